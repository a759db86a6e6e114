//! Progress notification port
//!
//! Defines the interface for reporting progress while a turn runs.

use fincounsel_domain::CapabilityTag;

/// Stage of a running turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    /// Deciding which actor handles the message
    Routing,
    /// An actor was dispatched
    Dispatching(CapabilityTag),
    /// Screening the query before retrieval
    Guardrail,
    /// Vector-store attempt (1-based)
    Retrieval { attempt: u32 },
    /// Composing the answer
    Synthesis,
}

impl TurnStage {
    pub fn label(&self) -> String {
        match self {
            TurnStage::Routing => "Routing".to_string(),
            TurnStage::Dispatching(tag) => format!("Dispatching to {}", tag),
            TurnStage::Guardrail => "Checking request".to_string(),
            TurnStage::Retrieval { attempt: 1 } => "Searching study material".to_string(),
            TurnStage::Retrieval { attempt } => {
                format!("Searching study material (attempt {})", attempt)
            }
            TurnStage::Synthesis => "Writing answer".to_string(),
        }
    }
}

/// Callback for progress updates during a turn
///
/// Implementations live in the presentation layer.
pub trait TurnProgress: Send + Sync {
    fn on_stage(&self, stage: TurnStage);

    fn on_turn_complete(&self) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl TurnProgress for NoProgress {
    fn on_stage(&self, _stage: TurnStage) {}
}
