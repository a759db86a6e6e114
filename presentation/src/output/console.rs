//! Console output formatter for turn replies

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use fincounsel_application::{HandleTurnError, TurnReply, TurnTrace};
use fincounsel_domain::RouterState;

const SOURCES_MARKER: &str = "\n\nSources:";

/// Formats turn replies for console display
#[derive(Debug, Clone, Default)]
pub struct ConsoleFormatter {
    show_trace: bool,
}

impl ConsoleFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace(mut self, show: bool) -> Self {
        self.show_trace = show;
        self
    }

    /// Format the answer, its sources, and the trace when enabled
    pub fn format(&self, reply: &TurnReply) -> String {
        let mut output = String::new();

        // The composer appends a plain `Sources:` block; it is re-rendered
        // here from the citation list.
        let body = match reply.answer.split_once(SOURCES_MARKER) {
            Some((body, _)) if !reply.citations.is_empty() => body,
            _ => reply.answer.as_str(),
        };
        output.push_str(body);
        output.push('\n');

        if !reply.citations.is_empty() {
            output.push_str(&format!("\n{}\n", "Sources:".cyan().bold()));
            for citation in &reply.citations {
                output.push_str(&format!("  - {}\n", citation.dimmed()));
            }
        }

        if reply.halted {
            output.push_str(&format!(
                "\n{}\n",
                "Session halted. Use /reset (or --reset) to start over.".yellow()
            ));
        }

        if self.show_trace {
            output.push_str(&Self::format_trace(&reply.trace));
        }

        output
    }

    fn format_trace(trace: &TurnTrace) -> String {
        let mut output = format!("\n{}\n", Self::section_header("Trace"));
        let actors = if trace.actor_sequence.is_empty() {
            "(none)".to_string()
        } else {
            trace.actor_sequence.join(" -> ")
        };
        output.push_str(&format!("  {} {}\n", "actors:".dimmed(), actors));
        output.push_str(&format!(
            "  {} {}\n",
            "final state:".dimmed(),
            Self::state_label(&trace.final_state)
        ));
        if let Some(rationale) = &trace.rationale {
            output.push_str(&format!("  {} {}\n", "rationale:".dimmed(), rationale));
        }
        for event in &trace.error_events {
            output.push_str(&format!(
                "  {} {} {}: {}\n",
                "x".red(),
                event.category.as_str().red(),
                event.actor,
                event.detail
            ));
        }
        output
    }

    pub fn state_label(state: &RouterState) -> String {
        match state {
            RouterState::Routing => "routing".to_string(),
            RouterState::Dispatched(tag) => format!("dispatched({})", tag),
            RouterState::Synthesizing => "synthesizing".to_string(),
            RouterState::Done => "done".to_string(),
            RouterState::Halted => "halted".to_string(),
        }
    }

    /// Format a turn that produced no reply
    pub fn format_error(error: &HandleTurnError) -> String {
        match error {
            HandleTurnError::Cancelled => format!("{}", "Cancelled.".yellow()),
            HandleTurnError::DeadlineExceeded => format!(
                "{} {}",
                "Timed out.".yellow(),
                "The question was not recorded; try again.".dimmed()
            ),
            other => format!("{} {}", "Error:".red().bold(), other),
        }
    }

    fn section_header(title: &str) -> String {
        format!("{}\n{}", title.cyan().bold(), "-".repeat(40))
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_text(&self, reply: &TurnReply) -> String {
        self.format(reply)
    }

    fn format_json(&self, reply: &TurnReply) -> String {
        serde_json::to_string_pretty(reply).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fincounsel_application::ErrorEvent;
    use fincounsel_domain::{CapabilityTag, ErrorCategory, OutputFormat, SessionId};

    fn reply() -> TurnReply {
        TurnReply {
            session_id: SessionId::new("s-1"),
            turn: 2,
            answer: "WACC blends the cost of equity and debt.\n\nSources:\n- Corporate Finance Notes, p. 12"
                .to_string(),
            citations: vec!["Corporate Finance Notes, p. 12".to_string()],
            fallback: false,
            halted: false,
            trace: TurnTrace {
                actor_sequence: vec!["retrieval".to_string()],
                error_events: Vec::new(),
                rationale: None,
                final_state: RouterState::Done,
            },
        }
    }

    #[test]
    fn test_sources_rendered_once() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::new().format(&reply());
        assert_eq!(text.matches("Sources:").count(), 1);
        assert!(text.starts_with("WACC blends the cost of equity and debt.\n"));
        assert!(text.contains("  - Corporate Finance Notes, p. 12"));
        assert!(!text.contains("Trace"));
    }

    #[test]
    fn test_trace_lists_actors_and_errors() {
        colored::control::set_override(false);
        let mut reply = reply();
        reply.trace.actor_sequence = vec!["handler:fixed_income".into(), "handler:fixed_income".into()];
        reply.trace.error_events.push(ErrorEvent {
            category: ErrorCategory::ToolFailure,
            actor: "handler:fixed_income".into(),
            detail: "timed out".into(),
        });
        reply.trace.final_state = RouterState::Dispatched(CapabilityTag::Retrieval);

        let text = ConsoleFormatter::new().with_trace(true).format(&reply);
        assert!(text.contains("handler:fixed_income -> handler:fixed_income"));
        assert!(text.contains("tool_failure handler:fixed_income: timed out"));
        assert!(text.contains("dispatched(retrieval)"));
    }

    #[test]
    fn test_halted_reply_mentions_reset() {
        colored::control::set_override(false);
        let mut reply = reply();
        reply.halted = true;
        reply.citations.clear();
        let text = ConsoleFormatter::new().format(&reply);
        assert!(text.contains("/reset"));
    }

    #[test]
    fn test_json_includes_trace() {
        let json = ConsoleFormatter::new().render(&reply(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["turn"], 2);
        assert_eq!(value["trace"]["actor_sequence"][0], "retrieval");
    }
}
