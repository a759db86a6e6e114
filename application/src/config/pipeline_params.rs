//! Pipeline parameters: retrieval, breaker, synthesis and session control.
//!
//! These are application-layer concerns: they bound external calls and
//! loops, while the rules themselves live in the domain.

use fincounsel_domain::{DEFAULT_MAX_VERBATIM_WORDS, DrafterKind, SimilarityTransform};
use std::time::Duration;

/// Retrieval engine parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalParams {
    /// Passages returned at most
    pub k: usize,
    /// Minimum similarity a passage must reach
    pub min_similarity: f64,
    /// Candidates requested = `k * overfetch_factor`
    pub overfetch_factor: usize,
    /// Vector-store attempts before reporting upstream unavailable
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt
    pub backoff_base: Duration,
    /// Bound on each embedding or search call
    pub call_timeout: Duration,
    pub transform: SimilarityTransform,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            k: 4,
            min_similarity: 0.5,
            overfetch_factor: 2,
            max_attempts: 2,
            backoff_base: Duration::from_millis(200),
            call_timeout: Duration::from_secs(10),
            transform: SimilarityTransform::InverseDistance,
        }
    }
}

impl RetrievalParams {
    // ==================== Builder Methods ====================

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_backoff_base(mut self, backoff: Duration) -> Self {
        self.backoff_base = backoff;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_transform(mut self, transform: SimilarityTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Circuit breaker parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerParams {
    /// Same-category failures that halt a session
    pub threshold: u32,
    /// Extra dispatches of the same actor after a tool failure
    pub max_actor_retries: u32,
}

impl Default for BreakerParams {
    fn default() -> Self {
        Self {
            threshold: 2,
            max_actor_retries: 1,
        }
    }
}

impl BreakerParams {
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_actor_retries(mut self, retries: u32) -> Self {
        self.max_actor_retries = retries;
        self
    }

    /// Upper bound on dispatches within one turn.
    pub fn max_dispatches(&self) -> u32 {
        self.max_actor_retries + 1
    }
}

/// Synthesis parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisParams {
    pub max_verbatim_words: usize,
    pub drafter: DrafterKind,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            max_verbatim_words: DEFAULT_MAX_VERBATIM_WORDS,
            drafter: DrafterKind::Extractive,
        }
    }
}

/// Session lifecycle parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionParams {
    /// Sessions idle longer than this are evicted from memory
    pub idle_timeout: Duration,
    /// Turns finishing after this are discarded
    pub turn_deadline: Option<Duration>,
    /// Bound on one specialist handler call
    pub handler_timeout: Duration,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30 * 60),
            turn_deadline: Some(Duration::from_secs(120)),
            handler_timeout: Duration::from_secs(5),
        }
    }
}

impl SessionParams {
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_turn_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.turn_deadline = deadline;
        self
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let retrieval = RetrievalParams::default();
        assert_eq!(retrieval.k, 4);
        assert_eq!(retrieval.overfetch_factor, 2);
        assert_eq!(retrieval.max_attempts, 2);

        let breaker = BreakerParams::default();
        assert_eq!(breaker.threshold, 2);
        assert_eq!(breaker.max_dispatches(), 2);
    }

    #[test]
    fn test_backoff_doubles() {
        let params = RetrievalParams::default().with_backoff_base(Duration::from_millis(100));
        assert_eq!(params.backoff_for(1), Duration::from_millis(100));
        assert_eq!(params.backoff_for(2), Duration::from_millis(200));
        assert_eq!(params.backoff_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_builder() {
        let params = RetrievalParams::default()
            .with_k(6)
            .with_min_similarity(0.3)
            .with_transform(SimilarityTransform::CosineDistance);
        assert_eq!(params.k, 6);
        assert_eq!(params.min_similarity, 0.3);
        assert_eq!(params.transform, SimilarityTransform::CosineDistance);
    }
}
