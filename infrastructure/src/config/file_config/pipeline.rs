//! Pipeline sections from TOML (`[retrieval]`, `[breaker]`, `[synthesis]`, `[session]`)

use fincounsel_application::{BreakerParams, RetrievalParams, SessionParams, SynthesisParams};
use fincounsel_domain::{DEFAULT_MAX_VERBATIM_WORDS, DrafterKind, SimilarityTransform};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw retrieval configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetrievalConfig {
    pub k: usize,
    pub min_similarity: f64,
    pub overfetch_factor: usize,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub timeout_secs: u64,
    pub transform: SimilarityTransform,
}

impl Default for FileRetrievalConfig {
    fn default() -> Self {
        Self {
            k: 4,
            min_similarity: 0.5,
            overfetch_factor: 2,
            max_attempts: 2,
            backoff_ms: 200,
            timeout_secs: 10,
            transform: SimilarityTransform::InverseDistance,
        }
    }
}

impl FileRetrievalConfig {
    pub fn to_params(&self) -> RetrievalParams {
        let mut params = RetrievalParams::default()
            .with_k(self.k)
            .with_min_similarity(self.min_similarity)
            .with_max_attempts(self.max_attempts)
            .with_backoff_base(Duration::from_millis(self.backoff_ms))
            .with_call_timeout(Duration::from_secs(self.timeout_secs))
            .with_transform(self.transform);
        params.overfetch_factor = self.overfetch_factor;
        params
    }
}

/// Raw circuit breaker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBreakerConfig {
    pub threshold: u32,
    pub max_actor_retries: u32,
}

impl Default for FileBreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 2,
            max_actor_retries: 1,
        }
    }
}

impl FileBreakerConfig {
    pub fn to_params(&self) -> BreakerParams {
        BreakerParams::default()
            .with_threshold(self.threshold)
            .with_max_actor_retries(self.max_actor_retries)
    }
}

/// Raw synthesis configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSynthesisConfig {
    pub max_verbatim_words: usize,
    pub drafter: DrafterKind,
}

impl Default for FileSynthesisConfig {
    fn default() -> Self {
        Self {
            max_verbatim_words: DEFAULT_MAX_VERBATIM_WORDS,
            drafter: DrafterKind::Extractive,
        }
    }
}

impl FileSynthesisConfig {
    pub fn to_params(&self) -> SynthesisParams {
        SynthesisParams {
            max_verbatim_words: self.max_verbatim_words,
            drafter: self.drafter,
        }
    }
}

/// Raw session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Directory for JSON session snapshots; sessions are memory-only when unset
    pub store_dir: Option<String>,
    pub idle_timeout_secs: u64,
    /// 0 disables the deadline
    pub turn_deadline_secs: u64,
    pub handler_timeout_secs: u64,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            store_dir: None,
            idle_timeout_secs: 30 * 60,
            turn_deadline_secs: 120,
            handler_timeout_secs: 5,
        }
    }
}

impl FileSessionConfig {
    pub fn to_params(&self) -> SessionParams {
        let deadline = (self.turn_deadline_secs > 0).then(|| Duration::from_secs(self.turn_deadline_secs));
        SessionParams::default()
            .with_idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .with_turn_deadline(deadline)
            .with_handler_timeout(Duration::from_secs(self.handler_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_section_maps_to_params() {
        let config: FileRetrievalConfig = toml::from_str(
            r#"
k = 6
min_similarity = 0.4
backoff_ms = 50
transform = "cosine_distance"
"#,
        )
        .unwrap();
        let params = config.to_params();
        assert_eq!(params.k, 6);
        assert_eq!(params.min_similarity, 0.4);
        assert_eq!(params.overfetch_factor, 2);
        assert_eq!(params.backoff_base, Duration::from_millis(50));
        assert_eq!(params.transform, SimilarityTransform::CosineDistance);
    }

    #[test]
    fn test_zero_deadline_disables_it() {
        let config = FileSessionConfig {
            turn_deadline_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.to_params().turn_deadline, None);
        assert_eq!(
            FileSessionConfig::default().to_params().turn_deadline,
            Some(Duration::from_secs(120))
        );
    }
}
