//! Distance → similarity transforms.
//!
//! Every transform is monotonic non-increasing in distance and maps into
//! [0, 1], so ordering by similarity is the reverse of ordering by distance.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityTransform {
    /// `1 / (1 + d)`, for L2 or other unbounded non-negative distances
    #[default]
    InverseDistance,
    /// `1 - d` clamped to [0, 1], for stores reporting cosine distance
    CosineDistance,
}

impl SimilarityTransform {
    pub fn similarity(&self, distance: f64) -> f64 {
        if distance.is_nan() {
            return 0.0;
        }
        let d = distance.max(0.0);
        match self {
            SimilarityTransform::InverseDistance => 1.0 / (1.0 + d),
            SimilarityTransform::CosineDistance => (1.0 - d).clamp(0.0, 1.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityTransform::InverseDistance => "inverse_distance",
            SimilarityTransform::CosineDistance => "cosine_distance",
        }
    }
}

impl fmt::Display for SimilarityTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SimilarityTransform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inverse_distance" | "inverse" | "l2" => Ok(SimilarityTransform::InverseDistance),
            "cosine_distance" | "cosine" => Ok(SimilarityTransform::CosineDistance),
            _ => Err(format!("Invalid SimilarityTransform: {}", s)),
        }
    }
}
