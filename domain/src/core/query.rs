//! Query value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// A user query (Value Object)
///
/// Always non-empty after trimming. The original spelling is kept; callers
/// that need case-insensitive matching lowercase on their side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    content: String,
}

impl Query {
    /// Create a query, rejecting empty or whitespace-only text.
    pub fn new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::EmptyQuery);
        }
        Ok(Self {
            content: content.trim().to_string(),
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_trims() {
        let q = Query::new("  What is WACC?  ").unwrap();
        assert_eq!(q.content(), "What is WACC?");
    }

    #[test]
    fn test_empty_query_rejected() {
        assert_eq!(Query::new(""), Err(DomainError::EmptyQuery));
        assert_eq!(Query::new("   \n"), Err(DomainError::EmptyQuery));
    }
}
