//! Handler result and error value objects.

use crate::breaker::category::ErrorCategory;
use crate::handler::args::HandlerArgs;
use crate::routing::tag::HandlerDomain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Input to a specialist handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerRequest {
    /// Calculation suggested by the router (e.g. "npv"); handlers fall back
    /// to their domain default when absent
    pub calculation: Option<String>,
    pub args: HandlerArgs,
}

impl HandlerRequest {
    pub fn new(args: HandlerArgs) -> Self {
        Self {
            calculation: None,
            args,
        }
    }

    pub fn with_calculation(mut self, calculation: impl Into<String>) -> Self {
        self.calculation = Some(calculation.into());
        self
    }
}

/// Successful handler result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerOutput {
    pub domain: HandlerDomain,
    /// Calculation that ran (e.g. "wacc", "npv")
    pub calculation: String,
    /// Named numeric results
    pub values: BTreeMap<String, f64>,
    /// One-paragraph natural-language answer
    pub summary: String,
}

impl HandlerOutput {
    pub fn new(
        domain: HandlerDomain,
        calculation: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            domain,
            calculation: calculation.into(),
            values: BTreeMap::new(),
            summary: summary.into(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

/// Declared kind of a handler failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerErrorKind {
    /// Missing or malformed arguments
    Validation,
    /// The handler failed while running
    Execution,
}

/// Handler failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct HandlerError {
    pub kind: HandlerErrorKind,
    pub message: String,
}

impl HandlerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: HandlerErrorKind::Validation,
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self {
            kind: HandlerErrorKind::Execution,
            message: message.into(),
        }
    }

    /// Breaker category this failure is recorded under.
    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            HandlerErrorKind::Validation => ErrorCategory::ValidationFailure,
            HandlerErrorKind::Execution => ErrorCategory::ToolFailure,
        }
    }
}
