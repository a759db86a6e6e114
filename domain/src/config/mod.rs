//! Configuration value objects for the domain layer
//!
//! These are domain concepts related to configuration that are
//! used across multiple layers.

mod drafter_kind;
mod output_format;

pub use drafter_kind::DrafterKind;
pub use output_format::OutputFormat;
