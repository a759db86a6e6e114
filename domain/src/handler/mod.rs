//! Specialist handler domain types.
//!
//! Handlers are stateless calculators invoked with structured arguments.
//! This module only defines the shapes that cross the handler boundary:
//!
//! - [`args::HandlerArgs`]: arguments extracted from free text
//! - [`value_objects::HandlerOutput`] / [`value_objects::HandlerError`]

pub mod args;
pub mod value_objects;
