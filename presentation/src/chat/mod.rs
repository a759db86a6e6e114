//! Interactive chat module
//!
//! Provides a line-editor chat interface over a single session.

mod repl;

pub use repl::ChatRepl;
