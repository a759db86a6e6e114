//! Output formatting for turn replies

pub mod console;
pub mod formatter;
