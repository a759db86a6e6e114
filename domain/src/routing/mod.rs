//! Request routing.
//!
//! - [`tag`]: the closed set of capability tags
//! - [`state`]: the per-turn router state table
//! - [`intent`]: `decide`, the pure routing function

pub mod intent;
pub mod state;
pub mod tag;
