//! Answer synthesis contract.
//!
//! Drafting (extractive or model-backed) produces a [`result::Draft`];
//! [`composer::AnswerComposer`] turns it into the final
//! [`result::SynthesisResult`] and enforces the structural rules.

pub mod acronyms;
pub mod composer;
pub mod extractive;
pub mod result;
pub mod verbatim;
