//! Fixed user-facing messages.
//!
//! Every degraded or refused turn answers with one of these constants.
//! Internal error categories never appear in answer text; they are only
//! visible in the turn trace and logs.

/// Returned for the tripping turn and every later turn of a halted session.
pub const SAFETY_MESSAGE: &str = "I could not complete this request after repeated failures, \
so this conversation has been paused for safety. Please start a new session to continue.";

/// Returned when an external service stayed unavailable after retries.
pub const DEGRADED_MESSAGE: &str = "The reference material is temporarily unavailable. \
I can still help with financial calculations such as NPV, WACC, bond pricing, CAPM, \
the Sharpe ratio, Gordon growth or a Black-Scholes call. Please try your question again later.";

/// Returned when no capability can serve the request.
pub const CAPABILITY_GAP_MESSAGE: &str = "I can answer questions about finance concepts from \
the indexed study material and run specific financial calculations, but I could not match \
your request to either. Type \"help\" to see examples of what I can do.";

/// Returned when a calculation is missing or has malformed arguments.
pub const VALIDATION_MESSAGE: &str = "I could not run that calculation because some inputs \
are missing or invalid. Please restate the request with every required value, for example \
\"Calculate WACC: Ke=12%, Kd=8%, E=60M, D=40M, tax=25%\".";

/// Returned when a calculation failed while running.
pub const TOOL_FAILURE_MESSAGE: &str = "The calculation could not be completed with the \
values provided. Please check that the inputs are consistent and try again.";

/// Synthesis output when no passage cleared the similarity threshold.
pub const FALLBACK_ANSWER: &str = "I could not find this information in the available study material.";
