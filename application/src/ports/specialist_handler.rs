//! Specialist handler port
//!
//! Deterministic calculators invoked with structured arguments. Handlers are
//! stateless; a declared error kind maps to a breaker category through
//! [`HandlerError::category`](fincounsel_domain::HandlerError::category).

use async_trait::async_trait;
use fincounsel_domain::{HandlerDomain, HandlerError, HandlerOutput, HandlerRequest};

#[async_trait]
pub trait SpecialistHandler: Send + Sync {
    async fn invoke(
        &self,
        domain: HandlerDomain,
        request: &HandlerRequest,
    ) -> Result<HandlerOutput, HandlerError>;
}
