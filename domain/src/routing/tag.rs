//! Capability tags: the closed set of routing targets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain served by one specialist handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerDomain {
    /// Bond valuation
    FixedIncome,
    /// NPV and WACC
    CorporateFinance,
    /// Dividend discount (Gordon growth)
    Equity,
    /// CAPM and Sharpe ratio
    Portfolio,
    /// Option pricing (Black-Scholes)
    Derivatives,
}

impl HandlerDomain {
    pub const ALL: [HandlerDomain; 5] = [
        HandlerDomain::FixedIncome,
        HandlerDomain::CorporateFinance,
        HandlerDomain::Equity,
        HandlerDomain::Portfolio,
        HandlerDomain::Derivatives,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerDomain::FixedIncome => "fixed_income",
            HandlerDomain::CorporateFinance => "corporate_finance",
            HandlerDomain::Equity => "equity",
            HandlerDomain::Portfolio => "portfolio",
            HandlerDomain::Derivatives => "derivatives",
        }
    }
}

impl fmt::Display for HandlerDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HandlerDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HandlerDomain::ALL
            .into_iter()
            .find(|d| d.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Invalid HandlerDomain: {}", s))
    }
}

/// Routing target chosen once per decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "domain")]
pub enum CapabilityTag {
    /// A deterministic calculator
    Handler(HandlerDomain),
    /// Guardrail → retrieval → synthesis chain
    Retrieval,
    /// Usage guide
    Help,
    /// Terminal: the turn is answered
    Finish,
}

impl CapabilityTag {
    /// Whether choosing this tag dispatches an actor.
    pub fn is_dispatch(&self) -> bool {
        !matches!(self, CapabilityTag::Finish)
    }
}

impl fmt::Display for CapabilityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityTag::Handler(domain) => write!(f, "handler:{}", domain),
            CapabilityTag::Retrieval => write!(f, "retrieval"),
            CapabilityTag::Help => write!(f, "help"),
            CapabilityTag::Finish => write!(f, "finish"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            CapabilityTag::Handler(HandlerDomain::Equity).to_string(),
            "handler:equity"
        );
        assert_eq!(CapabilityTag::Retrieval.to_string(), "retrieval");
        assert_eq!(CapabilityTag::Finish.to_string(), "finish");
    }

    #[test]
    fn test_domain_from_str() {
        assert_eq!(
            "corporate_finance".parse::<HandlerDomain>().ok(),
            Some(HandlerDomain::CorporateFinance)
        );
        assert!("astrology".parse::<HandlerDomain>().is_err());
    }

    #[test]
    fn test_only_finish_does_not_dispatch() {
        assert!(!CapabilityTag::Finish.is_dispatch());
        assert!(CapabilityTag::Help.is_dispatch());
        assert!(CapabilityTag::Handler(HandlerDomain::Portfolio).is_dispatch());
    }
}
