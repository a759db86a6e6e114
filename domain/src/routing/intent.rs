//! Pure routing function from a session's latest message to a capability tag.
//!
//! Rules, first match wins:
//!
//! 1. latest message is not from the user → `Finish`
//! 2. help phrasing → `Help`
//! 3. calculation intent + handler keyword → that handler
//! 4. knowledge intent without a complete parameter set → `Retrieval`
//! 5. handler keyword with enough parameters → that handler
//! 6. handler keyword, finance term, question phrasing or a reference to
//!    the study material → `Retrieval`
//! 7. otherwise → [`CapabilityGap`]

use crate::glossary::{TERMS, find_phrase};
use crate::handler::args::HandlerArgs;
use crate::routing::tag::{CapabilityTag, HandlerDomain};
use crate::session::entities::Session;
use regex::RegexSet;
use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

/// The router's choice for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDecision {
    pub tag: CapabilityTag,
    pub rationale: String,
    /// Calculation suggested to the handler, for handler tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation: Option<String>,
}

impl RouteDecision {
    fn new(tag: CapabilityTag, rationale: impl Into<String>) -> Self {
        Self {
            tag,
            rationale: rationale.into(),
            calculation: None,
        }
    }

    fn handler(rule: &KeywordRule, rationale: impl Into<String>) -> Self {
        Self {
            tag: CapabilityTag::Handler(rule.domain),
            rationale: rationale.into(),
            calculation: Some(rule.calculation.to_string()),
        }
    }
}

/// No capability matches the request; the turn ends without dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("capability gap: {rationale}")]
pub struct CapabilityGap {
    pub rationale: String,
}

/// Keyword mapping from phrasing to one calculation.
#[derive(Debug)]
struct KeywordRule {
    domain: HandlerDomain,
    calculation: &'static str,
    /// Higher wins when several rules match
    priority: u8,
    required_params: usize,
    patterns: RegexSet,
}

fn compile(patterns: &[&str]) -> RegexSet {
    RegexSet::new(patterns.iter().map(|p| format!("(?i){}", p))).unwrap_or_else(|_| RegexSet::empty())
}

fn rule(
    domain: HandlerDomain,
    calculation: &'static str,
    priority: u8,
    required_params: usize,
    patterns: &[&str],
) -> KeywordRule {
    KeywordRule {
        domain,
        calculation,
        priority,
        required_params,
        patterns: compile(patterns),
    }
}

static KEYWORD_RULES: LazyLock<Vec<KeywordRule>> = LazyLock::new(|| {
    let mut rules = vec![
        rule(
            HandlerDomain::CorporateFinance,
            "npv",
            10,
            3,
            &[r"\bnpv\b", r"\bvan\b", r"net present value", r"valor actual neto"],
        ),
        rule(
            HandlerDomain::CorporateFinance,
            "wacc",
            9,
            5,
            &[
                r"\bwacc\b",
                r"weighted average cost",
                r"costo promedio ponderado",
            ],
        ),
        rule(
            HandlerDomain::Portfolio,
            "capm",
            10,
            3,
            &[r"\bcapm\b", r"capital asset pricing"],
        ),
        rule(HandlerDomain::Portfolio, "sharpe", 9, 3, &[r"\bsharpe\b"]),
        rule(
            HandlerDomain::FixedIncome,
            "bond_value",
            10,
            4,
            &[
                r"\bbond\b.*\b(value|price|pv)\b",
                r"\b(value|price|pv)\b.*\bbond\b",
                r"\b(valor|precio)\b.*\bbono\b",
            ],
        ),
        rule(
            HandlerDomain::Equity,
            "gordon_growth",
            10,
            3,
            &[
                r"\bgordon\b",
                r"\bddm\b",
                r"dividend discount",
                r"descuento de dividendos",
            ],
        ),
        rule(
            HandlerDomain::Derivatives,
            "black_scholes_call",
            10,
            5,
            &[
                r"\bcall\s+option\b",
                r"\bopci[oó]n\s+(call|de\s+compra)\b",
                r"\bblack[\s-]*scholes\b",
            ],
        ),
    ];
    // Stable: equal priorities keep table order.
    rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    rules
});

static HELP: LazyLock<RegexSet> = LazyLock::new(|| {
    compile(&[
        r"^\s*(help|ayuda|examples|ejemplos)\s*[.!?]*\s*$",
        r"\bwhat can you (do|help with)\b",
        r"\bqu[eé] puedes hacer\b",
        r"\b(show|give)\s+me\s+(some\s+)?examples\b",
        r"\bdame\s+(algunos\s+)?ejemplos\b",
        r"\bhow (should|do) i ask\b",
        r"\bc[oó]mo (debo )?pregunt",
    ])
});

static CALC_INTENT: LazyLock<RegexSet> = LazyLock::new(|| {
    compile(&[
        r"\bcalculate\b",
        r"\bcompute\b",
        r"\bdetermine\b",
        r"\bcalcula(r|me)?\b",
        r"\bobt[eé]n(er)?\b",
        r"\bdetermin(a|ar)\b",
        r"\bcomput(a|ar)\b",
        r"\bvalue (a|the|this)\b",
        r"\bvalora\b",
    ])
});

static KNOWLEDGE_INTENT: LazyLock<RegexSet> = LazyLock::new(|| {
    compile(&[
        r"\bwhat (is|are)\b",
        r"\bexplain\b",
        r"\bdefine\b",
        r"\bdescribe\b",
        r"\bhow (does|do)\b",
        r"\bwhy\b",
        r"\bdifference between\b",
        r"\bqu[eé] (es|son)\b",
        r"\bexplica(me)?\b",
        r"\bdefin[ei]\b",
        r"\bc[oó]mo (funciona|se calcula)\b",
        r"\bdiferencia entre\b",
        r"\bpor qu[eé]\b",
    ])
});

static QUESTION: LazyLock<RegexSet> = LazyLock::new(|| {
    compile(&[
        r"\?\s*$",
        r"^\s*¿",
        r"^\s*(what|how|why|when|which|who|is|are|does|can|should)\b",
        r"^\s*(qu[eé]|c[oó]mo|cu[aá]l|cu[aá]ndo|d[oó]nde)\b",
    ])
});

/// References to the indexed material itself; the guardrail screens these.
static MATERIAL: LazyLock<RegexSet> = LazyLock::new(|| {
    compile(&[
        r"\b(chapter|section|page|pages|reading|textbook|excerpt|paragraph|syllabus)\b",
        r"\b(transcribe|quote|copy)\b",
        r"\b(cap[ií]tulo|secci[oó]n|p[aá]gina|lectura|libro|p[aá]rrafo|temario)\b",
        r"\b(transcrib\w*|cita\w*|copia\w*)\b",
    ])
});

fn matched_rule(text: &str) -> Option<&'static KeywordRule> {
    KEYWORD_RULES.iter().find(|r| r.patterns.is_match(text))
}

fn mentions_finance_term(text: &str) -> bool {
    TERMS.iter().any(|term| {
        [
            term.acronym,
            Some(term.english),
            Some(term.spanish),
            term.spanish_acronym,
        ]
        .into_iter()
        .flatten()
        .any(|form| find_phrase(text, form).is_some())
    })
}

/// Choose the capability tag for the session's latest message.
pub fn decide(session: &Session) -> Result<RouteDecision, CapabilityGap> {
    let Some(latest) = session.latest_message() else {
        return Ok(RouteDecision::new(CapabilityTag::Finish, "no message to route"));
    };
    if !latest.is_user() {
        return Ok(RouteDecision::new(
            CapabilityTag::Finish,
            "latest message already answered",
        ));
    }
    decide_text(&latest.content)
}

/// Routing rules applied to raw text.
pub fn decide_text(text: &str) -> Result<RouteDecision, CapabilityGap> {
    if HELP.is_match(text) {
        return Ok(RouteDecision::new(CapabilityTag::Help, "help phrasing"));
    }

    let rule = matched_rule(text);
    let params = HandlerArgs::parse(text).param_count();

    if let Some(rule) = rule {
        if CALC_INTENT.is_match(text) {
            return Ok(RouteDecision::handler(
                rule,
                format!("calculation intent for {}", rule.calculation),
            ));
        }
    }

    let complete = rule.is_some_and(|r| params >= r.required_params);

    if KNOWLEDGE_INTENT.is_match(text) && !complete {
        return Ok(RouteDecision::new(
            CapabilityTag::Retrieval,
            "knowledge question",
        ));
    }

    if let Some(rule) = rule.filter(|_| complete) {
        return Ok(RouteDecision::handler(
            rule,
            format!(
                "{} with {} parameters (needs {})",
                rule.calculation, params, rule.required_params
            ),
        ));
    }

    if let Some(rule) = rule {
        return Ok(RouteDecision::new(
            CapabilityTag::Retrieval,
            format!("mentions {} without parameters", rule.calculation),
        ));
    }

    if mentions_finance_term(text) || QUESTION.is_match(text) {
        return Ok(RouteDecision::new(
            CapabilityTag::Retrieval,
            "finance term or question phrasing",
        ));
    }

    if MATERIAL.is_match(text) {
        return Ok(RouteDecision::new(
            CapabilityTag::Retrieval,
            "refers to the study material",
        ));
    }

    Err(CapabilityGap {
        rationale: "no handler keyword, finance term or question phrasing".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::Query;
    use crate::session::entities::SessionId;

    fn tag_of(text: &str) -> Option<CapabilityTag> {
        decide_text(text).ok().map(|d| d.tag)
    }

    #[test]
    fn test_keyword_tables_compile() {
        assert!(KEYWORD_RULES.iter().all(|r| !r.patterns.is_empty()));
        assert!(!HELP.is_empty());
        assert!(!CALC_INTENT.is_empty());
        assert!(!KNOWLEDGE_INTENT.is_empty());
        assert!(!QUESTION.is_empty());
    }

    #[test]
    fn test_empty_session_finishes() {
        let session = Session::new(SessionId::new("s"), 2);
        assert_eq!(decide(&session).unwrap().tag, CapabilityTag::Finish);
    }

    #[test]
    fn test_answered_turn_finishes() {
        let mut session = Session::new(SessionId::new("s"), 2);
        session.begin_turn(&Query::new("what is beta?").unwrap()).unwrap();
        assert_eq!(decide(&session).unwrap().tag, CapabilityTag::Retrieval);

        session.append_assistant("Beta measures systematic risk.", None);
        assert_eq!(decide(&session).unwrap().tag, CapabilityTag::Finish);
    }

    #[test]
    fn test_help_phrasing() {
        assert_eq!(tag_of("help"), Some(CapabilityTag::Help));
        assert_eq!(tag_of("What can you do?"), Some(CapabilityTag::Help));
        assert_eq!(tag_of("¿Qué puedes hacer?"), Some(CapabilityTag::Help));
        assert_eq!(tag_of("dame ejemplos"), Some(CapabilityTag::Help));
    }

    #[test]
    fn test_calc_intent_wins_over_knowledge_intent() {
        let decision = decide_text("Calculate the WACC: Ke=12%, Kd=8%, E=60M, D=40M, tax=25%").unwrap();
        assert_eq!(
            decision.tag,
            CapabilityTag::Handler(HandlerDomain::CorporateFinance)
        );
        assert_eq!(decision.calculation.as_deref(), Some("wacc"));
    }

    #[test]
    fn test_calc_intent_without_params_still_dispatches() {
        assert_eq!(
            tag_of("calcula el VAN"),
            Some(CapabilityTag::Handler(HandlerDomain::CorporateFinance))
        );
    }

    #[test]
    fn test_knowledge_question_goes_to_retrieval() {
        assert_eq!(tag_of("explain the cost of capital"), Some(CapabilityTag::Retrieval));
        assert_eq!(tag_of("What is WACC?"), Some(CapabilityTag::Retrieval));
        assert_eq!(tag_of("Explica qué es el WACC"), Some(CapabilityTag::Retrieval));
    }

    #[test]
    fn test_question_with_full_params_dispatches_handler() {
        let decision =
            decide_text("What is the Ke using CAPM? risk free 3%, beta 1.2, market return 10%")
                .unwrap();
        assert_eq!(decision.tag, CapabilityTag::Handler(HandlerDomain::Portfolio));
        assert_eq!(decision.calculation.as_deref(), Some("capm"));
    }

    #[test]
    fn test_keyword_with_params() {
        let decision = decide_text("Gordon growth: D1=$2.50, Ke=12%, g=4%").unwrap();
        assert_eq!(decision.tag, CapabilityTag::Handler(HandlerDomain::Equity));

        let decision = decide_text("Call option price: S=100, K=105, T=0.5, r=5%, sigma=0.2").unwrap();
        assert_eq!(decision.tag, CapabilityTag::Handler(HandlerDomain::Derivatives));
    }

    #[test]
    fn test_priority_picks_npv_over_wacc() {
        let decision = decide_text("compute npv using wacc 10%, investment 1000, flows [500, 700]").unwrap();
        assert_eq!(decision.calculation.as_deref(), Some("npv"));
    }

    #[test]
    fn test_keyword_alone_goes_to_retrieval() {
        assert_eq!(tag_of("sharpe ratio interpretation"), Some(CapabilityTag::Retrieval));
        assert_eq!(tag_of("duration and convexity"), Some(CapabilityTag::Retrieval));
    }

    #[test]
    fn test_material_requests_reach_the_knowledge_chain() {
        assert_eq!(
            tag_of("transcribe chapter 5 word for word"),
            Some(CapabilityTag::Retrieval)
        );
        assert_eq!(
            tag_of("dame la página 42 completa"),
            Some(CapabilityTag::Retrieval)
        );
    }

    #[test]
    fn test_unrelated_text_is_capability_gap() {
        assert!(decide_text("book me a flight to Lisbon").is_err());
        assert!(decide_text("tell me a joke").is_err());
    }

    #[test]
    fn test_decide_is_deterministic() {
        let text = "determine the bond price: face 1000, coupon 5%, years 10, ytm 6%";
        assert_eq!(decide_text(text), decide_text(text));
        assert_eq!(
            tag_of(text),
            Some(CapabilityTag::Handler(HandlerDomain::FixedIncome))
        );
    }
}
