//! Acronym first-mention rendering.
//!
//! The first mention of a known term reads "Full Name (ACRONYM)"; every later
//! mention uses the acronym alone.

use crate::glossary::TERMS;
use regex::Regex;
use std::sync::LazyLock;

struct AcronymRule {
    acronym: &'static str,
    english: &'static str,
    /// Full name, optionally followed by "(ACRONYM)"
    long_form: Regex,
    short_form: Regex,
}

static RULES: LazyLock<Vec<AcronymRule>> = LazyLock::new(|| {
    TERMS
        .iter()
        .filter_map(|term| {
            let acronym = term.acronym?;
            let long_form = Regex::new(&format!(
                r"(?i)\b{}\b(\s*\(\s*{}\s*\))?",
                regex::escape(term.english),
                regex::escape(acronym)
            ))
            .ok()?;
            let short_form = Regex::new(&format!(r"\b{}\b", regex::escape(acronym))).ok()?;
            Some(AcronymRule {
                acronym,
                english: term.english,
                long_form,
                short_form,
            })
        })
        .collect()
});

/// Rewrite `text` so each known acronym is expanded exactly once, at its
/// first mention.
pub fn render_acronyms(text: &str) -> String {
    let mut out = text.to_string();
    for rule in RULES.iter() {
        if !rule.long_form.is_match(&out) && !rule.short_form.is_match(&out) {
            continue;
        }
        let collapsed = rule.long_form.replace_all(&out, rule.acronym);
        let expanded = format!("{} ({})", rule.english, rule.acronym);
        out = rule
            .short_form
            .replacen(&collapsed, 1, regex::NoExpand(&expanded))
            .into_owned();
    }
    out
}
