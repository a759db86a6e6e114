//! Query enrichment with bilingual term expansions.

use crate::glossary::{TERMS, find_phrase};

/// Append the English/Spanish counterparts of every known term in `raw`.
///
/// Expansions follow the term table order and are never repeated. Text with
/// no known term is returned unchanged.
pub fn enrich_query(raw: &str) -> String {
    let mut additions: Vec<&str> = Vec::new();

    for term in TERMS {
        let forms: Vec<&str> = [
            term.acronym,
            Some(term.english),
            Some(term.spanish),
            term.spanish_acronym,
        ]
        .into_iter()
        .flatten()
        .collect();

        if !forms.iter().any(|form| find_phrase(raw, form).is_some()) {
            continue;
        }
        for form in forms {
            let already_present = find_phrase(raw, form).is_some()
                || additions.iter().any(|a| a.eq_ignore_ascii_case(form));
            if !already_present {
                additions.push(form);
            }
        }
    }

    if additions.is_empty() {
        raw.to_string()
    } else {
        format!("{} ({})", raw.trim_end(), additions.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spanish_acronym_expands_to_english() {
        let enriched = enrich_query("¿Qué es el VAN?");
        assert!(enriched.starts_with("¿Qué es el VAN?"));
        assert!(enriched.contains("NPV"));
        assert!(enriched.contains("Net Present Value"));
        assert!(enriched.contains("valor actual neto"));
    }

    #[test]
    fn test_english_phrase_expands_to_spanish() {
        let enriched = enrich_query("explain the cost of capital");
        assert_eq!(enriched, "explain the cost of capital (costo de capital)");
    }

    #[test]
    fn test_unknown_text_unchanged() {
        assert_eq!(enrich_query("hello there"), "hello there");
    }

    #[test]
    fn test_no_duplicate_expansions() {
        let enriched = enrich_query("WACC vs weighted average cost of capital");
        assert_eq!(enriched.matches("costo promedio ponderado de capital").count(), 1);
        assert!(!enriched.contains("(WACC"));
    }

    #[test]
    fn test_enrichment_is_deterministic() {
        assert_eq!(enrich_query("IRR and NPV"), enrich_query("IRR and NPV"));
    }
}
