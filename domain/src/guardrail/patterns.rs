//! Ordered regex table guardrail (English and Spanish phrasing).

use super::verdict::{GuardrailCategory, GuardrailVerdict, QueryGuardrail};
use regex::RegexSet;
use std::sync::LazyLock;

const VERBATIM_TRANSCRIPTION: &[&str] = &[
    r"\b(transcribe|transcription|transcribir|transcripci[oó]n)\b",
    r"\b(copy|copia|copiar|c[oó]pia(me)?)\b",
    r"\bword[\s-]+for[\s-]+word\b",
    r"\b(full|complete|exact|literal|original)\s+text\b",
    r"\btexto\s+(completo|exacto|literal|original)\b",
    r"\b(give\s+me|dame)\s+(the\s+|el\s+)?(text|texto)\b",
    r"\bmuestra\s+el\s+(contenido|texto)\s+completo\b",
    r"\b(original|full|complete)\s+(pdf|document|material)\b",
    r"\b(pdf\s+completo|documento\s+original|material\s+original)\b",
];

const FULL_SECTION: &[&str] = &[
    r"\b(entire|whole|complete|full)\s+(chapter|section|reading)\b",
    r"\b(chapter|section|reading)\s+\d+\s+(in\s+full|completely|complete)\b",
    r"\bcap[ií]tulo\s+\d+\s+completo\b",
    r"\bsecci[oó]n\s+completa\b",
    r"\breading\s+\d+\s+completo\b",
    r"\btodo\s+el\s+(cap[ií]tulo|reading|material)\b",
];

const SPECIFIC_PAGE: &[&str] = &[
    r"\bpages?\s+\d+(\s*-\s*\d+)?\b",
    r"\bp[aá]ginas?\s+\d+(\s*-\s*\d+)?\b",
];

const VERBATIM_QUOTE: &[&str] = &[
    r"\bquote\s+(verbatim|literally|exactly|word)",
    r"\bverbatim\b",
    r"\b(exact|full)\s+(paragraph|excerpt|passage)\b",
    r"\bcita\s+textual(mente)?\b",
    r"\bc[ií]tame\s+(textual|literal)\b",
    r"\bextracto\s+completo\b",
    r"\bp[aá]rrafo\s+exacto\b",
];

const STRUCTURE_OUTLINE: &[&str] = &[
    r"\b(full|complete|entire)\s+(outline|index|table\s+of\s+contents)\b",
    r"\b(outline|index)\s+completo\b",
    r"\b[ií]ndice\s+completo\b",
    r"\btabla\s+de\s+contenidos?\s+completa\b",
    r"\bestructura\s+del\s+(libro|material|curriculum)\b",
];

fn patterns_for(category: GuardrailCategory) -> &'static [&'static str] {
    match category {
        GuardrailCategory::VerbatimTranscription => VERBATIM_TRANSCRIPTION,
        GuardrailCategory::FullSection => FULL_SECTION,
        GuardrailCategory::SpecificPage => SPECIFIC_PAGE,
        GuardrailCategory::VerbatimQuote => VERBATIM_QUOTE,
        GuardrailCategory::StructureOutline => STRUCTURE_OUTLINE,
    }
}

static DEFAULT_TABLE: LazyLock<Vec<(GuardrailCategory, RegexSet)>> = LazyLock::new(|| {
    GuardrailCategory::ORDERED
        .into_iter()
        .map(|category| {
            let set = RegexSet::new(patterns_for(category).iter().map(|p| format!("(?i){}", p)))
                .unwrap_or_else(|_| RegexSet::empty());
            (category, set)
        })
        .collect()
});

/// Guardrail that evaluates one regex set per category, in a fixed order.
#[derive(Debug, Clone)]
pub struct PatternGuardrail {
    table: Vec<(GuardrailCategory, RegexSet)>,
}

impl Default for PatternGuardrail {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.clone(),
        }
    }
}

impl PatternGuardrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extra pattern to an existing category.
    ///
    /// Evaluation order between categories is unchanged.
    pub fn with_pattern(mut self, category: GuardrailCategory, pattern: &str) -> Result<Self, regex::Error> {
        if let Some((_, set)) = self.table.iter_mut().find(|(c, _)| *c == category) {
            let mut patterns: Vec<String> = set.patterns().to_vec();
            patterns.push(format!("(?i){}", pattern));
            *set = RegexSet::new(patterns)?;
        }
        Ok(self)
    }
}

impl QueryGuardrail for PatternGuardrail {
    fn classify(&self, text: &str) -> GuardrailVerdict {
        self.table
            .iter()
            .find(|(_, set)| set.is_match(text))
            .map(|(category, _)| GuardrailVerdict::blocked(*category))
            .unwrap_or(GuardrailVerdict::Approved)
    }
}
