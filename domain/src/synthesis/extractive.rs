//! Deterministic key-phrase drafter.
//!
//! Builds a draft from short clauses of the supplied passages only. Clauses
//! that share words with the query are preferred and each is cut to
//! `max_phrase_words`. Adjacent short clauses can still form a longer copied
//! run; the composer's verbatim guard is what enforces the limit.

use crate::retrieval::passage::Passage;
use crate::synthesis::result::Draft;
use std::collections::HashSet;

const STOPWORDS: &[&str] = &[
    "what", "explain", "does", "about", "with", "that", "this", "from", "have", "which", "their",
    "there", "como", "para", "sobre", "cual", "entre", "explica", "the", "and", "into",
];

/// Passages that contribute at most this many clauses each.
const PHRASES_PER_PASSAGE: usize = 3;
/// Passages used for the draft.
const MAX_PASSAGES: usize = 3;

#[derive(Debug, Clone)]
pub struct ExtractiveDrafter {
    max_phrase_words: usize,
}

impl ExtractiveDrafter {
    pub fn new(max_phrase_words: usize) -> Self {
        Self {
            max_phrase_words: max_phrase_words.max(2),
        }
    }

    pub fn draft(&self, query: &str, passages: &[Passage]) -> Draft {
        let terms = query_terms(query);
        let mut paragraphs = Vec::new();
        let mut contributions = Vec::new();

        for (index, passage) in passages.iter().enumerate().take(MAX_PASSAGES) {
            let phrases = self.key_phrases(&passage.text, &terms);
            if phrases.is_empty() {
                continue;
            }
            let paragraph = if contributions.is_empty() {
                format!(
                    "According to {}, the key points are: {}.",
                    passage.locator,
                    phrases.join("; ")
                )
            } else {
                format!("{} adds: {}.", passage.locator, phrases.join("; "))
            };
            paragraphs.push(paragraph);
            contributions.push(index);
        }

        Draft::new(paragraphs.join("\n\n")).with_contributions(contributions)
    }

    fn key_phrases(&self, text: &str, terms: &HashSet<String>) -> Vec<String> {
        let clauses: Vec<&str> = text
            .split(['.', ';', ':', '\n', '!', '?'])
            .map(str::trim)
            .filter(|c| c.split_whitespace().count() >= 2)
            .collect();

        let mut scored: Vec<(usize, usize, &str)> = clauses
            .iter()
            .enumerate()
            .map(|(i, clause)| {
                let hits = clause
                    .split_whitespace()
                    .filter(|w| terms.contains(&normalize(w)))
                    .count();
                (hits, i, *clause)
            })
            .collect();
        // Most query overlap first, then text order.
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut chosen: Vec<(usize, String)> = scored
            .into_iter()
            .take(PHRASES_PER_PASSAGE)
            .map(|(_, i, clause)| (i, self.shorten(clause)))
            .collect();
        chosen.sort_by_key(|(i, _)| *i);
        chosen.into_iter().map(|(_, phrase)| phrase).collect()
    }

    fn shorten(&self, clause: &str) -> String {
        let words: Vec<&str> = clause.split([' ', ',']).filter(|w| !w.is_empty()).collect();
        let mut phrase = words
            .iter()
            .take(self.max_phrase_words)
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if words.len() > self.max_phrase_words {
            phrase.push('…');
        }
        phrase
    }
}

fn normalize(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn query_terms(query: &str) -> HashSet<String> {
    query
        .split_whitespace()
        .map(normalize)
        .filter(|w| w.chars().count() >= 3 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}
