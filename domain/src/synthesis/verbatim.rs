//! Verbatim reproduction guard.
//!
//! Word runs copied from a source passage may be at most `max_words` long;
//! longer runs are cut to the limit and marked with an ellipsis.

use std::collections::HashSet;

fn normalize(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn normalized_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(normalize)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Cut every run of more than `max_words` consecutive words that also
/// appears, in order, in one of `sources`.
pub fn limit_verbatim<S: AsRef<str>>(text: &str, sources: &[S], max_words: usize) -> String {
    let window = max_words.max(1) + 1;
    let shingles: HashSet<Vec<String>> = sources
        .iter()
        .flat_map(|source| {
            let words = normalized_words(source.as_ref());
            words.windows(window).map(|w| w.to_vec()).collect::<Vec<_>>()
        })
        .collect();
    if shingles.is_empty() {
        return text.to_string();
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let words: Vec<String> = tokens.iter().map(|t| normalize(t)).collect();

    // Tokens inside a copied run longer than max_words.
    let mut copied = vec![false; tokens.len()];
    for start in 0..tokens.len().saturating_sub(window - 1) {
        let slice = &words[start..start + window];
        if slice.iter().all(|w| !w.is_empty()) && shingles.contains(slice) {
            copied[start..start + window].iter_mut().for_each(|c| *c = true);
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    let mut run = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if copied[i] {
            run += 1;
            if run <= max_words {
                out.push((*token).to_string());
            } else if run == max_words + 1 {
                if let Some(last) = out.last_mut() {
                    last.push('…');
                }
            }
        } else {
            run = 0;
            out.push((*token).to_string());
        }
    }
    out.join(" ")
}

/// Length of the longest run of `text` copied from any of `sources`.
pub fn longest_copied_run<S: AsRef<str>>(text: &str, sources: &[S]) -> usize {
    let words = normalized_words(text);
    sources
        .iter()
        .map(|source| {
            let source_words = normalized_words(source.as_ref());
            let mut best = 0;
            let mut prev = vec![0usize; source_words.len() + 1];
            for w in &words {
                let mut cur = vec![0usize; source_words.len() + 1];
                for (j, s) in source_words.iter().enumerate() {
                    if w == s {
                        cur[j + 1] = prev[j] + 1;
                        best = best.max(cur[j + 1]);
                    }
                }
                prev = cur;
            }
            best
        })
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "The weighted average cost of capital is the minimum return a company \
must earn on existing assets to satisfy its creditors and owners.";

    #[test]
    fn test_long_copy_is_cut() {
        let text = "In short, the weighted average cost of capital is the minimum return a company must earn.";
        let out = limit_verbatim(text, &[SOURCE], 8);
        assert!(longest_copied_run(&out, &[SOURCE]) <= 8, "{}", out);
        assert!(out.starts_with("In short, the weighted"));
        assert!(out.contains('…'));
    }

    #[test]
    fn test_short_phrase_kept() {
        let text = "It is the minimum return investors require.";
        assert_eq!(limit_verbatim(text, &[SOURCE], 8), text);
    }

    #[test]
    fn test_paraphrase_untouched() {
        let text = "Firms must clear a blended hurdle rate that keeps lenders and shareholders whole.";
        assert_eq!(limit_verbatim(text, &[SOURCE], 4), text);
    }

    #[test]
    fn test_no_sources() {
        let sources: [&str; 0] = [];
        assert_eq!(limit_verbatim("anything at all", &sources, 2), "anything at all");
    }

    #[test]
    fn test_longest_copied_run() {
        assert_eq!(longest_copied_run("minimum return a company", &[SOURCE]), 4);
        assert_eq!(longest_copied_run("nothing shared", &[SOURCE]), 0);
    }
}
