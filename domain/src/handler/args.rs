//! Argument extraction from free-text calculation requests.
//!
//! Recognised forms:
//! - `key=value`, `key: value`, `key value` (one or two word keys)
//! - optional `$` prefix, `%` suffix, magnitude suffixes `k`, `m`, `b`
//! - bracketed series `[30k, 40k, 50k]`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static NAMED_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b([a-z][a-z0-9_]*(?:\s[a-z][a-z0-9_]*)?)\s*(?:=|:|\s)\s*\$?(-?\d+(?:\.\d+)?)\s*(%|[kmb]\b)?",
    )
    .expect("static argument pattern")
});

static SERIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]").expect("static series pattern"));

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\$|\b)(\d+(?:\.\d+)?)\s*(%|[kmb]\b)?").expect("static number pattern")
});

/// One extracted numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArgValue {
    /// Value with magnitude suffixes applied (`60M` → 60_000_000)
    pub value: f64,
    /// Written with a `%` sign
    pub percent: bool,
}

impl ArgValue {
    /// Interpret as a rate fraction.
    ///
    /// `12%` and a bare `12` both mean 0.12; a bare `0.12` is already a fraction.
    pub fn as_rate(&self) -> f64 {
        if self.percent || self.value.abs() > 1.0 {
            self.value / 100.0
        } else {
            self.value
        }
    }
}

/// Structured arguments for a specialist handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerArgs {
    /// Keyed values; keys are lowercase with single spaces
    pub named: BTreeMap<String, ArgValue>,
    /// Values of the first bracketed list, if any
    pub series: Vec<f64>,
    /// Every numeric token outside brackets, in order of appearance
    pub numbers: Vec<f64>,
}

impl HandlerArgs {
    /// Extract arguments from free text.
    pub fn parse(text: &str) -> Self {
        let mut args = HandlerArgs::default();

        let mut without_series = text.to_string();
        if let Some(caps) = SERIES.captures(text) {
            args.series = caps[1]
                .split(',')
                .filter_map(|item| parse_number(item.trim()))
                .map(|v| v.value)
                .collect();
            without_series = SERIES.replace_all(text, " ").into_owned();
        }

        for caps in NAMED_VALUE.captures_iter(&without_series) {
            let key = normalize_key(&caps[1]);
            if let Some(value) = build_value(&caps[2], caps.get(3).map(|m| m.as_str())) {
                args.named.entry(key).or_insert(value);
            }
        }

        args.numbers = NUMBER
            .captures_iter(&without_series)
            .filter_map(|caps| build_value(&caps[1], caps.get(2).map(|m| m.as_str())))
            .map(|v| v.value)
            .collect();

        args
    }

    /// Look up the first alias present.
    ///
    /// Exact key matches win; otherwise a two-word key ending in the alias
    /// ("discount rate" for `rate`) is accepted.
    pub fn get(&self, aliases: &[&str]) -> Option<ArgValue> {
        aliases
            .iter()
            .find_map(|alias| self.named.get(*alias).copied())
            .or_else(|| {
                aliases.iter().find_map(|alias| {
                    self.named
                        .iter()
                        .find(|(key, _)| key.ends_with(&format!(" {}", alias)))
                        .map(|(_, v)| *v)
                })
            })
    }

    /// Number of distinct parameters detected (named values plus a series).
    pub fn param_count(&self) -> usize {
        self.named.len().max(self.numbers.len()) + usize::from(!self.series.is_empty())
    }
}

fn normalize_key(raw: &str) -> String {
    raw.to_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_number(token: &str) -> Option<ArgValue> {
    let (sign, rest) = match token.strip_prefix('-') {
        Some(rest) => (-1.0, rest.trim_start()),
        None => (1.0, token),
    };
    let caps = NUMBER.captures(rest)?;
    build_value(&caps[1], caps.get(2).map(|m| m.as_str())).map(|v| ArgValue {
        value: sign * v.value,
        ..v
    })
}

fn build_value(number: &str, suffix: Option<&str>) -> Option<ArgValue> {
    let base: f64 = number.parse().ok()?;
    let suffix = suffix.map(str::to_lowercase);
    let (multiplier, percent) = match suffix.as_deref() {
        Some("%") => (1.0, true),
        Some("k") => (1e3, false),
        Some("m") => (1e6, false),
        Some("b") => (1e9, false),
        _ => (1.0, false),
    };
    Some(ArgValue {
        value: base * multiplier,
        percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wacc_request() {
        let args = HandlerArgs::parse("Calculate WACC: Ke=12%, Kd=8%, E=60M, D=40M, tax=25%");
        assert_eq!(args.get(&["ke"]).unwrap().as_rate(), 0.12);
        assert_eq!(args.get(&["e"]).unwrap().value, 60_000_000.0);
        assert_eq!(args.get(&["d"]).unwrap().value, 40_000_000.0);
        assert!(args.get(&["tax"]).unwrap().percent);
    }

    #[test]
    fn test_parse_series() {
        let args = HandlerArgs::parse("NPV with investment 100000, flows [30k, 40k, 50k], rate 10%");
        assert_eq!(args.series, vec![30_000.0, 40_000.0, 50_000.0]);
        assert_eq!(args.get(&["investment"]).unwrap().value, 100_000.0);
        assert_eq!(args.get(&["rate"]).unwrap().as_rate(), 0.10);
    }

    #[test]
    fn test_two_word_key_suffix_lookup() {
        let args = HandlerArgs::parse("discount rate 8%");
        assert_eq!(args.get(&["rate"]).unwrap().as_rate(), 0.08);
    }

    #[test]
    fn test_dollar_prefix_and_decimal() {
        let args = HandlerArgs::parse("Gordon growth: D1=$2.50, Ke=12%, g=4%");
        assert_eq!(args.get(&["d1"]).unwrap().value, 2.5);
        assert_eq!(args.get(&["g"]).unwrap().as_rate(), 0.04);
    }

    #[test]
    fn test_bare_fraction_is_rate() {
        let args = HandlerArgs::parse("sigma=0.2");
        assert_eq!(args.get(&["sigma"]).unwrap().as_rate(), 0.2);
    }

    #[test]
    fn test_negative_series_values() {
        let args = HandlerArgs::parse("flows [-5000, 2k, 3k]");
        assert_eq!(args.series, vec![-5_000.0, 2_000.0, 3_000.0]);
    }

    #[test]
    fn test_no_numbers() {
        let args = HandlerArgs::parse("explain the cost of capital");
        assert!(args.named.is_empty());
        assert!(args.numbers.is_empty());
        assert_eq!(args.param_count(), 0);
    }
}
