//! Static bilingual finance term table.
//!
//! Used for query enrichment (English/Spanish expansion) and for acronym
//! first-mention rendering in synthesized answers.

/// One finance term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub acronym: Option<&'static str>,
    /// English full name
    pub english: &'static str,
    /// Spanish full name
    pub spanish: &'static str,
    /// Spanish acronym, when it differs
    pub spanish_acronym: Option<&'static str>,
}

const fn term(
    acronym: Option<&'static str>,
    english: &'static str,
    spanish: &'static str,
    spanish_acronym: Option<&'static str>,
) -> Term {
    Term {
        acronym,
        english,
        spanish,
        spanish_acronym,
    }
}

pub const TERMS: &[Term] = &[
    term(Some("WACC"), "Weighted Average Cost of Capital", "costo promedio ponderado de capital", None),
    term(Some("NPV"), "Net Present Value", "valor actual neto", Some("VAN")),
    term(Some("IRR"), "Internal Rate of Return", "tasa interna de retorno", Some("TIR")),
    term(Some("CAPM"), "Capital Asset Pricing Model", "modelo de valoración de activos de capital", None),
    term(Some("DDM"), "Dividend Discount Model", "modelo de descuento de dividendos", None),
    term(Some("YTM"), "Yield to Maturity", "rendimiento al vencimiento", None),
    term(Some("FCFF"), "Free Cash Flow to the Firm", "flujo de caja libre de la firma", None),
    term(Some("FCFE"), "Free Cash Flow to Equity", "flujo de caja libre del accionista", None),
    term(Some("EPS"), "Earnings Per Share", "utilidad por acción", Some("UPA")),
    term(Some("ROE"), "Return on Equity", "rentabilidad sobre el patrimonio", None),
    term(Some("ROA"), "Return on Assets", "rentabilidad sobre los activos", None),
    term(Some("EBITDA"), "Earnings Before Interest, Taxes, Depreciation and Amortization", "beneficio antes de intereses, impuestos, depreciación y amortización", None),
    term(Some("VaR"), "Value at Risk", "valor en riesgo", None),
    term(Some("ETF"), "Exchange-Traded Fund", "fondo cotizado", None),
    term(Some("GDP"), "Gross Domestic Product", "producto interno bruto", Some("PIB")),
    term(None, "cost of capital", "costo de capital", None),
    term(None, "cost of equity", "costo del patrimonio", None),
    term(None, "cost of debt", "costo de la deuda", None),
    term(None, "duration", "duración", None),
    term(None, "convexity", "convexidad", None),
    term(None, "bond", "bono", None),
    term(None, "coupon", "cupón", None),
    term(None, "dividend", "dividendo", None),
    term(None, "growth rate", "tasa de crecimiento", None),
    term(None, "discount rate", "tasa de descuento", None),
    term(None, "cash flow", "flujo de caja", None),
    term(None, "risk-free rate", "tasa libre de riesgo", None),
    term(None, "portfolio", "portafolio", None),
    term(None, "volatility", "volatilidad", None),
    term(None, "call option", "opción de compra", None),
    term(None, "put option", "opción de venta", None),
    term(None, "derivative", "derivado", None),
    term(None, "equity", "patrimonio", None),
];

/// Case-insensitive phrase search on word boundaries.
///
/// Returns the byte offset of the first match in `haystack`.
pub fn find_phrase(haystack: &str, phrase: &str) -> Option<usize> {
    if phrase.is_empty() {
        return None;
    }
    let lower_haystack = haystack.to_lowercase();
    let lower_phrase = phrase.to_lowercase();
    // Offsets are only reported when lowercasing kept byte lengths intact.
    if lower_haystack.len() != haystack.len() {
        return find_phrase_exact(haystack, phrase);
    }
    find_phrase_exact(&lower_haystack, &lower_phrase)
}

fn find_phrase_exact(haystack: &str, phrase: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(phrase) {
        let start = from + pos;
        let end = start + phrase.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(start);
        }
        from = start + phrase.chars().next().map(char::len_utf8).unwrap_or(1);
    }
    None
}
