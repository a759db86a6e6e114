//! Closed-form valuation formulas.
//!
//! Rates are fractions (0.05 for 5%). Input checks that depend on the
//! caller's arguments return [`HandlerError::validation`]; a result that is
//! not a finite number returns [`HandlerError::execution`].

use fincounsel_domain::HandlerError;

fn finite(value: f64, what: &str) -> Result<f64, HandlerError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(HandlerError::execution(format!(
            "{} is not a finite number; check very large rates or periods",
            what
        )))
    }
}

fn positive(value: f64, name: &str) -> Result<(), HandlerError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(HandlerError::validation(format!("{} must be positive", name)))
    }
}

fn non_negative(value: f64, name: &str) -> Result<(), HandlerError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(HandlerError::validation(format!("{} cannot be negative", name)))
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Present value of a fixed-coupon bond.
pub fn bond_present_value(
    face: f64,
    coupon_rate: f64,
    yield_rate: f64,
    years: f64,
    frequency: u32,
) -> Result<f64, HandlerError> {
    positive(face, "face value")?;
    non_negative(coupon_rate, "coupon rate")?;
    non_negative(yield_rate, "discount rate")?;
    positive(years, "years to maturity")?;
    if frequency == 0 {
        return Err(HandlerError::validation("coupon frequency must be positive"));
    }

    let periods = (years * f64::from(frequency)).round();
    let period_rate = yield_rate / f64::from(frequency);
    let coupon = face * coupon_rate / f64::from(frequency);

    let coupons = if period_rate == 0.0 {
        coupon * periods
    } else {
        coupon * (1.0 - (1.0 + period_rate).powf(-periods)) / period_rate
    };
    let principal = face / (1.0 + period_rate).powf(periods);

    finite(coupons + principal, "bond value")
}

/// Net present value of an initial outlay followed by yearly cash flows.
///
/// The outlay is treated as negative whatever its written sign; the first
/// flow is discounted one period.
pub fn net_present_value(rate: f64, investment: f64, flows: &[f64]) -> Result<f64, HandlerError> {
    non_negative(rate, "discount rate")?;
    positive(investment.abs(), "initial investment")?;
    if flows.is_empty() {
        return Err(HandlerError::validation(
            "at least one future cash flow is required",
        ));
    }

    let discounted: f64 = flows
        .iter()
        .zip(1..)
        .map(|(flow, t)| flow / (1.0 + rate).powi(t))
        .sum();

    finite(discounted - investment.abs(), "NPV")
}

/// Weighted average cost of capital, as a fraction.
///
/// Zero debt and zero equity gives zero.
pub fn weighted_average_cost_of_capital(
    cost_of_equity: f64,
    cost_of_debt: f64,
    equity: f64,
    debt: f64,
    tax_rate: f64,
) -> Result<f64, HandlerError> {
    non_negative(equity, "equity value")?;
    non_negative(debt, "debt value")?;
    if !(0.0..=1.0).contains(&tax_rate) {
        return Err(HandlerError::validation("tax rate must be between 0% and 100%"));
    }

    let total = equity + debt;
    if total == 0.0 {
        return Ok(0.0);
    }

    finite(
        equity / total * cost_of_equity + debt / total * cost_of_debt * (1.0 - tax_rate),
        "WACC",
    )
}

/// CAPM cost of equity, as a fraction.
///
/// Zero and negative betas are valid (hedging assets, inverse funds).
pub fn capm_cost_of_equity(risk_free: f64, beta: f64, market_return: f64) -> Result<f64, HandlerError> {
    finite(beta, "beta")?;
    finite(risk_free + beta * (market_return - risk_free), "cost of equity")
}

pub fn sharpe_ratio(portfolio_return: f64, risk_free: f64, std_dev: f64) -> Result<f64, HandlerError> {
    positive(std_dev, "portfolio standard deviation")?;
    finite((portfolio_return - risk_free) / std_dev, "Sharpe ratio")
}

/// Gordon growth (constant dividend growth) share value.
pub fn gordon_growth_value(next_dividend: f64, required_return: f64, growth: f64) -> Result<f64, HandlerError> {
    positive(next_dividend, "next dividend (D1)")?;
    positive(required_return, "required return (Ke)")?;
    if required_return <= growth {
        return Err(HandlerError::execution(
            "required return (Ke) must be strictly greater than the growth rate (g)",
        ));
    }
    finite(next_dividend / (required_return - growth), "share value")
}

/// Black-Scholes price of a European call, floored at zero.
pub fn black_scholes_call(
    spot: f64,
    strike: f64,
    years: f64,
    rate: f64,
    volatility: f64,
) -> Result<f64, HandlerError> {
    positive(spot, "spot price (S)")?;
    positive(strike, "strike price (K)")?;
    positive(years, "time to expiry (T)")?;
    positive(volatility, "volatility (sigma)")?;

    let spread = volatility * years.sqrt();
    let d1 = ((spot / strike).ln() + (rate + 0.5 * volatility * volatility) * years) / spread;
    let d2 = d1 - spread;
    let price = spot * normal_cdf(d1) - strike * (-rate * years).exp() * normal_cdf(d2);

    finite(price.max(0.0), "option price")
}

/// Standard normal CDF via the Abramowitz-Stegun erf approximation (|error| < 1.5e-7).
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    const A: [f64; 5] = [
        0.254829592,
        -0.284496736,
        1.421413741,
        -1.453152027,
        1.061405429,
    ];
    const P: f64 = 0.3275911;

    let sign = x.signum();
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = A.iter().rev().fold(0.0, |acc, a| acc * t + a) * t;
    sign * (1.0 - poly * (-x * x).exp())
}
