//! Built-in financial calculators.
//!
//! [`FinancialCalculators`] implements the
//! [`SpecialistHandler`](fincounsel_application::SpecialistHandler) port for
//! every [`HandlerDomain`]. Arguments arrive as [`HandlerArgs`] extracted by
//! the router; rates may be written as `5%`, `5` or `0.05`.

pub mod formulas;

use async_trait::async_trait;
use fincounsel_application::SpecialistHandler;
use fincounsel_domain::{
    ArgValue, HandlerArgs, HandlerDomain, HandlerError, HandlerOutput, HandlerRequest,
};
use formulas::round_to;
use tracing::{debug, info};

/// One calculation a domain can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calculation {
    BondValue,
    Npv,
    Wacc,
    GordonGrowth,
    Capm,
    Sharpe,
    BlackScholesCall,
}

impl Calculation {
    pub const ALL: [Calculation; 7] = [
        Calculation::BondValue,
        Calculation::Npv,
        Calculation::Wacc,
        Calculation::GordonGrowth,
        Calculation::Capm,
        Calculation::Sharpe,
        Calculation::BlackScholesCall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Calculation::BondValue => "bond_value",
            Calculation::Npv => "npv",
            Calculation::Wacc => "wacc",
            Calculation::GordonGrowth => "gordon_growth",
            Calculation::Capm => "capm",
            Calculation::Sharpe => "sharpe",
            Calculation::BlackScholesCall => "black_scholes_call",
        }
    }

    pub fn domain(&self) -> HandlerDomain {
        match self {
            Calculation::BondValue => HandlerDomain::FixedIncome,
            Calculation::Npv | Calculation::Wacc => HandlerDomain::CorporateFinance,
            Calculation::GordonGrowth => HandlerDomain::Equity,
            Calculation::Capm | Calculation::Sharpe => HandlerDomain::Portfolio,
            Calculation::BlackScholesCall => HandlerDomain::Derivatives,
        }
    }

    /// Calculation to run when the router did not name one.
    fn infer(domain: HandlerDomain, args: &HandlerArgs) -> Self {
        match domain {
            HandlerDomain::FixedIncome => Calculation::BondValue,
            HandlerDomain::CorporateFinance if args.series.is_empty() => Calculation::Wacc,
            HandlerDomain::CorporateFinance => Calculation::Npv,
            HandlerDomain::Equity => Calculation::GordonGrowth,
            HandlerDomain::Portfolio if args.get(STD_DEV).is_some() => Calculation::Sharpe,
            HandlerDomain::Portfolio => Calculation::Capm,
            HandlerDomain::Derivatives => Calculation::BlackScholesCall,
        }
    }
}

impl std::str::FromStr for Calculation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Calculation::ALL
            .into_iter()
            .find(|c| c.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Invalid Calculation: {}", s))
    }
}

const RISK_FREE: &[&str] = &["rf", "risk free", "riskfree", "free", "libre"];
const STD_DEV: &[&str] = &["sd", "std", "stdev", "std dev", "deviation", "volatility", "sigma"];

/// Stateless calculator set covering every handler domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinancialCalculators;

impl FinancialCalculators {
    pub fn new() -> Self {
        Self
    }

    /// Run a calculation synchronously.
    pub fn calculate(
        &self,
        domain: HandlerDomain,
        request: &HandlerRequest,
    ) -> Result<HandlerOutput, HandlerError> {
        let calculation = match request.calculation.as_deref() {
            Some(name) => name
                .parse::<Calculation>()
                .map_err(HandlerError::validation)?,
            None => Calculation::infer(domain, &request.args),
        };
        if calculation.domain() != domain {
            return Err(HandlerError::validation(format!(
                "{} is not a {} calculation",
                calculation.as_str(),
                domain
            )));
        }

        debug!(calculation = calculation.as_str(), params = request.args.param_count(), "Running calculator");
        let args = &request.args;
        let output = match calculation {
            Calculation::BondValue => bond_value(args),
            Calculation::Npv => npv(args),
            Calculation::Wacc => wacc(args),
            Calculation::GordonGrowth => gordon_growth(args),
            Calculation::Capm => capm(args),
            Calculation::Sharpe => sharpe(args),
            Calculation::BlackScholesCall => black_scholes_call(args),
        }?;

        info!(calculation = calculation.as_str(), "Calculation completed");
        Ok(output)
    }
}

#[async_trait]
impl SpecialistHandler for FinancialCalculators {
    async fn invoke(
        &self,
        domain: HandlerDomain,
        request: &HandlerRequest,
    ) -> Result<HandlerOutput, HandlerError> {
        self.calculate(domain, request)
    }
}

fn require(args: &HandlerArgs, aliases: &[&str], label: &str) -> Result<ArgValue, HandlerError> {
    args.get(aliases)
        .ok_or_else(|| HandlerError::validation(format!("missing {}", label)))
}

fn rate(args: &HandlerArgs, aliases: &[&str], label: &str) -> Result<f64, HandlerError> {
    require(args, aliases, label).map(|v| v.as_rate())
}

fn amount(args: &HandlerArgs, aliases: &[&str], label: &str) -> Result<f64, HandlerError> {
    require(args, aliases, label).map(|v| v.value)
}

/// `1234567.891` → `1,234,567.89`
pub fn money(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, cents)
}

fn bond_value(args: &HandlerArgs) -> Result<HandlerOutput, HandlerError> {
    let face = amount(args, &["face", "nominal", "par", "principal"], "face value")?;
    let coupon = rate(args, &["coupon", "cupon"], "coupon rate")?;
    let ytm = rate(
        args,
        &["ytm", "yield", "discount rate", "market rate", "descuento", "discount"],
        "discount rate (YTM)",
    )?;
    let years = amount(args, &["years", "maturity", "n", "term", "anos", "plazo"], "years to maturity")?;
    let frequency = args
        .get(&["frequency", "freq", "payments", "m", "frecuencia"])
        .map(|v| v.value)
        .unwrap_or(1.0);
    if frequency < 1.0 || frequency.fract() != 0.0 {
        return Err(HandlerError::validation(
            "coupon frequency must be a whole number of payments per year",
        ));
    }

    let value = round_to(
        formulas::bond_present_value(face, coupon, ytm, years, frequency as u32)?,
        2,
    );
    Ok(HandlerOutput::new(
        HandlerDomain::FixedIncome,
        Calculation::BondValue.as_str(),
        format!(
            "The bond's present value is ${}: a face value of ${} paying a {:.2}% coupon, \
             discounted at {:.2}% over {} years.",
            money(value),
            money(face),
            coupon * 100.0,
            ytm * 100.0,
            years
        ),
    )
    .with_value("bond_value", value))
}

fn npv(args: &HandlerArgs) -> Result<HandlerOutput, HandlerError> {
    let rate = rate(args, &["rate", "discount", "wacc", "tasa", "r"], "discount rate")?;
    let investment = amount(
        args,
        &["investment", "outlay", "inversion", "cost", "i0"],
        "initial investment",
    )?;
    let value = round_to(formulas::net_present_value(rate, investment, &args.series)?, 2);

    let verdict = if value > 0.0 {
        "The project adds value at this rate."
    } else if value < 0.0 {
        "The project does not recover its cost at this rate."
    } else {
        "The project exactly breaks even at this rate."
    };
    Ok(HandlerOutput::new(
        HandlerDomain::CorporateFinance,
        Calculation::Npv.as_str(),
        format!(
            "The NPV is ${} at a {:.2}% discount rate over {} cash flows. {}",
            money(value),
            rate * 100.0,
            args.series.len(),
            verdict
        ),
    )
    .with_value("npv", value))
}

fn wacc(args: &HandlerArgs) -> Result<HandlerOutput, HandlerError> {
    let ke = rate(args, &["ke", "re", "cost of equity", "equity cost"], "cost of equity (Ke)")?;
    let kd = rate(args, &["kd", "rd", "cost of debt", "debt cost"], "cost of debt (Kd)")?;
    let equity = amount(args, &["e", "equity", "patrimonio"], "market value of equity (E)")?;
    let debt = amount(args, &["d", "debt", "deuda"], "market value of debt (D)")?;
    let tax = rate(args, &["tax", "t", "tc", "impuestos"], "tax rate")?;

    let pct = round_to(
        formulas::weighted_average_cost_of_capital(ke, kd, equity, debt, tax)? * 100.0,
        4,
    );
    Ok(HandlerOutput::new(
        HandlerDomain::CorporateFinance,
        Calculation::Wacc.as_str(),
        format!(
            "The WACC is {}%, weighting a {:.2}% cost of equity and a {:.2}% after-tax cost of debt.",
            pct,
            ke * 100.0,
            kd * (1.0 - tax) * 100.0
        ),
    )
    .with_value("wacc_pct", pct))
}

fn gordon_growth(args: &HandlerArgs) -> Result<HandlerOutput, HandlerError> {
    let d1 = amount(args, &["d1", "dividend", "dividendo"], "next dividend (D1)")?;
    let ke = rate(
        args,
        &["ke", "r", "required return", "discount", "cost of equity"],
        "required return (Ke)",
    )?;
    let g = rate(args, &["g", "growth", "crecimiento"], "growth rate (g)")?;

    let value = round_to(formulas::gordon_growth_value(d1, ke, g)?, 2);
    Ok(HandlerOutput::new(
        HandlerDomain::Equity,
        Calculation::GordonGrowth.as_str(),
        format!(
            "The intrinsic share value is ${}: a next dividend of ${} growing at {:.2}%, \
             discounted at {:.2}%.",
            money(value),
            money(d1),
            g * 100.0,
            ke * 100.0
        ),
    )
    .with_value("share_value", value))
}

fn capm(args: &HandlerArgs) -> Result<HandlerOutput, HandlerError> {
    let rf = rate(args, RISK_FREE, "risk-free rate")?;
    let beta = amount(args, &["beta", "b"], "beta")?;
    let rm = rate(
        args,
        &["rm", "market return", "market", "mercado"],
        "expected market return",
    )?;

    let pct = round_to(formulas::capm_cost_of_equity(rf, beta, rm)? * 100.0, 4);
    Ok(HandlerOutput::new(
        HandlerDomain::Portfolio,
        Calculation::Capm.as_str(),
        format!(
            "The CAPM cost of equity is {}%: a {:.2}% risk-free rate plus a beta of {} \
             times the {:.2}% market risk premium.",
            pct,
            rf * 100.0,
            beta,
            (rm - rf) * 100.0
        ),
    )
    .with_value("cost_of_equity_pct", pct))
}

fn sharpe(args: &HandlerArgs) -> Result<HandlerOutput, HandlerError> {
    let rp = rate(
        args,
        &["rp", "portfolio return", "return", "portfolio", "retorno"],
        "portfolio return",
    )?;
    let rf = rate(args, RISK_FREE, "risk-free rate")?;
    let sd = rate(args, STD_DEV, "portfolio standard deviation")?;

    let ratio = round_to(formulas::sharpe_ratio(rp, rf, sd)?, 4);
    Ok(HandlerOutput::new(
        HandlerDomain::Portfolio,
        Calculation::Sharpe.as_str(),
        format!(
            "The Sharpe ratio is {}: {:.2}% of excess return per {:.2}% of volatility.",
            ratio,
            (rp - rf) * 100.0,
            sd * 100.0
        ),
    )
    .with_value("sharpe_ratio", ratio))
}

fn black_scholes_call(args: &HandlerArgs) -> Result<HandlerOutput, HandlerError> {
    let spot = amount(args, &["s", "spot", "stock", "price", "s0"], "spot price (S)")?;
    let strike = amount(args, &["k", "strike", "exercise"], "strike price (K)")?;
    let years = amount(args, &["t", "time", "years", "maturity", "expiry"], "time to expiry (T)")?;
    let r = rate(args, &["r", "rf", "rate", "risk free"], "risk-free rate (r)")?;
    let sigma = rate(args, &["sigma", "vol", "volatility", "sd"], "volatility (sigma)")?;

    let price = round_to(formulas::black_scholes_call(spot, strike, years, r, sigma)?, 4);
    Ok(HandlerOutput::new(
        HandlerDomain::Derivatives,
        Calculation::BlackScholesCall.as_str(),
        format!(
            "The Black-Scholes value of the European call is ${}: S = {}, K = {}, T = {} years, \
             r = {:.2}%, sigma = {:.2}%.",
            price,
            spot,
            strike,
            years,
            r * 100.0,
            sigma * 100.0
        ),
    )
    .with_value("call_value", price))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fincounsel_domain::HandlerErrorKind;

    fn request(text: &str, calculation: &str) -> HandlerRequest {
        HandlerRequest::new(HandlerArgs::parse(text)).with_calculation(calculation)
    }

    #[tokio::test]
    async fn test_wacc_from_router_text() {
        let calc = FinancialCalculators::new();
        let output = calc
            .invoke(
                HandlerDomain::CorporateFinance,
                &request("Calculate WACC: Ke=12%, Kd=8%, E=60M, D=40M, tax=25%", "wacc"),
            )
            .await
            .unwrap();
        assert_eq!(output.calculation, "wacc");
        assert_eq!(output.values.get("wacc_pct"), Some(&9.6));
        assert!(output.summary.contains("9.6%"));
    }

    #[tokio::test]
    async fn test_npv_uses_series() {
        let calc = FinancialCalculators::new();
        let output = calc
            .invoke(
                HandlerDomain::CorporateFinance,
                &request(
                    "NPV with investment 100000, flows [30k, 40k, 50k], rate 10%",
                    "npv",
                ),
            )
            .await
            .unwrap();
        assert_eq!(output.values.get("npv"), Some(&-2103.68));
        assert!(output.summary.contains("-2,103.68"));
    }

    #[test]
    fn test_bond_defaults_to_annual_coupons() {
        let output = FinancialCalculators
            .calculate(
                HandlerDomain::FixedIncome,
                &request("bond value: face=1000, coupon=6%, ytm=5%, years=10", "bond_value"),
            )
            .unwrap();
        assert_eq!(output.values.get("bond_value"), Some(&1077.22));
    }

    #[test]
    fn test_gordon_and_capm() {
        let gordon = FinancialCalculators
            .calculate(
                HandlerDomain::Equity,
                &request("Gordon growth: D1=$2.50, Ke=12%, g=4%", "gordon_growth"),
            )
            .unwrap();
        assert_eq!(gordon.values.get("share_value"), Some(&31.25));

        let capm = FinancialCalculators
            .calculate(
                HandlerDomain::Portfolio,
                &request("CAPM with rf=3%, beta=1.2, rm=8%", "capm"),
            )
            .unwrap();
        assert_eq!(capm.values.get("cost_of_equity_pct"), Some(&9.0));
    }

    #[test]
    fn test_capm_accepts_negative_beta() {
        let capm = FinancialCalculators
            .calculate(
                HandlerDomain::Portfolio,
                &request("CAPM with rf=3%, beta=-0.5, rm=8%", "capm"),
            )
            .unwrap();
        assert_eq!(capm.values.get("cost_of_equity_pct"), Some(&0.5));
    }

    #[test]
    fn test_inferred_calculation() {
        let sharpe = FinancialCalculators
            .calculate(
                HandlerDomain::Portfolio,
                &HandlerRequest::new(HandlerArgs::parse("rp=12%, rf=3%, sd=15%")),
            )
            .unwrap();
        assert_eq!(sharpe.calculation, "sharpe");
        assert_eq!(sharpe.values.get("sharpe_ratio"), Some(&0.6));

        let option = FinancialCalculators
            .calculate(
                HandlerDomain::Derivatives,
                &HandlerRequest::new(HandlerArgs::parse("S=100, K=100, T=1, r=5%, sigma=20%")),
            )
            .unwrap();
        let price = option.values["call_value"];
        assert!((price - 10.4506).abs() < 1e-3);
    }

    #[test]
    fn test_missing_argument_is_validation() {
        let err = FinancialCalculators
            .calculate(
                HandlerDomain::CorporateFinance,
                &request("wacc with Ke=12%, Kd=8%", "wacc"),
            )
            .unwrap_err();
        assert_eq!(err.kind, HandlerErrorKind::Validation);
        assert!(err.message.contains("equity"));
    }

    #[test]
    fn test_growth_above_return_is_execution_failure() {
        let err = FinancialCalculators
            .calculate(
                HandlerDomain::Equity,
                &request("D1=2, Ke=5%, g=6%", "gordon_growth"),
            )
            .unwrap_err();
        assert_eq!(err.kind, HandlerErrorKind::Execution);
    }

    #[test]
    fn test_calculation_must_match_domain() {
        let err = FinancialCalculators
            .calculate(HandlerDomain::Equity, &request("rate 10%", "npv"))
            .unwrap_err();
        assert_eq!(err.kind, HandlerErrorKind::Validation);

        let err = FinancialCalculators
            .calculate(HandlerDomain::Equity, &request("rate 10%", "irr"))
            .unwrap_err();
        assert_eq!(err.kind, HandlerErrorKind::Validation);
    }

    #[test]
    fn test_money_grouping() {
        assert_eq!(money(1_234_567.891), "1,234,567.89");
        assert_eq!(money(-2103.68), "-2,103.68");
        assert_eq!(money(12.5), "12.50");
    }
}
