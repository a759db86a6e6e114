//! Usage guide returned by the help responder.

pub const HELP_GUIDE: &str = "Here are some examples of what you can ask me:

Calculations (one step):
- WACC: \"Calculate the WACC: Ke=12%, Kd=8%, E=60M, D=40M, tax=25%\"
- NPV: \"Calculate the NPV: investment 100000, flows [30k, 40k, 50k], rate 10%\"
- Bond: \"Calculate the bond price: face 1000, coupon 5%, years 10, ytm 6%\"
- CAPM: \"Compute the cost of equity with CAPM: risk free 3%, beta 1.2, market return 10%\"
- Sharpe: \"Calculate the Sharpe ratio: return 15%, risk free 4%, volatility 20%\"
- Gordon: \"Value a stock with Gordon growth: D1=$2.50, Ke=12%, g=4%\"
- Call: \"Calculate the call option price: S=100, K=105, T=0.5, r=5%, sigma=20%\"

Concepts (answered from the indexed study material, with sources):
- \"Explain the cost of capital\"
- \"What is the difference between Macaulay and modified duration?\"
- \"How does the CAPM relate beta to expected return?\"

I can explain ideas in my own words but I will not reproduce chapters, pages or long quotes.";
