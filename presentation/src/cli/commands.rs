//! CLI command definitions

use clap::{Parser, ValueEnum};
use fincounsel_domain::DrafterKind;
use std::path::PathBuf;

/// Output format for turn replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Answer and sources, colored for terminals
    Text,
    /// The full reply including the trace, as JSON
    Json,
}

impl From<OutputFormat> for fincounsel_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => fincounsel_domain::OutputFormat::Text,
            OutputFormat::Json => fincounsel_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for fincounsel
#[derive(Parser, Debug)]
#[command(name = "fincounsel")]
#[command(author, version, about = "Financial study assistant with guarded retrieval and calculators")]
#[command(long_about = r#"
fincounsel answers finance questions from your study material and runs
deterministic calculators (bond value, NPV, WACC, Gordon growth, CAPM,
Sharpe ratio, Black-Scholes).

Every message is routed to one of:
  - a calculator, when the message asks for a computation
  - the study-material search, for conceptual questions
  - the usage guide, for "help"

Answers from study material quote at most a few words verbatim and list
their sources. Requests for whole passages or tables are declined.

Configuration is loaded from (in priority order):
1. FINCOUNSEL_* environment variables (e.g. FINCOUNSEL_RETRIEVAL__K=8)
2. --config <path>            Explicit config file
3. ./fincounsel.toml          Project-level config (or ./.fincounsel.toml)
4. ~/.config/fincounsel/config.toml   Global config

Example:
  fincounsel "What is the difference between WACC and the cost of equity?"
  fincounsel "Calculate WACC: Ke=12%, Kd=8%, E=60M, D=40M, tax=25%"
  fincounsel --chat --session study-week-3
"#)]
pub struct Cli {
    /// The message to send (not required in chat mode)
    pub question: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Session to continue (a new id is generated when omitted)
    #[arg(short, long, value_name = "ID")]
    pub session: Option<String>,

    /// Clear the session's history and breaker before asking
    #[arg(long)]
    pub reset: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Answer drafter: extractive or llm
    #[arg(long, value_name = "KIND")]
    pub drafter: Option<DrafterKind>,

    /// Study-material corpus (JSON Lines) for the in-memory store
    #[arg(long, value_name = "PATH")]
    pub corpus: Option<PathBuf>,

    /// Show the routing trace after each answer
    #[arg(short, long)]
    pub trace: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
