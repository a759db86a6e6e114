//! Output formatter trait

use fincounsel_application::TurnReply;
use fincounsel_domain::OutputFormat;

/// Trait for formatting turn replies
pub trait OutputFormatter {
    /// Answer text with sources, and the trace when enabled
    fn format_text(&self, reply: &TurnReply) -> String;

    /// The whole reply as JSON
    fn format_json(&self, reply: &TurnReply) -> String;

    fn render(&self, reply: &TurnReply, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => self.format_text(reply),
            OutputFormat::Json => self.format_json(reply),
        }
    }
}
