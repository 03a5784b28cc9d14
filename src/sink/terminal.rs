//! The terminal sink (component H): renders every detected transfer to stdout.

use crate::ports::Sink;
use crate::types::{TransferEvent, TransferKind};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Colorized single-line human-readable format, the default on a TTY.
    Pretty,
    /// One JSON object per line, for machine consumption.
    Json,
}

impl LogFormat {
    /// Parse from the `--log-format` CLI value / config string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Writes every event to stdout, either as a colorized single line or as
/// compact JSON, one object per line.
#[derive(Debug)]
pub struct TerminalSink {
    format: LogFormat,
}

impl TerminalSink {
    /// Build a terminal sink rendering in the given format.
    #[must_use]
    pub const fn new(format: LogFormat) -> Self {
        Self { format }
    }

    fn render_pretty(event: &TransferEvent) -> String {
        let (color, kind_label) = match event.kind {
            TransferKind::Confirmed => (GREEN, "CONFIRMED"),
            TransferKind::Pending => (YELLOW, "PENDING"),
        };
        let block = event
            .block_number
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        let from = event.from_label.as_deref().unwrap_or(&event.from.to_hex()).to_string();
        let to = event.to_label.as_deref().unwrap_or(&event.to.to_hex()).to_string();

        format!(
            "{color}{BOLD}[{kind_label}]{RESET} {} ETH {from} -> {to} (block {block}, side={}, tx={})",
            event.value_eth(),
            event.watched_side,
            event.tx_hash,
        )
    }

    fn render_json(event: &TransferEvent) -> String {
        serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Sink for TerminalSink {
    fn emit(&self, event: &TransferEvent) {
        let line = match self.format {
            LogFormat::Pretty => Self::render_pretty(event),
            LogFormat::Json => Self::render_json(event),
        };
        println!("{line}");
    }
}
