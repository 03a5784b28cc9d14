//! Output sinks (component H).

mod terminal;

pub use terminal::{LogFormat, TerminalSink};
