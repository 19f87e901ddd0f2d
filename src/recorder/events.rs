use chrono::Local;
use std::fmt;
use std::path::PathBuf;

/// What the recorder has to say, as data rather than pre-formatted strings.
/// Presentation layers format these however they like; the recorder also
/// mirrors every event to the `log` facade.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    CycleStarted(u32),
    CycleEnded(u32),
    Saved(PathBuf),
    Warning(String),
}

impl fmt::Display for RecorderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecorderEvent::CycleStarted(n) => write!(f, "Cycle {} started", n),
            RecorderEvent::CycleEnded(n) => write!(f, "Cycle {} ended", n),
            RecorderEvent::Saved(path) => write!(f, "Data saved to {}", path.display()),
            RecorderEvent::Warning(msg) => write!(f, "{}", msg),
        }
    }
}

/// Observer supplied at recorder construction.
pub trait EventSink: Send {
    fn emit(&self, event: &RecorderEvent);
}

/// Discards everything; the `log` mirror is still active.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &RecorderEvent) {}
}

/// Prints timestamped lines to stdout, the way the operator log panel
/// displayed them.
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: &RecorderEvent) {
        println!("[{}] {}", Local::now().format("%H:%M:%S"), event);
    }
}
