use chrono::{DateTime, Local};
use serde::Serialize;

/// One poll's worth of telemetry. Any field may be absent after a failed
/// register read; absence of torque or rpm makes the whole snapshot unusable
/// for cycle detection.
#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub current: Option<f64>,
    pub voltage: Option<f64>,
    pub torque_ratio: Option<f64>,
    pub rpm: Option<f64>,
    pub timestamp: DateTime<Local>,
}

impl Reading {
    /// Cycle detection needs both torque and speed; everything else is
    /// display-only and may be missing.
    pub fn is_valid(&self) -> bool {
        self.torque_ratio.is_some() && self.rpm.is_some()
    }

    pub fn summary(&self) -> String {
        fn fmt(v: Option<f64>) -> String {
            match v {
                Some(v) => format!("{:.2}", v),
                None => "--".to_string(),
            }
        }
        format!(
            "RPM: {}  Torque: {}  Voltage: {} V  Current: {} A",
            fmt(self.rpm),
            fmt(self.torque_ratio),
            fmt(self.voltage),
            fmt(self.current)
        )
    }
}
