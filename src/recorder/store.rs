//! Append-only store for per-poll telemetry rows and its CSV round-trip.
//! The recorder owns one store exclusively; there is no shared table.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// One CSV row, one valid poll. Voltage and current may be absent even in a
/// row worth keeping; they serialize as empty fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(rename = "Cycle")]
    pub cycle: u32,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Torque")]
    pub torque: f64,
    #[serde(rename = "Voltage")]
    pub voltage: Option<f64>,
    #[serde(rename = "Current")]
    pub current: Option<f64>,
    #[serde(rename = "RPM")]
    pub rpm: f64,
}

#[derive(Default)]
pub struct RowStore {
    rows: Vec<Row>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Write the whole buffer, header first, truncating whatever was there.
    pub fn write_to(&self, path: &Path) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Read a cycle file back into rows, in file order.
pub fn read_rows(path: &Path) -> Result<Vec<Row>, csv::Error> {
    let mut reader = csv::Reader::from_path(path)?;
    reader.deserialize().collect()
}
