//! Cycle detection and recording. A cycle is one engagement-to-disengagement
//! period of the tool, detected from torque/speed thresholds; rows accumulate
//! continuously and the buffer is flushed to the session's CSV file whenever
//! a cycle ends.

use chrono::Local;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use super::events::{EventSink, RecorderEvent};
use super::store::{Row, RowStore};
use crate::device::Reading;
use crate::utils::error::VfdError;

/// Torque ratio above which the tool is considered engaged.
const TORQUE_START_THRESHOLD: f64 = 1.0;
/// Minimum speed for a cycle start; rules out stall torque at rest.
const RPM_START_THRESHOLD: f64 = 200.0;

pub struct CycleRecorder {
    base_dir: PathBuf,
    label: Option<String>,
    cycle_count: u32,
    in_cycle: bool,
    store: RowStore,
    current_file: Option<PathBuf>,
    sink: Box<dyn EventSink>,
}

impl CycleRecorder {
    /// Creates the output directory if it is missing. The recorder runs for
    /// the life of the session; there is no terminal state.
    pub fn new<P: AsRef<Path>>(base_dir: P, sink: Box<dyn EventSink>) -> Result<Self, VfdError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(|e| {
            VfdError::Config(format!(
                "cannot create log directory {}: {}",
                base_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            base_dir,
            label: None,
            cycle_count: 0,
            in_cycle: false,
            store: RowStore::new(),
            current_file: None,
            sink,
        })
    }

    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    pub fn in_cycle(&self) -> bool {
        self.in_cycle
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    pub fn row_count(&self) -> usize {
        self.store.len()
    }

    fn publish(&self, event: RecorderEvent) {
        // Default diagnostic channel first, attached sink second.
        match &event {
            RecorderEvent::Warning(msg) => warn!("⚠️ {}", msg),
            other => info!("{}", other),
        }
        self.sink.emit(&event);
    }

    /// Set the session label. Clears the pinned output path so the next save
    /// opens a freshly named file; it does not rename an existing one.
    pub fn set_label(&mut self, name: &str) {
        self.label = Some(name.to_string());
        self.current_file = None;
        info!("🏷️  Session label set to: {}", name);
    }

    /// Evaluate one reading against the state machine and record it.
    ///
    /// Returns the "running" signal for the display layer. An invalid
    /// reading (torque or rpm absent) reports not-running but deliberately
    /// does not transition InCycle -> Idle and appends no row.
    pub fn observe(&mut self, reading: &Reading) -> bool {
        let (torque, rpm) = match (reading.torque_ratio, reading.rpm) {
            (Some(t), Some(r)) => (t, r),
            _ => {
                self.publish(RecorderEvent::Warning("Error reading VFD data".to_string()));
                return false;
            }
        };

        if !self.in_cycle && torque > TORQUE_START_THRESHOLD && rpm >= RPM_START_THRESHOLD {
            self.cycle_count += 1;
            self.in_cycle = true;
            self.publish(RecorderEvent::CycleStarted(self.cycle_count));
        } else if self.in_cycle && torque <= TORQUE_START_THRESHOLD {
            self.in_cycle = false;
            self.publish(RecorderEvent::CycleEnded(self.cycle_count));
            if let Err(e) = self.save() {
                error!("❌ Save after cycle end failed: {}", e);
                self.publish(RecorderEvent::Warning(format!("Save failed: {}", e)));
            }
        }

        // Rows are recorded continuously, idle gaps included, so the file
        // shows what happened between cycles under the current index.
        self.store.push(Row {
            cycle: self.cycle_count,
            time: reading.timestamp.format("%H:%M:%S").to_string(),
            torque,
            voltage: reading.voltage,
            current: reading.current,
            rpm,
        });

        self.in_cycle
    }

    fn generate_filename(&self, label: &str) -> PathBuf {
        let date_str = Local::now().format("%Y-%m-%d_%H-%M-%S");
        self.base_dir
            .join(format!("vfd_cycles_{}_{}.csv", date_str, label))
    }

    /// Flush the whole buffer to the pinned output file, overwriting it.
    ///
    /// With no label set this is a skipped save, not an error: the operator
    /// has not named the batch yet, so there is nowhere meaningful to put it.
    pub fn save(&mut self) -> Result<Option<PathBuf>, VfdError> {
        let label = match &self.label {
            Some(label) => label.clone(),
            None => {
                self.publish(RecorderEvent::Warning(
                    "No session label set. Skipping save.".to_string(),
                ));
                return Ok(None);
            }
        };

        // Path is pinned lazily, once, and survives until the label changes.
        let path = match &self.current_file {
            Some(path) => path.clone(),
            None => {
                let path = self.generate_filename(&label);
                self.current_file = Some(path.clone());
                path
            }
        };

        self.store
            .write_to(&path)
            .map_err(|source| VfdError::Storage {
                path: path.clone(),
                source,
            })?;

        self.publish(RecorderEvent::Saved(path.clone()));
        Ok(Some(path))
    }

    /// Zero the cycle counter and drop the buffered rows. The label and
    /// pinned output path are untouched.
    pub fn reset(&mut self) {
        self.cycle_count = 0;
        self.store.clear();
        info!("🔄 Cycle counter and row buffer reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::store::read_rows;
    use std::sync::{Arc, Mutex};

    struct CollectingSink(Arc<Mutex<Vec<RecorderEvent>>>);

    impl EventSink for CollectingSink {
        fn emit(&self, event: &RecorderEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn recorder_in(
        dir: &Path,
    ) -> (CycleRecorder, Arc<Mutex<Vec<RecorderEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let recorder =
            CycleRecorder::new(dir, Box::new(CollectingSink(events.clone()))).unwrap();
        (recorder, events)
    }

    fn reading(torque: Option<f64>, rpm: Option<f64>) -> Reading {
        Reading {
            current: Some(2.3),
            voltage: Some(310.1),
            torque_ratio: torque,
            rpm,
            timestamp: Local::now(),
        }
    }

    #[test]
    fn test_single_cycle_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let (mut recorder, events) = recorder_in(dir.path());
        recorder.set_label("saw1");

        assert!(!recorder.observe(&reading(Some(0.5), Some(0.0))));
        assert!(recorder.observe(&reading(Some(1.5), Some(250.0))));
        assert!(recorder.observe(&reading(Some(1.5), Some(250.0))));
        assert!(!recorder.observe(&reading(Some(0.8), Some(250.0))));

        assert_eq!(recorder.cycle_count(), 1);
        assert_eq!(recorder.row_count(), 4);

        let events = events.lock().unwrap();
        let starts = events
            .iter()
            .filter(|e| matches!(e, RecorderEvent::CycleStarted(_)))
            .count();
        let ends = events
            .iter()
            .filter(|e| matches!(e, RecorderEvent::CycleEnded(_)))
            .count();
        let saves = events
            .iter()
            .filter(|e| matches!(e, RecorderEvent::Saved(_)))
            .count();
        assert_eq!((starts, ends, saves), (1, 1, 1));
    }

    #[test]
    fn test_cycle_end_writes_full_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let (mut recorder, _) = recorder_in(dir.path());
        recorder.set_label("saw1");

        recorder.observe(&reading(Some(0.5), Some(0.0)));
        recorder.observe(&reading(Some(1.5), Some(250.0)));
        recorder.observe(&reading(Some(0.8), Some(250.0)));

        let path = recorder.current_file().unwrap().to_path_buf();
        let rows = read_rows(&path).unwrap();
        // Save happens before the ending row is appended, matching the
        // original log order; the idle lead-in is included.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cycle, 0);
        assert_eq!(rows[1].cycle, 1);
    }

    #[test]
    fn test_below_rpm_threshold_does_not_start_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let (mut recorder, _) = recorder_in(dir.path());

        assert!(!recorder.observe(&reading(Some(1.5), Some(199.99))));
        assert_eq!(recorder.cycle_count(), 0);
        // Row still recorded under cycle index 0
        assert_eq!(recorder.row_count(), 1);
    }

    #[test]
    fn test_save_without_label_is_skipped_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let (mut recorder, events) = recorder_in(dir.path());

        recorder.observe(&reading(Some(0.5), Some(0.0)));
        assert_eq!(recorder.save().unwrap(), None);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(events
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, RecorderEvent::Warning(_))));
    }

    #[test]
    fn test_invalid_reading_never_transitions_or_appends() {
        let dir = tempfile::tempdir().unwrap();
        let (mut recorder, events) = recorder_in(dir.path());
        recorder.set_label("saw1");

        recorder.observe(&reading(Some(1.5), Some(250.0)));
        assert!(recorder.in_cycle());
        let rows_before = recorder.row_count();

        // Not-running signal for the display, but no InCycle -> Idle
        assert!(!recorder.observe(&reading(None, Some(250.0))));
        assert!(recorder.in_cycle());
        assert_eq!(recorder.row_count(), rows_before);

        assert!(!recorder.observe(&reading(Some(1.5), None)));
        assert!(recorder.in_cycle());
        assert_eq!(recorder.row_count(), rows_before);

        let warnings = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, RecorderEvent::Warning(_)))
            .count();
        assert_eq!(warnings, 2);
    }

    #[test]
    fn test_pinned_path_is_stable_across_saves() {
        let dir = tempfile::tempdir().unwrap();
        let (mut recorder, _) = recorder_in(dir.path());
        recorder.set_label("saw1");

        recorder.observe(&reading(Some(0.5), Some(0.0)));
        let first = recorder.save().unwrap().unwrap();
        recorder.observe(&reading(Some(0.6), Some(0.0)));
        let second = recorder.save().unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(read_rows(&first).unwrap().len(), 2);
    }

    #[test]
    fn test_set_label_clears_pinned_path() {
        let dir = tempfile::tempdir().unwrap();
        let (mut recorder, _) = recorder_in(dir.path());
        recorder.set_label("saw1");

        recorder.observe(&reading(Some(0.5), Some(0.0)));
        let first = recorder.save().unwrap().unwrap();
        assert!(first
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_saw1.csv"));

        recorder.set_label("saw2");
        assert!(recorder.current_file().is_none());
        let second = recorder.save().unwrap().unwrap();
        assert_ne!(first, second);
        assert!(second
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_saw2.csv"));
    }

    #[test]
    fn test_reset_keeps_label_and_pinned_path() {
        let dir = tempfile::tempdir().unwrap();
        let (mut recorder, _) = recorder_in(dir.path());
        recorder.set_label("saw1");

        recorder.observe(&reading(Some(1.5), Some(250.0)));
        recorder.observe(&reading(Some(0.8), Some(250.0)));
        let pinned = recorder.current_file().unwrap().to_path_buf();

        recorder.reset();

        assert_eq!(recorder.cycle_count(), 0);
        assert_eq!(recorder.row_count(), 0);
        assert_eq!(recorder.label(), Some("saw1"));
        assert_eq!(recorder.current_file(), Some(pinned.as_path()));
    }

    #[test]
    fn test_cycle_count_is_monotonic_across_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let (mut recorder, _) = recorder_in(dir.path());
        recorder.set_label("saw1");

        for _ in 0..3 {
            recorder.observe(&reading(Some(1.5), Some(250.0)));
            recorder.observe(&reading(Some(0.5), Some(250.0)));
        }
        assert_eq!(recorder.cycle_count(), 3);
    }
}
