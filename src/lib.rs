//! VFD Cycle Monitor
//!
//! Supervises a variable-frequency drive over a half-duplex Modbus-RTU
//! serial link, detects machining cycles from live torque/speed telemetry,
//! and records per-cycle measurement rows to CSV files. Three layers:
//! register transport ([`modbus`]), semantic device controller ([`device`]),
//! and the cycle-detection recorder ([`recorder`]).

pub mod cli;
pub mod config;
pub mod device;
pub mod modbus;
pub mod recorder;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, ParityConfig, SerialConfig};
pub use device::{Reading, VfdController};
pub use modbus::{RegisterIo, SerialLink};
pub use recorder::{CycleRecorder, EventSink, RecorderEvent};
pub use utils::error::{TransportError, VfdError};

pub const VERSION: &str = "0.1.0";
