use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::utils::error::VfdError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Connection settings
    pub serial: SerialConfig,

    // Monitoring settings
    pub poll_interval_ms: u64,

    // Output settings
    pub log_dir: String,
}

/// Line parameters for the RS-485 link, supplied once at startup. There is
/// no runtime reconfiguration; changing these means restarting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: ParityConfig,
    pub stop_bits: u8,
    pub timeout_ms: u64,
    pub slave_id: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParityConfig {
    None,
    Even,
    Odd,
}

impl fmt::Display for ParityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParityConfig::None => write!(f, "none"),
            ParityConfig::Even => write!(f, "even"),
            ParityConfig::Odd => write!(f, "odd"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            // The operator display refreshed at 200 ms; cycle detection
            // rides the same cadence.
            poll_interval_ms: 200,
            log_dir: "vfd_logs".to_string(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyCH343USB1".to_string(),
            baud_rate: 9600,
            data_bits: 8,
            parity: ParityConfig::None,
            stop_bits: 2,
            timeout_ms: 500,
            slave_id: 1,
        }
    }
}

impl SerialConfig {
    pub fn serial_parity(&self) -> serialport::Parity {
        match self.parity {
            ParityConfig::None => serialport::Parity::None,
            ParityConfig::Even => serialport::Parity::Even,
            ParityConfig::Odd => serialport::Parity::Odd,
        }
    }

    pub fn serial_data_bits(&self) -> serialport::DataBits {
        match self.data_bits {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            _ => serialport::DataBits::Eight,
        }
    }

    pub fn serial_stop_bits(&self) -> serialport::StopBits {
        match self.stop_bits {
            1 => serialport::StopBits::One,
            _ => serialport::StopBits::Two,
        }
    }
}

impl Config {
    /// Defaults, optionally layered with a TOML file, then CLI overrides.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, VfdError> {
        let mut config = match matches.get_one::<String>("config") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(port) = matches.get_one::<String>("port") {
            config.serial.port = port.clone();
        }
        if let Some(baud) = matches.get_one::<String>("baud") {
            config.serial.baud_rate = baud
                .parse()
                .map_err(|_| VfdError::Config(format!("invalid baud rate: {}", baud)))?;
        }
        if let Some(slave) = matches.get_one::<String>("slave") {
            config.serial.slave_id = slave
                .parse()
                .map_err(|_| VfdError::Config(format!("invalid slave id: {}", slave)))?;
        }
        if let Some(interval) = matches.get_one::<String>("interval") {
            config.poll_interval_ms = interval
                .parse()
                .map_err(|_| VfdError::Config(format!("invalid poll interval: {}", interval)))?;
        }
        if let Some(dir) = matches.get_one::<String>("log-dir") {
            config.log_dir = dir.clone();
        }

        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VfdError> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            VfdError::Config(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| VfdError::Config(format!("{}: {}", path.as_ref().display(), e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), VfdError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| VfdError::Config(format!("cannot create {}: {}", parent.display(), e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| VfdError::Config(format!("serialize config: {}", e)))?;
        std::fs::write(&path, content).map_err(|e| {
            VfdError::Config(format!("cannot write {}: {}", path.as_ref().display(), e))
        })?;
        Ok(())
    }
}
