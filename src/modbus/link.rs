use log::{debug, error, info};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::sync::Mutex;
use std::time::Duration;

use super::frame;
use crate::config::settings::SerialConfig;
use crate::utils::error::{TransportError, VfdError};

/// Register-level transport over one physical serial connection.
pub trait RegisterIo: Send {
    fn read_register(&self, register_addr: u16) -> Result<u16, TransportError>;
    fn write_register(&self, register_addr: u16, value: u16) -> Result<(), TransportError>;
}

/// Half-duplex RS-485 link to the drive.
///
/// The bus carries at most one register operation at a time. Callers must
/// serialize their own calls (one poll tick, one command at a time); an
/// overlapping call does not queue, it fails fast with
/// [`TransportError::Busy`] so interleaved traffic shows up in testing
/// instead of as garbled bytes on the wire.
pub struct SerialLink {
    port: Mutex<Box<dyn SerialPort>>,
    slave_id: u8,
}

impl SerialLink {
    /// Open the port with the configured line parameters. Fatal on failure;
    /// there is no reconnect once the process is up.
    pub fn open(config: &SerialConfig) -> Result<Self, VfdError> {
        info!("🔌 Connecting to RS485 port: {}", config.port);
        info!(
            "⚙️  Configuration: {} baud, {} data bits, {} parity, {} stop bits, {} ms timeout",
            config.baud_rate,
            config.data_bits,
            config.parity,
            config.stop_bits,
            config.timeout_ms
        );

        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(config.serial_data_bits())
            .parity(config.serial_parity())
            .stop_bits(config.serial_stop_bits())
            .timeout(Duration::from_millis(config.timeout_ms))
            .open()
            .map_err(|e| {
                error!("❌ Failed to open serial port {}: {}", config.port, e);
                VfdError::Connection(format!("failed to open {}: {}", config.port, e))
            })?;

        info!("✅ RS485 connection established");
        Ok(Self {
            port: Mutex::new(port),
            slave_id: config.slave_id,
        })
    }

    pub fn slave_id(&self) -> u8 {
        self.slave_id
    }

    /// Drop the port. The drive keeps whatever state it was last commanded
    /// into; closing the link does not stop it.
    pub fn close(self) {
        info!("✅ RS485 connection closed");
    }

    fn exchange(&self, request: &[u8], expected_len: usize) -> Result<Vec<u8>, TransportError> {
        let mut port = self.port.try_lock().map_err(|_| TransportError::Busy)?;

        debug!("📤 frame: {}", hex::encode(request));
        port.write_all(request)?;
        port.flush()?;

        // The serialport timeout bounds the whole read; a silent drive
        // surfaces as TimedOut here.
        let mut response = vec![0u8; expected_len];
        port.read_exact(&mut response)?;
        debug!("📥 frame: {}", hex::encode(&response));

        Ok(response)
    }
}

impl RegisterIo for SerialLink {
    fn read_register(&self, register_addr: u16) -> Result<u16, TransportError> {
        let request = frame::build_read_request(self.slave_id, register_addr);
        let response = self.exchange(&request, frame::READ_RESPONSE_LEN)?;
        frame::parse_read_response(self.slave_id, &response)
    }

    fn write_register(&self, register_addr: u16, value: u16) -> Result<(), TransportError> {
        let request = frame::build_write_request(self.slave_id, register_addr, value);
        let response = self.exchange(&request, frame::WRITE_RESPONSE_LEN)?;
        frame::parse_write_response(self.slave_id, register_addr, value, &response)
    }
}
