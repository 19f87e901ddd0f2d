use chrono::Local;
use log::{info, warn};

use super::reading::Reading;
use super::registers::{
    Conversion, Register, CMD_REG, CMD_START, CMD_STOP, CURRENT_REG, FREQ_SET_REG, RPM_REG,
    TORQUE_REG, VOLTAGE_REG,
};
use crate::modbus::RegisterIo;
use crate::utils::error::TransportError;

/// Semantic layer over the register transport: physical units in, physical
/// units out. One controller per drive; the link underneath is exclusive.
pub struct VfdController<L: RegisterIo> {
    link: L,
}

impl<L: RegisterIo> VfdController<L> {
    pub fn new(link: L) -> Self {
        Self { link }
    }

    pub fn into_link(self) -> L {
        self.link
    }

    /// Read one telemetry register and convert it. A transport failure is
    /// logged and degraded to `None`; the caller decides what absence means.
    fn read_scaled(&self, name: &str, register_addr: u16, conversion: Conversion) -> Option<f64> {
        match self.link.read_register(register_addr) {
            Ok(raw) => Some(conversion.apply(raw)),
            Err(e) => {
                warn!("⚠️ {} read failed (0x{:04x}): {}", name, register_addr, e);
                None
            }
        }
    }

    /// Read one entry of the register map.
    pub fn read(&self, register: &Register) -> Option<f64> {
        self.read_scaled(register.name, register.address, register.conversion)
    }

    pub fn read_current(&self) -> Option<f64> {
        self.read_scaled("Current", CURRENT_REG, Conversion::Scaled)
    }

    pub fn read_voltage(&self) -> Option<f64> {
        self.read_scaled("Voltage", VOLTAGE_REG, Conversion::Scaled)
    }

    pub fn read_torque_ratio(&self) -> Option<f64> {
        self.read_scaled("TorqueRatio", TORQUE_REG, Conversion::Scaled)
    }

    pub fn read_rpm(&self) -> Option<f64> {
        self.read_scaled("RPM", RPM_REG, Conversion::Rpm)
    }

    /// Four sequential register reads. Partial failure is allowed; each field
    /// is independently absent.
    pub fn read_all(&self) -> Reading {
        Reading {
            current: self.read_current(),
            voltage: self.read_voltage(),
            torque_ratio: self.read_torque_ratio(),
            rpm: self.read_rpm(),
            timestamp: Local::now(),
        }
    }

    /// Fire-and-forget run command. No state read-back is performed.
    pub fn start(&self) -> Result<(), TransportError> {
        self.link.write_register(CMD_REG, CMD_START)?;
        info!("▶️  VFD started");
        Ok(())
    }

    pub fn stop(&self) -> Result<(), TransportError> {
        self.link.write_register(CMD_REG, CMD_STOP)?;
        info!("⏹️  VFD stopped");
        Ok(())
    }

    /// Write the raw setpoint (Hz x 100). The controller does not clamp;
    /// callers clamp to `MAX_FREQ_RAW` before getting here.
    pub fn set_frequency(&self, raw: u16) -> Result<(), TransportError> {
        self.link.write_register(FREQ_SET_REG, raw)?;
        info!("🎚️  Frequency setpoint: {:.2} Hz", raw as f64 / 100.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::registers::{MAX_FREQ_RAW, SCALE_FACTOR};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory register file standing in for the serial link.
    struct MockLink {
        registers: Mutex<HashMap<u16, u16>>,
        failing: Vec<u16>,
        writes: Mutex<Vec<(u16, u16)>>,
    }

    impl MockLink {
        fn new(registers: &[(u16, u16)]) -> Self {
            Self {
                registers: Mutex::new(registers.iter().copied().collect()),
                failing: Vec::new(),
                writes: Mutex::new(Vec::new()),
            }
        }

        fn with_failing(mut self, addrs: &[u16]) -> Self {
            self.failing = addrs.to_vec();
            self
        }
    }

    impl RegisterIo for MockLink {
        fn read_register(&self, register_addr: u16) -> Result<u16, TransportError> {
            if self.failing.contains(&register_addr) {
                return Err(TransportError::Timeout);
            }
            self.registers
                .lock()
                .unwrap()
                .get(&register_addr)
                .copied()
                .ok_or(TransportError::Timeout)
        }

        fn write_register(&self, register_addr: u16, value: u16) -> Result<(), TransportError> {
            self.writes.lock().unwrap().push((register_addr, value));
            Ok(())
        }
    }

    #[test]
    fn test_scaled_reads_divide_by_ten() {
        let controller = VfdController::new(MockLink::new(&[
            (CURRENT_REG, 235),
            (VOLTAGE_REG, 3101),
            (TORQUE_REG, 15),
        ]));

        assert_eq!(controller.read_current(), Some(235.0 / SCALE_FACTOR));
        assert_eq!(controller.read_voltage(), Some(310.1));
        assert_eq!(controller.read_torque_ratio(), Some(1.5));
    }

    #[test]
    fn test_register_map_drives_a_full_poll() {
        use crate::device::registers::REGISTER_MAP;

        let controller = VfdController::new(MockLink::new(&[
            (CURRENT_REG, 235),
            (VOLTAGE_REG, 3101),
            (TORQUE_REG, 15),
            (RPM_REG, 974),
        ]));

        let values: Vec<Option<f64>> =
            REGISTER_MAP.iter().map(|r| controller.read(r)).collect();
        assert_eq!(
            values,
            vec![Some(23.5), Some(310.1), Some(1.5), Some(99.99)]
        );
    }

    #[test]
    fn test_rpm_read_rounds_to_two_decimals() {
        let controller = VfdController::new(MockLink::new(&[(RPM_REG, 1948)]));
        assert_eq!(controller.read_rpm(), Some(199.99));
    }

    #[test]
    fn test_read_all_with_partial_failure() {
        let link = MockLink::new(&[
            (CURRENT_REG, 100),
            (VOLTAGE_REG, 3100),
            (TORQUE_REG, 8),
            (RPM_REG, 974),
        ])
        .with_failing(&[VOLTAGE_REG]);

        let reading = VfdController::new(link).read_all();
        assert_eq!(reading.current, Some(10.0));
        assert_eq!(reading.voltage, None);
        assert_eq!(reading.torque_ratio, Some(0.8));
        assert_eq!(reading.rpm, Some(99.99));
        assert!(reading.is_valid());
    }

    #[test]
    fn test_read_all_invalid_when_torque_missing() {
        let link =
            MockLink::new(&[(CURRENT_REG, 100), (VOLTAGE_REG, 3100), (RPM_REG, 974)])
                .with_failing(&[TORQUE_REG]);

        let reading = VfdController::new(link).read_all();
        assert!(!reading.is_valid());
    }

    #[test]
    fn test_start_stop_write_command_codes() {
        let controller = VfdController::new(MockLink::new(&[]));
        controller.start().unwrap();
        controller.stop().unwrap();

        let link = controller.into_link();
        let writes = link.writes.lock().unwrap();
        assert_eq!(*writes, vec![(CMD_REG, CMD_START), (CMD_REG, CMD_STOP)]);
    }

    #[test]
    fn test_set_frequency_writes_raw_setpoint() {
        let controller = VfdController::new(MockLink::new(&[]));
        controller.set_frequency(MAX_FREQ_RAW).unwrap();

        let link = controller.into_link();
        let writes = link.writes.lock().unwrap();
        assert_eq!(*writes, vec![(FREQ_SET_REG, 6806)]);
    }
}
