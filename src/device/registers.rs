//! Protocol-fixed register map for the drive. Addresses, command codes and
//! scale factors come from the vendor register table and must not change at
//! runtime.

/// Output current, 0.1 A units.
pub const CURRENT_REG: u16 = 0x2104;
/// DC bus voltage, 0.1 V units.
pub const VOLTAGE_REG: u16 = 0x2106;
/// Torque ratio (load metric), 0.1 units.
pub const TORQUE_REG: u16 = 0x210B;
/// Spindle speed feedback.
pub const RPM_REG: u16 = 0x210C;
/// Run command register (write-only).
pub const CMD_REG: u16 = 0x2000;
/// Frequency setpoint register (write-only), raw units = Hz x 100.
pub const FREQ_SET_REG: u16 = 0x2001;

pub const CMD_START: u16 = 0x0012;
pub const CMD_STOP: u16 = 0x0001;

/// Divisor for current/voltage/torque registers.
pub const SCALE_FACTOR: f64 = 10.0;

/// Speed register counts per rpm. Encodes the drive's pulse-per-revolution
/// characteristic; telemetry files depend on this exact value.
pub const RPM_DIVISOR: f64 = 9.740550769;

/// Rated maximum output frequency in Hz.
pub const MAX_FREQ_HZ: f64 = 68.06;
/// Rated maximum in raw setpoint units (Hz x 100).
pub const MAX_FREQ_RAW: u16 = 6806;

/// How a raw register word becomes a physical value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    /// raw / SCALE_FACTOR
    Scaled,
    /// round(raw / RPM_DIVISOR, 2)
    Rpm,
}

#[derive(Debug, Clone, Copy)]
pub struct Register {
    pub name: &'static str,
    pub address: u16,
    pub conversion: Conversion,
}

/// The read-only telemetry registers, in the order a poll reads them.
pub static REGISTER_MAP: &[Register] = &[
    Register {
        name: "Current",
        address: CURRENT_REG,
        conversion: Conversion::Scaled,
    },
    Register {
        name: "Voltage",
        address: VOLTAGE_REG,
        conversion: Conversion::Scaled,
    },
    Register {
        name: "TorqueRatio",
        address: TORQUE_REG,
        conversion: Conversion::Scaled,
    },
    Register {
        name: "RPM",
        address: RPM_REG,
        conversion: Conversion::Rpm,
    },
];

impl Conversion {
    pub fn apply(self, raw: u16) -> f64 {
        match self {
            Conversion::Scaled => raw as f64 / SCALE_FACTOR,
            Conversion::Rpm => ((raw as f64 / RPM_DIVISOR) * 100.0).round() / 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_conversion() {
        assert_eq!(Conversion::Scaled.apply(235), 23.5);
        assert_eq!(Conversion::Scaled.apply(0), 0.0);
        assert_eq!(Conversion::Scaled.apply(15), 1.5);
    }

    #[test]
    fn test_rpm_conversion_rounds_to_two_decimals() {
        assert_eq!(Conversion::Rpm.apply(1948), 199.99);
        assert_eq!(Conversion::Rpm.apply(974), 99.99);
        assert_eq!(Conversion::Rpm.apply(0), 0.0);
    }

    #[test]
    fn test_max_freq_raw_matches_rated_hz() {
        assert_eq!(MAX_FREQ_RAW, (MAX_FREQ_HZ * 100.0) as u16);
    }
}
