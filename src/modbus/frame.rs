//! RTU frame assembly and response parsing for the two function codes the
//! drive speaks: 0x03 (read holding registers) and 0x06 (write single
//! register). Addresses and values are big-endian on the wire; the CRC-16
//! trailer is little-endian.

use super::crc::crc16_modbus;
use crate::utils::error::TransportError;

pub const FN_READ_HOLDING: u8 = 0x03;
pub const FN_WRITE_SINGLE: u8 = 0x06;

/// Response length for a single-register read: addr + fn + byte count +
/// 2 data bytes + 2 CRC bytes.
pub const READ_RESPONSE_LEN: usize = 7;
/// A write response echoes the 8-byte request.
pub const WRITE_RESPONSE_LEN: usize = 8;

/// Build a read-holding-registers request for exactly one register.
pub fn build_read_request(slave_id: u8, register_addr: u16) -> Vec<u8> {
    let mut frame = vec![slave_id, FN_READ_HOLDING];
    frame.extend_from_slice(&register_addr.to_be_bytes());
    frame.extend_from_slice(&1u16.to_be_bytes());

    let crc = crc16_modbus(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

/// Build a write-single-register request.
pub fn build_write_request(slave_id: u8, register_addr: u16, value: u16) -> Vec<u8> {
    let mut frame = vec![slave_id, FN_WRITE_SINGLE];
    frame.extend_from_slice(&register_addr.to_be_bytes());
    frame.extend_from_slice(&value.to_be_bytes());

    let crc = crc16_modbus(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

fn check_crc(frame: &[u8]) -> Result<(), TransportError> {
    let data_len = frame.len() - 2;
    let received = u16::from_le_bytes([frame[data_len], frame[data_len + 1]]);
    let calculated = crc16_modbus(&frame[..data_len]);

    if received != calculated {
        return Err(TransportError::Crc);
    }
    Ok(())
}

/// Extract the register word from a single-register read response.
pub fn parse_read_response(slave_id: u8, response: &[u8]) -> Result<u16, TransportError> {
    if response.len() < READ_RESPONSE_LEN {
        return Err(TransportError::Malformed(format!(
            "short read response: {} bytes",
            response.len()
        )));
    }

    check_crc(response)?;

    if response[0] != slave_id || response[1] != FN_READ_HOLDING {
        return Err(TransportError::Malformed(format!(
            "unexpected header: slave 0x{:02x}, function 0x{:02x}",
            response[0], response[1]
        )));
    }
    if response[2] != 2 {
        return Err(TransportError::Malformed(format!(
            "unexpected byte count: {}",
            response[2]
        )));
    }

    Ok(u16::from_be_bytes([response[3], response[4]]))
}

/// Verify the echo of a write-single-register request.
pub fn parse_write_response(
    slave_id: u8,
    register_addr: u16,
    value: u16,
    response: &[u8],
) -> Result<(), TransportError> {
    if response.len() < WRITE_RESPONSE_LEN {
        return Err(TransportError::Malformed(format!(
            "short write response: {} bytes",
            response.len()
        )));
    }

    check_crc(response)?;

    if response[0] != slave_id || response[1] != FN_WRITE_SINGLE {
        return Err(TransportError::Malformed(format!(
            "unexpected header: slave 0x{:02x}, function 0x{:02x}",
            response[0], response[1]
        )));
    }

    let echoed_addr = u16::from_be_bytes([response[2], response[3]]);
    let echoed_value = u16::from_be_bytes([response[4], response[5]]);
    if echoed_addr != register_addr || echoed_value != value {
        return Err(TransportError::Malformed(format!(
            "write echo mismatch: addr 0x{:04x}, value 0x{:04x}",
            echoed_addr, echoed_value
        )));
    }

    Ok(())
}
