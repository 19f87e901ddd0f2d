pub mod crc;
pub mod frame;
pub mod link;

pub use crc::crc16_modbus;
pub use link::{RegisterIo, SerialLink};
