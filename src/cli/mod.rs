pub mod commands;

pub use commands::{build_cli, percent_to_setpoint};
