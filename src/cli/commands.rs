use clap::{Arg, ArgAction, Command};

use crate::device::registers::{MAX_FREQ_HZ, MAX_FREQ_RAW};

pub fn build_cli() -> Command {
    Command::new("vfd_monitor")
        .version(crate::VERSION)
        .about("VFD cycle monitoring and logging over Modbus RTU")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .value_name("PORT")
                .help("Serial port (e.g. /dev/ttyCH343USB1)"),
        )
        .arg(
            Arg::new("baud")
                .long("baud")
                .short('b')
                .value_name("RATE")
                .help("Baud rate (default 9600)"),
        )
        .arg(
            Arg::new("slave")
                .long("slave")
                .value_name("ID")
                .help("Modbus slave id (default 1)"),
        )
        .arg(
            Arg::new("interval")
                .long("interval")
                .short('i')
                .value_name("MS")
                .help("Poll interval in milliseconds (default 200)"),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .help("Directory for cycle CSV files (default vfd_logs)"),
        )
        .subcommand(
            Command::new("monitor")
                .about("Poll telemetry, detect cycles and record them to CSV")
                .arg(
                    Arg::new("label")
                        .long("label")
                        .short('l')
                        .value_name("NAME")
                        .help("Session label; without it saves are skipped"),
                ),
        )
        .subcommand(
            Command::new("read")
                .about("Read one telemetry snapshot and print it")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the snapshot as JSON"),
                ),
        )
        .subcommand(Command::new("start").about("Send the run command to the drive"))
        .subcommand(Command::new("stop").about("Send the stop command to the drive"))
        .subcommand(
            Command::new("set-freq")
                .about("Set the speed as a percentage of the rated maximum")
                .arg(
                    Arg::new("percent")
                        .value_name("PERCENT")
                        .required(true)
                        .help("Speed in percent, 0-100"),
                ),
        )
        .subcommand(Command::new("ports").about("List available serial ports"))
        .subcommand(
            Command::new("init-config")
                .about("Write a default configuration file")
                .arg(
                    Arg::new("path")
                        .value_name("FILE")
                        .default_value("vfd_monitor.toml"),
                ),
        )
}

/// Convert a 0-100 % speed request into the raw Hz x 100 setpoint, clamped
/// to the rated maximum. The controller itself does not clamp.
pub fn percent_to_setpoint(percent: f64) -> u16 {
    let clamped = percent.clamp(0.0, 100.0);
    let raw = (clamped * MAX_FREQ_HZ) as u16;
    raw.min(MAX_FREQ_RAW)
}
