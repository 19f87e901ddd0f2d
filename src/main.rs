use anyhow::Result;
use log::{error, info, warn};
use std::time::Duration;
use tokio::time::interval;

use vfd_monitor::cli::{build_cli, percent_to_setpoint};
use vfd_monitor::config::Config;
use vfd_monitor::device::VfdController;
use vfd_monitor::modbus::SerialLink;
use vfd_monitor::recorder::{ConsoleSink, CycleRecorder};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = build_cli().get_matches();

    // Commands that need no serial link
    if matches.subcommand_matches("ports").is_some() {
        return list_serial_ports();
    }
    if let Some(sub) = matches.subcommand_matches("init-config") {
        let path = sub
            .get_one::<String>("path")
            .map(String::as_str)
            .unwrap_or("vfd_monitor.toml");
        Config::default().save_to_file(path)?;
        info!("📝 Default configuration written to {}", path);
        return Ok(());
    }

    let config = Config::from_matches(&matches)?;

    let link = SerialLink::open(&config.serial)?;
    let controller = VfdController::new(link);

    match matches.subcommand() {
        Some(("start", _)) => {
            controller.start()?;
        }
        Some(("stop", _)) => {
            controller.stop()?;
        }
        Some(("set-freq", sub)) => {
            let percent: f64 = sub
                .get_one::<String>("percent")
                .map(String::as_str)
                .unwrap_or("0")
                .parse()?;
            let raw = percent_to_setpoint(percent);
            info!("🎚️  Requested {}% of rated speed", percent);
            controller.set_frequency(raw)?;
        }
        Some(("read", sub)) => {
            if sub.get_flag("json") {
                let reading = controller.read_all();
                println!("{}", serde_json::to_string_pretty(&reading)?);
            } else {
                for register in vfd_monitor::device::registers::REGISTER_MAP {
                    match controller.read(register) {
                        Some(value) => println!("{}: {:.2}", register.name, value),
                        None => println!("{}: read failed", register.name),
                    }
                }
            }
        }
        Some(("monitor", sub)) => {
            let label = sub.get_one::<String>("label").cloned();
            run_monitor(&config, &controller, label).await?;
        }
        // Plain invocation monitors with no label; saves warn until one is set
        None => {
            run_monitor(&config, &controller, None).await?;
        }
        _ => unreachable!(),
    }

    controller.into_link().close();
    Ok(())
}

/// The poll-evaluate-log loop: one `read_all` and one recorder evaluation
/// per tick, serialized so the half-duplex link never sees overlapping
/// operations. Ctrl+C flushes the buffer as the session boundary.
async fn run_monitor(
    config: &Config,
    controller: &VfdController<SerialLink>,
    label: Option<String>,
) -> Result<()> {
    let mut recorder = CycleRecorder::new(&config.log_dir, Box::new(ConsoleSink))?;
    match label {
        Some(name) => recorder.set_label(&name),
        None => warn!("⚠️ No session label set; cycle files will not be saved until one is"),
    }

    info!("🔄 Monitoring started");
    info!("   ⏱️  Poll interval: {} ms", config.poll_interval_ms);
    info!("   📁 Log directory: {}", config.log_dir);
    info!("   🛑 Press Ctrl+C to stop");

    let mut ticker = interval(Duration::from_millis(config.poll_interval_ms));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Stopping monitor...");
                break;
            }
            _ = ticker.tick() => {
                let reading = controller.read_all();
                let running = recorder.observe(&reading);
                info!(
                    "📊 {}  Cycle count: {}  [{}]",
                    reading.summary(),
                    recorder.cycle_count(),
                    if running { "cutting" } else { "idle" }
                );
            }
        }
    }

    // Session boundary: flush whatever accumulated. Without a label this is
    // a skipped save plus a warning, same as mid-session.
    if let Err(e) = recorder.save() {
        error!("❌ Final save failed: {}", e);
    }

    info!("📈 Session total: {} cycles, {} rows", recorder.cycle_count(), recorder.row_count());
    Ok(())
}

fn list_serial_ports() -> Result<()> {
    println!("📡 Available Serial Ports:");

    let ports = serialport::available_ports()?;
    if ports.is_empty() {
        println!("   ⚠️  No serial ports found");
        return Ok(());
    }

    for (index, port) in ports.iter().enumerate() {
        println!("   {}. {}", index + 1, port.port_name);
        if let serialport::SerialPortType::UsbPort(usb_info) = &port.port_type {
            if let Some(manufacturer) = &usb_info.manufacturer {
                println!("      📱 Manufacturer: {}", manufacturer);
            }
            if let Some(serial_number) = &usb_info.serial_number {
                println!("      🔢 Serial Number: {}", serial_number);
            }
        }
    }

    Ok(())
}
