//! OBD-II Capture Tool
//!
//! Connects to an ELM327 adapter and prints timestamped snapshots of every
//! supported parameter, followed by any stored trouble codes.
//!
//! Usage:
//!   cargo run --example obd_capture -- [OPTIONS]
//!
//! Options:
//!   --port PORT       Serial port (default: scan all ports)
//!   --config FILE     JSON session config
//!   --count N         Number of snapshots (default: 1)
//!   --interval MS     Delay between snapshots in ms (default: 1000)
//!   --demo            Use the simulated adapter instead of hardware

use elmscan_core::prelude::*;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut port_name: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut count = 1u32;
    let mut interval_ms = 1000u64;
    let mut demo = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                i += 1;
                port_name = args.get(i).cloned();
            }
            "--config" | "-c" => {
                i += 1;
                config_path = args.get(i).cloned();
            }
            "--count" | "-n" => {
                i += 1;
                count = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(1);
            }
            "--interval" | "-i" => {
                i += 1;
                interval_ms = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(1000);
            }
            "--demo" => demo = true,
            "--help" | "-h" => {
                println!("Usage: obd_capture [--port PORT] [--config FILE] [--count N] [--interval MS] [--demo]");
                return;
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => match SessionConfig::from_json_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SessionConfig::default(),
    };

    if demo {
        config.reset_settle_ms = 0;
        match ProtocolSession::open(DemoAdapter::new(), config) {
            Ok(session) => run(session, count, interval_ms),
            Err(e) => eprintln!("Demo adapter failed: {}", e),
        }
        return;
    }

    let connected = match port_name {
        Some(name) => {
            config.port_name = name;
            ProtocolSession::open_serial(config)
        }
        None => scan_and_connect(&config),
    };

    match connected {
        Ok(session) => run(session, count, interval_ms),
        Err(e) => {
            eprintln!("Could not connect: {}", e);
            std::process::exit(1);
        }
    }
}

fn run<T: Transport>(mut session: ProtocolSession<T>, count: u32, interval_ms: u64) {
    println!(
        "Adapter: {}",
        session.adapter_version().unwrap_or("unknown")
    );

    for n in 0..count {
        if n > 0 {
            std::thread::sleep(Duration::from_millis(interval_ms));
        }
        match Capture::take(&mut session) {
            Ok(capture) => print!("{}", capture),
            Err(e) => {
                eprintln!("Capture failed: {}", e);
                break;
            }
        }
    }

    match session.read_dtcs() {
        Ok(codes) if codes.is_empty() => println!("No trouble codes"),
        Ok(codes) => {
            for code in codes {
                println!("{}", code);
            }
        }
        Err(e) => eprintln!("Reading trouble codes failed: {}", e),
    }

    if let Err(e) = session.close() {
        eprintln!("Close failed: {}", e);
    }
}
