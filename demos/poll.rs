// SPDX-License-Identifier: MPL-2.0

//! Polling example.
//!
//! Loads (or creates) a config entry, polls the wallbox at the configured
//! interval and prints a few values after every refresh. Set `RUST_LOG` to
//! see what the library is doing.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example poll -- <host> <password> [config.json]
//! ```
//!
//! # Example
//!
//! ```bash
//! RUST_LOG=alfen_lib=debug cargo run --example poll -- 192.168.1.50 secret
//! ```

use std::env;
use std::sync::Arc;

use alfen_lib::config::{ConfigEntry, EntryData};
use alfen_lib::entity::{Entities, TransactionField};
use alfen_lib::{Coordinator, WallboxEvent};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <host> <password> [config.json]", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --example poll -- 192.168.1.50 secret");
        std::process::exit(1);
    }

    let host = &args[1];
    let password = &args[2];

    let entry = match args.get(3) {
        Some(path) if std::path::Path::new(path).exists() => ConfigEntry::load(path)?,
        Some(path) => {
            let entry = ConfigEntry::new(EntryData::new(host, "wallbox", password));
            entry.save(path)?;
            entry
        }
        None => ConfigEntry::new(EntryData::new(host, "wallbox", password)),
    };

    let coordinator = Arc::new(Coordinator::from_entry(&entry)?);
    coordinator.setup().await?;

    let device = coordinator.device();
    let info = device.info();
    println!("=== {} ===", device.name());
    println!("Model:    {}", info.model);
    println!("Firmware: {}", info.firmware_version);
    println!("Sockets:  {}", device.number_of_sockets());
    for license in device.licenses().iter() {
        println!("License:  {}", license.name());
    }
    println!();

    let entities = Entities::new(&coordinator);
    let mut events = coordinator.subscribe();
    let handle = coordinator.spawn();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(WallboxEvent::Refreshed { property_count, .. }) => {
                    println!("Refreshed {property_count} properties");
                    for switch in &entities.switches {
                        if switch.available() {
                            println!("  {:<45} {}", switch.name(), if switch.is_on() { "on" } else { "off" });
                        }
                    }
                    for sensor in entities.sensors.iter().filter(|s| s.field() == TransactionField::ChargedKwh) {
                        if let Some(value) = sensor.value() {
                            println!("  {:<45} {value} kWh", sensor.name());
                        }
                    }
                }
                Ok(WallboxEvent::UpdateFailed { error, .. }) => println!("Update failed: {error}"),
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Event stream closed: {e}");
                    break;
                }
            },
        }
    }

    handle.shutdown().await;
    coordinator.unload().await?;
    Ok(())
}
