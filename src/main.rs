/*
 * This file is part of Luxd.
 *
 * Copyright (C) 2025 Luxd contributors
 *
 * Luxd is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Luxd is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Luxd. If not, see <https://www.gnu.org/licenses/>.
 */

use luxd::config::Config;
use luxd::logger;
use luxd::service;
use luxd::sources::{iio, manual, SourceRegistry};
use luxd::system;
use luxd::targets::{backlight, ddcutil, TargetRegistry};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // Optional event logging to /var/log/luxd/events.jsonl
    let logging_enabled = args.iter().any(|a| a == "--logging");
    if logging_enabled {
        logger::init_logging();
        logger::log_event("startup", serde_json::json!({ "args": args }));
    }

    // Backlight sysfs writes and raw i2c access usually need privileges;
    // keep going, individual writes degrade to logged failures
    if unsafe { libc::geteuid() } != 0 {
        eprintln!("luxd: not running as root; backlight and DDC/CI writes may fail");
    }

    let cfg = Config::load();

    // Auto-detect and load sensor modules
    system::load_sensor_modules();

    // `luxd --list` prints discovered backends and exits
    if args.iter().any(|a| a == "--list") {
        return list_backends();
    }

    service::run_service(cfg)
}

fn list_backends() -> anyhow::Result<()> {
    let mut sources = SourceRegistry::new();
    sources.add_source_type(iio::detect());
    sources.add_source_type(manual::detect());

    let mut targets = TargetRegistry::new();
    targets.add_target_type(ddcutil::detect());
    targets.add_target_type(backlight::detect());

    println!("sensors:");
    for (uid, source) in sources.iter() {
        println!("  [{}] {} ({})", uid, source.name(), source.path());
    }
    println!("displays:");
    for (uid, target) in targets.iter() {
        println!("  [{}] {} ({})", uid, target.name(), target.path());
    }
    Ok(())
}
