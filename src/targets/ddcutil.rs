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

use std::io;
use std::process::Command;

use serde_json::json;
use thiserror::Error;

use crate::logger;
use crate::targets::DisplayTarget;

/// VCP feature code for luminance on DDC/CI monitors
const VCP_BRIGHTNESS: &str = "0x10";

#[derive(Error, Debug)]
pub enum DdcError {
    #[error("ddcutil failed to run: {0}")]
    Io(#[from] io::Error),
    #[error("ddcutil exited with status {0}")]
    Status(i32),
    #[error("unexpected ddcutil output: {0}")]
    Parse(String),
}

/// External monitor controlled over DDC/CI through the `ddcutil` binary.
pub struct DdcutilTarget {
    name: String,
    path: String,
    bus: String,
    enabled: bool,
    brightness: Option<u8>,
}

impl DdcutilTarget {
    pub fn new(name: String, bus: String) -> Self {
        let path = format!("/dev/i2c-{}", bus);
        Self {
            name,
            path,
            bus,
            enabled: true,
            brightness: None,
        }
    }

    fn read_brightness(&mut self) {
        match command(&["--bus", &self.bus, "getvcp", VCP_BRIGHTNESS]) {
            Ok(output) => match parse_vcp_value(&output) {
                Ok(value) => self.brightness = Some(value),
                Err(err) => {
                    self.brightness = None;
                    eprintln!("luxd: ddcutil getvcp parse failed for {}: {}", self.name, err);
                }
            },
            Err(err) => {
                self.brightness = None;
                eprintln!("luxd: ddcutil getvcp failed for {}: {}", self.name, err);
            }
        }
    }
}

fn command(args: &[&str]) -> Result<String, DdcError> {
    let output = Command::new("ddcutil").arg("--brief").args(args).output()?;
    if !output.status.success() {
        return Err(DdcError::Status(output.status.code().unwrap_or(-1)));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Enumerate DDC/CI capable monitors via `ddcutil detect`.
pub fn detect() -> Vec<Box<dyn DisplayTarget>> {
    let output = match command(&["detect"]) {
        Ok(output) => output,
        Err(err) => {
            eprintln!("luxd: ddcutil detect failed: {}", err);
            return Vec::new();
        }
    };
    parse_detect(&output)
        .into_iter()
        .map(|t| Box::new(t) as Box<dyn DisplayTarget>)
        .collect()
}

/// Parse `ddcutil --brief detect` output: unindented lines open or close a
/// display stanza, indented lines carry the I2C bus and monitor id.
pub fn parse_detect(output: &str) -> Vec<DdcutilTarget> {
    let mut found = Vec::new();
    let mut current_valid = false;
    let mut bus: Option<String> = None;
    let mut name: Option<String> = None;

    for line in output.lines() {
        if line.is_empty() {
            // stanza separator, keep state
        } else if !line.starts_with(char::is_whitespace) {
            current_valid = line.starts_with("Display");
            if !current_valid {
                bus = None;
                name = None;
            }
        } else if current_valid {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("I2C bus:") {
                bus = rest
                    .split("/dev/i2c-")
                    .nth(1)
                    .map(|s| s.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("Monitor:") {
                name = Some(rest.trim().to_string());
            }
        }

        if let (Some(b), Some(n)) = (&bus, &name) {
            found.push(DdcutilTarget::new(n.clone(), b.clone()));
            bus = None;
            name = None;
        }
    }

    found
}

/// `getvcp --brief` prints `VCP <feature> C <current> <max>`; the current
/// value is the fourth field.
fn parse_vcp_value(output: &str) -> Result<u8, DdcError> {
    output
        .split_whitespace()
        .nth(3)
        .and_then(|v| v.parse::<u8>().ok())
        .ok_or_else(|| DdcError::Parse(output.to_string()))
}

impl DisplayTarget for DdcutilTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn get_brightness(&mut self) -> Option<u8> {
        if !self.enabled {
            return None;
        }
        if self.brightness.is_none() {
            self.read_brightness();
        }
        self.brightness
    }

    fn set_brightness(&mut self, brightness: u8) {
        if Some(brightness) == self.brightness {
            return;
        }
        let value = brightness.to_string();
        match command(&["--bus", &self.bus, "setvcp", VCP_BRIGHTNESS, &value]) {
            Ok(_) => {
                self.brightness = Some(brightness);
                logger::log_event(
                    "ddcutil_write",
                    json!({ "monitor": self.name, "bus": self.bus, "percent": brightness }),
                );
            }
            Err(err) => {
                eprintln!("luxd: ddcutil setvcp failed for {}: {}", self.name, err);
            }
        }
    }
}
