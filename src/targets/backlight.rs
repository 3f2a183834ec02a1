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

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::logger;
use crate::targets::DisplayTarget;

pub const SYSFS_BACKLIGHT_PATH: &str = "/sys/class/backlight";

/// Internal panel backlight driven through `/sys/class/backlight`.
/// Brightness percentages are scaled to the device's raw range via
/// `max_brightness`.
pub struct BacklightTarget {
    name: String,
    path: String,
    dir: PathBuf,
    max_raw: u32,
    enabled: bool,
    brightness: Option<u8>,
}

pub fn detect() -> Vec<Box<dyn DisplayTarget>> {
    detect_under(Path::new(SYSFS_BACKLIGHT_PATH))
}

pub fn detect_under(root: &Path) -> Vec<Box<dyn DisplayTarget>> {
    let mut found: Vec<Box<dyn DisplayTarget>> = Vec::new();
    let Ok(entries) = fs::read_dir(root) else {
        return found;
    };

    for ent in entries.flatten() {
        let dir = ent.path();
        if !dir.join("brightness").is_file() {
            continue;
        }
        let Some(max_raw) = read_trimmed(dir.join("max_brightness"))
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|m| *m > 0)
        else {
            continue;
        };
        let name = dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("backlight?")
            .to_string();

        found.push(Box::new(BacklightTarget {
            name,
            path: dir.display().to_string(),
            dir,
            max_raw,
            enabled: true,
            brightness: None,
        }));
    }

    found.sort_by(|a, b| a.name().cmp(b.name()));
    found
}

impl BacklightTarget {
    fn percent_from_raw(&self, raw: u32) -> u8 {
        let max = u64::from(self.max_raw);
        ((u64::from(raw) * 100 + max / 2) / max).min(100) as u8
    }

    fn raw_from_percent(&self, percent: u8) -> u32 {
        (u64::from(percent) * u64::from(self.max_raw) / 100) as u32
    }

    fn read_percent(&self) -> Option<u8> {
        // actual_brightness reflects what the hardware settled on
        let raw = read_trimmed(self.dir.join("actual_brightness"))
            .or_else(|_| read_trimmed(self.dir.join("brightness")))
            .ok()?
            .parse::<u32>()
            .ok()?;
        Some(self.percent_from_raw(raw))
    }
}

impl DisplayTarget for BacklightTarget {
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
            self.brightness = self.read_percent();
        }
        self.brightness
    }

    fn set_brightness(&mut self, brightness: u8) {
        if Some(brightness) == self.brightness {
            return;
        }
        let raw = self.raw_from_percent(brightness);
        match fs::write(self.dir.join("brightness"), raw.to_string()) {
            Ok(()) => {
                self.brightness = Some(brightness);
                logger::log_event(
                    "backlight_write",
                    json!({ "device": self.name, "percent": brightness, "raw": raw }),
                );
            }
            Err(err) => {
                eprintln!("luxd: backlight write failed for {}: {}", self.name, err);
            }
        }
    }
}

fn read_trimmed<P: AsRef<Path>>(p: P) -> io::Result<String> {
    let mut s = String::new();
    fs::File::open(p)?.read_to_string(&mut s)?;
    Ok(s.trim().to_string())
}
