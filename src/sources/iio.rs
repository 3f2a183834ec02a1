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

use crate::sources::LuminanceSource;

pub const SYSFS_IIO_PATH: &str = "/sys/bus/iio/devices";

// `_input` is already in lux; `_raw` needs the driver's scale factor
const ILLUMINANCE_FILES: [&str; 2] = ["in_illuminance_input", "in_illuminance_raw"];
const SCALE_FILE: &str = "in_illuminance_scale";
const NAME_FILE: &str = "name";

/// Ambient light sensor exposed by the kernel IIO subsystem.
pub struct IioSource {
    name: String,
    path: String,
    file: PathBuf,
    scale: f64,
    enabled: bool,
}

/// Enumerate every illuminance channel under `/sys/bus/iio/devices`.
pub fn detect() -> Vec<Box<dyn LuminanceSource>> {
    detect_under(Path::new(SYSFS_IIO_PATH))
}

pub fn detect_under(root: &Path) -> Vec<Box<dyn LuminanceSource>> {
    let mut found: Vec<Box<dyn LuminanceSource>> = Vec::new();
    let Ok(entries) = fs::read_dir(root) else {
        return found;
    };

    for ent in entries.flatten() {
        let dir = ent.path();
        if !dir.is_dir() {
            continue;
        }
        let Some(file) = ILLUMINANCE_FILES
            .iter()
            .map(|f| dir.join(f))
            .find(|p| p.is_file())
        else {
            continue;
        };

        let device = dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("iio?")
            .to_string();
        let name = read_trimmed(dir.join(NAME_FILE)).unwrap_or_else(|_| device.clone());
        let scale = if file.ends_with("in_illuminance_raw") {
            read_trimmed(dir.join(SCALE_FILE))
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .unwrap_or(1.0)
        } else {
            1.0
        };

        found.push(Box::new(IioSource {
            name,
            path: device,
            file,
            scale,
            enabled: true,
        }));
    }

    // Stable registration order regardless of readdir order
    found.sort_by(|a, b| a.path().cmp(b.path()));
    found
}

impl IioSource {
    fn read_value(&self) -> Option<f64> {
        let raw = read_trimmed(&self.file).ok()?;
        raw.parse::<f64>().ok().map(|v| v * self.scale)
    }
}

impl LuminanceSource for IioSource {
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

    fn is_ready(&self) -> bool {
        true
    }

    fn get_luminance(&mut self) -> Option<f64> {
        self.read_value()
    }
}

fn read_trimmed<P: AsRef<Path>>(p: P) -> io::Result<String> {
    let mut s = String::new();
    fs::File::open(p)?.read_to_string(&mut s)?;
    Ok(s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_device(root: &Path, dir: &str, name: &str, file: &str, value: &str) -> PathBuf {
        let device = root.join(dir);
        fs::create_dir_all(&device).unwrap();
        fs::write(device.join(NAME_FILE), format!("{}\n", name)).unwrap();
        fs::write(device.join(file), format!("{}\n", value)).unwrap();
        device
    }

    #[test]
    fn test_detect_empty_root() {
        let root = TempDir::new().unwrap();
        assert!(detect_under(root.path()).is_empty());
    }

    #[test]
    fn test_detect_missing_root() {
        let root = TempDir::new().unwrap();
        let gone = root.path().join("does-not-exist");
        assert!(detect_under(&gone).is_empty());
    }

    #[test]
    fn test_detect_skips_devices_without_illuminance() {
        let root = TempDir::new().unwrap();
        fake_device(root.path(), "iio:device0", "accel", "in_accel_x_raw", "5");
        assert!(detect_under(root.path()).is_empty());
    }

    #[test]
    fn test_detect_finds_sensor_and_reads() {
        let root = TempDir::new().unwrap();
        fake_device(root.path(), "iio:device0", "als0", "in_illuminance_input", "120");
        let mut found = detect_under(root.path());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "als0");
        assert_eq!(found[0].path(), "iio:device0");
        assert!(found[0].is_ready());
        assert_eq!(found[0].get_luminance(), Some(120.0));
    }

    #[test]
    fn test_raw_reading_applies_scale() {
        let root = TempDir::new().unwrap();
        let device = fake_device(root.path(), "iio:device1", "apds9960", "in_illuminance_raw", "400");
        fs::write(device.join(SCALE_FILE), "0.5\n").unwrap();
        let mut found = detect_under(root.path());
        assert_eq!(found[0].get_luminance(), Some(200.0));
    }

    #[test]
    fn test_raw_reading_without_scale_file() {
        let root = TempDir::new().unwrap();
        fake_device(root.path(), "iio:device1", "bh1750", "in_illuminance_raw", "42");
        let mut found = detect_under(root.path());
        assert_eq!(found[0].get_luminance(), Some(42.0));
    }

    #[test]
    fn test_unparsable_reading_is_none() {
        let root = TempDir::new().unwrap();
        let device = fake_device(root.path(), "iio:device0", "als0", "in_illuminance_input", "120");
        let mut found = detect_under(root.path());
        fs::write(device.join("in_illuminance_input"), "garbage\n").unwrap();
        assert_eq!(found[0].get_luminance(), None);
    }

    #[test]
    fn test_detection_order_is_stable() {
        let root = TempDir::new().unwrap();
        fake_device(root.path(), "iio:device1", "b", "in_illuminance_input", "1");
        fake_device(root.path(), "iio:device0", "a", "in_illuminance_input", "2");
        let found = detect_under(root.path());
        assert_eq!(found[0].path(), "iio:device0");
        assert_eq!(found[1].path(), "iio:device1");
    }
}
