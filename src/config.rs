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

use std::env;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::condition::ConditionExpr;
use crate::logger;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralSettings {
    pub default_sensor: usize,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    pub show_notifications: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            default_sensor: 0,
            tick_ms: default_tick_ms(),
            show_notifications: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrightnessSettings {
    #[serde(default = "default_increment")]
    pub increment: u8,
    #[serde(default = "default_margin")]
    pub margin: u8,
    #[serde(default = "default_slope")]
    pub slope: f64,
    pub base_value: f64,
}

impl Default for BrightnessSettings {
    fn default() -> Self {
        Self {
            increment: default_increment(),
            margin: default_margin(),
            slope: default_slope(),
            base_value: 0.0,
        }
    }
}

/// Connection parameters for an external MQTT bridge. The daemon never
/// opens the connection itself; the values are handed through to whatever
/// connector feeds a `FeedSource` / reads the applied brightness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MqttSettings {
    pub subscribe: bool,
    pub publish: bool,
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_topic")]
    pub topic: String,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            subscribe: false,
            publish: false,
            host: default_mqtt_host(),
            topic: default_mqtt_topic(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConditionSettings {
    pub enabled: bool,
    /// Condition expression of the form `key=value|key=value|...`
    pub max_brightness: String,
    #[serde(default = "default_forced_value")]
    pub forced_value: u8,
}

impl Default for ConditionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_brightness: String::new(),
            forced_value: default_forced_value(),
        }
    }
}

fn default_tick_ms() -> u64 { 1000 }
fn default_increment() -> u8 { 5 }
fn default_margin() -> u8 { 5 }
fn default_slope() -> f64 { 0.2 }
fn default_mqtt_host() -> String { "mqtt.example.com".to_string() }
fn default_mqtt_topic() -> String { "luxd/brightness".to_string() }
fn default_forced_value() -> u8 { 100 }

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub general: GeneralSettings,
    pub brightness: BrightnessSettings,
    pub mqtt: MqttSettings,
    pub conditions: ConditionSettings,
}

pub fn validate_settings(settings: &Settings) -> Result<(), String> {
    if !settings.brightness.slope.is_finite() {
        return Err("brightness slope must be finite".to_string());
    }
    if settings.brightness.increment == 0 || settings.brightness.increment > 100 {
        return Err("brightness increment out of range (1..=100)".to_string());
    }
    if settings.brightness.margin > 100 {
        return Err("brightness margin out of range (0..=100)".to_string());
    }
    if !(0.0..=100.0).contains(&settings.brightness.base_value) {
        return Err("brightness base_value out of range (0..=100)".to_string());
    }
    if settings.general.tick_ms < 100 || settings.general.tick_ms > 600_000 {
        return Err("tick_ms out of range (100..=600000)".to_string());
    }
    if settings.conditions.forced_value > 100 {
        return Err("conditions forced_value out of range (0..=100)".to_string());
    }
    ConditionExpr::parse(&settings.conditions.max_brightness)
        .map_err(|e| format!("invalid condition expression: {}", e))?;
    Ok(())
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("luxd").join("config.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("luxd")
            .join("config.json");
    }
    PathBuf::from("/etc/luxd/config.json")
}

/// Read priority: the per-user path first, then the system-wide file.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![config_path()];
    let system = PathBuf::from("/etc/luxd/config.json");
    if !paths.contains(&system) {
        paths.push(system);
    }
    paths
}

/// Typed settings plus the snapshot they were loaded from. `save()` writes
/// only what changed since the snapshot, merged over the on-disk document,
/// so keys managed outside this process survive a round trip.
#[derive(Debug)]
pub struct Config {
    pub settings: Settings,
    snapshot: Settings,
    path: PathBuf,
}

impl Config {
    /// Load the first readable configuration file, falling back to compiled
    /// defaults. A corrupt or invalid file is reported and ignored; the
    /// control loop must come up regardless.
    pub fn load() -> Self {
        let save_path = config_path();
        for path in config_paths() {
            if !path.is_file() {
                continue;
            }
            match Self::from_path(&path) {
                Ok(mut cfg) => {
                    cfg.path = save_path;
                    return cfg;
                }
                Err(err) => {
                    eprintln!("luxd: ignoring config {}: {}", path.display(), err);
                    logger::log_event(
                        "config_invalid",
                        json!({ "path": path.display().to_string(), "error": err }),
                    );
                    break;
                }
            }
        }
        Self::with_path(Settings::default(), save_path)
    }

    pub fn from_path(path: &Path) -> Result<Self, String> {
        let data = fs::read_to_string(path).map_err(|e| e.to_string())?;
        let settings: Settings =
            serde_json::from_str(&data).map_err(|e| format!("parse error: {}", e))?;
        validate_settings(&settings)?;
        Ok(Self::with_path(settings, path.to_path_buf()))
    }

    pub fn from_settings(settings: Settings) -> Self {
        Self::with_path(settings, config_path())
    }

    pub fn with_path(settings: Settings, path: PathBuf) -> Self {
        Self {
            snapshot: settings.clone(),
            settings,
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the delta between the live settings and the last-loaded
    /// snapshot. With no changes this writes nothing.
    pub fn save(&mut self) -> io::Result<()> {
        let current = serde_json::to_value(&self.settings).unwrap_or(Value::Null);
        let previous = serde_json::to_value(&self.snapshot).unwrap_or(Value::Null);
        let Some(delta) = value_delta(&previous, &current) else {
            return Ok(());
        };

        let mut on_disk = fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| serde_json::from_str::<Value>(&s).ok())
            .unwrap_or_else(|| json!({}));
        merge_value(&mut on_disk, &delta);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&on_disk).unwrap_or_else(|_| "{}".to_string());
        fs::write(&self.path, text)?;
        // Best-effort set permissions to 0644
        let perms = fs::Permissions::from_mode(0o644);
        let _ = fs::set_permissions(&self.path, perms);

        self.snapshot = self.settings.clone();
        Ok(())
    }
}

/// Recursive difference of `new` against `old`; `None` when nothing changed.
fn value_delta(old: &Value, new: &Value) -> Option<Value> {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let mut delta = serde_json::Map::new();
            for (key, new_value) in new_map {
                match old_map.get(key) {
                    Some(old_value) => {
                        if let Some(changed) = value_delta(old_value, new_value) {
                            delta.insert(key.clone(), changed);
                        }
                    }
                    None => {
                        delta.insert(key.clone(), new_value.clone());
                    }
                }
            }
            if delta.is_empty() {
                None
            } else {
                Some(Value::Object(delta))
            }
        }
        _ if old == new => None,
        _ => Some(new.clone()),
    }
}

fn merge_value(target: &mut Value, delta: &Value) {
    match (target, delta) {
        (Value::Object(target_map), Value::Object(delta_map)) => {
            for (key, value) in delta_map {
                merge_value(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target, delta) => *target = delta.clone(),
    }
}
