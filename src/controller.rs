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

use serde_json::json;

use crate::config::Config;
use crate::logger;

/// Recommends brightness values from ambient light readings.
///
/// The mapping is `slope * luminance + offset`, rounded and clamped to
/// 0..=100. The margin suppresses small corrections so the display does not
/// flicker around a threshold; the extremes and the very first reading
/// bypass it.
#[derive(Debug, Clone)]
pub struct Controller {
    slope: f64,
    offset: f64,
    margin: u8,
    increment: u8,
}

impl Controller {
    pub fn from_config(cfg: &Config) -> Self {
        let brightness = &cfg.settings.brightness;
        Self {
            slope: brightness.slope,
            offset: brightness.base_value,
            margin: brightness.margin,
            increment: brightness.increment,
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Map a luminance reading to a brightness percentage.
    pub fn calculate(&self, luminance: f64) -> u8 {
        let value = (self.slope * luminance + self.offset).round();
        value.clamp(0.0, 100.0) as u8
    }

    /// Whether moving from `old` to `new` is worth an actual write.
    /// Reaching 0 or 100, or having no previous value at all, always is.
    pub fn should_change(&self, old: Option<u8>, new: u8) -> bool {
        let Some(old) = old else { return true };
        if old == new {
            return false;
        }
        if new == 0 || new == 100 {
            return true;
        }
        old.abs_diff(new) >= self.margin
    }

    /// Compute a new brightness for the given reading, or `None` when the
    /// current value should be held.
    pub fn recommend(&self, luminance: f64, current: Option<u8>) -> Option<u8> {
        let recommended = self.calculate(luminance);
        if !self.should_change(current, recommended) {
            return None;
        }

        eprintln!(
            "luxd: brightness {:3}% -> {:3}% (luminance {:.1} lx)",
            current.unwrap_or(0),
            recommended,
            luminance,
        );
        logger::log_event(
            "brightness_change",
            json!({
                "from": current,
                "to": recommended,
                "luminance": luminance,
            }),
        );

        Some(recommended)
    }

    /// Replace the intercept and record it in the configuration for the
    /// next save.
    pub fn set_offset(&mut self, cfg: &mut Config, value: f64) {
        self.offset = value;
        cfg.settings.brightness.base_value = value;
    }

    pub fn increase_offset(&mut self, cfg: &mut Config) -> f64 {
        let value = (self.offset + f64::from(self.increment)).min(100.0);
        self.set_offset(cfg, value);
        self.offset
    }

    pub fn decrease_offset(&mut self, cfg: &mut Config) -> f64 {
        let value = (self.offset - f64::from(self.increment)).max(0.0);
        self.set_offset(cfg, value);
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn controller_with(slope: f64, base_value: f64, margin: u8, increment: u8) -> Controller {
        let mut settings = Settings::default();
        settings.brightness.slope = slope;
        settings.brightness.base_value = base_value;
        settings.brightness.margin = margin;
        settings.brightness.increment = increment;
        Controller::from_config(&Config::from_settings(settings))
    }

    #[test]
    fn test_calculate_clamps_low() {
        let controller = controller_with(-1.0, 0.0, 5, 5);
        assert_eq!(controller.calculate(500.0), 0);
    }

    #[test]
    fn test_calculate_clamps_high() {
        let controller = controller_with(0.2, 0.0, 5, 5);
        assert_eq!(controller.calculate(10_000.0), 100);
    }

    #[test]
    fn test_calculate_rounds() {
        let controller = controller_with(0.2, 0.0, 5, 5);
        assert_eq!(controller.calculate(10.0), 2);
        assert_eq!(controller.calculate(12.0), 2);
        assert_eq!(controller.calculate(13.0), 3);
    }

    #[test]
    fn test_calculate_applies_offset() {
        let controller = controller_with(0.2, 30.0, 5, 5);
        assert_eq!(controller.calculate(0.0), 30);
        assert_eq!(controller.calculate(100.0), 50);
    }

    #[test]
    fn test_should_change_equal_is_never_a_change() {
        let controller = controller_with(0.2, 0.0, 5, 5);
        for value in [0, 1, 50, 99, 100] {
            assert!(!controller.should_change(Some(value), value));
        }
    }

    #[test]
    fn test_should_change_without_previous_value() {
        let controller = controller_with(0.2, 0.0, 5, 5);
        for value in [0, 1, 50, 100] {
            assert!(controller.should_change(None, value));
        }
    }

    // Product decision: the extremes bypass the margin unconditionally so
    // the display always reaches full-off/full-on promptly.
    #[test]
    fn test_should_change_extremes_bypass_margin() {
        let controller = controller_with(0.2, 0.0, 50, 5);
        assert!(controller.should_change(Some(1), 0));
        assert!(controller.should_change(Some(99), 100));
        assert!(controller.should_change(Some(55), 100));
    }

    #[test]
    fn test_should_change_margin_boundary() {
        let five = controller_with(0.2, 0.0, 5, 5);
        assert!(five.should_change(Some(50), 55));
        let six = controller_with(0.2, 0.0, 6, 5);
        assert!(!six.should_change(Some(50), 55));
    }

    #[test]
    fn test_recommend_accepts_and_holds() {
        let controller = controller_with(0.2, 0.0, 5, 5);
        assert_eq!(controller.recommend(10.0, None), Some(2));
        assert_eq!(controller.recommend(10.0, Some(2)), None);
        assert_eq!(controller.recommend(15.0, Some(2)), None);
        assert_eq!(controller.recommend(500.0, Some(2)), Some(100));
    }

    #[test]
    fn test_set_offset_updates_config() {
        let mut cfg = Config::from_settings(Settings::default());
        let mut controller = Controller::from_config(&cfg);
        controller.set_offset(&mut cfg, 42.0);
        assert_eq!(controller.offset(), 42.0);
        assert_eq!(cfg.settings.brightness.base_value, 42.0);
    }

    #[test]
    fn test_offset_steps_clamp() {
        let mut cfg = Config::from_settings(Settings::default());
        let mut controller = controller_with(0.2, 98.0, 5, 5);
        assert_eq!(controller.increase_offset(&mut cfg), 100.0);
        assert_eq!(controller.increase_offset(&mut cfg), 100.0);

        let mut low = controller_with(0.2, 3.0, 5, 5);
        assert_eq!(low.decrease_offset(&mut cfg), 0.0);
        assert_eq!(low.decrease_offset(&mut cfg), 0.0);
    }

    #[test]
    fn test_offset_steps_use_increment() {
        let mut cfg = Config::from_settings(Settings::default());
        let mut controller = controller_with(0.2, 50.0, 5, 10);
        assert_eq!(controller.increase_offset(&mut cfg), 60.0);
        assert_eq!(controller.decrease_offset(&mut cfg), 50.0);
        assert_eq!(cfg.settings.brightness.base_value, 50.0);
    }
}
