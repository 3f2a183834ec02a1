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

use crate::sources::LuminanceSource;

/// Sensorless source reporting a constant 0 lx. With it active the
/// brightness is governed entirely by the controller offset, which turns
/// the offset adjustment into a direct brightness control.
pub struct ManualSource {
    enabled: bool,
}

impl ManualSource {
    pub fn new() -> Self {
        Self { enabled: true }
    }
}

impl Default for ManualSource {
    fn default() -> Self {
        Self::new()
    }
}

pub fn detect() -> Vec<Box<dyn LuminanceSource>> {
    vec![Box::new(ManualSource::new())]
}

impl LuminanceSource for ManualSource {
    fn name(&self) -> &str {
        "manual"
    }

    fn path(&self) -> &str {
        "manual"
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
        Some(0.0)
    }
}
