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

use crate::targets::DisplayTarget;

pub type GetBrightnessFn = Box<dyn FnMut() -> Option<u8>>;
pub type SetBrightnessFn = Box<dyn FnMut(u8)>;

/// Display target backed by a get/set closure pair. This is the attachment
/// point for session power-daemon glue (desktop brightness APIs) that lives
/// outside this crate.
///
/// Starts disabled: a session daemon often answers for a display another
/// backend already controls, so the user opts in explicitly.
pub struct CallbackTarget {
    name: String,
    path: String,
    enabled: bool,
    get: GetBrightnessFn,
    set: SetBrightnessFn,
    brightness: Option<u8>,
}

impl CallbackTarget {
    pub fn new(name: &str, path: &str, get: GetBrightnessFn, set: SetBrightnessFn) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            enabled: false,
            get,
            set,
            brightness: None,
        }
    }
}

impl DisplayTarget for CallbackTarget {
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
        // Live read; the daemon is the authority for its own display
        self.brightness = (self.get)();
        self.brightness
    }

    fn set_brightness(&mut self, brightness: u8) {
        if Some(brightness) == self.brightness {
            return;
        }
        (self.set)(brightness);
        self.brightness = Some(brightness);
    }
}
