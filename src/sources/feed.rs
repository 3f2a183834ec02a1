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

use std::sync::{Arc, Mutex, MutexGuard};

use crate::sources::LuminanceSource;

/// One-slot mailbox source for push-based transports (MQTT subscriptions,
/// bus property signals). The connector posts readings through a
/// [`FeedHandle`]; each post overwrites the previous value and the control
/// tick reads the latest one without blocking.
///
/// `disable()` detaches the slot under its lock, so no post that starts
/// after it returns can land — the connector's delivery thread never
/// mutates a deactivated source.
pub struct FeedSource {
    name: String,
    path: String,
    enabled: bool,
    slot: Arc<FeedSlot>,
}

#[derive(Clone)]
pub struct FeedHandle {
    slot: Arc<FeedSlot>,
}

struct FeedSlot {
    state: Mutex<FeedState>,
}

struct FeedState {
    value: Option<f64>,
    attached: bool,
}

fn lock(slot: &FeedSlot) -> MutexGuard<'_, FeedState> {
    match slot.state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl FeedSource {
    pub fn new(name: &str, path: &str) -> (Self, FeedHandle) {
        let slot = Arc::new(FeedSlot {
            state: Mutex::new(FeedState {
                value: None,
                attached: true,
            }),
        });
        let source = Self {
            name: name.to_string(),
            path: path.to_string(),
            enabled: true,
            slot: Arc::clone(&slot),
        };
        (source, FeedHandle { slot })
    }
}

impl FeedHandle {
    /// Store the latest reading. Returns false when the source is detached
    /// (disabled) and the reading was dropped.
    pub fn post(&self, luminance: f64) -> bool {
        let mut state = lock(&self.slot);
        if !state.attached {
            return false;
        }
        state.value = Some(luminance);
        true
    }
}

impl LuminanceSource for FeedSource {
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
        let mut state = lock(&self.slot);
        state.attached = true;
        // Not ready again until a fresh reading arrives
        state.value = None;
    }

    fn disable(&mut self) {
        self.enabled = false;
        let mut state = lock(&self.slot);
        state.attached = false;
        state.value = None;
    }

    fn is_ready(&self) -> bool {
        lock(&self.slot).value.is_some()
    }

    fn get_luminance(&mut self) -> Option<f64> {
        lock(&self.slot).value
    }
}
