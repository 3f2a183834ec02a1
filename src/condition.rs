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

use serde_json::json;

use crate::config::Config;
use crate::controller::Controller;
use crate::logger;

/// One term of a condition expression: a window property key, optionally
/// required to carry a specific value. A bare key means "property present".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionTerm {
    pub key: String,
    pub value: Option<String>,
}

/// AND-combined window-state predicate, parsed from the
/// `key=value|key=value|...` configuration form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConditionExpr {
    terms: Vec<ConditionTerm>,
}

impl ConditionExpr {
    pub fn parse(expression: &str) -> Result<Self, String> {
        let mut terms = Vec::new();
        if expression.trim().is_empty() {
            return Ok(Self { terms });
        }
        for part in expression.split('|') {
            let (key, value) = match part.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim().to_string())),
                None => (part.trim(), None),
            };
            if key.is_empty() {
                return Err(format!("empty key in condition term {:?}", part));
            }
            terms.push(ConditionTerm {
                key: key.to_string(),
                value,
            });
        }
        Ok(Self { terms })
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[ConditionTerm] {
        &self.terms
    }

    /// Evaluate against a property lookup. Every term must resolve; a term
    /// with a value additionally requires that value to be among the
    /// property's values. The empty expression is vacuously true (it is
    /// treated as "disabled" at construction, never evaluated).
    pub fn evaluate<F>(&self, mut lookup: F) -> bool
    where
        F: FnMut(&str) -> Option<Vec<String>>,
    {
        self.terms.iter().all(|term| match lookup(&term.key) {
            Some(values) => match &term.value {
                Some(expected) => values.iter().any(|v| v == expected),
                None => true,
            },
            None => false,
        })
    }
}

/// Supplies condition verdicts to the override, one per tick.
/// `None` means "no window-state change observed since the last check" —
/// including any watcher failure; inconclusive input never transitions.
pub trait ConditionWatcher {
    fn process(&mut self) -> Option<bool>;
}

/// One-slot mailbox watcher. Window-system glue (which lives outside this
/// crate) evaluates the condition expression on its own events and posts
/// the verdicts through a [`WatchHandle`]; `process()` drains the slot.
/// Dropping the watcher detaches the handle, so a replaced watcher's glue
/// can no longer post.
pub struct FeedWatcher {
    slot: Arc<WatchSlot>,
}

#[derive(Clone)]
pub struct WatchHandle {
    slot: Arc<WatchSlot>,
}

struct WatchSlot {
    state: Mutex<WatchState>,
}

struct WatchState {
    pending: Option<bool>,
    attached: bool,
}

fn lock(slot: &WatchSlot) -> MutexGuard<'_, WatchState> {
    match slot.state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl FeedWatcher {
    pub fn new() -> (Self, WatchHandle) {
        let slot = Arc::new(WatchSlot {
            state: Mutex::new(WatchState {
                pending: None,
                attached: true,
            }),
        });
        (
            Self {
                slot: Arc::clone(&slot),
            },
            WatchHandle { slot },
        )
    }
}

impl WatchHandle {
    /// Store a condition verdict for the next tick. Returns false when the
    /// watcher is gone and the verdict was dropped.
    pub fn post(&self, condition: bool) -> bool {
        let mut state = lock(&self.slot);
        if !state.attached {
            return false;
        }
        state.pending = Some(condition);
        true
    }
}

impl ConditionWatcher for FeedWatcher {
    fn process(&mut self) -> Option<bool> {
        lock(&self.slot).pending.take()
    }
}

impl Drop for FeedWatcher {
    fn drop(&mut self) {
        lock(&self.slot).attached = false;
    }
}

/// Two-state supervisor over a condition stream. While the condition
/// holds, the controller offset is forced to `forced_value`; on the
/// reverse edge the offset captured at the forcing transition is restored.
pub struct ConditionOverride {
    watcher: Option<Box<dyn ConditionWatcher>>,
    previous_condition: bool,
    saved_offset: f64,
    forced_value: f64,
}

impl ConditionOverride {
    /// `watcher: None` is the disabled / empty-predicate mode: `run` is a
    /// complete no-op until a watcher is attached.
    pub fn new(watcher: Option<Box<dyn ConditionWatcher>>, forced_value: f64) -> Self {
        Self {
            watcher,
            previous_condition: false,
            saved_offset: 0.0,
            forced_value,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn is_forcing(&self) -> bool {
        self.previous_condition
    }

    pub fn set_forced_value(&mut self, value: f64) {
        self.forced_value = value;
    }

    /// Attach a fresh watcher. Re-enabling starts from a clean slate so a
    /// stale previous state cannot suppress the next edge.
    pub fn enable(&mut self, watcher: Box<dyn ConditionWatcher>) {
        self.watcher = Some(watcher);
        self.previous_condition = false;
    }

    /// Drop the watcher. Disabling mid-force restores the saved offset
    /// first; the forced ceiling must never outlive the feature.
    pub fn disable(&mut self, controller: &mut Controller, cfg: &mut Config) {
        if self.previous_condition {
            controller.set_offset(cfg, self.saved_offset);
            self.previous_condition = false;
            logger::log_event(
                "override_end",
                json!({ "restored": self.saved_offset, "reason": "disabled" }),
            );
        }
        self.watcher = None;
    }

    /// Process one tick of condition input.
    pub fn run(&mut self, controller: &mut Controller, cfg: &mut Config) {
        let Some(watcher) = self.watcher.as_mut() else {
            return;
        };
        let Some(condition) = watcher.process() else {
            return;
        };
        if condition == self.previous_condition {
            return;
        }
        self.previous_condition = condition;

        if condition {
            self.saved_offset = controller.offset();
            controller.set_offset(cfg, self.forced_value);
            eprintln!(
                "luxd: condition override start (offset {} -> {})",
                self.saved_offset, self.forced_value
            );
            logger::log_event(
                "override_start",
                json!({ "saved": self.saved_offset, "forced": self.forced_value }),
            );
        } else {
            controller.set_offset(cfg, self.saved_offset);
            eprintln!(
                "luxd: condition override end (offset restored to {})",
                self.saved_offset
            );
            logger::log_event("override_end", json!({ "restored": self.saved_offset }));
        }
    }
}
