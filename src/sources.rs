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

pub mod feed;
pub mod iio;
pub mod manual;

use serde_json::json;

use crate::logger;

/// An ambient light reading backend.
///
/// Exactly one source is authoritative at a time; the registry switches
/// production on and off through `enable`/`disable` when the active
/// selection changes. A failed reading is `None`, never an error.
pub trait LuminanceSource {
    fn name(&self) -> &str;
    fn path(&self) -> &str;
    fn is_enabled(&self) -> bool;
    fn enable(&mut self);
    fn disable(&mut self);
    /// Whether the source has a usable reading. Checked before every
    /// `get_luminance` call.
    fn is_ready(&self) -> bool;
    fn get_luminance(&mut self) -> Option<f64>;
}

/// Ordered collection of sources with a single active selection.
/// Registration order is identity: a source's uid is its index, assigned
/// once and never reused (sources are disabled, not removed).
pub struct SourceRegistry {
    sources: Vec<Box<dyn LuminanceSource>>,
    active: usize,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            active: 0,
        }
    }

    pub fn add_source(&mut self, source: Box<dyn LuminanceSource>) -> usize {
        let uid = self.sources.len();
        self.sources.push(source);
        uid
    }

    /// Register every source yielded by a backend's discovery pass.
    pub fn add_source_type<I>(&mut self, detected: I) -> Vec<usize>
    where
        I: IntoIterator<Item = Box<dyn LuminanceSource>>,
    {
        detected.into_iter().map(|s| self.add_source(s)).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &dyn LuminanceSource)> {
        self.sources.iter().enumerate().map(|(uid, s)| (uid, s.as_ref()))
    }

    pub fn get(&self, uid: usize) -> Option<&dyn LuminanceSource> {
        self.sources.get(uid).map(|s| s.as_ref())
    }

    /// Luminance from the active source; `None` when the registry is empty
    /// or the read fails. Callers check `is_ready` first.
    pub fn get_luminance(&mut self) -> Option<f64> {
        self.sources.get_mut(self.active).and_then(|s| s.get_luminance())
    }

    pub fn is_ready(&self) -> bool {
        self.sources
            .get(self.active)
            .map(|s| s.is_ready())
            .unwrap_or(false)
    }

    /// Make the source with the given uid authoritative. The previously
    /// active source stops producing (disable), the new one starts
    /// (enable). An out-of-range uid is a logged no-op.
    pub fn activate(&mut self, uid: usize) {
        if uid >= self.sources.len() {
            logger::log_event(
                "source_activate_rejected",
                json!({ "uid": uid, "registered": self.sources.len() }),
            );
            return;
        }
        if let Some(current) = self.sources.get_mut(self.active) {
            current.disable();
        }
        self.active = uid;
        self.sources[self.active].enable();
        logger::log_event(
            "source_activate",
            json!({ "uid": uid, "name": self.sources[self.active].name() }),
        );
    }

    pub fn get_active(&self) -> usize {
        self.active
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::MockSource;

    fn registry_with_mocks(count: usize) -> (SourceRegistry, Vec<crate::test_utils::test_utils::StatsHandle>) {
        let mut registry = SourceRegistry::new();
        let mut stats = Vec::new();
        for i in 0..count {
            let (source, handle) = MockSource::new(&format!("mock{}", i), Some(100.0 * i as f64));
            registry.add_source(Box::new(source));
            stats.push(handle);
        }
        (registry, stats)
    }

    #[test]
    fn test_uids_follow_registration_order() {
        let mut registry = SourceRegistry::new();
        let (a, _) = MockSource::new("a", Some(1.0));
        let (b, _) = MockSource::new("b", Some(2.0));
        assert_eq!(registry.add_source(Box::new(a)), 0);
        assert_eq!(registry.add_source(Box::new(b)), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(0).map(|s| s.name().to_string()), Some("a".into()));
    }

    #[test]
    fn test_empty_registry_has_no_reading() {
        let mut registry = SourceRegistry::new();
        assert!(!registry.is_ready());
        assert_eq!(registry.get_luminance(), None);
    }

    #[test]
    fn test_activate_switches_production() {
        let (mut registry, stats) = registry_with_mocks(3);
        registry.activate(2);
        assert_eq!(registry.get_active(), 2);
        assert_eq!(stats[0].borrow().disable_calls, 1);
        assert_eq!(stats[2].borrow().enable_calls, 1);
        assert_eq!(registry.get_luminance(), Some(200.0));
    }

    #[test]
    fn test_activate_out_of_range_is_a_no_op() {
        let (mut registry, stats) = registry_with_mocks(2);
        registry.activate(5);
        assert_eq!(registry.get_active(), 0);
        assert_eq!(stats[0].borrow().disable_calls, 0);
        assert_eq!(stats[1].borrow().enable_calls, 0);
    }

    #[test]
    fn test_activate_same_uid_restarts_source() {
        let (mut registry, stats) = registry_with_mocks(1);
        registry.activate(0);
        assert_eq!(stats[0].borrow().disable_calls, 1);
        assert_eq!(stats[0].borrow().enable_calls, 1);
        assert_eq!(registry.get_active(), 0);
    }

    #[test]
    fn test_readiness_tracks_active_source() {
        let mut registry = SourceRegistry::new();
        let (ready, _) = MockSource::new("ready", Some(10.0));
        let (pending, _) = MockSource::not_ready("pending");
        registry.add_source(Box::new(ready));
        registry.add_source(Box::new(pending));

        assert!(registry.is_ready());
        registry.activate(1);
        assert!(!registry.is_ready());
    }

    #[test]
    fn test_failed_reading_is_none() {
        let mut registry = SourceRegistry::new();
        let (source, _) = MockSource::new("broken", None);
        registry.add_source(Box::new(source));
        assert_eq!(registry.get_luminance(), None);
    }
}
