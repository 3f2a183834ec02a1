/*
 * Test utilities and mock helpers for Luxd
 *
 * This module provides hand-rolled mock backends shared across the unit
 * test modules: a scriptable luminance source, a recording display target
 * and a scripted condition watcher.
 */

#[cfg(test)]
pub mod test_utils {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use crate::condition::ConditionWatcher;
    use crate::sources::LuminanceSource;
    use crate::targets::DisplayTarget;

    pub type StatsHandle = Rc<RefCell<BackendStats>>;

    /// Observable side effects of a mock backend.
    #[derive(Debug, Default)]
    pub struct BackendStats {
        pub enable_calls: usize,
        pub disable_calls: usize,
        /// Every `set_brightness` invocation, including suppressed ones.
        pub set_calls: usize,
        /// Values that actually reached the fake hardware.
        pub writes: Vec<u8>,
    }

    pub struct MockSource {
        name: String,
        enabled: bool,
        ready: bool,
        luminance: Option<f64>,
        stats: StatsHandle,
    }

    impl MockSource {
        pub fn new(name: &str, luminance: Option<f64>) -> (Self, StatsHandle) {
            let stats = Rc::new(RefCell::new(BackendStats::default()));
            (
                Self {
                    name: name.to_string(),
                    enabled: true,
                    ready: true,
                    luminance,
                    stats: Rc::clone(&stats),
                },
                stats,
            )
        }

        pub fn not_ready(name: &str) -> (Self, StatsHandle) {
            let (mut source, stats) = Self::new(name, None);
            source.ready = false;
            (source, stats)
        }
    }

    impl LuminanceSource for MockSource {
        fn name(&self) -> &str {
            &self.name
        }

        fn path(&self) -> &str {
            "mock"
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn enable(&mut self) {
            self.enabled = true;
            self.stats.borrow_mut().enable_calls += 1;
        }

        fn disable(&mut self) {
            self.enabled = false;
            self.stats.borrow_mut().disable_calls += 1;
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        fn get_luminance(&mut self) -> Option<f64> {
            self.luminance
        }
    }

    pub struct MockTarget {
        name: String,
        enabled: bool,
        brightness: Option<u8>,
        stats: StatsHandle,
    }

    impl MockTarget {
        pub fn new(name: &str, brightness: Option<u8>) -> (Self, StatsHandle) {
            let stats = Rc::new(RefCell::new(BackendStats::default()));
            (
                Self {
                    name: name.to_string(),
                    enabled: true,
                    brightness,
                    stats: Rc::clone(&stats),
                },
                stats,
            )
        }
    }

    impl DisplayTarget for MockTarget {
        fn name(&self) -> &str {
            &self.name
        }

        fn path(&self) -> &str {
            "mock"
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn enable(&mut self) {
            self.enabled = true;
            self.stats.borrow_mut().enable_calls += 1;
        }

        fn disable(&mut self) {
            self.enabled = false;
            self.stats.borrow_mut().disable_calls += 1;
        }

        fn get_brightness(&mut self) -> Option<u8> {
            if !self.enabled {
                return None;
            }
            self.brightness
        }

        fn set_brightness(&mut self, brightness: u8) {
            self.stats.borrow_mut().set_calls += 1;
            if Some(brightness) == self.brightness {
                return;
            }
            self.brightness = Some(brightness);
            self.stats.borrow_mut().writes.push(brightness);
        }
    }

    /// Watcher replaying a fixed verdict script; exhausted ticks report
    /// "nothing observed".
    pub struct ScriptedWatcher {
        script: VecDeque<Option<bool>>,
    }

    impl ScriptedWatcher {
        pub fn new(script: Vec<Option<bool>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl ConditionWatcher for ScriptedWatcher {
        fn process(&mut self) -> Option<bool> {
            self.script.pop_front().flatten()
        }
    }
}
