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

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use serde_json::json;

use crate::condition::{ConditionExpr, ConditionOverride};
use crate::config::Config;
use crate::controller::Controller;
use crate::logger;
use crate::sources::{iio, manual, SourceRegistry};
use crate::targets::{backlight, ddcutil, TargetRegistry};

/// The control loop state: registries, controller and override, advanced
/// one tick at a time. Everything runs on the caller's thread; a tick never
/// blocks.
pub struct ControlLoop {
    pub sources: SourceRegistry,
    pub targets: TargetRegistry,
    pub controller: Controller,
    pub condition: ConditionOverride,
}

impl ControlLoop {
    pub fn new(
        sources: SourceRegistry,
        targets: TargetRegistry,
        controller: Controller,
        condition: ConditionOverride,
    ) -> Self {
        Self {
            sources,
            targets,
            controller,
            condition,
        }
    }

    /// One control tick: drive the override, then sensors -> controller ->
    /// targets. Whenever a required input is missing the tick holds the
    /// current brightness and returns.
    pub fn tick(&mut self, cfg: &mut Config) {
        self.condition.run(&mut self.controller, cfg);

        if !self.sources.is_ready() {
            return;
        }
        let Some(luminance) = self.sources.get_luminance() else {
            return;
        };

        let current = self.targets.get_brightness();
        let Some(next) = self.controller.recommend(luminance, current) else {
            return;
        };
        self.targets.set_brightness(i32::from(next));
    }
}

fn build_condition_override(cfg: &Config) -> ConditionOverride {
    let forced = f64::from(cfg.settings.conditions.forced_value);
    if !cfg.settings.conditions.enabled {
        return ConditionOverride::new(None, forced);
    }
    let expr = ConditionExpr::parse(&cfg.settings.conditions.max_brightness).unwrap_or_default();
    if expr.is_empty() {
        return ConditionOverride::new(None, forced);
    }
    // The window-system watcher is external glue; in plain service mode
    // nothing attaches one, so the override stays dormant.
    eprintln!("luxd: conditions configured but no window-system watcher is attached in service mode");
    ConditionOverride::new(None, forced)
}

pub fn run_service(mut cfg: Config) -> Result<()> {
    eprintln!("luxd: starting service mode");
    logger::log_event("service_start", json!({}));

    let mut targets = TargetRegistry::new();
    targets.add_target_type(ddcutil::detect());
    targets.add_target_type(backlight::detect());
    if targets.is_empty() {
        return Err(anyhow!("no supported displays found"));
    }
    for (uid, target) in targets.iter() {
        eprintln!("luxd: display [{}] {} ({})", uid, target.name(), target.path());
    }

    let mut sources = SourceRegistry::new();
    sources.add_source_type(iio::detect());
    sources.add_source_type(manual::detect());
    sources.activate(cfg.settings.general.default_sensor);
    for (uid, source) in sources.iter() {
        eprintln!("luxd: sensor  [{}] {} ({})", uid, source.name(), source.path());
    }

    let controller = Controller::from_config(&cfg);
    let condition = build_condition_override(&cfg);
    let mut control = ControlLoop::new(sources, targets, controller, condition);

    let interval = Duration::from_millis(cfg.settings.general.tick_ms);
    let mut last = Instant::now() - interval;

    loop {
        let now = Instant::now();
        if now.duration_since(last) < interval {
            thread::sleep(Duration::from_millis(50));
            continue;
        }
        last = now;

        control.tick(&mut cfg);
    }
}
