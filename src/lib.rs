/*
 * This file is part of cputemp.
 *
 * Copyright (C) 2025 cputemp contributors
 *
 * cputemp is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * cputemp is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with cputemp. If not, see <https://www.gnu.org/licenses/>.
 */

//! cputemp - per-CPU temperatures for system monitors on Linux
//!
//! Temperatures come from libsensors when it can be loaded, choosing the
//! most trusted CPU driver among the detected chips, and otherwise from a
//! kernel thermal-zone file.
//!
//! The free functions below drive one process-wide [`SensorLifecycle`] and
//! are meant to be called from the monitor's control thread: [`init`] at
//! start, [`get_cpu_temperatures`] once per refresh cycle, [`reload`] after
//! a hardware change and [`cleanup`] at shutdown.

use std::sync::{Mutex, MutexGuard};

use lazy_static::lazy_static;

pub mod aggregate;
pub mod binder;
pub mod config;
pub mod error;
pub mod ffi;
pub mod fallback;
pub mod library;
pub mod lifecycle;
pub mod priority;
pub mod temperature;

#[cfg(test)]
pub mod test_utils;

pub use aggregate::TemperatureAggregator;
pub use binder::{default_binder, BindMode, Binder, DynamicBinder};
pub use config::SensorsConfig;
pub use error::{BindError, ConfigError, InitError, ReadError, ReloadError};
pub use fallback::FallbackReader;
pub use library::{Chip, Feature, SensorLibrary, SubFeature};
pub use lifecycle::SensorLifecycle;
pub use priority::{ChipPrioritizer, DriverPriority, Priority};
pub use temperature::{CpuData, CpuRecord, Temperature};

struct Sensors {
    lifecycle: SensorLifecycle,
    aggregator: TemperatureAggregator,
}

impl Sensors {
    fn from_config(config: SensorsConfig) -> Self {
        Self {
            lifecycle: SensorLifecycle::new(default_binder(&config)),
            aggregator: config.aggregator(),
        }
    }
}

lazy_static! {
    static ref SENSORS: Mutex<Sensors> =
        Mutex::new(Sensors::from_config(config::load_config().unwrap_or_default()));
}

fn sensors() -> MutexGuard<'static, Sensors> {
    match SENSORS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Bind and initialize libsensors. Failure is not fatal: temperatures then
/// come from the thermal zone.
pub fn init() -> Result<(), InitError> {
    sensors().lifecycle.initialize()
}

pub fn cleanup() {
    sensors().lifecycle.cleanup();
}

/// Re-read the libsensors configuration.
pub fn reload() -> Result<(), ReloadError> {
    sensors().lifecycle.reload()
}

/// Fill `cpus[0..=existing_cpus]` with the current temperatures; slot 0 is
/// the package temperature.
///
/// # Panics
///
/// Panics unless `0 < existing_cpus < 16384` and `cpus` has room for
/// `existing_cpus + 1` records.
pub fn get_cpu_temperatures<R: CpuRecord>(cpus: &mut [R], existing_cpus: usize, active_cpus: usize) {
    let guard = sensors();
    guard
        .aggregator
        .refresh(guard.lifecycle.sensors(), cpus, existing_cpus, active_cpus);
}

/// Replace the process-wide configuration. The current binding is cleaned
/// up; call [`init`] again afterwards.
pub fn configure(config: SensorsConfig) {
    // Dropping the old lifecycle cleans it up.
    *sensors() = Sensors::from_config(config);
}
