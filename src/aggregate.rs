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

//! Per-cycle CPU temperature collection.
//!
//! Slot 0 of the record array is the package (aggregate) temperature and
//! slots `1..=existing_cpus` are the logical CPUs. Every slot is written on
//! every refresh, with `Unknown` where nothing could be read.
//!
//! When libsensors is usable, only chips of the best driver priority seen in
//! the cycle contribute. Their `tempN` features map to slot `N - 1`, so
//! `temp1` is the package reading. Gaps are then filled:
//!
//! - a single reading is copied to every slot
//! - a missing package reading becomes the hottest core
//! - with cores for half of the CPUs, the SMT siblings copy their core
//! - remaining CPUs get the package reading
//!
//! Without any library reading the thermal zone is read once and its value
//! goes to every slot.

use tracing::{debug, trace};

use crate::ffi::SENSORS_SUBFEATURE_TEMP_INPUT;
use crate::fallback::FallbackReader;
use crate::library::SensorLibrary;
use crate::priority::{ChipPrioritizer, Priority};
use crate::temperature::{CpuRecord, Temperature};

/// Upper bound on the CPU count accepted by [`TemperatureAggregator::refresh`].
pub const MAX_CPUS: usize = 16384;

#[derive(Debug, Clone, Default)]
pub struct TemperatureAggregator {
    prioritizer: ChipPrioritizer,
    fallback: FallbackReader,
}

impl TemperatureAggregator {
    pub fn new(prioritizer: ChipPrioritizer, fallback: FallbackReader) -> Self {
        Self { prioritizer, fallback }
    }

    pub fn prioritizer(&self) -> &ChipPrioritizer {
        &self.prioritizer
    }

    /// Write one temperature per slot of `records[..=existing_cpus]`.
    ///
    /// `active_cpus` is used only to recognise SMT siblings; all existing
    /// CPUs are always written.
    ///
    /// # Panics
    ///
    /// Panics unless `0 < existing_cpus < MAX_CPUS` and `records` holds at
    /// least `existing_cpus + 1` entries.
    pub fn refresh<R: CpuRecord>(
        &self,
        sensors: Option<&dyn SensorLibrary>,
        records: &mut [R],
        existing_cpus: usize,
        active_cpus: usize,
    ) {
        assert!(
            existing_cpus > 0 && existing_cpus < MAX_CPUS,
            "invalid CPU count: {}",
            existing_cpus
        );
        assert!(
            records.len() > existing_cpus,
            "record array too short: {} entries for {} CPUs",
            records.len(),
            existing_cpus
        );

        let mut data = match sensors {
            Some(library) => self.collect_from_library(library, existing_cpus, active_cpus),
            None => vec![Temperature::Unknown; existing_cpus + 1],
        };

        if !data.iter().any(|t| t.is_known()) {
            let temperature = self.fallback.read_once();
            debug!(path = %self.fallback.path().display(), %temperature, "Using thermal zone fallback");
            data.fill(temperature);
        }

        for (record, temperature) in records.iter_mut().zip(data) {
            record.set_temperature(temperature);
        }
    }

    fn collect_from_library(
        &self,
        library: &dyn SensorLibrary,
        existing_cpus: usize,
        active_cpus: usize,
    ) -> Vec<Temperature> {
        let mut data = vec![Temperature::Unknown; existing_cpus + 1];
        let mut top_priority: Option<Priority> = None;
        let mut readings = 0usize;

        for chip in library.detected_chips() {
            let Some(priority) = self.prioritizer.priority_of(&chip) else { continue };

            match top_priority {
                Some(top) if priority > top => continue,
                Some(top) if priority == top => {}
                _ => {
                    // Better chip class: drop what lower-trust chips reported.
                    data.fill(Temperature::Unknown);
                    readings = 0;
                    top_priority = Some(priority);
                }
            }
            trace!(chip = %chip.prefix(), priority, "Reading CPU temperature chip");

            for feature in library.features(&chip) {
                if !feature.is_temperature() {
                    continue;
                }
                let Some(index) = feature.temp_index() else { continue };
                if index == 0 || index > existing_cpus + 1 {
                    continue;
                }
                let Some(sub) = library.subfeature(&chip, &feature, SENSORS_SUBFEATURE_TEMP_INPUT) else {
                    continue;
                };
                let value = match library.value(&chip, &sub) {
                    Ok(value) if value.is_finite() => value,
                    _ => continue,
                };

                // Several dies may report the same slot; keep the hottest.
                let slot = &mut data[index - 1];
                *slot = slot.max(Temperature::Celsius(value));
                readings += 1;
            }
        }

        if readings > 0 {
            fill_gaps(&mut data, readings, existing_cpus, active_cpus);
        }
        data
    }
}

fn fill_gaps(data: &mut [Temperature], readings: usize, existing_cpus: usize, active_cpus: usize) {
    if readings == 1 {
        let only = data.iter().copied().find(|t| t.is_known()).unwrap_or_default();
        data.fill(only);
        return;
    }

    if !data[0].is_known() {
        data[0] = data[1..].iter().fold(Temperature::Unknown, |acc, t| acc.max(*t));
    }

    let cores = data[1..].iter().filter(|t| t.is_known()).count();
    let half = active_cpus / 2;
    if half > 0 && active_cpus % 2 == 0 && active_cpus <= existing_cpus && cores == half {
        for cpu in 1..=half {
            if !data[cpu + half].is_known() {
                data[cpu + half] = data[cpu];
            }
        }
    }

    let package = data[0];
    for slot in data[1..].iter_mut() {
        if !slot.is_known() {
            *slot = package;
        }
    }
}
