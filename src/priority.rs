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

use serde::{Deserialize, Serialize};

use crate::library::Chip;

/// Lower is preferred.
pub type Priority = u8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverPriority {
    pub prefix: String,
    pub priority: Priority,
}

impl DriverPriority {
    pub fn new(prefix: impl Into<String>, priority: Priority) -> Self {
        Self { prefix: prefix.into(), priority }
    }
}

pub fn default_driver_priorities() -> Vec<DriverPriority> {
    vec![
        DriverPriority::new("coretemp", 0),
        DriverPriority::new("via_cputemp", 0),
        DriverPriority::new("cpu_thermal", 0),
        DriverPriority::new("k10temp", 0),
        DriverPriority::new("zenpower", 0),
        // Low priority drivers
        DriverPriority::new("acpitz", 1),
    ]
}

/// Maps chip drivers to how much their readings are trusted as CPU temperature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipPrioritizer {
    drivers: Vec<DriverPriority>,
}

impl Default for ChipPrioritizer {
    fn default() -> Self {
        Self::new(default_driver_priorities())
    }
}

impl ChipPrioritizer {
    pub fn new(drivers: Vec<DriverPriority>) -> Self {
        Self { drivers }
    }

    /// Priority of `chip`, or `None` when it is not a CPU temperature source.
    /// The first table entry matching the chip's driver prefix wins.
    pub fn priority_of(&self, chip: &Chip) -> Option<Priority> {
        self.priority_of_prefix(chip.prefix())
    }

    pub fn priority_of_prefix(&self, prefix: &str) -> Option<Priority> {
        self.drivers
            .iter()
            .find(|d| d.prefix == prefix)
            .map(|d| d.priority)
    }
}
