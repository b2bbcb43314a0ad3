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

use std::fmt;

use serde::{Deserialize, Serialize};

/// A CPU temperature in degrees Celsius, or explicitly unknown.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    #[default]
    Unknown,
    Celsius(f64),
}

impl Temperature {
    /// Non-finite readings become `Unknown`.
    pub fn from_celsius(value: f64) -> Self {
        if value.is_finite() {
            Temperature::Celsius(value)
        } else {
            Temperature::Unknown
        }
    }

    pub fn celsius(self) -> Option<f64> {
        match self {
            Temperature::Celsius(c) => Some(c),
            Temperature::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, Temperature::Celsius(_))
    }

    /// The hotter of two readings; a known reading beats `Unknown`.
    pub fn max(self, other: Temperature) -> Temperature {
        match (self, other) {
            (Temperature::Celsius(a), Temperature::Celsius(b)) => Temperature::Celsius(a.max(b)),
            (Temperature::Celsius(_), Temperature::Unknown) => self,
            _ => other,
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temperature::Celsius(c) => write!(f, "{:.1}°C", c),
            Temperature::Unknown => write!(f, "N/A"),
        }
    }
}

/// A caller-owned per-CPU record with a temperature slot.
pub trait CpuRecord {
    fn temperature(&self) -> Temperature;
    fn set_temperature(&mut self, temperature: Temperature);
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CpuData {
    pub temperature: Temperature,
}

impl CpuRecord for CpuData {
    fn temperature(&self) -> Temperature {
        self.temperature
    }

    fn set_temperature(&mut self, temperature: Temperature) {
        self.temperature = temperature;
    }
}

impl CpuRecord for Temperature {
    fn temperature(&self) -> Temperature {
        *self
    }

    fn set_temperature(&mut self, temperature: Temperature) {
        *self = temperature;
    }
}
