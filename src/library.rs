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

//! The sensors library capability.
//!
//! [`SensorLibrary`] is the seam between temperature selection and however
//! libsensors got bound (linked in, or resolved with `dlopen`). Chips,
//! features and sub-features are identifiers owned by the library: they stay
//! valid until the next `cleanup` and are never mutated here.

use crate::ffi::{SENSORS_FEATURE_TEMP, SENSORS_SUBFEATURE_TEMP_INPUT};

/// A detected hardware monitoring chip, e.g. `coretemp-isa-0000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    prefix: String,
    handle: usize,
}

impl Chip {
    pub fn new(prefix: impl Into<String>, handle: usize) -> Self {
        Self { prefix: prefix.into(), handle }
    }

    /// Driver name of the chip (`coretemp`, `k10temp`, ...).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn handle(&self) -> usize {
        self.handle
    }
}

/// One measurable quantity on a chip, e.g. `temp1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    name: String,
    number: i32,
    kind: i32,
    handle: usize,
}

impl Feature {
    pub fn new(name: impl Into<String>, number: i32, kind: i32, handle: usize) -> Self {
        Self { name: name.into(), number, kind, handle }
    }

    /// A temperature feature as reported by the library.
    pub fn temperature(name: impl Into<String>, number: i32) -> Self {
        Self::new(name, number, SENSORS_FEATURE_TEMP, number as usize)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn kind(&self) -> i32 {
        self.kind
    }

    pub fn is_temperature(&self) -> bool {
        self.kind == SENSORS_FEATURE_TEMP
    }

    /// The `N` of a `tempN` feature name.
    pub fn temp_index(&self) -> Option<usize> {
        self.name.strip_prefix("temp")?.parse().ok()
    }

    pub(crate) fn handle(&self) -> usize {
        self.handle
    }
}

/// One reading of a feature, e.g. the current input value of `temp1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubFeature {
    name: String,
    number: i32,
    kind: i32,
}

impl SubFeature {
    pub fn new(name: impl Into<String>, number: i32, kind: i32) -> Self {
        Self { name: name.into(), number, kind }
    }

    pub fn temp_input(name: impl Into<String>, number: i32) -> Self {
        Self::new(name, number, SENSORS_SUBFEATURE_TEMP_INPUT)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index used by the library to read this sub-feature's value.
    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn kind(&self) -> i32 {
        self.kind
    }
}

/// Operations needed from libsensors.
///
/// The enumeration methods follow the library's cursor convention: the
/// caller owns the cursor, starts it at zero and gets `None` at the end.
/// `detected_chips()` and `features()` on a `dyn SensorLibrary` wrap them
/// as iterators.
#[cfg_attr(test, mockall::automock)]
pub trait SensorLibrary: Send {
    /// Load the default configuration. Returns the library's status, 0 on success.
    fn init(&self) -> i32;

    fn cleanup(&self);

    fn next_chip(&self, cursor: &mut i32) -> Option<Chip>;

    fn next_feature(&self, chip: &Chip, cursor: &mut i32) -> Option<Feature>;

    fn subfeature(&self, chip: &Chip, feature: &Feature, kind: i32) -> Option<SubFeature>;

    /// Read a sub-feature value. The error is the library's status code.
    fn value(&self, chip: &Chip, subfeature: &SubFeature) -> Result<f64, i32>;
}

impl<'l> dyn SensorLibrary + 'l {
    /// All chips currently detected by the library.
    pub fn detected_chips(&self) -> Chips<'_> {
        Chips { library: self, cursor: 0, done: false }
    }

    /// All features of `chip`.
    pub fn features<'a>(&'a self, chip: &'a Chip) -> Features<'a> {
        Features { library: self, chip, cursor: 0, done: false }
    }
}

pub struct Chips<'a> {
    library: &'a dyn SensorLibrary,
    cursor: i32,
    done: bool,
}

impl Iterator for Chips<'_> {
    type Item = Chip;

    fn next(&mut self) -> Option<Chip> {
        if self.done {
            return None;
        }
        let chip = self.library.next_chip(&mut self.cursor);
        self.done = chip.is_none();
        chip
    }
}

pub struct Features<'a> {
    library: &'a dyn SensorLibrary,
    chip: &'a Chip,
    cursor: i32,
    done: bool,
}

impl Iterator for Features<'_> {
    type Item = Feature;

    fn next(&mut self) -> Option<Feature> {
        if self.done {
            return None;
        }
        let feature = self.library.next_feature(self.chip, &mut self.cursor);
        self.done = feature.is_none();
        feature
    }
}
