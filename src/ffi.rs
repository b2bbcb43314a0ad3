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

//! Raw libsensors ABI (`<sensors/sensors.h>`, API versions 4 and 5).

#![allow(non_camel_case_types)]

use std::ffi::CStr;
use std::os::raw::{c_char, c_double, c_int, c_short, c_uint};

use libc::FILE;

pub const SENSORS_FEATURE_TEMP: c_int = 0x02;
pub const SENSORS_SUBFEATURE_TEMP_INPUT: c_int = SENSORS_FEATURE_TEMP << 8;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct sensors_bus_id {
    pub type_: c_short,
    pub nr: c_short,
}

#[repr(C)]
#[derive(Debug)]
pub struct sensors_chip_name {
    pub prefix: *mut c_char,
    pub bus: sensors_bus_id,
    pub addr: c_int,
    pub path: *mut c_char,
}

#[repr(C)]
#[derive(Debug)]
pub struct sensors_feature {
    pub name: *mut c_char,
    pub number: c_int,
    pub type_: c_int,
    pub first_subfeature: c_int,
    pub padding1: c_int,
}

#[repr(C)]
#[derive(Debug)]
pub struct sensors_subfeature {
    pub name: *mut c_char,
    pub number: c_int,
    pub type_: c_int,
    pub mapping: c_int,
    pub flags: c_uint,
}

pub type SensorsInitFn = unsafe extern "C" fn(input: *mut FILE) -> c_int;
pub type SensorsCleanupFn = unsafe extern "C" fn();
pub type SensorsGetDetectedChipsFn =
    unsafe extern "C" fn(match_: *const sensors_chip_name, nr: *mut c_int) -> *const sensors_chip_name;
pub type SensorsGetFeaturesFn =
    unsafe extern "C" fn(name: *const sensors_chip_name, nr: *mut c_int) -> *const sensors_feature;
pub type SensorsGetSubfeatureFn = unsafe extern "C" fn(
    name: *const sensors_chip_name,
    feature: *const sensors_feature,
    type_: c_int,
) -> *const sensors_subfeature;
pub type SensorsGetValueFn =
    unsafe extern "C" fn(name: *const sensors_chip_name, subfeat_nr: c_int, value: *mut c_double) -> c_int;

#[cfg(feature = "static-link")]
#[link(name = "sensors")]
extern "C" {
    pub fn sensors_init(input: *mut FILE) -> c_int;
    pub fn sensors_cleanup();
    pub fn sensors_get_detected_chips(
        match_: *const sensors_chip_name,
        nr: *mut c_int,
    ) -> *const sensors_chip_name;
    pub fn sensors_get_features(name: *const sensors_chip_name, nr: *mut c_int) -> *const sensors_feature;
    pub fn sensors_get_subfeature(
        name: *const sensors_chip_name,
        feature: *const sensors_feature,
        type_: c_int,
    ) -> *const sensors_subfeature;
    pub fn sensors_get_value(name: *const sensors_chip_name, subfeat_nr: c_int, value: *mut c_double) -> c_int;
}

/// Copy a NUL-terminated string owned by the library. Null yields an empty string.
///
/// # Safety
///
/// `ptr` must be null or point to a valid NUL-terminated string.
pub unsafe fn string_from_ptr(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}
