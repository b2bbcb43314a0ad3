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

//! Binding the libsensors entry points.
//!
//! Default builds open the shared library at runtime so that libsensors is
//! not a hard install-time dependency. Distributions ship different sonames
//! (Debian has `.so.5`, Fedora `.so.4`) and the unversioned symlink only
//! comes with the development package, so several names are tried in order.
//! With the `static-link` feature the compiled-in functions are used.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_int;
use std::ptr;

use tracing::{debug, info, warn};

use crate::config::SensorsConfig;
use crate::error::BindError;
use crate::ffi::{
    self, sensors_chip_name, sensors_feature, SensorsCleanupFn, SensorsGetDetectedChipsFn,
    SensorsGetFeaturesFn, SensorsGetSubfeatureFn, SensorsGetValueFn, SensorsInitFn,
};
use crate::library::{Chip, Feature, SensorLibrary, SubFeature};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// Entry points linked at build time; binding cannot fail.
    Static,
    /// Entry points resolved from a shared library at runtime.
    Dynamic,
}

/// Produces a bound [`SensorLibrary`].
#[cfg_attr(test, mockall::automock)]
pub trait Binder: Send {
    fn mode(&self) -> BindMode;

    fn bind(&self) -> Result<Box<dyn SensorLibrary>, BindError>;
}

/// The entry points the temperature code needs from libsensors.
#[derive(Clone, Copy)]
pub struct BoundSymbolSet {
    pub init: SensorsInitFn,
    pub cleanup: SensorsCleanupFn,
    pub get_detected_chips: SensorsGetDetectedChipsFn,
    pub get_features: SensorsGetFeaturesFn,
    pub get_subfeature: SensorsGetSubfeatureFn,
    pub get_value: SensorsGetValueFn,
}

impl BoundSymbolSet {
    #[cfg(feature = "static-link")]
    pub fn compiled_in() -> Self {
        Self {
            init: ffi::sensors_init,
            cleanup: ffi::sensors_cleanup,
            get_detected_chips: ffi::sensors_get_detected_chips,
            get_features: ffi::sensors_get_features,
            get_subfeature: ffi::sensors_get_subfeature,
            get_value: ffi::sensors_get_value,
        }
    }

    /// Resolve every entry point from `handle`, in a fixed order.
    /// Any missing symbol fails the whole set.
    fn resolve(handle: &LibraryHandle) -> Result<Self, BindError> {
        // SAFETY: each symbol is cast to the function type declared by sensors.h.
        unsafe {
            Ok(Self {
                init: handle.symbol::<SensorsInitFn>("sensors_init")?,
                cleanup: handle.symbol::<SensorsCleanupFn>("sensors_cleanup")?,
                get_detected_chips: handle
                    .symbol::<SensorsGetDetectedChipsFn>("sensors_get_detected_chips")?,
                get_features: handle.symbol::<SensorsGetFeaturesFn>("sensors_get_features")?,
                get_subfeature: handle.symbol::<SensorsGetSubfeatureFn>("sensors_get_subfeature")?,
                get_value: handle.symbol::<SensorsGetValueFn>("sensors_get_value")?,
            })
        }
    }
}

/// An open `dlopen` handle, closed on drop.
pub struct LibraryHandle {
    raw: *mut c_void,
    name: String,
}

// SAFETY: a dlopen handle is a process-global reference count, not tied to a thread.
unsafe impl Send for LibraryHandle {}

impl LibraryHandle {
    pub fn open(name: &str) -> Result<Option<Self>, BindError> {
        let c_name = CString::new(name).map_err(|_| BindError::InvalidLibraryName(name.to_string()))?;
        // SAFETY: c_name is a valid NUL-terminated string.
        let raw = unsafe { libc::dlopen(c_name.as_ptr(), libc::RTLD_LAZY) };
        if raw.is_null() {
            debug!(library = %name, error = %last_dl_error(), "dlopen failed");
            return Ok(None);
        }
        Ok(Some(Self { raw, name: name.to_string() }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// # Safety
    ///
    /// `T` must be a function pointer type matching the symbol's C signature.
    unsafe fn symbol<T: Copy>(&self, symbol: &'static str) -> Result<T, BindError> {
        let missing = || BindError::SymbolResolutionFailed { library: self.name.clone(), symbol };
        let c_symbol = CString::new(symbol).map_err(|_| missing())?;

        // Clear any stale error before the lookup.
        libc::dlerror();
        let ptr = libc::dlsym(self.raw, c_symbol.as_ptr());
        if ptr.is_null() || !libc::dlerror().is_null() {
            warn!(library = %self.name, symbol, "Failed to resolve sensors symbol");
            return Err(missing());
        }
        debug_assert_eq!(std::mem::size_of::<T>(), std::mem::size_of::<*mut c_void>());
        Ok(std::mem::transmute_copy::<*mut c_void, T>(&ptr))
    }
}

impl Drop for LibraryHandle {
    fn drop(&mut self) {
        // SAFETY: raw came from a successful dlopen and is closed exactly once.
        unsafe {
            libc::dlclose(self.raw);
        }
        debug!(library = %self.name, "Closed sensors library");
    }
}

fn last_dl_error() -> String {
    // SAFETY: dlerror returns null or a thread-local NUL-terminated string.
    unsafe {
        let err = libc::dlerror();
        if err.is_null() {
            "unknown error".to_string()
        } else {
            CStr::from_ptr(err).to_string_lossy().into_owned()
        }
    }
}

/// libsensors reached through a [`BoundSymbolSet`].
///
/// Holds the library handle, if any, for as long as the symbols are in use.
pub struct LibSensors {
    symbols: BoundSymbolSet,
    _handle: Option<LibraryHandle>,
}

impl LibSensors {
    pub fn new(symbols: BoundSymbolSet, handle: Option<LibraryHandle>) -> Self {
        Self { symbols, _handle: handle }
    }
}

impl SensorLibrary for LibSensors {
    fn init(&self) -> i32 {
        // SAFETY: a null FILE makes libsensors use its default configuration.
        unsafe { (self.symbols.init)(ptr::null_mut()) }
    }

    fn cleanup(&self) {
        // SAFETY: plain call into the bound library.
        unsafe { (self.symbols.cleanup)() }
    }

    fn next_chip(&self, cursor: &mut i32) -> Option<Chip> {
        let mut nr: c_int = *cursor;
        // SAFETY: a null match pattern enumerates every detected chip.
        let chip = unsafe { (self.symbols.get_detected_chips)(ptr::null(), &mut nr) };
        *cursor = nr;
        if chip.is_null() {
            return None;
        }
        // SAFETY: non-null chips point at library-owned records valid until cleanup.
        let prefix = unsafe { ffi::string_from_ptr((*chip).prefix) };
        Some(Chip::new(prefix, chip as usize))
    }

    fn next_feature(&self, chip: &Chip, cursor: &mut i32) -> Option<Feature> {
        let mut nr: c_int = *cursor;
        let chip_ptr = chip.handle() as *const sensors_chip_name;
        // SAFETY: chip_ptr was handed out by next_chip.
        let feature = unsafe { (self.symbols.get_features)(chip_ptr, &mut nr) };
        *cursor = nr;
        if feature.is_null() {
            return None;
        }
        // SAFETY: non-null features are library-owned and valid until cleanup.
        let (name, number, kind) = unsafe {
            (ffi::string_from_ptr((*feature).name), (*feature).number, (*feature).type_)
        };
        Some(Feature::new(name, number, kind, feature as usize))
    }

    fn subfeature(&self, chip: &Chip, feature: &Feature, kind: i32) -> Option<SubFeature> {
        let chip_ptr = chip.handle() as *const sensors_chip_name;
        let feature_ptr = feature.handle() as *const sensors_feature;
        // SAFETY: both pointers were handed out by this library.
        let sub = unsafe { (self.symbols.get_subfeature)(chip_ptr, feature_ptr, kind) };
        if sub.is_null() {
            return None;
        }
        // SAFETY: non-null sub-features are library-owned and valid until cleanup.
        let (name, number, kind) =
            unsafe { (ffi::string_from_ptr((*sub).name), (*sub).number, (*sub).type_) };
        Some(SubFeature::new(name, number, kind))
    }

    fn value(&self, chip: &Chip, subfeature: &SubFeature) -> Result<f64, i32> {
        let chip_ptr = chip.handle() as *const sensors_chip_name;
        let mut value = 0.0;
        // SAFETY: chip_ptr was handed out by next_chip; value is a valid out pointer.
        let status = unsafe { (self.symbols.get_value)(chip_ptr, subfeature.number(), &mut value) };
        if status == 0 {
            Ok(value)
        } else {
            Err(status)
        }
    }
}

/// Opens libsensors with `dlopen`, trying each candidate name in order.
#[derive(Debug, Clone)]
pub struct DynamicBinder {
    library_names: Vec<String>,
}

impl DynamicBinder {
    pub fn new(library_names: Vec<String>) -> Self {
        Self { library_names }
    }

    fn open_first(&self) -> Result<LibraryHandle, BindError> {
        for name in &self.library_names {
            if let Some(handle) = LibraryHandle::open(name)? {
                info!(library = %name, "Opened sensors library");
                return Ok(handle);
            }
        }
        Err(BindError::LibraryNotFound { tried: self.library_names.clone() })
    }
}

impl Binder for DynamicBinder {
    fn mode(&self) -> BindMode {
        BindMode::Dynamic
    }

    fn bind(&self) -> Result<Box<dyn SensorLibrary>, BindError> {
        let handle = self.open_first()?;
        // On failure the handle drops here and the library is closed again.
        let symbols = BoundSymbolSet::resolve(&handle)?;
        Ok(Box::new(LibSensors::new(symbols, Some(handle))))
    }
}

/// Uses the libsensors functions linked into the binary.
#[cfg(feature = "static-link")]
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticBinder;

#[cfg(feature = "static-link")]
impl Binder for StaticBinder {
    fn mode(&self) -> BindMode {
        BindMode::Static
    }

    fn bind(&self) -> Result<Box<dyn SensorLibrary>, BindError> {
        Ok(Box::new(LibSensors::new(BoundSymbolSet::compiled_in(), None)))
    }
}

/// Pick the binder for this build.
#[cfg(feature = "static-link")]
pub fn default_binder(_config: &SensorsConfig) -> Box<dyn Binder> {
    Box::new(StaticBinder)
}

/// Pick the binder for this build.
#[cfg(not(feature = "static-link"))]
pub fn default_binder(config: &SensorsConfig) -> Box<dyn Binder> {
    Box::new(DynamicBinder::new(config.library_names.clone()))
}
