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

//! Initialization, reload and teardown of the bound sensors library.
//!
//! A `SensorLifecycle` is meant to have a single owner (the monitoring
//! control thread). It is not synchronized; wrap it in a mutex if several
//! threads drive it, as the crate-level entry points do.

use tracing::{debug, info, warn};

use crate::binder::{BindMode, Binder};
use crate::error::{InitError, ReloadError};
use crate::library::SensorLibrary;

pub struct SensorLifecycle {
    binder: Box<dyn Binder>,
    library: Option<Box<dyn SensorLibrary>>,
    initialized: bool,
}

impl SensorLifecycle {
    pub fn new(binder: Box<dyn Binder>) -> Self {
        Self { binder, library: None, initialized: false }
    }

    pub fn mode(&self) -> BindMode {
        self.binder.mode()
    }

    /// Whether a library binding is currently held.
    pub fn is_bound(&self) -> bool {
        self.library.is_some()
    }

    /// Whether the last init or reload of the library succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The library, when bound and initialized.
    pub fn sensors(&self) -> Option<&dyn SensorLibrary> {
        if self.initialized {
            self.library.as_deref()
        } else {
            None
        }
    }

    /// Bind the library if not bound yet, then initialize it with the
    /// default configuration. An existing binding is reused.
    pub fn initialize(&mut self) -> Result<(), InitError> {
        let library = match self.library.take() {
            Some(library) => library,
            None => self.binder.bind()?,
        };

        let status = library.init();
        self.library = Some(library);
        self.initialized = status == 0;
        if status != 0 {
            warn!(status, "sensors_init failed");
            return Err(InitError::Library { status });
        }
        info!(mode = ?self.binder.mode(), "Sensors library initialized");
        Ok(())
    }

    /// Clean up the library and release the binding. No-op when not bound.
    pub fn cleanup(&mut self) {
        if let Some(library) = self.library.take() {
            library.cleanup();
            debug!("Sensors library cleaned up");
        }
        self.initialized = false;
    }

    /// Re-read the sensors configuration with the existing binding.
    pub fn reload(&mut self) -> Result<(), ReloadError> {
        if self.library.is_none() {
            match self.binder.mode() {
                BindMode::Dynamic => return Err(ReloadError::NotBound),
                BindMode::Static => match self.binder.bind() {
                    Ok(library) => self.library = Some(library),
                    Err(e) => {
                        warn!(error = %e, "Binding linked-in sensors library failed");
                        return Err(ReloadError::NotBound);
                    }
                },
            }
        }
        let library = self.library.as_deref().ok_or(ReloadError::NotBound)?;

        library.cleanup();
        let status = library.init();
        self.initialized = status == 0;
        if status != 0 {
            warn!(status, "sensors_init failed on reload");
            return Err(ReloadError::Library { status });
        }
        info!("Sensors configuration reloaded");
        Ok(())
    }
}

impl Drop for SensorLifecycle {
    fn drop(&mut self) {
        self.cleanup();
    }
}
