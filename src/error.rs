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

//! Error types for binding, lifecycle, fallback and configuration.
//!
//! None of these are fatal for the host application: binding failures fall
//! back to the thermal-zone file and read failures become `Unknown`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BindError {
    #[error("sensors library not found (tried: {})", tried.join(", "))]
    LibraryNotFound { tried: Vec<String> },

    #[error("symbol {symbol} missing from {library}")]
    SymbolResolutionFailed { library: String, symbol: &'static str },

    #[error("invalid library name: {0:?}")]
    InvalidLibraryName(String),
}

#[derive(Error, Debug)]
pub enum InitError {
    #[error("failed to bind sensors library: {0}")]
    Bind(#[from] BindError),

    #[error("sensors_init failed with status {status}")]
    Library { status: i32 },
}

#[derive(Error, Debug)]
pub enum ReloadError {
    #[error("sensors library is not bound")]
    NotBound,

    #[error("sensors_init failed with status {status}")]
    Library { status: i32 },
}

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("failed to open temperature file {}: {source}", path.display())]
    FileOpenFailed { path: PathBuf, source: io::Error },

    /// `source` is `None` when the read succeeded but returned no data.
    #[error("failed to read temperature from {}", path.display())]
    FileReadFailed {
        path: PathBuf,
        source: Option<io::Error>,
    },

    #[error("failed to parse temperature from {}: {content:?}", path.display())]
    FileParseFailed { path: PathBuf, content: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
