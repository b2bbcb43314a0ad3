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

//! Kernel thermal-zone fallback.
//!
//! Thermal-zone files hold one integer line in millidegrees Celsius, e.g.
//! `45000`. No range check is done on the value.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::ReadError;
use crate::temperature::Temperature;

pub const DEFAULT_THERMAL_ZONE_PATH: &str = "/sys/devices/virtual/thermal/thermal_zone2/temp";

/// Longest line read from the file, newline included.
const MAX_LINE_LEN: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackReader {
    path: PathBuf,
}

impl Default for FallbackReader {
    fn default() -> Self {
        Self::new(DEFAULT_THERMAL_ZONE_PATH)
    }
}

impl FallbackReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the zone once. Failures are logged and reported as `Unknown`.
    pub fn read_once(&self) -> Temperature {
        match read_temperature_file(&self.path) {
            Ok(celsius) => Temperature::from_celsius(celsius),
            Err(e) => {
                warn!(error = %e, "Fallback temperature unavailable");
                Temperature::Unknown
            }
        }
    }
}

/// Read a millidegree value from `path` and convert it to degrees Celsius.
pub fn read_temperature_file(path: &Path) -> Result<f64, ReadError> {
    let file = File::open(path).map_err(|source| ReadError::FileOpenFailed {
        path: path.to_path_buf(),
        source,
    })?;

    let mut raw = Vec::new();
    let read = BufReader::new(file)
        .take(MAX_LINE_LEN)
        .read_until(b'\n', &mut raw)
        .map_err(|source| ReadError::FileReadFailed {
            path: path.to_path_buf(),
            source: Some(source),
        })?;
    if read == 0 {
        return Err(ReadError::FileReadFailed { path: path.to_path_buf(), source: None });
    }
    // Bytes after the number need not be UTF-8.
    let line = String::from_utf8_lossy(&raw);

    let millidegrees = parse_leading_number(&line).ok_or_else(|| ReadError::FileParseFailed {
        path: path.to_path_buf(),
        content: line.trim_end().to_string(),
    })?;
    Ok(millidegrees / 1000.0)
}

/// Parse the numeric prefix of `s`, ignoring leading whitespace and any
/// trailing garbage. `None` when there is no number at all.
pub fn parse_leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn zone_file(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("temp");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_with_newline() {
        let dir = TempDir::new().unwrap();
        let path = zone_file(&dir, "45000\n");
        assert_eq!(read_temperature_file(&path).unwrap(), 45.0);
        assert_eq!(FallbackReader::new(&path).read_once(), Temperature::Celsius(45.0));
    }

    #[test]
    fn test_read_without_newline() {
        let dir = TempDir::new().unwrap();
        let path = zone_file(&dir, "45000");
        assert_eq!(FallbackReader::new(&path).read_once(), Temperature::Celsius(45.0));
    }

    #[test]
    fn test_read_keeps_fraction() {
        let dir = TempDir::new().unwrap();
        let path = zone_file(&dir, "52375\n");
        assert_eq!(FallbackReader::new(&path).read_once(), Temperature::Celsius(52.375));
    }

    #[test]
    fn test_negative_values_are_passed_through() {
        let dir = TempDir::new().unwrap();
        let path = zone_file(&dir, "-2000\n");
        assert_eq!(FallbackReader::new(&path).read_once(), Temperature::Celsius(-2.0));
    }

    #[test]
    fn test_trailing_garbage_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = zone_file(&dir, "61000 mC\n");
        assert_eq!(FallbackReader::new(&path).read_once(), Temperature::Celsius(61.0));
    }

    #[test]
    fn test_trailing_non_utf8_bytes_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("temp");
        fs::write(&path, b"45000\xff\n").unwrap();
        assert_eq!(read_temperature_file(&path).unwrap(), 45.0);
        assert_eq!(FallbackReader::new(&path).read_once(), Temperature::Celsius(45.0));
    }

    #[test]
    fn test_non_numeric_is_unknown() {
        let dir = TempDir::new().unwrap();
        let path = zone_file(&dir, "disabled\n");
        assert!(matches!(read_temperature_file(&path), Err(ReadError::FileParseFailed { .. })));
        assert_eq!(FallbackReader::new(&path).read_once(), Temperature::Unknown);
    }

    #[test]
    fn test_empty_file_is_unknown() {
        let dir = TempDir::new().unwrap();
        let path = zone_file(&dir, "");
        assert!(matches!(
            read_temperature_file(&path),
            Err(ReadError::FileReadFailed { source: None, .. })
        ));
        assert_eq!(FallbackReader::new(&path).read_once(), Temperature::Unknown);
    }

    #[test]
    fn test_missing_file_is_unknown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("thermal_zone9").join("temp");
        assert!(matches!(read_temperature_file(&path), Err(ReadError::FileOpenFailed { .. })));
        assert_eq!(FallbackReader::new(&path).read_once(), Temperature::Unknown);
    }

    #[test]
    fn test_directory_is_unknown() {
        let dir = TempDir::new().unwrap();
        assert_eq!(FallbackReader::new(dir.path()).read_once(), Temperature::Unknown);
    }

    #[test]
    fn test_parse_leading_number() {
        assert_eq!(parse_leading_number("45000"), Some(45000.0));
        assert_eq!(parse_leading_number("  45000\n"), Some(45000.0));
        assert_eq!(parse_leading_number("+12.5x"), Some(12.5));
        assert_eq!(parse_leading_number("-7"), Some(-7.0));
        assert_eq!(parse_leading_number(".5"), Some(0.5));
        assert_eq!(parse_leading_number("4e3"), Some(4000.0));
        assert_eq!(parse_leading_number("4e"), Some(4.0));
        assert_eq!(parse_leading_number(""), None);
        assert_eq!(parse_leading_number("abc"), None);
        assert_eq!(parse_leading_number("-"), None);
        assert_eq!(parse_leading_number("."), None);
    }

    #[test]
    fn test_default_path() {
        assert_eq!(FallbackReader::default().path(), Path::new(DEFAULT_THERMAL_ZONE_PATH));
    }
}
