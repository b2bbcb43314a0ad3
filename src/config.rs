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

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::aggregate::TemperatureAggregator;
use crate::error::ConfigError;
use crate::fallback::{FallbackReader, DEFAULT_THERMAL_ZONE_PATH};
use crate::priority::{default_driver_priorities, ChipPrioritizer, DriverPriority};

/// Library names tried in order: the unversioned development symlink first,
/// then the sonames shipped by distributions.
pub const DEFAULT_LIBRARY_NAMES: &[&str] = &["libsensors.so", "libsensors.so.5", "libsensors.so.4"];

const MAX_DRIVER_PRIORITIES: usize = 64;

fn default_thermal_zone_path() -> PathBuf {
    PathBuf::from(DEFAULT_THERMAL_ZONE_PATH)
}

fn default_library_names() -> Vec<String> {
    DEFAULT_LIBRARY_NAMES.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorsConfig {
    /// Thermal zone read when libsensors gives no CPU temperature.
    #[serde(default = "default_thermal_zone_path")]
    pub thermal_zone_path: PathBuf,
    /// Candidate libsensors names for `dlopen`, tried in order.
    #[serde(default = "default_library_names")]
    pub library_names: Vec<String>,
    #[serde(default = "default_driver_priorities")]
    pub driver_priorities: Vec<DriverPriority>,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            thermal_zone_path: default_thermal_zone_path(),
            library_names: default_library_names(),
            driver_priorities: default_driver_priorities(),
        }
    }
}

impl SensorsConfig {
    pub fn aggregator(&self) -> TemperatureAggregator {
        TemperatureAggregator::new(
            ChipPrioritizer::new(self.driver_priorities.clone()),
            FallbackReader::new(self.thermal_zone_path.clone()),
        )
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("cputemp").join("config.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("cputemp")
            .join("config.json");
    }
    PathBuf::from("/etc/cputemp/config.json")
}

/// Load and validate the user config, `None` when absent or invalid.
/// An unreadable or invalid file is logged before it is ignored.
pub fn load_config() -> Option<SensorsConfig> {
    let path = config_path();
    match try_load_config(&path) {
        Ok(cfg) => Some(cfg),
        Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring invalid config, using defaults");
            None
        }
    }
}

pub fn try_load_config(path: &Path) -> Result<SensorsConfig, ConfigError> {
    let data = fs::read_to_string(path)?;
    let cfg: SensorsConfig = serde_json::from_str(&data)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

fn is_safe_library_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= 255 && !name.contains('/') && !name.contains('\0')
}

pub fn validate_config(cfg: &SensorsConfig) -> Result<(), ConfigError> {
    if cfg.thermal_zone_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("thermal_zone_path is empty".to_string()));
    }

    if cfg.library_names.is_empty() {
        return Err(ConfigError::Invalid("library_names is empty".to_string()));
    }
    for (i, name) in cfg.library_names.iter().enumerate() {
        if !is_safe_library_name(name) {
            return Err(ConfigError::Invalid(format!("invalid library name #{}", i + 1)));
        }
    }

    if cfg.driver_priorities.is_empty() {
        return Err(ConfigError::Invalid("driver_priorities is empty".to_string()));
    }
    if cfg.driver_priorities.len() > MAX_DRIVER_PRIORITIES {
        return Err(ConfigError::Invalid(format!(
            "too many driver priorities (max {})",
            MAX_DRIVER_PRIORITIES
        )));
    }
    for (i, d) in cfg.driver_priorities.iter().enumerate() {
        if d.prefix.is_empty() {
            return Err(ConfigError::Invalid(format!("driver priority #{} has an empty prefix", i + 1)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", json).unwrap();
        file
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = SensorsConfig::default();
        assert!(validate_config(&cfg).is_ok());
        assert_eq!(cfg.thermal_zone_path, PathBuf::from("/sys/devices/virtual/thermal/thermal_zone2/temp"));
        assert_eq!(cfg.library_names, vec!["libsensors.so", "libsensors.so.5", "libsensors.so.4"]);
        assert_eq!(cfg.driver_priorities.len(), 6);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let file = write_config(r#"{ "thermal_zone_path": "/sys/class/thermal/thermal_zone0/temp" }"#);
        let cfg = try_load_config(file.path()).unwrap();
        assert_eq!(cfg.thermal_zone_path, PathBuf::from("/sys/class/thermal/thermal_zone0/temp"));
        assert_eq!(cfg.library_names, SensorsConfig::default().library_names);
        assert_eq!(cfg.driver_priorities, default_driver_priorities());
    }

    #[test]
    fn test_custom_priorities() {
        let file = write_config(
            r#"{ "driver_priorities": [ { "prefix": "nct6775", "priority": 2 } ] }"#,
        );
        let cfg = try_load_config(file.path()).unwrap();
        let agg = cfg.aggregator();
        assert_eq!(agg.prioritizer().priority_of_prefix("nct6775"), Some(2));
        assert_eq!(agg.prioritizer().priority_of_prefix("coretemp"), None);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let file = write_config(r#"{ "thermal_zone": "/tmp/x" }"#);
        assert!(matches!(try_load_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = try_load_config(&dir.path().join("config.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_validate_rejects_library_paths() {
        let cfg = SensorsConfig {
            library_names: vec!["/tmp/evil/libsensors.so".to_string()],
            ..SensorsConfig::default()
        };
        assert!(matches!(validate_config(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_lists() {
        let cfg = SensorsConfig { library_names: Vec::new(), ..SensorsConfig::default() };
        assert!(validate_config(&cfg).is_err());

        let cfg = SensorsConfig { driver_priorities: Vec::new(), ..SensorsConfig::default() };
        assert!(validate_config(&cfg).is_err());

        let cfg = SensorsConfig { thermal_zone_path: PathBuf::new(), ..SensorsConfig::default() };
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_prefix() {
        let cfg = SensorsConfig {
            driver_priorities: vec![DriverPriority::new("", 0)],
            ..SensorsConfig::default()
        };
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_too_many_priorities() {
        let cfg = SensorsConfig {
            driver_priorities: (0..=MAX_DRIVER_PRIORITIES)
                .map(|i| DriverPriority::new(format!("drv{}", i), 0))
                .collect(),
            ..SensorsConfig::default()
        };
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    #[serial]
    fn test_config_path_with_xdg() {
        let original = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", "/tmp/test_config");
        assert_eq!(config_path(), PathBuf::from("/tmp/test_config/cputemp/config.json"));
        match original {
            Some(value) => env::set_var("XDG_CONFIG_HOME", value),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    #[test]
    #[serial]
    fn test_config_path_with_home() {
        let original_xdg = env::var("XDG_CONFIG_HOME").ok();
        let original_home = env::var("HOME").ok();
        env::remove_var("XDG_CONFIG_HOME");
        env::set_var("HOME", "/tmp/test_home");
        assert_eq!(config_path(), PathBuf::from("/tmp/test_home/.config/cputemp/config.json"));
        if let Some(value) = original_xdg {
            env::set_var("XDG_CONFIG_HOME", value);
        }
        match original_home {
            Some(value) => env::set_var("HOME", value),
            None => env::remove_var("HOME"),
        }
    }

    fn with_xdg_config<F: FnOnce()>(dir: &tempfile::TempDir, f: F) {
        let original = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", dir.path());
        f();
        match original {
            Some(value) => env::set_var("XDG_CONFIG_HOME", value),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    #[test]
    #[serial]
    fn test_load_config_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        with_xdg_config(&dir, || assert_eq!(load_config(), None));
    }

    #[test]
    #[serial]
    fn test_load_config_ignores_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("cputemp")).unwrap();
        fs::write(dir.path().join("cputemp/config.json"), r#"{ "library_names": [] }"#).unwrap();
        with_xdg_config(&dir, || assert_eq!(load_config(), None));

        fs::write(dir.path().join("cputemp/config.json"), "{ not json").unwrap();
        with_xdg_config(&dir, || assert_eq!(load_config(), None));
    }

    #[test]
    #[serial]
    fn test_load_config_valid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("cputemp")).unwrap();
        fs::write(
            dir.path().join("cputemp/config.json"),
            r#"{ "thermal_zone_path": "/sys/class/thermal/thermal_zone0/temp" }"#,
        )
        .unwrap();
        with_xdg_config(&dir, || {
            let cfg = load_config().unwrap();
            assert_eq!(cfg.thermal_zone_path, PathBuf::from("/sys/class/thermal/thermal_zone0/temp"));
        });
    }
}
