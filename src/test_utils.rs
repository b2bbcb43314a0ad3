/*
 * Test utilities and mock helpers for cputemp
 *
 * This module provides common test utilities, mock objects, and helper functions
 * that can be used across different test modules.
 */

#[cfg(test)]
pub mod test_utils {
    use crate::library::{Chip, MockSensorLibrary, SubFeature};
    use crate::library::Feature;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Writes a thermal zone file with the given content into `dir`
    pub fn thermal_zone(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("temp");
        fs::write(&path, content).expect("write thermal zone");
        path
    }

    /// Creates a mock library that detects `chips`, each given as a driver
    /// prefix and its `tempN` readings in Celsius.
    ///
    /// Chip handles are the chip's position; sub-feature numbers encode the
    /// chip and feature position so `value` can find the reading again.
    pub fn fake_library(chips: Vec<(&str, Vec<(&str, f64)>)>) -> MockSensorLibrary {
        let chips: Vec<(String, Vec<(String, f64)>)> = chips
            .into_iter()
            .map(|(prefix, temps)| {
                let temps = temps.into_iter().map(|(name, value)| (name.to_string(), value)).collect();
                (prefix.to_string(), temps)
            })
            .collect();

        let mut lib = MockSensorLibrary::new();

        let detected: Vec<String> = chips.iter().map(|(prefix, _)| prefix.clone()).collect();
        lib.expect_next_chip().returning(move |cursor| {
            let idx = *cursor as usize;
            *cursor += 1;
            detected.get(idx).map(|prefix| Chip::new(prefix.clone(), idx))
        });

        let features: Vec<Vec<String>> = chips
            .iter()
            .map(|(_, temps)| temps.iter().map(|(name, _)| name.clone()).collect())
            .collect();
        lib.expect_next_feature().returning(move |chip, cursor| {
            let idx = *cursor as usize;
            *cursor += 1;
            let name = features.get(chip.handle())?.get(idx)?;
            Some(Feature::temperature(name.clone(), idx as i32))
        });

        lib.expect_subfeature().returning(|chip, feature, kind| {
            let number = (chip.handle() * 1000) as i32 + feature.number();
            Some(SubFeature::new(format!("{}_input", feature.name()), number, kind))
        });

        let values: Vec<Vec<f64>> = chips
            .iter()
            .map(|(_, temps)| temps.iter().map(|(_, value)| *value).collect())
            .collect();
        lib.expect_value().returning(move |chip, sub| {
            let feature = (sub.number() % 1000) as usize;
            values
                .get(chip.handle())
                .and_then(|temps| temps.get(feature))
                .copied()
                .ok_or(-1)
        });

        lib
    }

    /// Creates a mock library with no chips that expects exactly `inits` init
    /// calls, each returning `init_status`, and `cleanups` cleanup calls
    pub fn counting_library(init_status: i32, inits: usize, cleanups: usize) -> MockSensorLibrary {
        let mut lib = MockSensorLibrary::new();
        lib.expect_init().times(inits).return_const(init_status);
        lib.expect_cleanup().times(cleanups).return_const(());
        lib.expect_next_chip().returning(|_| None);
        lib
    }

    #[test]
    fn test_fake_library_reads_back_values() {
        use crate::library::SensorLibrary;

        let lib = fake_library(vec![("coretemp", vec![("temp1", 42.0), ("temp2", 40.0)])]);
        let lib: &dyn SensorLibrary = &lib;
        let chips: Vec<Chip> = lib.detected_chips().collect();
        assert_eq!(chips.len(), 1);
        assert_eq!(chips[0].prefix(), "coretemp");

        let features: Vec<Feature> = lib.features(&chips[0]).collect();
        assert_eq!(features.len(), 2);
        let sub = lib.subfeature(&chips[0], &features[1], 0).unwrap();
        assert_eq!(lib.value(&chips[0], &sub), Ok(40.0));
    }
}
