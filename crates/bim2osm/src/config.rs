// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Converter configuration

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geographic anchor of the working frame origin, in degrees
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoReference {
    pub lat: f64,
    pub lon: f64,
}

impl GeoReference {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    fn validate(&self) -> Result<()> {
        // poles excluded, the local projection has no east direction there
        if !self.lat.is_finite() || self.lat.abs() >= 90.0 || !(-180.0..=180.0).contains(&self.lon) {
            return Err(ConvertError::config(format!(
                "origin ({}, {}) is outside the valid latitude/longitude range",
                self.lat, self.lon
            )));
        }
        Ok(())
    }
}

/// Options for one conversion
///
/// Every field has a default, so a partial JSON document such as
/// `{"merge_tolerance": 1e-6}` is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Strip `/* ... */` comments before loading
    pub remove_block_comments: bool,
    /// Distance in degrees under which two nodes are merged
    pub merge_tolerance: f64,
    /// Polygon vertex count used for circles
    pub curve_segments: usize,
    /// Overrides the site reference latitude/longitude
    pub origin: Option<GeoReference>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            remove_block_comments: true,
            merge_tolerance: 1e-7,
            curve_segments: 16,
            origin: None,
        }
    }
}

impl ConverterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConvertError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_remove_block_comments(mut self, enabled: bool) -> Self {
        self.remove_block_comments = enabled;
        self
    }

    pub fn with_merge_tolerance(mut self, tolerance: f64) -> Self {
        self.merge_tolerance = tolerance;
        self
    }

    pub fn with_curve_segments(mut self, segments: usize) -> Self {
        self.curve_segments = segments;
        self
    }

    pub fn with_origin(mut self, origin: GeoReference) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !self.merge_tolerance.is_finite() || self.merge_tolerance < 0.0 {
            return Err(ConvertError::config(format!(
                "merge_tolerance must be a non-negative number, got {}",
                self.merge_tolerance
            )));
        }
        if self.curve_segments < 3 {
            return Err(ConvertError::config(format!(
                "curve_segments must be at least 3, got {}",
                self.curve_segments
            )));
        }
        if let Some(origin) = &self.origin {
            origin.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConverterConfig::default();
        assert!(config.remove_block_comments);
        assert_eq!(config.merge_tolerance, 1e-7);
        assert_eq!(config.curve_segments, 16);
        assert!(config.origin.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            ConverterConfig::from_json_str(r#"{"curve_segments": 32, "origin": {"lat": 48.1, "lon": 11.5}}"#)
                .unwrap();
        assert_eq!(config.curve_segments, 32);
        assert!(config.remove_block_comments);
        assert_eq!(config.origin, Some(GeoReference::new(48.1, 11.5)));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            ConverterConfig::from_json_str(r#"{"curve_segments": 2}"#),
            Err(ConvertError::Config(_))
        ));
        assert!(ConverterConfig::from_json_str(r#"{"merge_tolerance": -1.0}"#).is_err());
        assert!(ConverterConfig::from_json_str(r#"{"origin": {"lat": 91.0, "lon": 0.0}}"#).is_err());
        assert!(ConverterConfig::from_json_str(r#"{"origin": {"lat": 90.0, "lon": 0.0}}"#).is_err());
        assert!(ConverterConfig::from_json_str(r#"{"origin": {"lat": -90.0, "lon": 0.0}}"#).is_err());
        assert!(ConverterConfig::from_json_str(r#"{"origin": {"lat": 89.5, "lon": 0.0}}"#).is_ok());
        assert!(ConverterConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_builder() {
        let config = ConverterConfig::new()
            .with_remove_block_comments(false)
            .with_merge_tolerance(1e-6)
            .with_origin(GeoReference::new(1.0, 2.0));
        assert!(!config.remove_block_comments);
        assert_eq!(config.merge_tolerance, 1e-6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{"remove_block_comments": false}"#).unwrap();
        let config = ConverterConfig::from_json_file(file.path()).unwrap();
        assert!(!config.remove_block_comments);
    }
}
