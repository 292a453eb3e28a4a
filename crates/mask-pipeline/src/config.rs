//! Pipeline configuration.
//!
//! Loaded from YAML, from environment variables, or built in code; every
//! section falls back to its defaults when omitted.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use grid_processor::SinkConfig;
use ocean_common::{GridShape, OceanError, OceanResult, RatioRange};

use crate::pairs::PairRequest;
use crate::sampler::SamplerConfig;

/// Mask generation settings.
pub type MaskConfig = SamplerConfig;

/// Crop/regrid settings for pair building.
pub type PairConfig = PairRequest;

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub masks: MaskConfig,
    pub pairs: PairConfig,
    pub sink: SinkConfig,
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values are ignored, keeping the default.
    pub fn from_env() -> Self {
        let mut config = Self {
            sink: SinkConfig::from_env(),
            ..Default::default()
        };

        let low = env_parse::<f64>("OCEAN_MISSING_RATIO_LOW");
        let high = env_parse::<f64>("OCEAN_MISSING_RATIO_HIGH");
        if low.is_some() || high.is_some() {
            let current = config.masks.missing_ratio_range;
            let low = low.unwrap_or(current.low());
            let high = high.unwrap_or(current.high());
            match RatioRange::new(low, high) {
                Ok(range) => config.masks.missing_ratio_range = range,
                Err(e) => warn!(error = %e, "Ignoring missing ratio range from environment"),
            }
        }

        if let Some(count) = env_parse("OCEAN_MASK_COUNT") {
            config.masks.mask_count = count;
        }

        if let Some(threshold) = env_parse("OCEAN_LAND_THRESHOLD") {
            config.masks.land_threshold = Some(threshold);
        }

        if let Ok(val) = std::env::var("OCEAN_TARGET_GRID") {
            match parse_grid(&val) {
                Some(shape) => config.pairs.target_grid = Some(shape),
                None => warn!(value = %val, "Ignoring OCEAN_TARGET_GRID, expected HxW"),
            }
        }

        config
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> OceanResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            OceanError::io(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> OceanResult<Self> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| OceanError::io(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> OceanResult<()> {
        self.pairs.validate()?;
        self.sink.validate().map_err(OceanError::invalid_range)?;
        Ok(())
    }
}

/// Parse an environment variable, warning when it is set but invalid.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let val = std::env::var(key).ok()?;
    match val.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value = %val, "Ignoring unparseable environment value");
            None
        }
    }
}

/// Parse `"HxW"` (case-insensitive `x`).
fn parse_grid(s: &str) -> Option<GridShape> {
    let lower = s.to_lowercase();
    let (h, w) = lower.split_once('x')?;
    Some(GridShape::new(h.trim().parse().ok()?, w.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_processor::ZarrCompression;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.masks.mask_count, 360);
        assert_eq!(config.masks.missing_ratio_range, RatioRange::default());
        assert!(config.pairs.target_grid.is_none());
        assert_eq!(config.sink.compression, ZarrCompression::BloscZstd);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
masks:
  missing_ratio_range: [0.2, 0.5]
  mask_count: 20
pairs:
  latitude_range: [-10.0, 10.0]
  target_grid: [32, 64]
sink:
  compression: none
"#;
        let config = PipelineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.masks.missing_ratio_range.low(), 0.2);
        assert_eq!(config.masks.mask_count, 20);
        assert_eq!(config.pairs.target_grid, Some(GridShape::new(32, 64)));
        assert_eq!(config.sink.compression, ZarrCompression::None);
        assert!(config.sink.shuffle);
    }

    #[test]
    fn test_from_yaml_rejects_inverted_range() {
        let yaml = "masks:\n  missing_ratio_range: [0.6, 0.1]\n";
        let err = PipelineConfig::from_yaml_str(yaml).unwrap_err();
        assert_eq!(err.kind(), ocean_common::ErrorKind::InvalidRange);
    }

    #[test]
    fn test_from_yaml_malformed_is_io_failure() {
        let err = PipelineConfig::from_yaml_str("masks: [unclosed").unwrap_err();
        assert_eq!(err.kind(), ocean_common::ErrorKind::IoFailure);
        assert!(err.to_string().contains("Failed to parse configuration"));
    }

    #[test]
    fn test_from_yaml_missing_file() {
        let err = PipelineConfig::from_yaml("/definitely/not/here.yaml").unwrap_err();
        assert_eq!(err.kind(), ocean_common::ErrorKind::IoFailure);
    }

    #[test]
    fn test_parse_grid() {
        assert_eq!(parse_grid("64x128"), Some(GridShape::new(64, 128)));
        assert_eq!(parse_grid("64X128"), Some(GridShape::new(64, 128)));
        assert_eq!(parse_grid("64"), None);
        assert_eq!(parse_grid("ax1"), None);
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("OCEAN_MASK_COUNT", "42");
        std::env::set_var("OCEAN_MISSING_RATIO_LOW", "0.05");
        std::env::set_var("OCEAN_TARGET_GRID", "16x24");
        let config = PipelineConfig::from_env();
        std::env::remove_var("OCEAN_MASK_COUNT");
        std::env::remove_var("OCEAN_MISSING_RATIO_LOW");
        std::env::remove_var("OCEAN_TARGET_GRID");

        assert_eq!(config.masks.mask_count, 42);
        assert_eq!(config.masks.missing_ratio_range.low(), 0.05);
        assert_eq!(config.masks.missing_ratio_range.high(), 0.6);
        assert_eq!(config.pairs.target_grid, Some(GridShape::new(16, 24)));

        std::env::set_var("OCEAN_MASK_COUNT", "lots");
        std::env::set_var("OCEAN_LAND_THRESHOLD", "-3");
        let config = PipelineConfig::from_env();
        std::env::remove_var("OCEAN_MASK_COUNT");
        std::env::remove_var("OCEAN_LAND_THRESHOLD");

        assert_eq!(config.masks.mask_count, 360);
        assert!(config.masks.land_threshold.is_none());
    }
}
