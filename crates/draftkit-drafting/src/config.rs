//! Drawing configuration, loadable from TOML.
//!
//! Every section has defaults, so an empty file is a valid configuration:
//!
//! ```toml
//! [features]
//! dihedral_threshold_deg = 30.0
//!
//! [decimation]
//! target_ratio = 0.5
//!
//! [dimensions]
//! decimal_places = 1
//! show_unit = true
//! ```

use std::path::Path;

use draftkit_mesh::{DecimationSettings, FeatureEdgeSettings};
use serde::{Deserialize, Serialize};

use crate::arc_fit::ArcFitSettings;
use crate::error::{DraftingError, Result};
use crate::hidden_line::ProjectionSettings;
use crate::placement::DimensionStyle;

/// All settings for [`crate::generate_drawing`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftingConfig {
    /// Feature edge extraction.
    pub features: FeatureEdgeSettings,
    /// Mesh simplification before extraction. Skipped when absent.
    pub decimation: Option<DecimationSettings>,
    /// View projection.
    pub projection: ProjectionSettings,
    /// Circle and arc detection.
    pub arcs: ArcFitSettings,
    /// Dimension layout and labels.
    pub dimensions: DimensionStyle,
}

impl DraftingConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        let invalid = |e: draftkit_mesh::MeshError| DraftingError::InvalidConfig(e.to_string());
        self.features.validate().map_err(invalid)?;
        if let Some(decimation) = &self.decimation {
            decimation.validate().map_err(invalid)?;
        }

        if !(self.projection.degenerate_epsilon > 0.0) {
            return Err(DraftingError::InvalidConfig(format!(
                "degenerate_epsilon must be positive, got {}",
                self.projection.degenerate_epsilon
            )));
        }

        let arcs = &self.arcs;
        if !(arcs.chain_tolerance > 0.0) || !(arcs.relative_tolerance > 0.0) {
            return Err(DraftingError::InvalidConfig(
                "arc tolerances must be positive".into(),
            ));
        }
        if arcs.min_segments < 3 {
            return Err(DraftingError::InvalidConfig(format!(
                "min_segments must be at least 3, got {}",
                arcs.min_segments
            )));
        }
        if arcs.max_iterations == 0 {
            return Err(DraftingError::InvalidConfig(
                "max_iterations must be at least 1".into(),
            ));
        }

        self.dimensions.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = DraftingConfig::from_toml_str("").unwrap();
        assert_eq!(config, DraftingConfig::default());
        assert!(config.decimation.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config = DraftingConfig::from_toml_str(
            r#"
            [features]
            dihedral_threshold_deg = 35.0

            [decimation]
            target_ratio = 0.5

            [projection.mirror]
            horizontal = true

            [dimensions]
            decimal_places = 1
            show_unit = true
            "#,
        )
        .unwrap();
        assert_eq!(config.features.dihedral_threshold_deg, 35.0);
        let decimation = config.decimation.unwrap();
        assert_eq!(decimation.target_ratio, 0.5);
        assert_eq!(decimation.min_triangles, 100);
        assert!(config.projection.mirror.horizontal);
        assert!(!config.projection.mirror.vertical);
        assert_eq!(config.dimensions.decimal_places, 1);
        assert_eq!(config.dimensions.layer_stride, 8.0);
        assert_eq!(config.arcs.min_segments, 8);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let err = DraftingConfig::from_toml_str("[features]\ndihedral_threshold_deg = 270.0\n")
            .unwrap_err();
        assert!(matches!(err, DraftingError::InvalidConfig(_)));

        let err = DraftingConfig::from_toml_str("[decimation]\ntarget_ratio = 0.0\n").unwrap_err();
        assert!(matches!(err, DraftingError::InvalidConfig(_)));

        let err = DraftingConfig::from_toml_str("[dimensions]\nmax_layers = 0\n").unwrap_err();
        assert!(matches!(err, DraftingError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = DraftingConfig::from_toml_str("[features\n").unwrap_err();
        assert!(matches!(err, DraftingError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = DraftingConfig::from_toml_file("/nonexistent/draftkit.toml").unwrap_err();
        assert!(matches!(err, DraftingError::Io(_)));
    }
}
