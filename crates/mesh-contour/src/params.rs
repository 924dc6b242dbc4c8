//! Contour extraction parameters.

use crate::error::{ContourError, ContourResult};

/// Precision of generated point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum OutputPrecision {
    /// Same precision as the input points.
    #[default]
    MatchInput,
    /// Always f32.
    Single,
    /// Always f64.
    Double,
}

/// Parameters for contour extraction.
///
/// Merging, attribute interpolation and normals all need per-point
/// identity, so enabling any of them selects the edge-merge extractor;
/// otherwise the faster duplicate-point extractor runs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContourParams {
    /// Share output points between triangles that cross the same mesh edge.
    /// Default: false
    pub merge_points: bool,

    /// Interpolate point arrays and copy cell arrays onto the output.
    /// Default: false
    pub interpolate_attributes: bool,

    /// Generate a unit "Normals" point array. Implies point merging.
    /// Default: false
    pub compute_normals: bool,

    /// Carry the contoured scalar array onto the output points, filled with
    /// the contour value of each point.
    /// Default: false
    pub compute_scalars: bool,

    /// Precision of output point coordinates.
    /// Default: MatchInput
    pub output_precision: OutputPrecision,

    /// Restrict each value to candidate cells from a scalar tree.
    /// Default: false
    pub use_scalar_tree: bool,

    /// Run every phase on the calling thread.
    /// Default: false
    pub sequential: bool,

    /// Bound the worker pool. `None` uses the global rayon pool.
    /// Default: None
    pub num_threads: Option<usize>,

    /// Point array to contour. `None` uses the active scalars.
    /// Default: None
    pub scalar_array: Option<String>,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            merge_points: false,
            interpolate_attributes: false,
            compute_normals: false,
            compute_scalars: false,
            output_precision: OutputPrecision::MatchInput,
            use_scalar_tree: false,
            sequential: false,
            num_threads: None,
            scalar_array: None,
        }
    }
}

impl ContourParams {
    /// Duplicate points, no attributes: the cheapest extraction.
    pub fn fast() -> Self {
        Self::default()
    }

    /// Merged points only.
    pub fn merged() -> Self {
        Self {
            merge_points: true,
            ..Default::default()
        }
    }

    /// Merged points with attributes, scalars and normals.
    pub fn full() -> Self {
        Self {
            merge_points: true,
            interpolate_attributes: true,
            compute_normals: true,
            compute_scalars: true,
            ..Default::default()
        }
    }

    /// Whether the edge-merge extractor is required.
    #[inline]
    pub fn needs_merging(&self) -> bool {
        self.merge_points || self.interpolate_attributes || self.compute_normals
    }

    /// Check parameter consistency.
    pub fn validate(&self) -> ContourResult<()> {
        if self.num_threads == Some(0) {
            return Err(ContourError::invalid_param(
                "num_threads",
                "num_threads must be at least 1",
            ));
        }
        if let Some(name) = &self.scalar_array {
            if name.is_empty() {
                return Err(ContourError::invalid_param(
                    "scalar_array",
                    "scalar array name must not be empty",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(feature = "config")]
impl ContourParams {
    /// Load parameters from a TOML string. Missing fields take defaults.
    pub fn from_toml(toml_str: &str) -> ContourResult<Self> {
        toml::from_str(toml_str).map_err(|e| ContourError::config_parse(e.to_string()))
    }

    /// Load parameters from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> ContourResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ContourError::config_parse(e.to_string()))?;
        Self::from_toml(&contents)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> ContourResult<String> {
        toml::to_string_pretty(self).map_err(|e| ContourError::config_parse(e.to_string()))
    }

    /// Load parameters from a JSON string. Missing fields take defaults.
    pub fn from_json(json_str: &str) -> ContourResult<Self> {
        serde_json::from_str(json_str).map_err(|e| ContourError::config_parse(e.to_string()))
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> ContourResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ContourError::config_parse(e.to_string()))
    }
}
