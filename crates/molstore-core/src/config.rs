use crate::index::kdtree::Metric;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Parameters of the covalent connectivity test and of automatic bond calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BondingConfig {
    /// Tolerance added to the sum of covalent radii for the upper distance bound.
    pub upper_tolerance: f32,
    /// Tolerance subtracted from the sum of covalent radii for the lower distance bound.
    pub lower_tolerance: f32,
    /// Distance below which two coarse-grained beads are considered connected.
    pub cg_cutoff: f32,
    /// Residues with more atoms are skipped by automatic intra-residue bonding.
    pub max_residue_atoms: usize,
    /// Residues with more atoms use a k-d tree instead of all pairs for automatic bonding.
    pub kdtree_threshold: usize,
    /// Search radius for bonds between hetero residues and their neighbors.
    pub hetero_search_radius: f32,
}

impl Default for BondingConfig {
    fn default() -> Self {
        Self {
            upper_tolerance: 0.3,
            lower_tolerance: 0.5,
            cg_cutoff: 8.0,
            max_residue_atoms: 500,
            kdtree_threshold: 50,
            hetero_search_radius: 4.0,
        }
    }
}

impl BondingConfig {
    pub fn cg_cutoff_squared(&self) -> f32 {
        self.cg_cutoff * self.cg_cutoff
    }
}

/// Parameters of the spatial grid index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpatialConfig {
    /// Grid cells are `2^cell_exponent` Angstrom wide.
    pub cell_exponent: u32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self { cell_exponent: 3 }
    }
}

/// Tunable parameters of a structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructureConfig {
    pub bonding: BondingConfig,
    pub spatial: SpatialConfig,
}

impl StructureConfig {
    /// Loads a configuration from a TOML file. Missing keys take their default values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bonding = &self.bonding;
        if !(bonding.upper_tolerance >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "bonding.upper_tolerance",
                reason: format!("must be non-negative, got {}", bonding.upper_tolerance),
            });
        }
        if !(bonding.lower_tolerance >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "bonding.lower_tolerance",
                reason: format!("must be non-negative, got {}", bonding.lower_tolerance),
            });
        }
        if !(bonding.hetero_search_radius > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "bonding.hetero_search_radius",
                reason: format!("must be positive, got {}", bonding.hetero_search_radius),
            });
        }
        if self.spatial.cell_exponent > 8 {
            return Err(ConfigError::InvalidParameter {
                name: "spatial.cell_exponent",
                reason: format!("must be at most 8, got {}", self.spatial.cell_exponent),
            });
        }
        Ok(())
    }
}

/// Parameters of a contact search between two structure views.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactConfig {
    pub max_distance: f32,
    pub min_distance: Option<f32>,
    pub max_neighbors: Option<usize>,
    pub metric: Metric,
}

#[derive(Default)]
pub struct ContactConfigBuilder {
    max_distance: Option<f32>,
    min_distance: Option<f32>,
    max_neighbors: Option<usize>,
    metric: Option<Metric>,
}

impl ContactConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_distance(mut self, distance: f32) -> Self {
        self.max_distance = Some(distance);
        self
    }
    pub fn min_distance(mut self, distance: f32) -> Self {
        self.min_distance = Some(distance);
        self
    }
    pub fn max_neighbors(mut self, n: usize) -> Self {
        self.max_neighbors = Some(n);
        self
    }
    pub fn metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn build(self) -> Result<ContactConfig, ConfigError> {
        let max_distance = self
            .max_distance
            .ok_or(ConfigError::MissingParameter("max_distance"))?;
        if !(max_distance > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "max_distance",
                reason: format!("must be positive, got {max_distance}"),
            });
        }
        if let Some(min_distance) = self.min_distance {
            if !(min_distance >= 0.0 && min_distance < max_distance) {
                return Err(ConfigError::InvalidParameter {
                    name: "min_distance",
                    reason: format!("must be in [0, {max_distance}), got {min_distance}"),
                });
            }
        }
        if self.max_neighbors == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "max_neighbors",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(ContactConfig {
            max_distance,
            min_distance: self.min_distance,
            max_neighbors: self.max_neighbors,
            metric: self.metric.unwrap_or(Metric::Euclidean),
        })
    }
}
