/// Economy Kernel v1: Configuration
///
/// Passed to the engine at construction and never mutated afterwards.
/// Replaces process-wide default records with explicit values.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{LocationId, ResourceId};

pub const BUILTIN_ECONOMY_CONFIG: &str = include_str!("data/economy_config.json");

/// What production does when an input storage cannot support one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputShortfallPolicy {
    /// Deliver zero this call, no error.
    ZeroOutput,
    /// Legacy behaviour: reject with `InputStorageAmountTooLow`.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomyConfig {
    /// Location used by `create_unit` when none is given.
    pub default_location: Option<LocationId>,
    /// Fuel resource used by `create_processor` when none is given.
    pub default_fuel_resource: Option<ResourceId>,
    pub fuel_per_output_unit: i64,
    pub fuel_per_distance_unit: i64,
    pub input_shortfall: InputShortfallPolicy,
    pub max_name_length: usize,
    pub max_recipe_inputs: usize,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            default_location: None,
            default_fuel_resource: None,
            fuel_per_output_unit: 1,
            fuel_per_distance_unit: 1,
            input_shortfall: InputShortfallPolicy::ZeroOutput,
            max_name_length: 64,
            max_recipe_inputs: 2,
        }
    }
}

impl EconomyConfig {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_ECONOMY_CONFIG)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EconomyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&contents)?;
        tracing::info!(
            target: "economy::config",
            path = %path.display(),
            "economy_config.loaded=file"
        );
        Ok(config)
    }

    /// Load from `path` when given, falling back to the builtin values.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            match Self::from_file(path) {
                Ok(config) => return Ok(config),
                Err(err) => {
                    tracing::warn!(
                        target: "economy::config",
                        path = %path.display(),
                        error = %err,
                        "economy_config.load_failed"
                    );
                }
            }
        }
        tracing::info!(target: "economy::config", "economy_config.loaded=builtin");
        Self::builtin()
    }

    pub fn with_default_location(mut self, location: LocationId) -> Self {
        self.default_location = Some(location);
        self
    }

    pub fn with_default_fuel_resource(mut self, resource: ResourceId) -> Self {
        self.default_fuel_resource = Some(resource);
        self
    }

    pub fn with_input_shortfall(mut self, policy: InputShortfallPolicy) -> Self {
        self.input_shortfall = policy;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fuel_per_output_unit < 0 {
            return Err(ConfigError::Invalid(format!(
                "fuel_per_output_unit must be >= 0, got {}",
                self.fuel_per_output_unit
            )));
        }
        if self.fuel_per_distance_unit < 0 {
            return Err(ConfigError::Invalid(format!(
                "fuel_per_distance_unit must be >= 0, got {}",
                self.fuel_per_distance_unit
            )));
        }
        if self.max_recipe_inputs > 2 {
            return Err(ConfigError::Invalid(format!(
                "max_recipe_inputs supports at most 2, got {}",
                self.max_recipe_inputs
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse economy config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read economy config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid economy config: {0}")]
    Invalid(String),
}
