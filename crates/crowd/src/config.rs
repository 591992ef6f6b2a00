use std::path::Path;

use serde::{Deserialize, Serialize};
use weave_kernel::{ConfigError, SimParams, load_file};

use crate::population::PopulationConfig;

/// Everything needed to set up a run: simulation constants and the demo
/// population. Missing sections fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub sim: SimParams,
    pub population: PopulationConfig,
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sim.validate()?;
        self.population.validate()
    }

    /// Load and validate a YAML or JSON scenario file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config: Self = load_file(path)?;
        config.validate()?;
        tracing::info!(path = %path.display(), "scenario loaded");
        Ok(config)
    }
}
