use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid parameter `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Social-force constants and numerical guards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Relaxation time τ of the driving force, in seconds.
    pub relaxation_time: f32,
    /// Interaction strength A.
    pub interaction_strength: f32,
    /// Interaction decay range B.
    pub interaction_range: f32,
    /// Separations below this contribute no force or exposure.
    pub separation_epsilon: f32,
    /// Infectivity above which an agent is displayed as infected.
    pub infected_threshold: f32,
    pub infection: InfectionParams,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            relaxation_time: 0.5,
            interaction_strength: 20.0,
            interaction_range: 0.5,
            separation_epsilon: 1e-6,
            infected_threshold: 0.2,
            infection: InfectionParams::default(),
        }
    }
}

/// Constants of the infectivity/immunity dynamics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfectionParams {
    pub enabled: bool,
    /// Neighbours closer than this expose each other.
    pub range: f32,
    /// Immunity suppression of infectivity (`a`).
    pub suppression: f32,
    /// Infectivity-driven immunity response (`γ`).
    pub immunity_gain: f32,
    /// Baseline immunity growth rate (`u`).
    pub immunity_growth: f32,
}

impl Default for InfectionParams {
    fn default() -> Self {
        Self {
            enabled: true,
            range: 1.0,
            suppression: 0.0,
            immunity_gain: -0.5,
            immunity_growth: 0.1,
        }
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.into(),
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be finite and > 0, got {value}")))
    }
}

fn finite(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(name, format!("must be finite, got {value}")))
    }
}

impl SimParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("relaxation_time", self.relaxation_time)?;
        positive("interaction_range", self.interaction_range)?;
        positive("separation_epsilon", self.separation_epsilon)?;
        finite("interaction_strength", self.interaction_strength)?;
        if self.interaction_strength < 0.0 {
            return Err(invalid("interaction_strength", "must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.infected_threshold) {
            return Err(invalid(
                "infected_threshold",
                format!("must lie in [0, 1], got {}", self.infected_threshold),
            ));
        }
        positive("infection.range", self.infection.range)?;
        finite("infection.suppression", self.infection.suppression)?;
        finite("infection.immunity_gain", self.infection.immunity_gain)?;
        finite("infection.immunity_growth", self.infection.immunity_growth)?;
        Ok(())
    }

    /// Load and validate parameters from a YAML or JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let params: Self = load_file(path)?;
        params.validate()?;
        Ok(params)
    }
}

/// Deserialize a config file, choosing JSON for `.json` and YAML otherwise.
pub fn load_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&text)?)
    } else {
        Ok(serde_yaml::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_reference_constants() {
        let p = SimParams::default();
        assert_eq!(p.relaxation_time, 0.5);
        assert_eq!(p.interaction_strength, 20.0);
        assert_eq!(p.interaction_range, 0.5);
        assert_eq!(p.infected_threshold, 0.2);
        assert_eq!(p.infection.range, 1.0);
        assert_eq!(p.infection.suppression, 0.0);
        assert_eq!(p.infection.immunity_gain, -0.5);
        assert_eq!(p.infection.immunity_growth, 0.1);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let p = SimParams {
            relaxation_time: 0.0,
            ..SimParams::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ConfigError::Invalid { name: "relaxation_time", .. })
        ));

        let p = SimParams {
            infected_threshold: 1.5,
            ..SimParams::default()
        };
        assert!(p.validate().is_err());

        let mut p = SimParams::default();
        p.infection.range = f32::NAN;
        assert!(matches!(
            p.validate(),
            Err(ConfigError::Invalid { name: "infection.range", .. })
        ));
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "interaction_strength: 10.0\ninfection:\n  suppression: 0.3").unwrap();
        let p = SimParams::load(file.path()).unwrap();
        assert_eq!(p.interaction_strength, 10.0);
        assert_eq!(p.infection.suppression, 0.3);
        assert_eq!(p.relaxation_time, 0.5);
        assert!(p.infection.enabled);
    }

    #[test]
    fn json_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"relaxation_time": 0.25, "infection": {{"enabled": false}}}}"#).unwrap();
        let p = SimParams::load(file.path()).unwrap();
        assert_eq!(p.relaxation_time, 0.25);
        assert!(!p.infection.enabled);
    }

    #[test]
    fn load_rejects_invalid_file_contents() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "interaction_range: -1.0").unwrap();
        assert!(matches!(
            SimParams::load(file.path()),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SimParams::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
