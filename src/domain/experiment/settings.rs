//! Defaults shared by all experiments

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::error::SettingsError;

/// Experiment defaults
///
/// Experiments copy these values when they are constructed; changing the
/// process-wide defaults afterwards does not affect existing experiments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Probability that candidates run alongside the control (1.0 = always)
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
    /// Fail runs whose observations do not match
    #[serde(default)]
    pub raise_on_mismatch: bool,
}

fn default_sampling_rate() -> f64 {
    1.0
}

impl Settings {
    pub const DEFAULT: Settings = Settings {
        sampling_rate: 1.0,
        raise_on_mismatch: false,
    };

    /// Set the sampling rate
    pub fn with_sampling_rate(mut self, sampling_rate: f64) -> Self {
        self.sampling_rate = sampling_rate;
        self
    }

    /// Set whether mismatches fail the run
    pub fn with_raise_on_mismatch(mut self, raise_on_mismatch: bool) -> Self {
        self.raise_on_mismatch = raise_on_mismatch;
        self
    }

    /// Check that the sampling rate is a probability
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&self.sampling_rate) {
            return Err(SettingsError::InvalidSamplingRate(self.sampling_rate));
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static GLOBAL: RwLock<Settings> = RwLock::new(Settings::DEFAULT);

/// Current process-wide defaults
pub fn global() -> Settings {
    *GLOBAL.read().unwrap_or_else(PoisonError::into_inner)
}

/// Replace the process-wide defaults
pub fn set_global(settings: Settings) -> Result<(), SettingsError> {
    settings.validate()?;
    *GLOBAL.write().unwrap_or_else(PoisonError::into_inner) = settings;
    tracing::debug!(
        sampling_rate = settings.sampling_rate,
        raise_on_mismatch = settings.raise_on_mismatch,
        "Updated global experiment settings"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.sampling_rate, 1.0);
        assert!(!settings.raise_on_mismatch);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(Settings::default().with_sampling_rate(0.0).validate().is_ok());
        assert!(Settings::default().with_sampling_rate(1.0).validate().is_ok());
        assert_eq!(
            Settings::default().with_sampling_rate(1.5).validate(),
            Err(SettingsError::InvalidSamplingRate(1.5))
        );
        assert!(Settings::default().with_sampling_rate(-0.1).validate().is_err());
        assert!(Settings::default().with_sampling_rate(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_set_global_rejects_invalid() {
        assert!(set_global(Settings::default().with_sampling_rate(2.0)).is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"raise_on_mismatch": true}"#).unwrap();

        assert_eq!(settings.sampling_rate, 1.0);
        assert!(settings.raise_on_mismatch);
    }
}
