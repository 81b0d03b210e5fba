//! Experiment errors

use thiserror::Error;

use super::result::ExperimentResult;

/// Invalid experiment setup
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("The control behavior of experiment '{experiment}' should only be set once")]
    ControlAlreadySet { experiment: String },

    #[error("Experiment '{experiment}' has no control behavior")]
    MissingControl { experiment: String },
}

/// Invalid experiment settings
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Sampling rate must be between 0 and 1, got {0}")]
    InvalidSamplingRate(f64),
}

/// Raised when a run's observations diverge and mismatches are fatal
#[derive(Debug, Error)]
#[error("Observations for '{}' are not equivalent", .result.experiment_name())]
pub struct ObservationMismatchError<A, T, E> {
    result: ExperimentResult<A, T, E>,
}

impl<A, T, E> ObservationMismatchError<A, T, E> {
    pub fn new(result: ExperimentResult<A, T, E>) -> Self {
        Self { result }
    }

    /// Get the mismatching result
    pub fn result(&self) -> &ExperimentResult<A, T, E> {
        &self.result
    }

    /// Consume the error, returning the mismatching result
    pub fn into_result(self) -> ExperimentResult<A, T, E> {
        self.result
    }
}

/// Failure of a single experiment run
#[derive(Debug, Error)]
pub enum RunError<A, T, E> {
    /// The control behavior failed; carries its exact error
    #[error("Control behavior failed: {0}")]
    Control(E),

    #[error("{0}")]
    Mismatch(ObservationMismatchError<A, T, E>),

    #[error("{0}")]
    Configuration(ConfigurationError),
}

impl<A, T, E> RunError<A, T, E> {
    /// Get the control's error, if that is why the run failed
    pub fn control_error(&self) -> Option<&E> {
        match self {
            Self::Control(error) => Some(error),
            _ => None,
        }
    }

    /// Get the mismatch, if that is why the run failed
    pub fn mismatch(&self) -> Option<&ObservationMismatchError<A, T, E>> {
        match self {
            Self::Mismatch(mismatch) => Some(mismatch),
            _ => None,
        }
    }

    /// Check if the run failed on a mismatch
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch(_))
    }

    /// Consume the error, returning the control's error if present
    pub fn into_control_error(self) -> Option<E> {
        match self {
            Self::Control(error) => Some(error),
            _ => None,
        }
    }
}

impl<A, T, E> From<ConfigurationError> for RunError<A, T, E> {
    fn from(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }
}

impl<A, T, E> From<ObservationMismatchError<A, T, E>> for RunError<A, T, E> {
    fn from(error: ObservationMismatchError<A, T, E>) -> Self {
        Self::Mismatch(error)
    }
}
