//! Observations: the recorded outcome of one behavior execution

use std::any::Any;
use std::time::Duration;

/// What a behavior execution produced
#[derive(Debug)]
enum Outcome<T, E> {
    Returned(Result<T, E>),
    Panicked(String),
}

/// Outcome and elapsed time of a single behavior execution
///
/// Holds a value, an error, or the message of a panic that unwound out of
/// the behavior. Observations have no notion of equality; two runs that
/// produce identical outcomes are still distinct observations.
#[derive(Debug)]
pub struct Observation<T, E> {
    outcome: Outcome<T, E>,
    duration: Duration,
}

impl<T, E> Observation<T, E> {
    /// Create an observation from a behavior outcome
    pub fn new(outcome: Result<T, E>, duration: Duration) -> Self {
        Self {
            outcome: Outcome::Returned(outcome),
            duration,
        }
    }

    /// Create a successful observation
    pub fn value(value: T, duration: Duration) -> Self {
        Self::new(Ok(value), duration)
    }

    /// Create a failed observation
    pub fn error(error: E, duration: Duration) -> Self {
        Self::new(Err(error), duration)
    }

    /// Create an observation for a behavior that panicked
    pub fn panicked(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            outcome: Outcome::Panicked(message.into()),
            duration,
        }
    }

    /// Get the returned outcome, `None` if the behavior panicked
    pub fn outcome(&self) -> Option<&Result<T, E>> {
        match &self.outcome {
            Outcome::Returned(outcome) => Some(outcome),
            Outcome::Panicked(_) => None,
        }
    }

    /// Get the value if the behavior succeeded
    pub fn as_value(&self) -> Option<&T> {
        self.outcome().and_then(|outcome| outcome.as_ref().ok())
    }

    /// Get the error if the behavior returned one
    pub fn as_error(&self) -> Option<&E> {
        self.outcome().and_then(|outcome| outcome.as_ref().err())
    }

    /// Get the panic message if the behavior panicked
    pub fn panic_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Panicked(message) => Some(message),
            Outcome::Returned(_) => None,
        }
    }

    /// Check if the behavior failed, by error or by panic
    pub fn is_error(&self) -> bool {
        !matches!(self.outcome, Outcome::Returned(Ok(_)))
    }

    /// Check if the behavior panicked
    pub fn is_panic(&self) -> bool {
        matches!(self.outcome, Outcome::Panicked(_))
    }

    /// Get the elapsed time
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Consume the observation, returning the outcome if the behavior returned
    pub fn into_outcome(self) -> Option<Result<T, E>> {
        match self.outcome {
            Outcome::Returned(outcome) => Some(outcome),
            Outcome::Panicked(_) => None,
        }
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
