//! Experiment domain module for refactoring experiments
//!
//! An experiment runs a trusted control behavior alongside candidate
//! behaviors, returns the control's outcome, and publishes whether the
//! candidates agreed with it.

mod behavior;
mod compare;
mod entity;
mod error;
mod observation;
mod publisher;
mod result;
mod sampling;
pub mod settings;
mod timer;

// Re-export all public types
pub use behavior::{Behavior, BehaviorId};
pub use compare::Comparator;
pub use entity::{Experiment, Instrumented};
pub use error::{ConfigurationError, ObservationMismatchError, RunError, SettingsError};
pub use observation::Observation;
pub use publisher::{CompositePublisher, FnPublisher, LogPublisher, Publisher};
pub use result::ExperimentResult;
pub use sampling::{Randomness, SeededRandomness, ThreadRandomness};
pub use settings::Settings;
pub use timer::{Clock, SystemClock, Timer};
