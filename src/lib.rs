//! PMP Scientist
//!
//! Refactor critical code paths with confidence:
//! - Run a trusted control behavior alongside candidate behaviors
//! - Always return the control's outcome to the caller
//! - Publish whether the candidates agreed, with timings and errors
//! - Sample candidates probabilistically to bound their cost

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::experiment::{
    Behavior, ConfigurationError, Experiment, ExperimentResult, Instrumented, Observation,
    ObservationMismatchError, Publisher, RunError, Settings,
};
