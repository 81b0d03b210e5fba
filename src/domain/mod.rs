//! Domain layer - Core experiment engine

pub mod experiment;

pub use experiment::{
    Behavior, BehaviorId, ConfigurationError, Experiment, ExperimentResult, Instrumented,
    Observation, ObservationMismatchError, Publisher, RunError, Settings,
};
