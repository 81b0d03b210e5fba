//! Experiment entity: runs a control alongside candidates and compares them

use std::fmt;
use std::panic;
use std::sync::Arc;

use tracing::{debug, warn};

use super::behavior::Behavior;
use super::compare::Comparator;
use super::error::{ConfigurationError, ObservationMismatchError, RunError};
use super::observation::Observation;
use super::publisher::{LogPublisher, Publisher};
use super::result::ExperimentResult;
use super::sampling::{Randomness, ThreadRandomness};
use super::settings::{self, Settings};
use super::timer::{Clock, SystemClock};

const DEFAULT_NAME: &str = "experiment";

// ============================================================================
// Experiment
// ============================================================================

/// A refactoring experiment
///
/// The control behavior's outcome is always what callers observe. Candidates
/// run alongside it on sampled invocations, and every run is published with
/// a verdict on whether the candidates agreed with the control.
///
/// Configuration methods take `self` or `&mut self`, so an experiment is
/// fully configured before it can be shared between threads.
pub struct Experiment<A, T, E> {
    name: Option<Arc<str>>,
    control: Option<Behavior<A, T, E>>,
    behaviors: Vec<Behavior<A, T, E>>,
    comparator: Comparator<T, E>,
    context: Arc<serde_json::Value>,
    sampling_rate: f64,
    raise_on_mismatch: bool,
    publisher: Arc<dyn Publisher<A, T, E>>,
    randomness: Arc<dyn Randomness>,
    clock: Arc<dyn Clock>,
}

impl<A, T: PartialEq + 'static, E: 'static> Experiment<A, T, E> {
    /// Create an experiment around a control behavior
    pub fn new(control: Behavior<A, T, E>) -> Self {
        let mut experiment = Self::compared_by(|a: &T, b: &T| a == b);
        experiment.control = Some(control.clone());
        experiment.add_behavior(control);
        experiment
    }

    /// Create an experiment from a set of behaviors, without a control yet
    pub fn from_behaviors(behaviors: impl IntoIterator<Item = Behavior<A, T, E>>) -> Self {
        Self::compared_by(|a: &T, b: &T| a == b).with_behaviors(behaviors)
    }
}

impl<A, T: 'static, E: 'static> Experiment<A, T, E> {
    /// Create an empty experiment that compares values with `compare`
    pub fn compared_by<F>(compare: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let defaults = settings::global();

        Self {
            name: None,
            control: None,
            behaviors: Vec::new(),
            comparator: Comparator::new(compare),
            context: Arc::new(serde_json::Value::Object(serde_json::Map::new())),
            sampling_rate: defaults.sampling_rate,
            raise_on_mismatch: defaults.raise_on_mismatch,
            publisher: Arc::new(LogPublisher),
            randomness: Arc::new(ThreadRandomness),
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Replace the value comparison predicate
    pub fn with_compare<F>(mut self, compare: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.comparator = self.comparator.with_values(compare);
        self
    }

    /// Replace the error category predicate
    pub fn with_error_compare<F>(mut self, compare: F) -> Self
    where
        F: Fn(&E, &E) -> bool + Send + Sync + 'static,
    {
        self.comparator = self.comparator.with_errors(compare);
        self
    }
}

impl<A, T, E> Experiment<A, T, E> {
    // Builder methods

    /// Set the experiment name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Arc::from(name.into()));
        self
    }

    /// Add a candidate behavior
    pub fn with_candidate(mut self, candidate: Behavior<A, T, E>) -> Self {
        self.add_behavior(candidate);
        self
    }

    /// Add several behaviors
    pub fn with_behaviors(mut self, behaviors: impl IntoIterator<Item = Behavior<A, T, E>>) -> Self {
        for behavior in behaviors {
            self.add_behavior(behavior);
        }
        self
    }

    /// Set the control behavior
    pub fn with_control(mut self, control: Behavior<A, T, E>) -> Result<Self, ConfigurationError> {
        self.set_control(control)?;
        Ok(self)
    }

    /// Attach caller data for publishers
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Arc::new(context);
        self
    }

    /// Set the probability that candidates run, clamped to `[0, 1]`
    pub fn with_sampling_rate(mut self, sampling_rate: f64) -> Self {
        self.sampling_rate = if sampling_rate.is_nan() {
            0.0
        } else {
            sampling_rate.clamp(0.0, 1.0)
        };
        self
    }

    /// Set whether mismatches fail the run
    pub fn with_raise_on_mismatch(mut self, raise_on_mismatch: bool) -> Self {
        self.raise_on_mismatch = raise_on_mismatch;
        self
    }

    /// Override both defaults from explicit settings
    pub fn with_settings(self, settings: Settings) -> Self {
        self.with_sampling_rate(settings.sampling_rate)
            .with_raise_on_mismatch(settings.raise_on_mismatch)
    }

    /// Set the publisher
    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher<A, T, E>>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Set the randomness source
    pub fn with_randomness(mut self, randomness: Arc<dyn Randomness>) -> Self {
        self.randomness = randomness;
        self
    }

    /// Set the clock used to time behaviors
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // Configuration

    /// Assign the control behavior
    ///
    /// Fails if a control has already been assigned.
    pub fn set_control(&mut self, control: Behavior<A, T, E>) -> Result<(), ConfigurationError> {
        if self.control.is_some() {
            return Err(ConfigurationError::ControlAlreadySet {
                experiment: self.name().to_string(),
            });
        }

        debug!(experiment = %self.name(), control = %control.name(), "Control behavior assigned");
        self.control = Some(control.clone());
        self.add_behavior(control);
        Ok(())
    }

    /// Assign the control and wrap the experiment into a callable
    pub fn wrap(mut self, control: Behavior<A, T, E>) -> Result<Instrumented<A, T, E>, ConfigurationError> {
        self.set_control(control)?;
        Ok(Instrumented {
            experiment: Arc::new(self),
        })
    }

    fn add_behavior(&mut self, behavior: Behavior<A, T, E>) {
        if !self.behaviors.iter().any(|b| b.is(&behavior)) {
            self.behaviors.push(behavior);
        }
    }

    // Getters

    /// Get the experiment name, defaulting to the control's name
    pub fn name(&self) -> &str {
        if let Some(name) = &self.name {
            return name;
        }

        self.control.as_ref().map_or(DEFAULT_NAME, |control| control.name())
    }

    /// Get the control behavior
    pub fn control(&self) -> Option<&Behavior<A, T, E>> {
        self.control.as_ref()
    }

    /// Get all registered behaviors, control included
    pub fn behaviors(&self) -> &[Behavior<A, T, E>] {
        &self.behaviors
    }

    /// Get the caller-supplied context
    pub fn context(&self) -> &serde_json::Value {
        &self.context
    }

    /// Get the candidate sampling rate
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Check if mismatches fail the run
    pub fn raise_on_mismatch(&self) -> bool {
        self.raise_on_mismatch
    }

    // Execution

    /// Check whether two observations are equivalent
    pub fn compare(&self, control: &Observation<T, E>, candidate: &Observation<T, E>) -> bool {
        self.comparator.compare(control, candidate)
    }

    /// Decide whether candidates run on this invocation
    pub fn should_sample(&self) -> bool {
        self.behaviors.len() > 1 && self.randomness.draw() < self.sampling_rate
    }

    /// Pick the behaviors for one invocation, in execution order
    ///
    /// Either every behavior in a shuffled order, or the control alone.
    pub fn schedule(&self) -> Result<Vec<Behavior<A, T, E>>, ConfigurationError> {
        let control = self.require_control()?;

        if !self.should_sample() {
            return Ok(vec![control.clone()]);
        }

        let mut order: Vec<usize> = (0..self.behaviors.len()).collect();
        self.randomness.shuffle(&mut order);

        Ok(order.into_iter().map(|index| self.behaviors[index].clone()).collect())
    }

    /// Run the experiment
    ///
    /// Returns the control's value, or its exact error. With
    /// `raise_on_mismatch` set, a divergent candidate fails the run with
    /// [`ObservationMismatchError`] instead, even when the control failed.
    ///
    /// Candidate panics are recorded as mismatches. A control panic is
    /// resumed once every scheduled behavior has run and the result has been
    /// published.
    pub fn run(&self, args: A) -> Result<T, RunError<A, T, E>> {
        let control = self.require_control()?.id();
        let schedule = self.schedule()?;

        let mut result = ExperimentResult::new(
            self.shared_name(),
            control,
            Arc::clone(&self.context),
            self.comparator.clone(),
            schedule,
            args,
        );

        let control_panic = result.run_scheduled(self.clock.as_ref());
        self.publisher.publish(&result);

        if let Some(payload) = control_panic {
            panic::resume_unwind(payload);
        }

        if self.raise_on_mismatch && !result.all_equivalent_to_control() {
            warn!(experiment = %self.name(), run_id = %result.run_id(), "Raising on mismatch");
            return Err(ObservationMismatchError::new(result).into());
        }

        match result.into_control_outcome() {
            Some(outcome) => outcome.map_err(RunError::Control),
            None => Err(self.missing_control().into()),
        }
    }

    fn require_control(&self) -> Result<&Behavior<A, T, E>, ConfigurationError> {
        self.control.as_ref().ok_or_else(|| self.missing_control())
    }

    fn missing_control(&self) -> ConfigurationError {
        ConfigurationError::MissingControl {
            experiment: self.name().to_string(),
        }
    }

    fn shared_name(&self) -> Arc<str> {
        match &self.name {
            Some(name) => Arc::clone(name),
            None => Arc::from(self.name()),
        }
    }
}

impl<A, T, E> fmt::Debug for Experiment<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Experiment")
            .field("name", &self.name())
            .field("control", &self.control)
            .field("behaviors", &self.behaviors)
            .field("context", &self.context)
            .field("sampling_rate", &self.sampling_rate)
            .field("raise_on_mismatch", &self.raise_on_mismatch)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Instrumented
// ============================================================================

/// A control behavior wrapped by an experiment
///
/// Calling it is equivalent to [`Experiment::run`].
pub struct Instrumented<A, T, E> {
    experiment: Arc<Experiment<A, T, E>>,
}

impl<A, T, E> Instrumented<A, T, E> {
    /// Run the wrapped experiment
    pub fn call(&self, args: A) -> Result<T, RunError<A, T, E>> {
        self.experiment.run(args)
    }

    /// Get the wrapped experiment
    pub fn experiment(&self) -> &Experiment<A, T, E> {
        &self.experiment
    }

    /// Convert into a plain closure
    pub fn into_fn(self) -> impl Fn(A) -> Result<T, RunError<A, T, E>> {
        move |args| self.experiment.run(args)
    }
}

impl<A, T, E> Clone for Instrumented<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            experiment: Arc::clone(&self.experiment),
        }
    }
}

impl<A, T, E> fmt::Debug for Instrumented<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrumented")
            .field("experiment", &self.experiment)
            .finish()
    }
}
