//! Per-run experiment results

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::behavior::{Behavior, BehaviorId};
use super::compare::Comparator;
use super::observation::{self, Observation};
use super::timer::{Clock, Timer};

type PanicPayload = Box<dyn Any + Send + 'static>;

/// Observations collected during a single experiment run
///
/// Created fresh for every run and handed to the publisher once all
/// scheduled behaviors have executed.
#[derive(Debug)]
pub struct ExperimentResult<A, T, E> {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    experiment_name: Arc<str>,
    control: BehaviorId,
    context: Arc<serde_json::Value>,
    comparator: Comparator<T, E>,
    behaviors: Vec<Behavior<A, T, E>>,
    args: A,
    observations: Vec<(BehaviorId, Observation<T, E>)>,
}

impl<A, T, E> ExperimentResult<A, T, E> {
    /// Create an empty result for the given schedule
    pub fn new(
        experiment_name: Arc<str>,
        control: BehaviorId,
        context: Arc<serde_json::Value>,
        comparator: Comparator<T, E>,
        behaviors: Vec<Behavior<A, T, E>>,
        args: A,
    ) -> Self {
        let observations = Vec::with_capacity(behaviors.len());

        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            experiment_name,
            control,
            context,
            comparator,
            behaviors,
            args,
            observations,
        }
    }

    /// Append an observation for a behavior
    pub fn record(&mut self, behavior: &Behavior<A, T, E>, observation: Observation<T, E>) {
        self.observations.push((behavior.id(), observation));
    }

    /// Run a behavior against this result's arguments and record the outcome
    ///
    /// A panic is caught and recorded as a panicked observation. Its payload
    /// is handed back so the caller can resume it.
    pub fn timed_run(
        &mut self,
        behavior: &Behavior<A, T, E>,
        clock: &dyn Clock,
    ) -> Option<PanicPayload> {
        let timer = Timer::start(clock);
        let caught = panic::catch_unwind(AssertUnwindSafe(|| behavior.call(&self.args)));
        let duration = timer.stop();

        match caught {
            Ok(outcome) => {
                self.record(behavior, Observation::new(outcome, duration));
                None
            }
            Err(payload) => {
                let message = observation::panic_message(payload.as_ref());
                self.record(behavior, Observation::panicked(message, duration));
                Some(payload)
            }
        }
    }

    /// Run every scheduled behavior in order
    ///
    /// A failing or panicking control does not stop the run: the behaviors
    /// scheduled after it still execute so that their observations can be
    /// compared. Candidate panics are absorbed; the control's panic payload,
    /// if any, is returned.
    pub(crate) fn run_scheduled(&mut self, clock: &dyn Clock) -> Option<PanicPayload> {
        let mut control_panic = None;

        for index in 0..self.behaviors.len() {
            let behavior = self.behaviors[index].clone();
            let is_control = behavior.id() == self.control;
            let remaining = self.behaviors.len() - index - 1;

            match self.timed_run(&behavior, clock) {
                Some(payload) if is_control => {
                    tracing::warn!(
                        experiment = %self.experiment_name,
                        remaining,
                        "Control behavior panicked, running remaining behaviors"
                    );
                    control_panic = Some(payload);
                }
                Some(_) => {
                    tracing::warn!(
                        experiment = %self.experiment_name,
                        behavior = %behavior.name(),
                        "Candidate behavior panicked"
                    );
                }
                None if is_control && self.control_observation().is_some_and(Observation::is_error) => {
                    tracing::debug!(
                        experiment = %self.experiment_name,
                        remaining,
                        "Control behavior failed, running remaining behaviors"
                    );
                }
                None => {}
            }
        }

        control_panic
    }

    /// Get the unique ID of this run
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Get the time the run started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Get the experiment name
    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    /// Get the caller-supplied experiment context
    pub fn context(&self) -> &serde_json::Value {
        &self.context
    }

    /// Get the behaviors scheduled for this run, in execution order
    pub fn behaviors(&self) -> &[Behavior<A, T, E>] {
        &self.behaviors
    }

    /// Get the arguments the behaviors were called with
    pub fn args(&self) -> &A {
        &self.args
    }

    /// Iterate the recorded observations in execution order
    pub fn observations(&self) -> impl Iterator<Item = (BehaviorId, &Observation<T, E>)> {
        self.observations.iter().map(|(id, obs)| (*id, obs))
    }

    /// Get the observation recorded for a behavior
    pub fn observation_for(&self, behavior: BehaviorId) -> Option<&Observation<T, E>> {
        self.observations
            .iter()
            .find(|(id, _)| *id == behavior)
            .map(|(_, observation)| observation)
    }

    /// Get the control's observation
    pub fn control_observation(&self) -> Option<&Observation<T, E>> {
        self.observation_for(self.control)
    }

    /// Check if the control ran in this result
    pub fn is_control(&self, behavior: BehaviorId) -> bool {
        behavior == self.control
    }

    /// Check whether the only behavior that ran was the control
    pub fn is_control_only(&self) -> bool {
        self.observations.iter().all(|(id, _)| *id == self.control)
    }

    /// Check whether every candidate observation matches the control's
    pub fn all_equivalent_to_control(&self) -> bool {
        self.mismatched_behaviors().next().is_none()
    }

    /// Iterate the candidates whose observations differ from the control's
    ///
    /// If the control did not run, every candidate is reported.
    pub fn mismatched_behaviors(&self) -> impl Iterator<Item = BehaviorId> + '_ {
        let control = self.control_observation();

        self.observations
            .iter()
            .filter(move |(id, observation)| {
                *id != self.control
                    && !control.is_some_and(|c| self.comparator.compare(c, observation))
            })
            .map(|(id, _)| *id)
    }

    /// Get the name of a scheduled behavior
    pub fn behavior_name(&self, behavior: BehaviorId) -> Option<&str> {
        self.behaviors
            .iter()
            .find(|b| b.id() == behavior)
            .map(Behavior::name)
    }

    /// Consume the result, returning the control's outcome
    ///
    /// `None` if the control did not run or panicked.
    pub fn into_control_outcome(self) -> Option<Result<T, E>> {
        let control = self.control;

        self.observations
            .into_iter()
            .find(|(id, _)| *id == control)
            .and_then(|(_, observation)| observation.into_outcome())
    }
}
