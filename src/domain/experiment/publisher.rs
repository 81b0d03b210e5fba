//! Publishing of completed experiment runs

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{error, info};

use super::result::ExperimentResult;

/// Receives every completed run exactly once
pub trait Publisher<A, T, E>: Send + Sync {
    /// Publish a completed run
    fn publish(&self, result: &ExperimentResult<A, T, E>);
}

/// Logs whether each run matched
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

impl<A, T, E> Publisher<A, T, E> for LogPublisher {
    fn publish(&self, result: &ExperimentResult<A, T, E>) {
        if result.all_equivalent_to_control() {
            info!(
                experiment = %result.experiment_name(),
                run_id = %result.run_id(),
                "Observations for {} match!",
                result.experiment_name()
            );
        } else {
            let mismatched: Vec<&str> = result
                .mismatched_behaviors()
                .filter_map(|id| result.behavior_name(id))
                .collect();

            error!(
                experiment = %result.experiment_name(),
                run_id = %result.run_id(),
                mismatched = ?mismatched,
                "Observations for {} don't match!",
                result.experiment_name()
            );
        }
    }
}

/// Adapts a closure into a publisher
pub struct FnPublisher<F, A, T, E> {
    publish: F,
    _marker: PhantomData<fn(&ExperimentResult<A, T, E>)>,
}

impl<F, A, T, E> FnPublisher<F, A, T, E>
where
    F: Fn(&ExperimentResult<A, T, E>) + Send + Sync,
{
    pub fn new(publish: F) -> Self {
        Self {
            publish,
            _marker: PhantomData,
        }
    }
}

impl<F, A, T, E> Publisher<A, T, E> for FnPublisher<F, A, T, E>
where
    F: Fn(&ExperimentResult<A, T, E>) + Send + Sync,
{
    fn publish(&self, result: &ExperimentResult<A, T, E>) {
        (self.publish)(result)
    }
}

impl<F, A, T, E> fmt::Debug for FnPublisher<F, A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPublisher").finish_non_exhaustive()
    }
}

/// Forwards each run to several publishers in order
pub struct CompositePublisher<A, T, E> {
    publishers: Vec<Arc<dyn Publisher<A, T, E>>>,
}

impl<A, T, E> CompositePublisher<A, T, E> {
    pub fn new() -> Self {
        Self {
            publishers: Vec::new(),
        }
    }

    /// Add a publisher
    pub fn with(mut self, publisher: Arc<dyn Publisher<A, T, E>>) -> Self {
        self.publishers.push(publisher);
        self
    }

    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }
}

impl<A, T, E> Default for CompositePublisher<A, T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T, E> Publisher<A, T, E> for CompositePublisher<A, T, E> {
    fn publish(&self, result: &ExperimentResult<A, T, E>) {
        for publisher in &self.publishers {
            publisher.publish(result);
        }
    }
}
