//! Demo command - runs sample experiments end to end

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use clap::Args;
use thiserror::Error;
use tracing::{info, warn};

use super::{init_logging, load_config};
use crate::domain::experiment::{
    settings, Behavior, CompositePublisher, Experiment, ExperimentResult, Instrumented,
    LogPublisher, Publisher, RunError,
};
use crate::infrastructure::observability::{init_metrics, MetricsPublisher};

const SAMPLE_INPUTS: &[&str] = &[
    "the quick brown fox",
    "jumps  over the lazy dog",
    "",
    " leading space",
    "trailing space ",
    "single",
];

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Number of passes over the sample inputs
    #[arg(long, default_value_t = 1)]
    pub runs: u32,

    /// Override the configured sampling rate
    #[arg(long)]
    pub sampling_rate: Option<f64>,

    /// Fail runs whose observations do not match
    #[arg(long)]
    pub raise_on_mismatch: bool,

    /// Print Prometheus metrics after the runs
    #[arg(long)]
    pub metrics: bool,
}

/// Errors produced by the sample behaviors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TextError {
    #[error("Input is empty")]
    Empty,
}

/// Match and mismatch counts across runs
#[derive(Debug, Default)]
struct Tally {
    runs: AtomicU64,
    mismatches: AtomicU64,
}

impl<A, T, E> Publisher<A, T, E> for Tally {
    fn publish(&self, result: &ExperimentResult<A, T, E>) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        if !result.all_equivalent_to_control() {
            self.mismatches.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Run the sample experiments
pub fn run(args: DemoArgs) -> anyhow::Result<()> {
    let mut config = load_config()?;
    if let Some(sampling_rate) = args.sampling_rate {
        config.experiment.sampling_rate = sampling_rate;
    }
    if args.raise_on_mismatch {
        config.experiment.raise_on_mismatch = true;
    }
    if args.metrics {
        config.metrics.enabled = true;
    }

    init_logging(&config);
    settings::set_global(config.experiment)?;
    let metrics = init_metrics(&config.metrics);

    let tally = Arc::new(Tally::default());

    let shout = shout_experiment(Arc::clone(&tally))?;
    let word_count = word_count_experiment(Arc::clone(&tally));

    for _ in 0..args.runs {
        for input in SAMPLE_INPUTS {
            report(shout.call(input.to_string()));
            report(word_count.run(input.to_string()));
        }
    }

    info!(
        runs = tally.runs.load(Ordering::Relaxed),
        mismatches = tally.mismatches.load(Ordering::Relaxed),
        "Demo finished"
    );

    if let Some(metrics) = metrics {
        println!("{}", metrics.render());
    }

    Ok(())
}

fn publishers<T: 'static>(tally: Arc<Tally>) -> Arc<dyn Publisher<String, T, TextError>> {
    Arc::new(
        CompositePublisher::new()
            .with(Arc::new(LogPublisher))
            .with(Arc::new(MetricsPublisher))
            .with(tally),
    )
}

/// Control wrapped by an experiment, the candidate registered up front
fn shout_experiment(tally: Arc<Tally>) -> anyhow::Result<Instrumented<String, String, TextError>> {
    let candidate = Behavior::new("shout_chars", |text: &String| {
        if text.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(text.chars().flat_map(char::to_uppercase).collect::<String>() + "!")
    });

    let instrumented = Experiment::from_behaviors([candidate])
        .with_publisher(publishers(tally))
        .wrap(Behavior::new("shout", |text: &String| {
            if text.is_empty() {
                return Err(TextError::Empty);
            }
            Ok(format!("{}!", text.to_uppercase()))
        }))?;

    Ok(instrumented)
}

/// Experiment built inline with a candidate that splits differently
fn word_count_experiment(tally: Arc<Tally>) -> Experiment<String, usize, TextError> {
    let control = Behavior::new("split_whitespace", |text: &String| {
        Ok(text.split_whitespace().count())
    });
    let candidate = Behavior::new("split_space", |text: &String| {
        Ok(text.split(' ').filter(|word| !word.is_empty()).count())
    });
    let naive = Behavior::new("split_space_naive", |text: &String| Ok(text.split(' ').count()));

    Experiment::new(control)
        .with_name("word-count")
        .with_candidate(candidate)
        .with_candidate(naive)
        .with_context(serde_json::json!({ "owner": "demo" }))
        .with_publisher(publishers(tally))
}

fn report<T: std::fmt::Debug>(outcome: Result<T, RunError<String, T, TextError>>) {
    match outcome {
        Ok(value) => info!(value = ?value, "Control returned"),
        Err(RunError::Control(error)) => info!(error = %error, "Control failed"),
        Err(RunError::Mismatch(mismatch)) => {
            let result = mismatch.result();
            let candidates: Vec<&str> = result
                .mismatched_behaviors()
                .filter_map(|id| result.behavior_name(id))
                .collect();
            warn!(
                experiment = %result.experiment_name(),
                input = %result.args(),
                candidates = ?candidates,
                "Mismatch raised"
            );
        }
        Err(RunError::Configuration(error)) => warn!(error = %error, "Experiment misconfigured"),
    }
}
