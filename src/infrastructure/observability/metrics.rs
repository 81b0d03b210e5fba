//! Prometheus metrics for experiment runs

use std::sync::Arc;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;
use crate::domain::experiment::{ExperimentResult, Publisher};

/// Prometheus metrics handle for rendering the exposition text
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics in Prometheus text format
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            tracing::info!("Prometheus metrics initialized");
            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Record the metrics of one completed experiment run
pub fn record_run<A, T, E>(result: &ExperimentResult<A, T, E>) {
    let experiment = result.experiment_name().to_string();
    let matched = result.all_equivalent_to_control();
    let outcome = if matched { "match" } else { "mismatch" };
    let sampled = if result.is_control_only() { "false" } else { "true" };

    counter!(
        "experiment_runs_total",
        "experiment" => experiment.clone(),
        "outcome" => outcome,
        "sampled" => sampled
    )
    .increment(1);

    if !matched {
        counter!("experiment_mismatches_total", "experiment" => experiment.clone()).increment(1);
    }

    for (id, observation) in result.observations() {
        let behavior = result.behavior_name(id).unwrap_or("unknown").to_string();
        let role = if result.is_control(id) { "control" } else { "candidate" };
        let labels = [
            ("experiment", experiment.clone()),
            ("behavior", behavior),
            ("role", role.to_string()),
        ];

        histogram!("experiment_behavior_duration_seconds", &labels)
            .record(observation.duration().as_secs_f64());

        if observation.is_error() {
            counter!("experiment_behavior_errors_total", &labels).increment(1);
        }
    }
}

/// Publisher that records run metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsPublisher;

impl<A, T, E> Publisher<A, T, E> for MetricsPublisher {
    fn publish(&self, result: &ExperimentResult<A, T, E>) {
        record_run(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::experiment::{Behavior, Experiment, Settings};

    #[test]
    fn test_disabled_metrics() {
        let config = MetricsConfig { enabled: false };
        assert!(init_metrics(&config).is_none());
    }

    fn lookup_experiment() -> Experiment<i32, i32, String> {
        Experiment::new(Behavior::new("control", |x: &i32| Ok::<_, String>(*x)))
            .with_name("lookup")
            .with_candidate(Behavior::new("candidate", |x: &i32| Err(format!("bad {x}"))))
            .with_settings(Settings::default())
            .with_publisher(Arc::new(MetricsPublisher))
    }

    fn sample<'a>(rendered: &'a str, name: &str, labels: &[&str]) -> Option<&'a str> {
        rendered.lines().find(|line| {
            line.starts_with(&format!("{name}{{")) && labels.iter().all(|l| line.contains(l))
        })
    }

    #[test]
    fn test_publisher_without_recorder_is_noop() {
        assert_eq!(lookup_experiment().run(3).unwrap(), 3);
    }

    #[test]
    fn test_record_run_counts_runs_mismatches_and_errors() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let experiment = lookup_experiment();

        metrics::with_local_recorder(&recorder, || {
            assert_eq!(experiment.run(3).unwrap(), 3);
            assert_eq!(experiment.run(4).unwrap(), 4);
        });

        let rendered = handle.render();
        let runs = sample(
            &rendered,
            "experiment_runs_total",
            &[r#"experiment="lookup""#, r#"outcome="mismatch""#, r#"sampled="true""#],
        );
        assert!(runs.is_some_and(|line| line.ends_with(" 2")), "{rendered}");

        let mismatches = sample(&rendered, "experiment_mismatches_total", &[r#"experiment="lookup""#]);
        assert!(mismatches.is_some_and(|line| line.ends_with(" 2")), "{rendered}");

        let candidate_errors = sample(
            &rendered,
            "experiment_behavior_errors_total",
            &[r#"behavior="candidate""#, r#"role="candidate""#],
        );
        assert!(candidate_errors.is_some_and(|line| line.ends_with(" 2")), "{rendered}");
        assert!(
            sample(&rendered, "experiment_behavior_errors_total", &[r#"role="control""#]).is_none(),
            "{rendered}"
        );
        assert!(rendered.contains("experiment_behavior_duration_seconds"), "{rendered}");
    }

    #[test]
    fn test_record_run_counts_matching_control_only_run() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let experiment = lookup_experiment().with_sampling_rate(0.0);

        metrics::with_local_recorder(&recorder, || {
            experiment.run(1).unwrap();
        });

        let rendered = handle.render();
        let runs = sample(
            &rendered,
            "experiment_runs_total",
            &[r#"outcome="match""#, r#"sampled="false""#],
        );
        assert!(runs.is_some_and(|line| line.ends_with(" 1")), "{rendered}");
        assert!(!rendered.contains("experiment_mismatches_total"), "{rendered}");
    }
}
