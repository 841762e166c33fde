//! Resolver metrics.
//!
//! Recorded through the `metrics` facade; the Prometheus recorder installed by
//! `service_core::middleware::init_metrics` renders them on `/metrics`.

use metrics::{counter, histogram};

/// Count a response by the source that produced its answer.
pub fn record_answer(source: &'static str) {
    counter!("chat_answers_total", "source" => source).increment(1);
}

/// Record one call to the generation collaborator.
pub fn record_generation(model: &str, duration_secs: f64) {
    histogram!("chat_generation_duration_seconds", "model" => model.to_string())
        .record(duration_secs);
}

/// Count a generation attempt that produced no usable text.
pub fn record_generation_failure(reason: &'static str) {
    counter!("chat_generation_failures_total", "reason" => reason).increment(1);
}

/// Count a passthrough call by upstream outcome.
pub fn record_forward(outcome: &'static str) {
    counter!("chat_forward_requests_total", "outcome" => outcome).increment(1);
}
