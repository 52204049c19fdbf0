//! Dispatch counters.
//!
//! Counters are recorded through the [`metrics`](https://docs.rs/metrics)
//! facade when the `metrics` feature is enabled; otherwise every helper is a
//! no-op. Hosts install their own recorder, such as the Prometheus exporter
//! used by the demo binary.

/// Counter of requests answered by a scenario, labelled by `scenario`.
pub const SCENARIOS_MATCHED: &str = "smartmocks_scenarios_matched_total";
/// Counter of requests no scenario matched.
pub const REQUESTS_UNMATCHED: &str = "smartmocks_requests_unmatched_total";
/// Counter of dispatch attempts aborted by an error.
pub const DISPATCH_ERRORS: &str = "smartmocks_dispatch_errors_total";

/// Record a request answered by `scenario`.
pub fn inc_matched(scenario: &str) {
    #[cfg(feature = "metrics")]
    metrics::counter!(SCENARIOS_MATCHED, "scenario" => scenario.to_owned()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = scenario;
}

/// Record an unmatched request.
pub fn inc_unmatched() {
    #[cfg(feature = "metrics")]
    metrics::counter!(REQUESTS_UNMATCHED).increment(1);
}

/// Record an aborted dispatch.
pub fn inc_errors() {
    #[cfg(feature = "metrics")]
    metrics::counter!(DISPATCH_ERRORS).increment(1);
}
