//! Dispatch, counting and metrics helpers.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use futures::{FutureExt, future::BoxFuture};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use smartmocks::{
    DispatchError,
    Dispatcher,
    MockRegistry,
    Outcome,
    Request,
    RequestContext,
    Response,
    ScenarioView,
    middleware::Service,
    step::Handler,
};

/// Build a request context from `registry` and dispatch it once.
///
/// # Errors
///
/// Propagates the [`DispatchError`] returned by the dispatcher.
pub async fn outcome_of(
    dispatcher: &Dispatcher,
    registry: &MockRegistry,
    request: Request,
) -> Result<Outcome, DispatchError> {
    dispatcher.dispatch(&registry.context(request)).await
}

/// Dispatch `request` through the [`Service`] seam and return the response.
///
/// # Errors
///
/// Propagates the [`DispatchError`] returned by the dispatcher.
pub async fn dispatch_once(
    dispatcher: &Dispatcher,
    registry: &MockRegistry,
    request: Request,
) -> Result<Response, DispatchError> {
    dispatcher.call(&registry.context(request)).await
}

/// Shared counter for observing how often predicates or handlers run.
#[derive(Clone, Debug, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Number of recorded calls.
    #[must_use]
    pub fn count(&self) -> usize { self.0.load(Ordering::SeqCst) }

    /// Record one call.
    pub fn hit(&self) { self.0.fetch_add(1, Ordering::SeqCst); }

    /// Predicate that records each evaluation and returns `result`.
    pub fn predicate(
        &self,
        result: bool,
    ) -> impl Fn(&RequestContext) -> smartmocks::Result<bool> + Send + Sync + 'static {
        let counter = self.clone();
        move |_: &RequestContext| {
            counter.hit();
            Ok(result)
        }
    }

    /// Handler that records each invocation and answers with `response`.
    #[must_use]
    pub fn handler(&self, response: Response) -> Handler {
        let counter = self.clone();
        boxed(move |_, _| {
            counter.hit();
            let response = response.clone();
            async move { response }.boxed()
        })
    }
}

fn boxed<F>(handler: F) -> Handler
where
    F: for<'a> Fn(&'a RequestContext, ScenarioView<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    Box::new(handler)
}

/// Run `f` with a thread-local debugging recorder and return every counter
/// it recorded as `(name, labels, value)`.
///
/// Labels are rendered as `key=value` pairs.
pub fn capture_counters<F: FnOnce()>(f: F) -> Vec<(String, Vec<String>, u64)> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    metrics::with_local_recorder(&recorder, f);
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(key, _, _, value)| match value {
            DebugValue::Counter(count) => Some((
                key.key().name().to_owned(),
                key.key()
                    .labels()
                    .map(|label| format!("{}={}", label.key(), label.value()))
                    .collect(),
                count,
            )),
            _ => None,
        })
        .collect()
}

/// Value of counter `name` in `counters`, summed across labels.
#[must_use]
pub fn counter_value(counters: &[(String, Vec<String>, u64)], name: &str) -> u64 {
    counters
        .iter()
        .filter(|(key, _, _)| key == name)
        .map(|(_, _, value)| value)
        .sum()
}
