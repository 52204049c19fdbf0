//! Test world for dispatch behaviour scenarios.
//!
//! [`DispatchWorld`] accumulates registrations from `Given` steps, builds the
//! dispatcher lazily on the first request and keeps the last outcome for
//! assertions.

use cucumber::World;
use smartmocks::{
    DispatchConfig,
    DispatchError,
    Dispatcher,
    MockRegistry,
    Outcome,
    Request,
    Response,
    ScenarioRouter,
};

use crate::common;

#[derive(Debug, Default, World)]
pub struct DispatchWorld {
    config: DispatchConfig,
    with_feature: bool,
    without_mocks: bool,
    dispatcher: Option<Dispatcher>,
    outcome: Option<Result<Outcome, DispatchError>>,
}

impl DispatchWorld {
    pub fn register_authentication(&mut self) { self.with_feature = true; }

    pub fn enable_docs(&mut self, route: String) { self.config.docs_route = Some(route); }

    pub fn drop_mocks(&mut self) { self.without_mocks = true; }

    fn dispatcher(&mut self) -> &Dispatcher {
        let config = self.config.clone();
        let with_feature = self.with_feature;
        self.dispatcher.get_or_insert_with(|| {
            let router = ScenarioRouter::new().config(config);
            let router = if with_feature {
                router
                    .feature(common::authentication_feature())
                    .expect("unique scenarios")
            } else {
                router
            };
            router.build()
        })
    }

    pub async fn send(&mut self, method: &str, path: &str, credentials: bool) {
        let registry = if self.without_mocks {
            MockRegistry::builder().build()
        } else {
            common::registry()
        };
        let mut request = Request::new(method, path);
        if credentials {
            request = request.with_header("x-auth", "token");
        }
        let ctx = registry.context(request);
        let outcome = self.dispatcher().dispatch(&ctx).await;
        self.outcome = Some(outcome);
    }

    fn outcome(&self) -> &Outcome {
        match self.outcome.as_ref().expect("no request sent") {
            Ok(outcome) => outcome,
            Err(err) => panic!("dispatch failed: {err}"),
        }
    }

    pub fn response(&self) -> Response { self.outcome().clone().into_response(&self.config) }

    pub fn matched_scenario(&self) -> Option<&str> { self.outcome().scenario() }

    pub fn error(&self) -> &DispatchError {
        match self.outcome.as_ref().expect("no request sent") {
            Ok(outcome) => panic!("expected failure, got {outcome:?}"),
            Err(err) => err,
        }
    }
}
