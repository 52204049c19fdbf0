//! Route grouping and first-match dispatch.
//!
//! [`ScenarioRouter`] collects scenarios and features at startup and groups
//! every dispatchable scenario by its [`Endpoint`]. The resulting
//! [`Dispatcher`] is immutable and shared across requests: each dispatch
//! binds the selected scenario to the request's own scope through a
//! [`ScenarioView`](crate::scenario::ScenarioView), so concurrent requests
//! never observe each other's mocks.

use std::{
    collections::{HashMap, hash_map::Entry},
    fmt,
    panic::AssertUnwindSafe,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::DashMap;
use futures::FutureExt;

use crate::{
    config::DispatchConfig,
    endpoint::Endpoint,
    error::{DispatchError, RenderError, RouterError, ScenarioError},
    feature::Feature,
    gherkin,
    metrics,
    panic::format_panic,
    request::{RequestContext, Response},
    scenario::{Scenario, StepTrace},
    scope::Resolver,
};

/// Result of dispatching one request.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Outcome {
    /// A scenario matched and its handler produced `response`.
    Matched {
        /// Name of the matched scenario.
        scenario: String,
        /// Response produced by the scenario's handler.
        response: Response,
    },
    /// The documentation route was requested.
    Documentation(String),
    /// No scenario matched the request.
    NotFound,
}

impl Outcome {
    /// Convert the outcome into the response sent to the caller.
    ///
    /// `NotFound` becomes a `404` carrying only the configured message.
    #[must_use]
    pub fn into_response(self, config: &DispatchConfig) -> Response {
        match self {
            Self::Matched { response, .. } => response,
            Self::Documentation(text) => Response::text(200, text),
            Self::NotFound => Response::not_found(&config.not_found_message),
        }
    }

    /// Name of the matched scenario, if any.
    #[must_use]
    pub fn scenario(&self) -> Option<&str> {
        match self {
            Self::Matched { scenario, .. } => Some(scenario),
            _ => None,
        }
    }
}

/// Scenarios sharing one [`Endpoint`], tried in registration order.
pub struct ScenarioGroup {
    endpoint: Endpoint,
    scenarios: Vec<Arc<Scenario>>,
}

impl ScenarioGroup {
    fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            scenarios: Vec::new(),
        }
    }

    fn push(&mut self, scenario: Arc<Scenario>) -> Result<(), RouterError> {
        if self
            .scenarios
            .iter()
            .any(|existing| existing.name() == scenario.name())
        {
            return Err(RouterError::DuplicateScenario {
                name: scenario.name().to_owned(),
                endpoint: self.endpoint.clone(),
            });
        }
        self.scenarios.push(scenario);
        Ok(())
    }

    /// Endpoint served by this group.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint { &self.endpoint }

    /// Candidate scenarios in registration order.
    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter().map(|scenario| &**scenario)
    }

    /// Number of candidate scenarios.
    #[must_use]
    pub fn len(&self) -> usize { self.scenarios.len() }

    /// Returns `true` when the group has no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.scenarios.is_empty() }

    /// Find the first scenario whose preconditions hold for `ctx`.
    ///
    /// Candidates after the match are never evaluated. A candidate whose
    /// evaluation fails is skipped, except for a missing dependency, which
    /// aborts the request.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MissingDependency`] naming the scenario and
    /// the unregistered capability.
    pub fn select(&self, ctx: &RequestContext) -> Result<Option<&Scenario>, DispatchError> {
        for scenario in self.scenarios() {
            match scenario.matches(ctx) {
                Ok(true) => {
                    tracing::debug!(
                        scenario = scenario.name(),
                        endpoint = %self.endpoint,
                        "scenario matched"
                    );
                    return Ok(Some(scenario));
                }
                Ok(false) => {
                    tracing::trace!(scenario = scenario.name(), "preconditions not met");
                }
                Err(ScenarioError::DependencyNotRegistered(capability)) => {
                    tracing::error!(
                        scenario = scenario.name(),
                        capability,
                        "dependency not registered"
                    );
                    return Err(DispatchError::MissingDependency {
                        scenario: scenario.name().to_owned(),
                        capability,
                    });
                }
                Err(error) => {
                    tracing::warn!(scenario = scenario.name(), %error, "skipping scenario");
                }
            }
        }
        Ok(None)
    }

    /// Run the dispatch algorithm for a request already routed to this
    /// group: select the first match and invoke its handler once.
    ///
    /// # Errors
    ///
    /// Propagates [`ScenarioGroup::select`] failures and reports handler
    /// panics as [`DispatchError::HandlerPanicked`] when `catch_panics` is
    /// enabled.
    pub async fn handle(
        &self,
        ctx: &RequestContext,
        catch_panics: bool,
    ) -> Result<Outcome, DispatchError> {
        let Some(scenario) = self.select(ctx)? else {
            return Ok(Outcome::NotFound);
        };
        let Some(handler) = scenario.handler() else {
            return Ok(Outcome::NotFound);
        };
        let view = scenario.bind(ctx.resolver());
        let response = if catch_panics {
            AssertUnwindSafe(async { handler(ctx, view).await })
                .catch_unwind()
                .await
                .map_err(|payload| {
                    let message = format_panic(payload).to_string();
                    tracing::error!(scenario = scenario.name(), %message, "handler panicked");
                    DispatchError::HandlerPanicked {
                        scenario: scenario.name().to_owned(),
                        message,
                    }
                })?
        } else {
            handler(ctx, view).await
        };
        Ok(Outcome::Matched {
            scenario: scenario.name().to_owned(),
            response,
        })
    }
}

impl fmt::Debug for ScenarioGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioGroup")
            .field("endpoint", &self.endpoint)
            .field(
                "scenarios",
                &self.scenarios().map(Scenario::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Counters observed while dispatching.
///
/// Statistics are informational; evaluation never reads them.
#[derive(Debug, Default)]
pub struct DispatchStats {
    matched: DashMap<String, u64>,
    unmatched: AtomicU64,
}

impl DispatchStats {
    fn record_match(&self, scenario: &str) {
        *self.matched.entry(scenario.to_owned()).or_insert(0) += 1;
        metrics::inc_matched(scenario);
    }

    fn record_unmatched(&self) {
        self.unmatched.fetch_add(1, Ordering::Relaxed);
        metrics::inc_unmatched();
    }

    /// Number of requests answered by `scenario`.
    #[must_use]
    pub fn matched(&self, scenario: &str) -> u64 {
        self.matched.get(scenario).map_or(0, |count| *count)
    }

    /// Number of requests no scenario matched.
    #[must_use]
    pub fn unmatched(&self) -> u64 { self.unmatched.load(Ordering::Relaxed) }
}

/// Startup-time registration of scenarios and features.
///
/// ```
/// use smartmocks::{dispatch::ScenarioRouter, endpoint::Endpoint, request::Response, scenario::Scenario};
///
/// let dispatcher = ScenarioRouter::new()
///     .scenario(
///         Scenario::builder("ping")
///             .when_endpoint(Endpoint::get("/ping"))
///             .then_respond("pong is returned", Response::text(200, "pong"))
///             .build(),
///     )
///     .expect("unique scenario")
///     .build();
/// assert_eq!(dispatcher.routes().count(), 1);
/// ```
#[derive(Default, Debug)]
#[must_use]
pub struct ScenarioRouter {
    config: DispatchConfig,
    groups: HashMap<Endpoint, ScenarioGroup>,
    features: Vec<Feature>,
    scenarios: Vec<Arc<Scenario>>,
}

impl ScenarioRouter {
    /// Create an empty router with the default configuration.
    pub fn new() -> Self { Self::default() }

    /// Replace the dispatch configuration.
    ///
    /// Set the configuration before registering scenarios so that a
    /// collision with the documentation route is rejected. Collisions with
    /// scenarios already registered are only logged.
    pub fn config(mut self, config: DispatchConfig) -> Self {
        if let Some(group) = config.docs_endpoint().and_then(|docs| self.groups.get(&docs)) {
            for scenario in group.scenarios() {
                tracing::warn!(
                    scenario = scenario.name(),
                    endpoint = %group.endpoint(),
                    "scenario shadowed by the documentation route"
                );
            }
        }
        self.config = config;
        self
    }

    /// Register a standalone scenario.
    ///
    /// Scenarios without a route or handler are kept for documentation only.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::DuplicateScenario`] if a scenario with the same
    /// name already serves the same endpoint, and
    /// [`RouterError::ShadowedByDocsRoute`] if the scenario is bound to the
    /// configured documentation route.
    pub fn scenario(mut self, scenario: Scenario) -> Result<Self, RouterError> {
        let scenario = Arc::new(scenario);
        self.register(&scenario)?;
        self.scenarios.push(scenario);
        Ok(self)
    }

    /// Register every scenario of `feature`.
    ///
    /// # Errors
    ///
    /// Returns a [`RouterError`] as for [`ScenarioRouter::scenario`].
    pub fn feature(mut self, feature: Feature) -> Result<Self, RouterError> {
        for scenario in feature.shared_scenarios() {
            self.register(scenario)?;
        }
        tracing::info!(feature = feature.name(), mount = feature.mount(), "feature registered");
        self.features.push(feature);
        Ok(self)
    }

    fn register(&mut self, scenario: &Arc<Scenario>) -> Result<(), RouterError> {
        let Some(endpoint) = scenario.endpoint().filter(|_| scenario.is_dispatchable()) else {
            tracing::debug!(scenario = scenario.name(), "documentation-only scenario registered");
            return Ok(());
        };
        if self.config.docs_endpoint().as_ref() == Some(endpoint) {
            return Err(RouterError::ShadowedByDocsRoute {
                name: scenario.name().to_owned(),
                endpoint: endpoint.clone(),
            });
        }
        let group = match self.groups.entry(endpoint.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(ScenarioGroup::new(endpoint.clone())),
        };
        group.push(Arc::clone(scenario))?;
        tracing::info!(
            scenario = scenario.name(),
            %endpoint,
            position = group.len() - 1,
            "scenario registered"
        );
        Ok(())
    }

    /// Freeze the registrations into a [`Dispatcher`].
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            config: self.config,
            groups: self.groups,
            features: self.features,
            scenarios: self.scenarios,
            stats: DispatchStats::default(),
        }
    }
}

/// Immutable dispatch table shared by every request.
pub struct Dispatcher {
    config: DispatchConfig,
    groups: HashMap<Endpoint, ScenarioGroup>,
    features: Vec<Feature>,
    scenarios: Vec<Arc<Scenario>>,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Dispatch configuration in effect.
    #[must_use]
    pub fn config(&self) -> &DispatchConfig { &self.config }

    /// Counters collected so far.
    #[must_use]
    pub fn stats(&self) -> &DispatchStats { &self.stats }

    /// Endpoints with at least one dispatchable scenario.
    pub fn routes(&self) -> impl Iterator<Item = &Endpoint> { self.groups.keys() }

    /// Group serving `endpoint`, if any.
    #[must_use]
    pub fn group(&self, endpoint: &Endpoint) -> Option<&ScenarioGroup> { self.groups.get(endpoint) }

    fn is_docs_request(&self, ctx: &RequestContext) -> bool {
        self.config
            .docs_endpoint()
            .is_some_and(|docs| ctx.request().endpoint() == docs)
    }

    /// Dispatch one request.
    ///
    /// Unmatched requests and unknown routes yield [`Outcome::NotFound`],
    /// which is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MissingDependency`] when a candidate needs a
    /// capability absent from the request scope,
    /// [`DispatchError::HandlerPanicked`] when the matched handler panics and
    /// [`DispatchError::Render`] when the documentation route cannot render.
    pub async fn dispatch(&self, ctx: &RequestContext) -> Result<Outcome, DispatchError> {
        if self.is_docs_request(ctx) {
            return self
                .render_documentation(ctx.resolver())
                .map(Outcome::Documentation)
                .map_err(|error| {
                    metrics::inc_errors();
                    DispatchError::from(error)
                });
        }

        let endpoint = ctx.request().endpoint();
        let Some(group) = self.groups.get(&endpoint) else {
            tracing::debug!(%endpoint, "no scenarios registered for endpoint");
            self.stats.record_unmatched();
            return Ok(Outcome::NotFound);
        };

        match group.handle(ctx, self.config.catch_panics).await {
            Ok(Outcome::Matched { scenario, response }) => {
                self.stats.record_match(&scenario);
                Ok(Outcome::Matched { scenario, response })
            }
            Ok(outcome) => {
                tracing::debug!(%endpoint, "no scenario matched");
                self.stats.record_unmatched();
                Ok(outcome)
            }
            Err(error) => {
                metrics::inc_errors();
                Err(error)
            }
        }
    }

    /// Evaluate every candidate for the request's endpoint and report each
    /// precondition result, without invoking any handler.
    #[must_use]
    pub fn explain(&self, ctx: &RequestContext) -> Vec<(String, Vec<StepTrace>)> {
        self.groups
            .get(&ctx.request().endpoint())
            .map(|group| {
                group
                    .scenarios()
                    .map(|scenario| (scenario.name().to_owned(), scenario.explain(ctx)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Render every registered feature, then every standalone scenario,
    /// separated by blank lines.
    ///
    /// # Errors
    ///
    /// Propagates the first [`RenderError`].
    pub fn render_documentation(&self, resolver: &dyn Resolver) -> Result<String, RenderError> {
        let mut blocks = Vec::with_capacity(self.features.len() + self.scenarios.len());
        for feature in &self.features {
            blocks.push(gherkin::render_feature(feature, resolver)?);
        }
        for scenario in &self.scenarios {
            blocks.push(scenario.bind(resolver).render()?);
        }
        Ok(blocks.join("\n\n"))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("groups", &self.groups)
            .field("features", &self.features.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;
    use rstest::{fixture, rstest};
    use tracing_test::traced_test;

    use super::{Dispatcher, Outcome, ScenarioRouter};
    use crate::{
        config::DispatchConfig,
        endpoint::Endpoint,
        error::{DispatchError, RouterError, ScenarioError},
        feature::Feature,
        mock::Member,
        request::{Request, Response},
        scenario::Scenario,
        scope::MockRegistry,
    };

    struct AuthenticationService;
    const IS_AUTHENTICATED: Member<AuthenticationService, bool> = Member::new("IsAuthenticated");

    fn registry() -> MockRegistry {
        MockRegistry::builder()
            .scoped_mock::<AuthenticationService, _>(|mock, request| {
                mock.setup(IS_AUTHENTICATED, request.header("x-auth").is_some());
            })
            .build()
    }

    #[fixture]
    fn dispatcher() -> Dispatcher {
        ScenarioRouter::new()
            .config(DispatchConfig::default().with_docs_route("/_scenarios"))
            .feature(
                Feature::new("Authentication", "/features")
                    .scenario(
                        Scenario::builder("Authenticated")
                            .given(IS_AUTHENTICATED, true)
                            .when_endpoint(Endpoint::get("/authenticated"))
                            .then_respond("authenticated", Response::text(200, "authenticated"))
                            .build(),
                    )
                    .scenario(
                        Scenario::builder("Anonymous")
                            .given(IS_AUTHENTICATED, false)
                            .when_endpoint(Endpoint::get("/authenticated"))
                            .then_respond("anonymous", Response::text(200, "anonymous"))
                            .build(),
                    ),
            )
            .expect("unique scenarios")
            .build()
    }

    #[rstest]
    #[case(Some("token"), "Authenticated", "authenticated")]
    #[case(None, "Anonymous", "anonymous")]
    #[tokio::test]
    async fn first_matching_scenario_answers(
        dispatcher: Dispatcher,
        #[case] auth: Option<&str>,
        #[case] scenario: &str,
        #[case] body: &str,
    ) {
        let mut request = Request::get("/features/authenticated");
        if let Some(token) = auth {
            request = request.with_header("x-auth", token);
        }
        let outcome = dispatcher
            .dispatch(&registry().context(request))
            .await
            .expect("dispatch");
        assert_eq!(outcome.scenario(), Some(scenario));
        let response = outcome.into_response(dispatcher.config());
        assert_eq!(response.body_text(), body);
        assert_eq!(dispatcher.stats().matched(scenario), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_route_is_not_found(dispatcher: Dispatcher) {
        let ctx = registry().context(Request::new("DELETE", "/features/authenticated"));
        let outcome = dispatcher.dispatch(&ctx).await.expect("dispatch");
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(dispatcher.stats().unmatched(), 1);

        let response = outcome.into_response(dispatcher.config());
        assert_eq!(response.status(), 404);
        assert_eq!(response.body_text(), r#"{"message":"Not Found"}"#);
    }

    #[rstest]
    #[tokio::test]
    async fn docs_route_renders_every_feature(dispatcher: Dispatcher) {
        let ctx = registry().context(Request::get("/_scenarios"));
        let Outcome::Documentation(text) = dispatcher.dispatch(&ctx).await.expect("dispatch")
        else {
            panic!("expected documentation");
        };
        assert!(text.starts_with("Feature: Authentication\n\nScenario: Authenticated\n"));
        assert!(text.contains("When the /features/authenticated endpoint is called using GET"));
        assert!(text.contains("Given IsAuthenticated is false"));
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_dependency_names_scenario_and_capability() {
        let dispatcher = dispatcher();
        let ctx = MockRegistry::builder()
            .build()
            .context(Request::get("/features/authenticated"));
        let err = dispatcher
            .dispatch(&ctx)
            .await
            .expect_err("mock not registered");
        let DispatchError::MissingDependency {
            scenario,
            capability,
        } = err
        else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(scenario, "Authenticated");
        assert!(capability.contains("AuthenticationService"));
        assert!(logs_contain("dependency not registered"));
    }

    #[tokio::test]
    #[traced_test]
    async fn evaluation_errors_skip_the_candidate() {
        let dispatcher = ScenarioRouter::new()
            .scenario(
                Scenario::builder("flaky")
                    .given_that("the backend answers", |_| Err(ScenarioError::evaluation("timeout")))
                    .when_endpoint(Endpoint::get("/status"))
                    .then_respond("up", Response::text(200, "up"))
                    .build(),
            )
            .and_then(|router| {
                router.scenario(
                    Scenario::builder("fallback")
                        .when_endpoint(Endpoint::get("/status"))
                        .then_respond("unknown", Response::text(503, "unknown"))
                        .build(),
                )
            })
            .expect("unique scenarios")
            .build();

        let outcome = dispatcher
            .dispatch(&MockRegistry::builder().build().context(Request::get("/status")))
            .await
            .expect("dispatch");
        assert_eq!(outcome.scenario(), Some("fallback"));
        assert!(logs_contain("skipping scenario"));
    }

    fn explode() -> Response { panic!("boom") }

    #[tokio::test]
    async fn handler_panics_are_reported() {
        let dispatcher = ScenarioRouter::new()
            .scenario(
                Scenario::builder("explosive")
                    .when_endpoint(Endpoint::get("/boom"))
                    .then("nothing is returned", |_, _| async { explode() }.boxed())
                    .build(),
            )
            .expect("unique scenario")
            .build();

        let err = dispatcher
            .dispatch(&MockRegistry::builder().build().context(Request::get("/boom")))
            .await
            .expect_err("handler panics");
        assert!(matches!(
            err,
            DispatchError::HandlerPanicked { ref scenario, ref message }
                if scenario == "explosive" && message == "boom"
        ));
    }

    #[test]
    fn duplicate_names_on_one_endpoint_are_rejected() {
        let scenario = || {
            Scenario::builder("twin")
                .when_endpoint(Endpoint::get("/twins"))
                .then_respond("ok", Response::ok())
                .build()
        };
        let err = ScenarioRouter::new()
            .scenario(scenario())
            .and_then(|router| router.scenario(scenario()))
            .expect_err("duplicate");
        assert_eq!(
            err,
            RouterError::DuplicateScenario {
                name: "twin".into(),
                endpoint: Endpoint::get("/twins"),
            }
        );
    }

    fn docs_page() -> Scenario {
        Scenario::builder("docs page")
            .when_endpoint(Endpoint::get("/Docs/"))
            .then_respond("a page is returned", Response::ok())
            .build()
    }

    #[test]
    fn scenarios_on_the_docs_route_are_rejected() {
        let err = ScenarioRouter::new()
            .config(DispatchConfig::default().with_docs_route("/docs"))
            .scenario(docs_page())
            .expect_err("shadowed");
        assert_eq!(
            err,
            RouterError::ShadowedByDocsRoute {
                name: "docs page".into(),
                endpoint: Endpoint::get("/docs"),
            }
        );
    }

    #[test]
    #[traced_test]
    fn late_docs_route_warns_about_shadowed_scenarios() {
        let dispatcher = ScenarioRouter::new()
            .scenario(docs_page())
            .expect("no docs route yet")
            .config(DispatchConfig::default().with_docs_route("/docs"))
            .build();
        assert_eq!(dispatcher.routes().count(), 1);
        assert!(logs_contain("scenario shadowed by the documentation route"));
    }

    #[test]
    fn documentation_only_scenarios_are_not_routed() {
        let dispatcher = ScenarioRouter::new()
            .scenario(
                Scenario::builder("notes")
                    .when_endpoint(Endpoint::get("/notes"))
                    .build(),
            )
            .expect("unique scenario")
            .build();
        assert_eq!(dispatcher.routes().count(), 0);
        assert_eq!(
            dispatcher
                .render_documentation(&crate::scope::RequestScope::default())
                .expect("render"),
            "Scenario: notes\nWhen the /notes endpoint is called using GET"
        );
    }

    #[rstest]
    fn explain_traces_every_candidate(dispatcher: Dispatcher) {
        let ctx = registry().context(Request::get("/features/authenticated"));
        let traces = dispatcher.explain(&ctx);
        let names: Vec<&str> = traces.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["Authenticated", "Anonymous"]);
        assert_eq!(traces[0].1[0].outcome, Ok(false));
        assert_eq!(traces[1].1[0].outcome, Ok(true));
    }
}
