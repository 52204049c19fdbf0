//! Scenarios and their per-request evaluation views.
//!
//! A [`Scenario`] is immutable once built and shared by every request that
//! reaches its route. Request-specific state never lives on the scenario:
//! binding it to a resolver yields a [`ScenarioView`], a borrowed
//! `{scenario, resolver}` pair that exists only for the duration of one
//! dispatch or render.

mod builder;

use std::fmt;

pub use builder::{GivenPhase, ScenarioBuilder, ThenPhase, WhenPhase};

use crate::{
    endpoint::Endpoint,
    error::{RenderError, Result, ScenarioError},
    gherkin,
    request::RequestContext,
    scope::Resolver,
    step::{Handler, Step, StepType},
};

/// Named, ordered sequence of Given/When/Then steps.
pub struct Scenario {
    name: String,
    steps: Vec<Step>,
    endpoint: Option<Endpoint>,
}

impl Scenario {
    /// Start declaring a scenario called `name`.
    ///
    /// ```
    /// use smartmocks::scenario::Scenario;
    ///
    /// let scenario = Scenario::builder("documentation only")
    ///     .when("the page is read")
    ///     .build();
    /// assert_eq!(scenario.steps().len(), 1);
    /// assert!(!scenario.is_dispatchable());
    /// ```
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ScenarioBuilder { ScenarioBuilder::new(name.into()) }

    /// Scenario name.
    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// Steps in declaration order.
    #[must_use]
    pub fn steps(&self) -> &[Step] { &self.steps }

    /// Route this scenario answers, if a `When` step declared one.
    #[must_use]
    pub fn endpoint(&self) -> Option<&Endpoint> { self.endpoint.as_ref() }

    /// Returns `true` when the scenario has both a route and a response
    /// handler and can therefore take part in dispatch.
    #[must_use]
    pub fn is_dispatchable(&self) -> bool { self.endpoint.is_some() && self.handler().is_some() }

    /// `Given` and `AndGiven` steps in declaration order.
    pub fn preconditions(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|step| step.is_precondition())
    }

    /// Evaluate every precondition against `ctx`, stopping at the first one
    /// that does not hold. A scenario without preconditions always matches.
    ///
    /// # Errors
    ///
    /// Propagates the first precondition failure.
    pub fn matches(&self, ctx: &RequestContext) -> Result<bool> {
        for step in self.preconditions() {
            if !step.evaluate(ctx)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Evaluate every precondition against `ctx` and report each result.
    ///
    /// Unlike [`Scenario::matches`], evaluation continues past failing steps.
    #[must_use]
    pub fn explain(&self, ctx: &RequestContext) -> Vec<StepTrace> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.is_precondition())
            .map(|(position, step)| StepTrace {
                position,
                step_type: step.step_type(),
                outcome: step.evaluate(ctx),
            })
            .collect()
    }

    /// Bind this scenario to `resolver` for one request or render.
    #[must_use]
    pub fn bind<'a>(&'a self, resolver: &'a dyn Resolver) -> ScenarioView<'a> {
        ScenarioView {
            scenario: self,
            resolver,
        }
    }

    /// Mount this scenario's route under `prefix`.
    ///
    /// Endpoint step descriptions follow the new route.
    #[must_use]
    pub fn nested(mut self, prefix: &str) -> Self {
        self.endpoint = self.endpoint.map(|endpoint| endpoint.nested(prefix));
        for step in &mut self.steps {
            step.nest(prefix);
        }
        self
    }

    /// Handler of the first `Then` step carrying one.
    pub(crate) fn handler(&self) -> Option<&Handler> { self.steps.iter().find_map(Step::handler) }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("steps", &self.steps)
            .finish()
    }
}

/// A scenario bound to the execution context of one request.
#[derive(Clone, Copy)]
pub struct ScenarioView<'a> {
    scenario: &'a Scenario,
    resolver: &'a dyn Resolver,
}

impl<'a> ScenarioView<'a> {
    /// The bound scenario.
    #[must_use]
    pub fn scenario(&self) -> &'a Scenario { self.scenario }

    /// Scenario name.
    #[must_use]
    pub fn name(&self) -> &'a str { self.scenario.name() }

    /// Resolver this view was bound to.
    #[must_use]
    pub fn resolver(&self) -> &'a dyn Resolver { self.resolver }

    /// Render the scenario as Gherkin against the bound resolver.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Step`] identifying the first step whose
    /// description cannot be resolved.
    pub fn render(&self) -> std::result::Result<String, RenderError> {
        gherkin::render_scenario(self.scenario, self.resolver)
    }
}

impl fmt::Debug for ScenarioView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioView")
            .field("scenario", &self.scenario.name)
            .finish_non_exhaustive()
    }
}

/// Result of evaluating one precondition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepTrace {
    /// Zero-based position of the step within its scenario.
    pub position: usize,
    /// Type of the step.
    pub step_type: StepType,
    /// Whether the step held, or why it could not be decided.
    pub outcome: Result<bool, ScenarioError>,
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::{Scenario, StepTrace};
    use crate::{
        endpoint::Endpoint,
        error::ScenarioError,
        mock::Member,
        request::{Request, RequestContext},
        scope::{MockRegistry, RequestScope},
        step::StepType,
    };

    struct Inventory;
    const IN_STOCK: Member<Inventory, bool> = Member::new("in_stock");

    fn ctx(in_stock: bool) -> RequestContext {
        MockRegistry::builder()
            .scoped_mock::<Inventory, _>(move |mock, _| {
                mock.setup(IN_STOCK, in_stock);
            })
            .build()
            .context(Request::get("/items"))
    }

    #[test]
    fn no_preconditions_match_vacuously() {
        let scenario = Scenario::builder("always")
            .when_endpoint(Endpoint::get("/items"))
            .build();
        assert_eq!(scenario.matches(&ctx(false)), Ok(true));
    }

    #[test]
    fn preconditions_short_circuit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let scenario = Scenario::builder("guarded")
            .given(IN_STOCK, true)
            .and_that("the second check runs", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            })
            .build();

        assert_eq!(scenario.matches(&ctx(false)), Ok(false));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(scenario.matches(&ctx(true)), Ok(true));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explain_reports_every_precondition() {
        let scenario = Scenario::builder("traced")
            .given(IN_STOCK, true)
            .and_that("the backend is down", |_| Err(ScenarioError::evaluation("timeout")))
            .when("the catalogue is read")
            .build();

        let traces = scenario.explain(&ctx(false));
        assert_eq!(
            traces,
            vec![
                StepTrace {
                    position: 0,
                    step_type: StepType::Given,
                    outcome: Ok(false),
                },
                StepTrace {
                    position: 1,
                    step_type: StepType::AndGiven,
                    outcome: Err(ScenarioError::Evaluation("timeout".into())),
                },
            ]
        );
    }

    #[test]
    fn missing_dependency_surfaces_from_matches() {
        let scenario = Scenario::builder("unwired").given(IN_STOCK, true).build();
        let ctx = RequestContext::new(Request::get("/items"), RequestScope::default());
        assert!(matches!(
            scenario.matches(&ctx),
            Err(ScenarioError::DependencyNotRegistered(_))
        ));
    }

    #[test]
    fn nested_moves_the_route() {
        let scenario = Scenario::builder("nested")
            .when_endpoint(Endpoint::get("/items"))
            .build()
            .nested("/shop/v1");
        assert_eq!(scenario.endpoint(), Some(&Endpoint::get("/shop/v1/items")));
        assert_eq!(
            scenario.steps()[0]
                .description(&RequestScope::default())
                .expect("endpoint text"),
            "the /shop/v1/items endpoint is called using GET"
        );
    }

    #[test]
    fn views_render_against_their_own_resolver() {
        let registry = MockRegistry::builder()
            .scoped_mock::<Inventory, _>(|mock, request| {
                let label = request.header("x-label").unwrap_or("in stock").to_owned();
                mock.describe(IN_STOCK, move |_| label.clone());
            })
            .build();
        let scenario = Scenario::builder("labelled").given(IN_STOCK, true).build();

        let first = registry.scope(&Request::get("/").with_header("x-label", "shelves are full"));
        let second = registry.scope(&Request::get("/"));
        assert_eq!(
            scenario.bind(&first).render().expect("render"),
            "Scenario: labelled\nGiven shelves are full"
        );
        assert_eq!(
            scenario.bind(&second).render().expect("render"),
            "Scenario: labelled\nGiven in stock"
        );
    }
}
