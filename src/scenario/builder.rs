//! Phase builders for [`Scenario`].
//!
//! Each phase type only offers the transitions that are legal from it:
//! start → Given → When → Then, with `and` staying in the current phase.
//! Going back to an earlier phase is therefore not expressible.

use std::fmt;

use futures::{FutureExt, future::BoxFuture};

use super::{Scenario, ScenarioView};
use crate::{
    endpoint::Endpoint,
    error::Result,
    mock::Member,
    request::{RequestContext, Response},
    step::{Condition, Description, Handler, Step, StepType},
};

struct Draft(Scenario);

impl Draft {
    fn push(&mut self, step: Step) {
        tracing::debug!(
            scenario = %self.0.name,
            step_type = %step.step_type(),
            position = self.0.steps.len(),
            "step added"
        );
        self.0.steps.push(step);
    }

    fn text(&mut self, step_type: StepType, description: Description) {
        self.push(Step::new(step_type, description));
    }

    fn member<C, V>(&mut self, step_type: StepType, member: Member<C, V>, expected: V)
    where
        C: ?Sized + 'static,
        V: PartialEq + fmt::Debug + Clone + Send + Sync + 'static,
    {
        self.push(Step::member(step_type, member, expected));
    }

    fn predicate<P>(&mut self, step_type: StepType, description: Description, predicate: P)
    where
        P: Fn(&RequestContext) -> Result<bool> + Send + Sync + 'static,
    {
        let condition: Condition = Box::new(predicate);
        self.push(Step::new(step_type, description).with_condition(condition));
    }

    fn endpoint(&mut self, endpoint: Endpoint) {
        self.0.endpoint = Some(endpoint.clone());
        self.text(StepType::When, Description::Endpoint(endpoint));
    }

    fn then(&mut self, description: Description, handler: Handler) {
        self.push(Step::new(StepType::Then, description).with_handler(handler));
    }
}

fn boxed_handler<F>(handler: F) -> Handler
where
    F: for<'a> Fn(&'a RequestContext, ScenarioView<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    Box::new(handler)
}

/// Entry point of the phase machine, returned by [`Scenario::builder`].
#[must_use]
pub struct ScenarioBuilder(Draft);

impl ScenarioBuilder {
    pub(super) fn new(name: String) -> Self {
        Self(Draft(Scenario {
            name,
            steps: Vec::new(),
            endpoint: None,
        }))
    }

    /// Require `member` of the `C` mock to equal `expected`.
    ///
    /// The step is described through the mock's description for `member`.
    pub fn given<C, V>(mut self, member: Member<C, V>, expected: V) -> GivenPhase
    where
        C: ?Sized + 'static,
        V: PartialEq + fmt::Debug + Clone + Send + Sync + 'static,
    {
        self.0.member(StepType::Given, member, expected);
        GivenPhase(self.0)
    }

    /// Require `predicate` to hold for the request.
    pub fn given_that<P>(mut self, description: impl Into<Description>, predicate: P) -> GivenPhase
    where
        P: Fn(&RequestContext) -> Result<bool> + Send + Sync + 'static,
    {
        self.0
            .predicate(StepType::Given, description.into(), predicate);
        GivenPhase(self.0)
    }

    /// Describe the action without preconditions.
    pub fn when(mut self, description: impl Into<Description>) -> WhenPhase {
        self.0.text(StepType::When, description.into());
        WhenPhase(self.0)
    }

    /// Bind the scenario to `endpoint` without preconditions.
    pub fn when_endpoint(mut self, endpoint: Endpoint) -> WhenPhase {
        self.0.endpoint(endpoint);
        WhenPhase(self.0)
    }

    /// Finish an empty scenario.
    #[must_use]
    pub fn build(self) -> Scenario { self.0.0 }
}

/// Builder state after a `Given` step.
#[must_use]
pub struct GivenPhase(Draft);

impl GivenPhase {
    /// Add a further member precondition.
    pub fn and<C, V>(mut self, member: Member<C, V>, expected: V) -> Self
    where
        C: ?Sized + 'static,
        V: PartialEq + fmt::Debug + Clone + Send + Sync + 'static,
    {
        self.0.member(StepType::AndGiven, member, expected);
        self
    }

    /// Add a further predicate precondition.
    pub fn and_that<P>(mut self, description: impl Into<Description>, predicate: P) -> Self
    where
        P: Fn(&RequestContext) -> Result<bool> + Send + Sync + 'static,
    {
        self.0
            .predicate(StepType::AndGiven, description.into(), predicate);
        self
    }

    /// Describe the action.
    pub fn when(mut self, description: impl Into<Description>) -> WhenPhase {
        self.0.text(StepType::When, description.into());
        WhenPhase(self.0)
    }

    /// Bind the scenario to `endpoint`.
    pub fn when_endpoint(mut self, endpoint: Endpoint) -> WhenPhase {
        self.0.endpoint(endpoint);
        WhenPhase(self.0)
    }

    /// Finish the scenario.
    #[must_use]
    pub fn build(self) -> Scenario { self.0.0 }
}

/// Builder state after a `When` step.
#[must_use]
pub struct WhenPhase(Draft);

impl WhenPhase {
    /// Describe a further action.
    pub fn and(mut self, description: impl Into<Description>) -> Self {
        self.0.text(StepType::AndWhen, description.into());
        self
    }

    /// Describe the outcome and attach the handler producing it.
    ///
    /// ```
    /// use futures::FutureExt;
    /// use smartmocks::{endpoint::Endpoint, request::Response, scenario::Scenario};
    ///
    /// let scenario = Scenario::builder("hello")
    ///     .when_endpoint(Endpoint::get("/hello"))
    ///     .then("a greeting is returned", |_ctx, view| {
    ///         async move { Response::text(200, format!("hello from {}", view.name())) }.boxed()
    ///     })
    ///     .build();
    /// assert!(scenario.is_dispatchable());
    /// ```
    pub fn then<F>(mut self, description: impl Into<Description>, handler: F) -> ThenPhase
    where
        F: for<'a> Fn(&'a RequestContext, ScenarioView<'a>) -> BoxFuture<'a, Response>
            + Send
            + Sync
            + 'static,
    {
        self.0.then(description.into(), boxed_handler(handler));
        ThenPhase(self.0)
    }

    /// Describe the outcome and always answer with `response`.
    pub fn then_respond(self, description: impl Into<Description>, response: Response) -> ThenPhase {
        self.then(description, move |_, _| {
            let response = response.clone();
            async move { response }.boxed()
        })
    }

    /// Finish the scenario without an outcome.
    #[must_use]
    pub fn build(self) -> Scenario { self.0.0 }
}

/// Builder state after a `Then` step.
#[must_use]
pub struct ThenPhase(Draft);

impl ThenPhase {
    /// Describe a further outcome.
    pub fn and(mut self, description: impl Into<Description>) -> Self {
        self.0.text(StepType::AndThen, description.into());
        self
    }

    /// Finish the scenario.
    #[must_use]
    pub fn build(self) -> Scenario { self.0.0 }
}
