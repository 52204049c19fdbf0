//! Given/When/Then steps.
//!
//! A [`Step`] stores a recipe for its description rather than the text
//! itself: the description is resolved against whichever execution context
//! is active when the scenario is rendered. Precondition steps also carry a
//! predicate evaluated against the request being dispatched.

use std::{borrow::Cow, fmt};

use futures::future::BoxFuture;

use crate::{
    endpoint::Endpoint,
    error::Result,
    mock::{Member, SmartMock},
    request::{RequestContext, Response},
    scenario::ScenarioView,
    scope::{Resolver, ResolverExt},
};

/// Kind of a scenario step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepType {
    /// Opening precondition.
    Given,
    /// Additional precondition.
    AndGiven,
    /// Opening action.
    When,
    /// Additional action.
    AndWhen,
    /// Opening outcome.
    Then,
    /// Additional outcome.
    AndThen,
}

impl StepType {
    /// Gherkin keyword used when rendering the step.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::AndGiven | Self::AndWhen | Self::AndThen => "And",
        }
    }

    /// Returns `true` for `Given` and `AndGiven`.
    #[must_use]
    pub const fn is_precondition(self) -> bool { matches!(self, Self::Given | Self::AndGiven) }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Debug::fmt(self, f) }
}

type DeferredDescription = Box<dyn Fn(&dyn Resolver) -> Result<String> + Send + Sync>;

/// Recipe producing a step's text.
pub enum Description {
    /// Fixed text.
    Text(Cow<'static, str>),
    /// Text computed from the execution context at render time.
    Deferred(DeferredDescription),
    /// Call of an endpoint, rendered from the endpoint's current route.
    Endpoint(Endpoint),
}

impl Description {
    /// Describe a step with a function of the execution context.
    ///
    /// ```
    /// use smartmocks::{scope::RequestScope, step::Description};
    ///
    /// let description = Description::deferred(|_| Ok("computed later".to_owned()));
    /// let text = description.resolve(&RequestScope::default()).expect("resolves");
    /// assert_eq!(text, "computed later");
    /// ```
    pub fn deferred<F>(describe: F) -> Self
    where
        F: Fn(&dyn Resolver) -> Result<String> + Send + Sync + 'static,
    {
        Self::Deferred(Box::new(describe))
    }

    /// Resolve the text against `resolver`.
    ///
    /// # Errors
    ///
    /// Propagates the error of a deferred description, typically
    /// [`ScenarioError::DependencyNotRegistered`](crate::error::ScenarioError::DependencyNotRegistered).
    pub fn resolve(&self, resolver: &dyn Resolver) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text.clone().into_owned()),
            Self::Deferred(describe) => describe(resolver),
            Self::Endpoint(endpoint) => Ok(format!(
                "the {} endpoint is called using {}",
                endpoint.route(),
                endpoint.method()
            )),
        }
    }
}

impl From<&'static str> for Description {
    fn from(text: &'static str) -> Self { Self::Text(Cow::Borrowed(text)) }
}

impl From<String> for Description {
    fn from(text: String) -> Self { Self::Text(Cow::Owned(text)) }
}

impl fmt::Debug for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
            Self::Endpoint(endpoint) => f.debug_tuple("Endpoint").field(endpoint).finish(),
        }
    }
}

pub(crate) type Condition = Box<dyn Fn(&RequestContext) -> Result<bool> + Send + Sync>;

/// Asynchronous response handler attached to a `Then` step.
///
/// The handler receives the request being served and the scenario bound to
/// that request's scope.
pub type Handler = Box<
    dyn for<'a> Fn(&'a RequestContext, ScenarioView<'a>) -> BoxFuture<'a, Response> + Send + Sync,
>;

/// One clause of a scenario.
pub struct Step {
    step_type: StepType,
    description: Description,
    condition: Option<Condition>,
    handler: Option<Handler>,
}

impl Step {
    pub(crate) fn new(step_type: StepType, description: Description) -> Self {
        Self {
            step_type,
            description,
            condition: None,
            handler: None,
        }
    }

    pub(crate) fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub(crate) fn with_handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Precondition comparing `member` of the `C` mock with `expected`.
    ///
    /// The mock is resolved from the request scope on every evaluation. An
    /// unconfigured member never equals `expected`.
    pub(crate) fn member<C, V>(step_type: StepType, member: Member<C, V>, expected: V) -> Self
    where
        C: ?Sized + 'static,
        V: PartialEq + fmt::Debug + Clone + Send + Sync + 'static,
    {
        let described = expected.clone();
        let description = Description::deferred(move |resolver| {
            let mock = resolver.mock::<C>()?;
            Ok(mock.description_for(member, &described))
        });
        let condition: Condition = Box::new(move |ctx| {
            let mock = ctx.resolve::<SmartMock<C>>()?;
            Ok(mock.get(member).is_some_and(|actual| *actual == expected))
        });
        Self::new(step_type, description).with_condition(condition)
    }

    /// Kind of this step.
    #[must_use]
    pub fn step_type(&self) -> StepType { self.step_type }

    /// Resolve this step's text against `resolver`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::DependencyNotRegistered`](crate::error::ScenarioError::DependencyNotRegistered)
    /// when the description needs a capability missing from `resolver`.
    pub fn description(&self, resolver: &dyn Resolver) -> Result<String> {
        self.description.resolve(resolver)
    }

    /// Evaluate this step's predicate for `ctx`.
    ///
    /// Steps without a predicate hold trivially. Evaluation never mutates the
    /// step, so repeated calls with the same request agree.
    ///
    /// # Errors
    ///
    /// Propagates predicate failures, including missing dependencies.
    pub fn evaluate(&self, ctx: &RequestContext) -> Result<bool> {
        self.condition.as_ref().map_or(Ok(true), |condition| condition(ctx))
    }

    /// Returns `true` for `Given` and `AndGiven` steps.
    #[must_use]
    pub fn is_precondition(&self) -> bool { self.step_type.is_precondition() }

    /// Returns `true` when this step carries a response handler.
    #[must_use]
    pub fn has_handler(&self) -> bool { self.handler.is_some() }

    pub(crate) fn handler(&self) -> Option<&Handler> { self.handler.as_ref() }

    pub(crate) fn nest(&mut self, prefix: &str) {
        if let Description::Endpoint(endpoint) = &mut self.description {
            *endpoint = endpoint.nested(prefix);
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("step_type", &self.step_type)
            .field("description", &self.description)
            .field("has_condition", &self.condition.is_some())
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Step, StepType};
    use crate::{
        error::ScenarioError,
        mock::Member,
        request::Request,
        scope::{MockRegistry, RequestScope},
    };

    struct FeatureFlags;
    const DARK_MODE: Member<FeatureFlags, bool> = Member::new("dark_mode");
    const RETRIES: Member<FeatureFlags, u32> = Member::new("retries");

    #[rstest]
    #[case(StepType::Given, "Given")]
    #[case(StepType::AndGiven, "And")]
    #[case(StepType::When, "When")]
    #[case(StepType::AndWhen, "And")]
    #[case(StepType::Then, "Then")]
    #[case(StepType::AndThen, "And")]
    fn keywords(#[case] step_type: StepType, #[case] keyword: &str) {
        assert_eq!(step_type.keyword(), keyword);
    }

    fn registry() -> MockRegistry {
        MockRegistry::builder()
            .describe(DARK_MODE, |on| format!("dark mode is {}", if *on { "on" } else { "off" }))
            .scoped_mock::<FeatureFlags, _>(|mock, request| {
                if let Some(value) = request.header("x-dark") {
                    mock.setup(DARK_MODE, value == "1");
                }
                mock.setup(RETRIES, 0);
            })
            .build()
    }

    #[test]
    fn member_step_compares_by_value() {
        let step = Step::member(StepType::Given, DARK_MODE, true);
        let registry = registry();
        let on = registry.context(Request::get("/").with_header("x-dark", "1"));
        let off = registry.context(Request::get("/").with_header("x-dark", "0"));
        assert_eq!(step.evaluate(&on), Ok(true));
        assert_eq!(step.evaluate(&off), Ok(false));
    }

    #[test]
    fn unconfigured_member_never_matches_falsy_expectation() {
        let step = Step::member(StepType::Given, DARK_MODE, false);
        let ctx = registry().context(Request::get("/"));
        assert_eq!(step.evaluate(&ctx), Ok(false));
    }

    #[test]
    fn zero_is_a_configured_value() {
        let step = Step::member(StepType::AndGiven, RETRIES, 0);
        let ctx = registry().context(Request::get("/"));
        assert_eq!(step.evaluate(&ctx), Ok(true));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let step = Step::member(StepType::Given, DARK_MODE, true);
        let ctx = registry().context(Request::get("/").with_header("x-dark", "1"));
        assert_eq!(step.evaluate(&ctx), step.evaluate(&ctx));
    }

    #[test]
    fn description_is_resolved_late() {
        let step = Step::member(StepType::Given, DARK_MODE, false);
        let scope = registry().scope(&Request::get("/"));
        assert_eq!(step.description(&scope), Ok("dark mode is off".to_owned()));
    }

    #[test]
    fn missing_mock_is_reported_not_swallowed() {
        let step = Step::member(StepType::Given, DARK_MODE, true);
        let err = step
            .description(&RequestScope::default())
            .expect_err("no mock registered");
        assert!(matches!(err, ScenarioError::DependencyNotRegistered(name) if name.contains("FeatureFlags")));
    }

    #[test]
    fn text_steps_hold_trivially() {
        let step = Step::new(StepType::When, "something happens".into());
        let ctx = registry().context(Request::get("/"));
        assert_eq!(step.evaluate(&ctx), Ok(true));
        assert!(!step.is_precondition());
        assert!(!step.has_handler());
    }
}
