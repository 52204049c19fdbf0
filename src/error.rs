//! Canonical error types for the crate.
//!
//! Errors are split by the phase that raises them: step evaluation
//! ([`ScenarioError`]), per-request dispatch ([`DispatchError`]), Gherkin
//! rendering ([`RenderError`]) and startup registration ([`RouterError`]).
//! An unmatched request is not an error; see
//! [`Outcome::NotFound`](crate::dispatch::Outcome::NotFound).

use thiserror::Error;

use crate::{endpoint::Endpoint, step::StepType};

/// Failure raised while resolving a step description or evaluating a
/// precondition against an execution context.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScenarioError {
    /// The step references a capability with no entry in the current scope.
    #[error("dependency `{0}` is not registered in the current scope")]
    DependencyNotRegistered(&'static str),
    /// A user-supplied precondition could not decide.
    #[error("step evaluation failed: {0}")]
    Evaluation(String),
}

impl ScenarioError {
    /// Build an [`ScenarioError::Evaluation`] from any displayable reason.
    #[must_use]
    pub fn evaluation(reason: impl std::fmt::Display) -> Self { Self::Evaluation(reason.to_string()) }
}

/// Failure that aborts dispatch of a single request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// A candidate scenario needs a capability missing from the request scope.
    #[error(
        "scenario `{scenario}` requires `{capability}`, which is not registered for this request"
    )]
    MissingDependency {
        /// Name of the scenario being evaluated.
        scenario: String,
        /// Type name of the missing capability.
        capability: &'static str,
    },
    /// The matched scenario's handler panicked.
    #[error("handler for scenario `{scenario}` panicked: {message}")]
    HandlerPanicked {
        /// Name of the matched scenario.
        scenario: String,
        /// Formatted panic payload.
        message: String,
    },
    /// Rendering the documentation route failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Failure raised while rendering a scenario as Gherkin text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RenderError {
    /// A step's description could not be resolved.
    #[error("cannot render step {position} ({step_type}) of scenario `{scenario}`: {source}")]
    Step {
        /// Name of the scenario being rendered.
        scenario: String,
        /// Zero-based position of the step within the scenario.
        position: usize,
        /// Type of the failing step.
        step_type: StepType,
        /// Underlying resolution failure.
        #[source]
        source: ScenarioError,
    },
}

/// Failure raised while registering scenarios at startup.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RouterError {
    /// Two scenarios with the same name target the same endpoint.
    #[error("scenario `{name}` is already registered for {endpoint}")]
    DuplicateScenario {
        /// Name shared by both scenarios.
        name: String,
        /// Endpoint both scenarios are bound to.
        endpoint: Endpoint,
    },
    /// A scenario is bound to the configured documentation route.
    #[error("scenario `{name}` on {endpoint} is shadowed by the documentation route")]
    ShadowedByDocsRoute {
        /// Name of the unreachable scenario.
        name: String,
        /// Documentation endpoint.
        endpoint: Endpoint,
    },
}

/// Result alias for step evaluation and description resolution.
pub type Result<T, E = ScenarioError> = std::result::Result<T, E>;
