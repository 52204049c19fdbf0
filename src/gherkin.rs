//! Gherkin rendering of scenarios and features.
//!
//! Rendering is a pure function of a scenario and the resolver it is
//! rendered against: step descriptions are resolved at render time, so the
//! same scenario can read differently under different mock configurations.
//!
//! A scenario renders as a `Scenario: <name>` header followed by one
//! `<Keyword> <description>` line per step, joined by `\n` with no trailing
//! newline.

use crate::{error::RenderError, feature::Feature, scenario::Scenario, scope::Resolver};

/// Render `scenario` against `resolver`.
///
/// # Errors
///
/// Returns [`RenderError::Step`] for the first step whose description cannot
/// be resolved, identifying its position and type.
///
/// # Examples
///
/// ```
/// use smartmocks::{gherkin, request::Response, scenario::Scenario, scope::RequestScope};
///
/// let scenario = Scenario::builder("round trip")
///     .given_that("a", |_| Ok(true))
///     .when("b")
///     .then_respond("c", Response::ok())
///     .build();
/// let text = gherkin::render_scenario(&scenario, &RequestScope::default()).expect("render");
/// assert_eq!(text, "Scenario: round trip\nGiven a\nWhen b\nThen c");
/// ```
pub fn render_scenario(scenario: &Scenario, resolver: &dyn Resolver) -> Result<String, RenderError> {
    let mut out = format!("Scenario: {}", scenario.name());
    for (position, step) in scenario.steps().iter().enumerate() {
        let description = step
            .description(resolver)
            .map_err(|source| RenderError::Step {
                scenario: scenario.name().to_owned(),
                position,
                step_type: step.step_type(),
                source,
            })?;
        out.push('\n');
        out.push_str(step.step_type().keyword());
        out.push(' ');
        out.push_str(&description);
    }
    Ok(out)
}

/// Render `feature` and all of its scenarios against `resolver`.
///
/// The `Feature:` header is followed by the description (if any) indented
/// two spaces, then each scenario block preceded by a blank line.
///
/// # Errors
///
/// Propagates the first [`RenderError`] raised by a scenario.
pub fn render_feature(feature: &Feature, resolver: &dyn Resolver) -> Result<String, RenderError> {
    let mut out = format!("Feature: {}", feature.name());
    if let Some(description) = feature.description() {
        out.push_str("\n  ");
        out.push_str(description);
    }
    for scenario in feature.scenarios() {
        out.push_str("\n\n");
        out.push_str(&render_scenario(scenario, resolver)?);
    }
    Ok(out)
}
