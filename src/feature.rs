//! Features: named collections of scenarios sharing a route prefix.
//!
//! A feature mounts every scenario it owns under its prefix (and optional
//! version segment) and renders as a single Gherkin `Feature:` block on the
//! documentation route.

use std::sync::Arc;

use crate::scenario::Scenario;

/// Named group of scenarios mounted under a common prefix.
///
/// ```
/// use smartmocks::{endpoint::Endpoint, feature::Feature, request::Response, scenario::Scenario};
///
/// let feature = Feature::versioned("Authentication", "/features", "v1").scenario(
///     Scenario::builder("anyone")
///         .when_endpoint(Endpoint::get("/ping"))
///         .then_respond("pong", Response::text(200, "pong"))
///         .build(),
/// );
/// let scenario = feature.scenarios().next().expect("one scenario");
/// assert_eq!(scenario.endpoint(), Some(&Endpoint::get("/features/v1/ping")));
/// ```
#[derive(Debug)]
pub struct Feature {
    name: String,
    description: Option<String>,
    mount: String,
    scenarios: Vec<Arc<Scenario>>,
}

impl Feature {
    /// Create a feature whose scenarios are mounted under `prefix`.
    #[must_use]
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            mount: prefix.into(),
            scenarios: Vec::new(),
        }
    }

    /// Create a feature mounted under `prefix/version`.
    #[must_use]
    pub fn versioned(name: impl Into<String>, prefix: &str, version: &str) -> Self {
        Self::new(name, format!("{}/{}", prefix.trim_end_matches('/'), version.trim_matches('/')))
    }

    /// Attach a free-text description rendered under the header.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add `scenario`, mounting its route under this feature's prefix.
    #[must_use]
    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(Arc::new(scenario.nested(&self.mount)));
        self
    }

    /// Feature name.
    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// Feature description.
    #[must_use]
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }

    /// Prefix applied to every scenario route.
    #[must_use]
    pub fn mount(&self) -> &str { &self.mount }

    /// Scenarios in declaration order.
    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter().map(|scenario| &**scenario)
    }

    pub(crate) fn shared_scenarios(&self) -> &[Arc<Scenario>] { &self.scenarios }
}
