//! Dispatcher configuration.
//!
//! [`DispatchConfig`] controls the observable edges of dispatch: the body of
//! "not found" answers, the optional documentation route and whether handler
//! panics are caught. It deserialises from JSON so hosts can ship it beside
//! their scenario declarations.

use serde::Deserialize;

use crate::endpoint::Endpoint;

/// Message returned in the body of unmatched requests.
pub const DEFAULT_NOT_FOUND_MESSAGE: &str = "Not Found";

/// Options applied by [`Dispatcher`](crate::dispatch::Dispatcher).
///
/// ```
/// use smartmocks::config::DispatchConfig;
///
/// let config: DispatchConfig =
///     serde_json::from_str(r#"{ "docs_route": "/_scenarios" }"#).expect("valid config");
/// assert_eq!(config.not_found_message, "Not Found");
/// assert_eq!(config.docs_route.as_deref(), Some("/_scenarios"));
/// assert!(config.catch_panics);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Body message of `404` answers. Never includes scenario names.
    pub not_found_message: String,
    /// `GET` route answering with the Gherkin rendering of every scenario.
    pub docs_route: Option<String>,
    /// Convert handler panics into [`DispatchError::HandlerPanicked`](crate::error::DispatchError::HandlerPanicked).
    pub catch_panics: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            not_found_message: DEFAULT_NOT_FOUND_MESSAGE.to_owned(),
            docs_route: None,
            catch_panics: true,
        }
    }
}

impl DispatchConfig {
    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] when `text` is not a valid
    /// configuration object.
    pub fn from_json(text: &str) -> serde_json::Result<Self> { serde_json::from_str(text) }

    /// Endpoint answered with documentation, if a docs route is set.
    #[must_use]
    pub fn docs_endpoint(&self) -> Option<Endpoint> { self.docs_route.as_deref().map(Endpoint::get) }

    /// Set the documentation route.
    #[must_use]
    pub fn with_docs_route(mut self, route: impl Into<String>) -> Self {
        self.docs_route = Some(route.into());
        self
    }
}
