//! Request and response types exchanged with the host.
//!
//! [`Request`] carries the parts of an inbound HTTP request the engine needs;
//! [`RequestContext`] pairs it with the request's own dependency scope.
//! Handlers return a [`Response`].

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::{
    endpoint::Endpoint,
    error::Result,
    scope::{RequestScope, Resolver, ResolverExt},
};

/// Inbound request metadata.
#[derive(Clone, Debug, Default)]
pub struct Request {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Request {
    /// Create a request for `method` and `path` with no headers or body.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Shorthand for a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self { Self::new("GET", path) }

    /// Add a header. Header names compare case-insensitively.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Request method as received.
    #[must_use]
    pub fn method(&self) -> &str { &self.method }

    /// Request path as received.
    #[must_use]
    pub fn path(&self) -> &str { &self.path }

    /// First value of header `name`, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Request body.
    #[must_use]
    pub fn body(&self) -> &Bytes { &self.body }

    /// Path without its query string or fragment.
    #[must_use]
    pub fn route_path(&self) -> &str {
        self.path
            .find(['?', '#'])
            .map_or(self.path.as_str(), |end| &self.path[..end])
    }

    /// Route identity of this request.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint { Endpoint::new(&self.method, self.route_path()) }
}

/// A request together with the dependency scope created for it.
///
/// Every precondition and handler receives the context of the request being
/// dispatched, so mocks configured for one request are never visible to
/// another.
pub struct RequestContext {
    request: Request,
    scope: RequestScope,
}

impl RequestContext {
    /// Pair `request` with its `scope`.
    #[must_use]
    pub fn new(request: Request, scope: RequestScope) -> Self { Self { request, scope } }

    /// The inbound request.
    #[must_use]
    pub fn request(&self) -> &Request { &self.request }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &str { self.request.method() }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str { self.request.path() }

    /// Resolver for this request's scope.
    #[must_use]
    pub fn resolver(&self) -> &dyn Resolver { &self.scope }

    /// Resolve a dependency of type `T` from this request's scope.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::DependencyNotRegistered`](crate::error::ScenarioError::DependencyNotRegistered)
    /// if the scope holds no `T`.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<&T> { self.scope.resolve::<T>() }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request", &self.request)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Response produced by a scenario handler or by the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

#[derive(Serialize)]
struct Message<'a> {
    message: &'a str,
}

impl Response {
    /// Empty response with `status`.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Empty `200 OK`.
    #[must_use]
    pub fn ok() -> Self { Self::new(200) }

    /// Plain-text response.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status)
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_body(body.into())
    }

    /// JSON response serialised from `value`.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if `value` cannot be serialised.
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> serde_json::Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(body))
    }

    /// `404 Not Found` carrying only `{"message": ...}`.
    #[must_use]
    pub fn not_found(message: &str) -> Self { Self::message(404, message) }

    /// `500 Internal Server Error` carrying only `{"message": ...}`.
    #[must_use]
    pub fn internal_error(message: &str) -> Self { Self::message(500, message) }

    fn message(status: u16, message: &str) -> Self {
        Self::json(status, &Message { message })
            .unwrap_or_else(|_| Self::text(status, message.to_owned()))
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Status code.
    #[must_use]
    pub fn status(&self) -> u16 { self.status }

    /// First value of header `name`, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Headers in insertion order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Response body.
    #[must_use]
    pub fn body(&self) -> &Bytes { &self.body }

    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn body_text(&self) -> String { String::from_utf8_lossy(&self.body).into_owned() }
}
