//! Route identity used to group scenarios.
//!
//! An [`Endpoint`] pairs an HTTP method with a route. Both parts compare
//! case-insensitively, so `get /Users/` and `GET /users` name the same
//! dispatch group. Routes fold case per Unicode character, so non-ASCII
//! segments group the same way.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// Method and route identifying one dispatch group.
///
/// # Examples
///
/// ```
/// use smartmocks::endpoint::Endpoint;
///
/// assert_eq!(Endpoint::get("/Users/"), Endpoint::new("get", "users"));
/// assert_eq!(Endpoint::post("/users").to_string(), "POST /users");
/// ```
#[derive(Clone, Debug)]
pub struct Endpoint {
    method: String,
    route: String,
}

impl Endpoint {
    /// Create an endpoint for `method` and `route`.
    ///
    /// The method is upper-cased and the route normalised: a leading slash
    /// is added, repeated slashes collapse and a trailing slash is dropped.
    #[must_use]
    pub fn new(method: impl AsRef<str>, route: impl AsRef<str>) -> Self {
        Self {
            method: method.as_ref().trim().to_ascii_uppercase(),
            route: normalise_route(route.as_ref()),
        }
    }

    /// `GET` endpoint for `route`.
    #[must_use]
    pub fn get(route: impl AsRef<str>) -> Self { Self::new("GET", route) }

    /// `POST` endpoint for `route`.
    #[must_use]
    pub fn post(route: impl AsRef<str>) -> Self { Self::new("POST", route) }

    /// `PUT` endpoint for `route`.
    #[must_use]
    pub fn put(route: impl AsRef<str>) -> Self { Self::new("PUT", route) }

    /// `PATCH` endpoint for `route`.
    #[must_use]
    pub fn patch(route: impl AsRef<str>) -> Self { Self::new("PATCH", route) }

    /// `DELETE` endpoint for `route`.
    #[must_use]
    pub fn delete(route: impl AsRef<str>) -> Self { Self::new("DELETE", route) }

    /// Upper-cased HTTP method.
    #[must_use]
    pub fn method(&self) -> &str { &self.method }

    /// Normalised route, preserving the declared letter case.
    #[must_use]
    pub fn route(&self) -> &str { &self.route }

    /// Return a copy of this endpoint mounted under `prefix`.
    ///
    /// ```
    /// use smartmocks::endpoint::Endpoint;
    ///
    /// let nested = Endpoint::get("/authenticated").nested("/features/v1/");
    /// assert_eq!(nested.route(), "/features/v1/authenticated");
    /// ```
    #[must_use]
    pub fn nested(&self, prefix: &str) -> Self {
        Self {
            method: self.method.clone(),
            route: normalise_route(&format!("{prefix}/{}", self.route)),
        }
    }
}

fn normalise_route(route: &str) -> String {
    let segments: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

// Equality and hashing both go through this fold.
fn folded(route: &str) -> impl Iterator<Item = char> + '_ {
    route.chars().flat_map(char::to_lowercase)
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && folded(&self.route).eq(folded(&other.route))
    }
}

impl Eq for Endpoint {}

impl Hash for Endpoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.method.hash(state);
        for c in folded(&self.route) {
            c.hash(state);
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.route)
    }
}
