//! Shared fixtures for integration tests.
//!
//! Provides the authentication capability used throughout the suite: a
//! request-scoped mock whose `IsAuthenticated` member follows the `x-auth`
//! header, and a feature with one scenario per caller kind.

#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use rstest::fixture;
use smartmocks::{Endpoint, Feature, Member, MockRegistry, Request, Response, Scenario};

pub struct AuthenticationService;

pub const IS_AUTHENTICATED: Member<AuthenticationService, bool> = Member::new("IsAuthenticated");

pub const ROUTE: &str = "/features/v1/authenticated";

/// Mock registry configuring `IsAuthenticated` from the `x-auth` header.
#[fixture]
pub fn registry() -> MockRegistry {
    MockRegistry::builder()
        .describe(IS_AUTHENTICATED, |authenticated| {
            if *authenticated {
                "the user is authenticated".to_owned()
            } else {
                "the user is not authenticated".to_owned()
            }
        })
        .scoped_mock::<AuthenticationService, _>(|mock, request| {
            mock.setup(IS_AUTHENTICATED, request.header("x-auth").is_some());
        })
        .build()
}

pub fn authenticated_scenario() -> Scenario {
    Scenario::builder("Authenticated user")
        .given(IS_AUTHENTICATED, true)
        .when_endpoint(Endpoint::get("/authenticated"))
        .then_respond(
            "the response says authenticated",
            Response::text(200, "authenticated"),
        )
        .build()
}

pub fn anonymous_scenario() -> Scenario {
    Scenario::builder("Anonymous user")
        .given(IS_AUTHENTICATED, false)
        .when_endpoint(Endpoint::get("/authenticated"))
        .then_respond("the response says anonymous", Response::text(200, "anonymous"))
        .build()
}

/// Authentication feature mounted under `/features/v1`.
pub fn authentication_feature() -> Feature {
    Feature::versioned("Authentication", "/features", "v1")
        .scenario(authenticated_scenario())
        .scenario(anonymous_scenario())
}

/// Request for the authentication route, optionally carrying credentials.
pub fn auth_request(token: Option<&str>) -> Request {
    let request = Request::get(ROUTE);
    match token {
        Some(token) => request.with_header("x-auth", token),
        None => request,
    }
}
