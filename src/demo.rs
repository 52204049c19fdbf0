//! Demo authentication feature served by the binary.

use smartmocks::{Endpoint, Feature, Member, MockRegistry, Response, Scenario};

/// Capability whose state the demo scenarios inspect.
pub struct AuthenticationService;

/// Whether the caller presented credentials.
pub const IS_AUTHENTICATED: Member<AuthenticationService, bool> = Member::new("IsAuthenticated");

/// Header carrying the caller's credentials.
const AUTH_HEADER: &str = "x-auth";

/// Mocks configured from each request's headers.
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
            mock.setup(IS_AUTHENTICATED, request.header(AUTH_HEADER).is_some());
        })
        .build()
}

/// `GET /features/v1/authenticated`, answered differently per caller.
pub fn authentication() -> Feature {
    Feature::versioned("Authentication", "/features", "v1")
        .with_description("Responses depend on whether the caller is signed in")
        .scenario(
            Scenario::builder("Authenticated user")
                .given(IS_AUTHENTICATED, true)
                .when_endpoint(Endpoint::get("/authenticated"))
                .then_respond(
                    "the response says authenticated",
                    Response::text(200, "authenticated"),
                )
                .build(),
        )
        .scenario(
            Scenario::builder("Anonymous user")
                .given(IS_AUTHENTICATED, false)
                .when_endpoint(Endpoint::get("/authenticated"))
                .then_respond("the response says anonymous", Response::text(200, "anonymous"))
                .build(),
        )
}
