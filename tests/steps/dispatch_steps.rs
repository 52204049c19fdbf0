use cucumber::{given, then, when};

use crate::world::DispatchWorld;

#[given("the authentication feature is registered")]
fn authentication_feature(world: &mut DispatchWorld) { world.register_authentication(); }

#[given(expr = "the documentation route {string} is enabled")]
fn docs_route(world: &mut DispatchWorld, route: String) { world.enable_docs(route); }

#[given("no mocks are registered")]
fn no_mocks(world: &mut DispatchWorld) { world.drop_mocks(); }

#[when(expr = "a {word} request for {string} arrives with credentials")]
async fn request_with_credentials(world: &mut DispatchWorld, method: String, path: String) {
    world.send(&method, &path, true).await;
}

#[when(expr = "a {word} request for {string} arrives without credentials")]
async fn request_without_credentials(world: &mut DispatchWorld, method: String, path: String) {
    world.send(&method, &path, false).await;
}

#[then(expr = "the response status is {int}")]
fn response_status(world: &mut DispatchWorld, status: u16) {
    assert_eq!(world.response().status(), status);
}

#[then(expr = "the response body is {string}")]
fn response_body(world: &mut DispatchWorld, body: String) {
    assert_eq!(world.response().body_text(), body);
}

#[then(expr = "the response body contains {string}")]
fn response_body_contains(world: &mut DispatchWorld, needle: String) {
    let body = world.response().body_text();
    assert!(body.contains(&needle), "{body}");
}

#[then(expr = "the matched scenario is {string}")]
fn matched_scenario(world: &mut DispatchWorld, scenario: String) {
    assert_eq!(world.matched_scenario(), Some(scenario.as_str()));
}

#[then("no scenario matched")]
fn no_scenario(world: &mut DispatchWorld) { assert_eq!(world.matched_scenario(), None); }

#[then(expr = "dispatch fails naming {string}")]
fn dispatch_fails(world: &mut DispatchWorld, needle: String) {
    let message = world.error().to_string();
    assert!(message.contains(&needle), "{message}");
}
