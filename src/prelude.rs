//! Convenience imports for declaring and dispatching scenarios.
//!
//! # Examples
//!
//! ```rust
//! use smartmocks::prelude::*;
//!
//! struct Clock;
//! const IS_WEEKEND: Member<Clock, bool> = Member::new("IsWeekend");
//!
//! fn router() -> std::result::Result<ScenarioRouter, RouterError> {
//!     ScenarioRouter::new().scenario(
//!         Scenario::builder("Weekend")
//!             .given(IS_WEEKEND, true)
//!             .when_endpoint(Endpoint::get("/opening-hours"))
//!             .then_respond("the shop is closed", Response::text(200, "closed"))
//!             .build(),
//!     )
//! }
//! # router().expect("router");
//! ```

pub use futures::FutureExt as _;

pub use crate::{
    config::DispatchConfig,
    dispatch::{Dispatcher, Outcome, ScenarioRouter},
    endpoint::Endpoint,
    error::{DispatchError, RouterError, ScenarioError},
    feature::Feature,
    middleware::Service,
    mock::{Member, SmartMock},
    request::{Request, RequestContext, Response},
    scenario::{Scenario, ScenarioView},
    scope::{MockRegistry, ResolverExt},
};
