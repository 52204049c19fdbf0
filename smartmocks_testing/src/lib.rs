//! Helpers for exercising a [`Dispatcher`](smartmocks::Dispatcher) in tests.
//!
//! ```rust
//! use smartmocks::{Endpoint, MockRegistry, Request, Response, Scenario, ScenarioRouter};
//! use smartmocks_testing::dispatch_once;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let dispatcher = ScenarioRouter::new()
//!     .scenario(
//!         Scenario::builder("ping")
//!             .when_endpoint(Endpoint::get("/ping"))
//!             .then_respond("pong", Response::text(200, "pong"))
//!             .build(),
//!     )
//!     .expect("unique scenario")
//!     .build();
//! let response = dispatch_once(&dispatcher, &MockRegistry::builder().build(), Request::get("/ping"))
//!     .await
//!     .expect("dispatch");
//! assert_eq!(response.body_text(), "pong");
//! # }
//! ```

pub mod helpers;
pub mod logging;
pub mod macros;

pub use helpers::{CallCounter, capture_counters, counter_value, dispatch_once, outcome_of};
pub use logging::{LoggerHandle, logger};
