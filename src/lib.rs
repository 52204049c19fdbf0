#![doc(html_root_url = "https://docs.rs/smartmocks/latest")]
//! Scenario evaluation and dispatch engine for mock-backed HTTP endpoints.
//!
//! Engineers declare, per route, named Given/When/Then [`Scenario`]s whose
//! preconditions inspect request-scoped [`SmartMock`]s. A [`Dispatcher`]
//! groups scenarios by [`Endpoint`] and answers each request with the first
//! scenario whose preconditions hold. The same declarations render as
//! Gherkin text through [`gherkin`].

pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod feature;
pub mod gherkin;
pub mod metrics;
pub mod middleware;
pub mod mock;
pub mod panic;
pub mod prelude;
pub mod request;
pub mod scenario;
pub mod scope;
pub mod step;

pub use config::DispatchConfig;
pub use dispatch::{DispatchStats, Dispatcher, Outcome, ScenarioGroup, ScenarioRouter};
pub use endpoint::Endpoint;
pub use error::{DispatchError, RenderError, Result, RouterError, ScenarioError};
pub use feature::Feature;
pub use metrics::{DISPATCH_ERRORS, REQUESTS_UNMATCHED, SCENARIOS_MATCHED};
pub use mock::{DescriptionRegistry, Member, SmartMock};
pub use request::{Request, RequestContext, Response};
pub use scenario::{Scenario, ScenarioView, StepTrace};
pub use scope::{MockRegistry, RequestScope, Resolver, ResolverExt};
pub use step::{Description, Step, StepType};
