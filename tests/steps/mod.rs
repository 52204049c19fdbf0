//! Step definitions for behavioural tests.

mod dispatch_steps;
