//! Assertion macros shared by integration tests.

/// Await a dispatch future, panicking with the error and call site if
/// dispatch fails.
///
/// With `=> scenario`, the future must yield an
/// [`Outcome`](smartmocks::Outcome) answered by `scenario`; the outcome is
/// returned for further checks.
#[macro_export]
macro_rules! dispatch_expect {
    ($fut:expr => $scenario:expr) => {{
        let outcome = $crate::dispatch_expect!($fut);
        assert_eq!(
            outcome.scenario(),
            Some($scenario),
            "unexpected scenario at {}:{}",
            file!(),
            line!()
        );
        outcome
    }};
    ($fut:expr) => {{
        match $fut.await {
            Ok(value) => value,
            Err(error) => panic!("dispatch failed at {}:{}: {error}", file!(), line!()),
        }
    }};
}

pub use crate::dispatch_expect;
