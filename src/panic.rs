//! Formatting of panic payloads raised by scenario handlers.

use std::{any::Any, fmt};

/// Displayable view of a panic payload.
///
/// `String` and `&'static str` payloads print as their text; any other
/// payload falls back to `Debug` formatting.
///
/// ```
/// use smartmocks::panic::format_panic;
///
/// assert_eq!(format_panic(Box::new("boom")).to_string(), "boom");
/// assert_eq!(format_panic(Box::new(String::from("bang"))).to_string(), "bang");
/// assert!(format_panic(Box::new(7_u8)).to_string().contains("Any"));
/// ```
#[derive(Debug)]
#[must_use]
pub struct PanicMessage(Box<dyn Any + Send>);

impl PanicMessage {
    /// Text of the payload when it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| self.0.downcast_ref::<&'static str>().copied())
    }
}

impl fmt::Display for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(text) => f.write_str(text),
            None => write!(f, "{:?}", self.0),
        }
    }
}

/// Wrap a payload caught by `catch_unwind`.
pub fn format_panic(payload: Box<dyn Any + Send>) -> PanicMessage { PanicMessage(payload) }
