//! Typed results for best-effort decoding.
//!
//! Nothing in this crate aborts a page because one annotation is malformed.
//! Instead of collapsing every fallback into a bare `Option`, components
//! report which path produced the value so callers (and tests) can tell a
//! faithful decode apart from an approximation or a failure.

use crate::error::Error;

/// Result of a best-effort decoding step.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The value was decoded from the document as declared.
    Decoded(T),
    /// A value was produced, but through a documented fallback or approximation.
    Defaulted(T),
    /// No value could be produced.
    Failed(Error),
}

impl<T> Outcome<T> {
    /// Wrap an optional value, failing with `err` on `None`.
    pub fn from_option(value: Option<T>, err: impl FnOnce() -> Error) -> Self {
        match value {
            Some(v) => Outcome::Decoded(v),
            None => Outcome::Failed(err()),
        }
    }

    /// Chain a further step. A defaulted input keeps the result defaulted.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Decoded(v) => f(v),
            Outcome::Defaulted(v) => f(v).defaulted(),
            Outcome::Failed(e) => Outcome::Failed(e),
        }
    }

    /// Borrow the produced value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Decoded(v) | Outcome::Defaulted(v) => Some(v),
            Outcome::Failed(_) => None,
        }
    }

    /// Take the produced value, discarding how it was obtained.
    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Decoded(v) | Outcome::Defaulted(v) => Some(v),
            Outcome::Failed(_) => None,
        }
    }

    /// Convert into a `Result`, treating defaulted values as success.
    pub fn into_result(self) -> crate::error::Result<T> {
        match self {
            Outcome::Decoded(v) | Outcome::Defaulted(v) => Ok(v),
            Outcome::Failed(e) => Err(e),
        }
    }

    /// The failure reason, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Outcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// True if the value was decoded without fallbacks.
    pub fn is_decoded(&self) -> bool {
        matches!(self, Outcome::Decoded(_))
    }

    /// True if the value came from a fallback path.
    pub fn is_defaulted(&self) -> bool {
        matches!(self, Outcome::Defaulted(_))
    }

    /// True if no value was produced.
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Map the value, keeping the path that produced it.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Decoded(v) => Outcome::Decoded(f(v)),
            Outcome::Defaulted(v) => Outcome::Defaulted(f(v)),
            Outcome::Failed(e) => Outcome::Failed(e),
        }
    }

    /// Downgrade a decoded value to defaulted.
    pub fn defaulted(self) -> Self {
        match self {
            Outcome::Decoded(v) => Outcome::Defaulted(v),
            other => other,
        }
    }
}

impl<T> From<crate::error::Result<T>> for Outcome<T> {
    fn from(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(v) => Outcome::Decoded(v),
            Err(e) => Outcome::Failed(e),
        }
    }
}
