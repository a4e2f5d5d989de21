// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::error::EnumerationError;

/// Result of a fetch which may have been cut short.
///
/// Holds everything accumulated until an enumeration failed, together with that failure. The
/// value is valid but possibly incomplete, callers decide whether to keep it.
#[derive(Debug)]
#[must_use = "a partial result may carry an enumeration error"]
pub struct Partial<T> {
    value: T,
    error: Option<EnumerationError>,
}

impl<T> Partial<T> {
    pub(crate) fn complete(value: T) -> Self {
        Self { value, error: None }
    }

    pub(crate) fn failed(value: T, error: EnumerationError) -> Self {
        Self {
            value,
            error: Some(error),
        }
    }

    /// Returns `true` if no enumeration failed.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn error(&self) -> Option<&EnumerationError> {
        self.error.as_ref()
    }

    /// Discards the accumulated value if an enumeration failed.
    pub fn into_result(self) -> Result<T, EnumerationError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.value),
        }
    }

    /// Keeps the accumulated value in any case.
    pub fn into_parts(self) -> (T, Option<EnumerationError>) {
        (self.value, self.error)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Partial<U> {
        Partial {
            value: f(self.value),
            error: self.error,
        }
    }
}
