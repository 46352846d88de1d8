// --- File: crates/dimple_common/src/error.rs ---
//! Startup errors and the HTTP status mapping trait.
//!
//! The domain taxonomies (`BookingError`, `PaymentError`) live next to the
//! logic that produces them. What lives here is the error a Dimple binary
//! dies with before it can serve traffic, and the trait the handler layer
//! uses to turn a domain error into a status code.

use std::fmt;
use thiserror::Error;

/// A fatal error raised while bootstrapping a Dimple binary: bad
/// configuration, an unreachable database, a port that will not bind.
#[derive(Error, Debug)]
pub enum DimpleError {
    #[error("configuration error: {0}")]
    Config(String),

    /// A lower-level failure wrapped with what the binary was doing at the
    /// time, via [`Context`].
    #[error("startup failed: {0}")]
    Startup(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Builds a [`DimpleError::Config`] from anything displayable; shaped for
/// `Result::map_err`.
pub fn config_error<T: fmt::Display>(message: T) -> DimpleError {
    DimpleError::Config(message.to_string())
}

/// Maps an error onto the HTTP status code the REST layer answers with.
///
/// Each domain error enum implements this next to its definition; the
/// handlers only ever see the trait.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

/// Attaches what the caller was doing to an error that ends the process.
pub trait Context<T, E> {
    fn context<C>(self, context: C) -> Result<T, DimpleError>
    where
        C: fmt::Display;
}

impl<T, E: std::error::Error> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, DimpleError>
    where
        C: fmt::Display,
    {
        self.map_err(|error| DimpleError::Startup(format!("{}: {}", context, error)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Error, Debug)]
    #[error("pool exhausted")]
    struct FakeDbError;

    #[test]
    fn context_names_the_failed_step() {
        let result: Result<(), FakeDbError> = Err(FakeDbError);
        let err = result.context("connecting to the database").unwrap_err();
        assert_eq!(
            err.to_string(),
            "startup failed: connecting to the database: pool exhausted"
        );
    }

    #[test]
    fn ok_results_pass_through_untouched() {
        let result: Result<u16, FakeDbError> = Ok(8086);
        assert_eq!(result.context("irrelevant").unwrap(), 8086);
    }
}
