use thiserror::Error;

use crate::error::{LogDensityError, Result};

/// Marks a point as infeasible.
///
/// Scoring functions and transformations return this (usually through
/// [`reject`]) to say that the log density at the current point is negative
/// infinity. `TransformedLogDensity` converts it to such a value, so callers
/// of `evaluate` never see it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("point rejected")]
pub struct Rejection;

/// Reject the current point.
///
/// ```
/// fn score(x: &[f64]) -> anyhow::Result<f64> {
///     if x[0] < 0. {
///         return logdensity::reject();
///     }
///     Ok(-x[0])
/// }
/// # assert_eq!(score(&[1.]).unwrap(), -1.);
/// ```
pub fn reject<T>() -> anyhow::Result<T> {
    Err(Rejection.into())
}

/// Reject the current point if `condition` holds.
pub fn reject_if(condition: bool) -> anyhow::Result<()> {
    if condition {
        reject()
    } else {
        Ok(())
    }
}

/// An error returned by user code, tagged with the variant it is reported as.
pub(crate) struct CallbackError {
    err: anyhow::Error,
    wrap: fn(anyhow::Error) -> LogDensityError,
}

impl CallbackError {
    pub(crate) fn transformation(err: anyhow::Error) -> Self {
        CallbackError {
            err,
            wrap: LogDensityError::Transformation,
        }
    }

    pub(crate) fn scoring(err: anyhow::Error) -> Self {
        CallbackError {
            err,
            wrap: LogDensityError::Scoring,
        }
    }
}

/// Replace a rejection by negative infinity.
///
/// This is the only place where a `Rejection` is intercepted. All other
/// errors are returned unchanged.
pub(crate) fn catch_rejection(result: std::result::Result<f64, CallbackError>) -> Result<f64> {
    match result {
        Ok(value) => Ok(value),
        Err(CallbackError { err, .. }) if err.is::<Rejection>() => Ok(f64::NEG_INFINITY),
        Err(CallbackError { err, wrap }) => Err(LogDensityError::from_callback(err, wrap)),
    }
}
