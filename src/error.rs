use thiserror::Error;

/// Errors returned by log density evaluations and by the wrappers around them.
///
/// Errors raised by user code (the scoring function, the transformation or a
/// gradient backend) are stored unchanged in the delegated variants. Use
/// [`LogDensityError::delegated`] to get at them, for example to downcast to
/// an error type of your own.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LogDensityError {
    /// A `Value` or `ValueGradient` would violate its finiteness invariant.
    ///
    /// `index` is 0 if the value itself is invalid and `i + 1` if the problem
    /// is the gradient entry `i`.
    #[error("invalid log density result at index {index}: {value}")]
    InvalidResult { index: usize, value: f64 },
    #[error("the problem cannot produce results of kind {kind}")]
    UnsupportedKind { kind: &'static str },
    #[error("no gradient backend registered under the name {name:?}")]
    UnsupportedBackend { name: String },
    #[error("invalid option {option:?} for gradient backend {backend:?}: {reason}")]
    InvalidBackendOption {
        backend: String,
        option: String,
        reason: String,
    },
    #[error("expected an input of length {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error(transparent)]
    Transformation(anyhow::Error),
    #[error(transparent)]
    Scoring(anyhow::Error),
    #[error(transparent)]
    Backend(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LogDensityError>;

/// Classification of [`LogDensityError`] variants.
///
/// `RejectErrors` is configured with a set of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    InvalidResult,
    UnsupportedKind,
    UnsupportedBackend,
    InvalidBackendOption,
    Domain,
    InvalidSettings,
    Transformation,
    Scoring,
    Backend,
}

impl LogDensityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LogDensityError::InvalidResult { .. } => ErrorKind::InvalidResult,
            LogDensityError::UnsupportedKind { .. } => ErrorKind::UnsupportedKind,
            LogDensityError::UnsupportedBackend { .. } => ErrorKind::UnsupportedBackend,
            LogDensityError::InvalidBackendOption { .. } => ErrorKind::InvalidBackendOption,
            LogDensityError::DimensionMismatch { .. } => ErrorKind::Domain,
            LogDensityError::InvalidSettings(_) => ErrorKind::InvalidSettings,
            LogDensityError::Transformation(_) => ErrorKind::Transformation,
            LogDensityError::Scoring(_) => ErrorKind::Scoring,
            LogDensityError::Backend(_) => ErrorKind::Backend,
        }
    }

    /// The user error behind a delegated variant.
    pub fn delegated(&self) -> Option<&anyhow::Error> {
        match self {
            LogDensityError::Transformation(err)
            | LogDensityError::Scoring(err)
            | LogDensityError::Backend(err) => Some(err),
            _ => None,
        }
    }

    /// Convert an error returned by user code.
    ///
    /// A `LogDensityError` that was passed through `anyhow` is returned as it
    /// was raised, everything else is stored in the variant built by `wrap`.
    pub(crate) fn from_callback(
        err: anyhow::Error,
        wrap: fn(anyhow::Error) -> LogDensityError,
    ) -> LogDensityError {
        match err.downcast::<LogDensityError>() {
            Ok(err) => err,
            Err(err) => wrap(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Error, Debug)]
    #[error("custom failure")]
    struct CustomError;

    #[test]
    fn kinds_of_variants() {
        let err = LogDensityError::InvalidResult {
            index: 2,
            value: f64::NAN,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidResult);
        let err = LogDensityError::DimensionMismatch {
            expected: 2,
            found: 3,
        };
        assert_eq!(err.kind(), ErrorKind::Domain);
        assert_eq!(
            LogDensityError::Scoring(CustomError.into()).kind(),
            ErrorKind::Scoring
        );
    }

    #[test]
    fn delegated_errors_are_transparent() {
        let err = LogDensityError::Scoring(CustomError.into());
        assert_eq!(err.to_string(), "custom failure");
        assert!(err.delegated().unwrap().is::<CustomError>());
        assert!(LogDensityError::InvalidSettings("x".into())
            .delegated()
            .is_none());
    }

    #[test]
    fn callback_errors_are_not_wrapped_twice() {
        let inner: anyhow::Error = LogDensityError::InvalidResult {
            index: 0,
            value: f64::INFINITY,
        }
        .into();
        let err = LogDensityError::from_callback(inner, LogDensityError::Scoring);
        assert_eq!(err.kind(), ErrorKind::InvalidResult);

        let err = LogDensityError::from_callback(CustomError.into(), LogDensityError::Scoring);
        assert_eq!(err.kind(), ErrorKind::Scoring);
    }
}
