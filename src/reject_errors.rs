use std::fmt::Debug;

use crate::{
    error::{ErrorKind, LogDensityError, Result},
    problem::{Capability, GradientKind, LogDensity, ResultKind, ValueKind, Wrapper},
    transformed::{HasScoringFunction, HasTransformation},
    value::{Value, ValueGradient},
};

#[derive(Clone, Copy)]
enum ErrorMatcher {
    Kind(ErrorKind),
    Source {
        type_name: &'static str,
        matches: fn(&LogDensityError) -> bool,
    },
}

impl ErrorMatcher {
    fn matches(&self, err: &LogDensityError) -> bool {
        match self {
            ErrorMatcher::Kind(kind) => err.kind() == *kind,
            ErrorMatcher::Source { matches, .. } => matches(err),
        }
    }
}

impl Debug for ErrorMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorMatcher::Kind(kind) => write!(f, "{kind:?}"),
            ErrorMatcher::Source { type_name, .. } => write!(f, "Source({type_name})"),
        }
    }
}

fn delegated_is<E>(err: &LogDensityError) -> bool
where
    E: std::fmt::Display + Debug + Send + Sync + 'static,
{
    err.delegated().is_some_and(|inner| inner.is::<E>())
}

/// Turns selected errors of the parent into a log density of negative infinity.
///
/// By default only `InvalidResult` errors are caught, which is what gradient
/// backends produce when they step outside of the support. Other errors are
/// returned unchanged. Use this wrapper only for errors that are known to
/// mean "outside the support", it will also hide real bugs of those kinds.
#[derive(Debug)]
pub struct RejectErrors<P> {
    parent: P,
    catching: Vec<ErrorMatcher>,
}

impl<P: LogDensity> RejectErrors<P> {
    pub fn new(parent: P) -> Self {
        Self::catching(parent, [ErrorKind::InvalidResult])
    }

    /// Catch exactly the errors of the given kinds.
    pub fn catching(parent: P, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        RejectErrors {
            parent,
            catching: kinds.into_iter().map(ErrorMatcher::Kind).collect(),
        }
    }

    pub fn also_catching(mut self, kind: ErrorKind) -> Self {
        self.catching.push(ErrorMatcher::Kind(kind));
        self
    }

    /// Also catch errors raised by user code whose underlying error has type `E`.
    pub fn also_catching_source<E>(mut self) -> Self
    where
        E: std::fmt::Display + Debug + Send + Sync + 'static,
    {
        self.catching.push(ErrorMatcher::Source {
            type_name: std::any::type_name::<E>(),
            matches: delegated_is::<E>,
        });
        self
    }

    pub fn is_caught(&self, err: &LogDensityError) -> bool {
        self.catching.iter().any(|matcher| matcher.matches(err))
    }

    fn intercept<K: ResultKind>(&self, position: &[f64]) -> Result<K::Output> {
        match K::evaluate(&self.parent, position) {
            Err(err) if self.is_caught(&err) => {
                log::debug!("replacing {} error by negative infinity: {err}", K::NAME);
                Ok(K::rejected(self.parent.dim()))
            }
            other => other,
        }
    }
}

impl<P: LogDensity> LogDensity for RejectErrors<P> {
    fn dim(&self) -> usize {
        self.parent.dim()
    }

    fn capability(&self) -> Capability {
        self.parent.capability()
    }

    fn logdensity(&self, position: &[f64]) -> Result<Value> {
        self.intercept::<ValueKind>(position)
    }

    fn logdensity_and_gradient(&self, position: &[f64]) -> Result<ValueGradient> {
        self.intercept::<GradientKind>(position)
    }
}

impl<P: LogDensity> Wrapper for RejectErrors<P> {
    type Parent = P;

    fn parent(&self) -> &P {
        &self.parent
    }

    fn into_parent(self) -> P {
        self.parent
    }
}

impl<P: HasTransformation> HasTransformation for RejectErrors<P> {
    type Transformation = P::Transformation;

    fn transformation(&self) -> &Self::Transformation {
        self.parent.transformation()
    }
}

impl<P: HasScoringFunction> HasScoringFunction for RejectErrors<P> {
    type ScoringFunction = P::ScoringFunction;

    fn scoring_function(&self) -> &Self::ScoringFunction {
        self.parent.scoring_function()
    }
}
