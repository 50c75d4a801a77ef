use std::fmt::Debug;

use crate::{
    error::{LogDensityError, Result},
    problem::LogDensity,
    rejection::{catch_rejection, CallbackError},
    value::Value,
};

/// Maps a flat real vector to the parameters of a model.
pub trait Transformation: Send + Sync {
    type Output;

    /// The length of the flat input vector.
    fn dim(&self) -> usize;

    /// Transform `position` and return the log absolute determinant of the
    /// Jacobian of the transformation at that point.
    ///
    /// Inputs of the wrong length must result in an error.
    fn transform_with_jacobian(&self, position: &[f64]) -> anyhow::Result<(Self::Output, f64)>;
}

/// The identity on `R^dim`, with a log Jacobian of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    dim: usize,
}

impl Identity {
    pub fn new(dim: usize) -> Self {
        Identity { dim }
    }
}

impl Transformation for Identity {
    type Output = Vec<f64>;

    fn dim(&self) -> usize {
        self.dim
    }

    fn transform_with_jacobian(&self, position: &[f64]) -> anyhow::Result<(Vec<f64>, f64)> {
        if position.len() != self.dim {
            return Err(LogDensityError::DimensionMismatch {
                expected: self.dim,
                found: position.len(),
            }
            .into());
        }
        Ok((position.to_vec(), 0.))
    }
}

/// Access to the transformation of the innermost problem.
///
/// Implemented by [`TransformedLogDensity`] and forwarded by all wrappers of
/// this crate.
pub trait HasTransformation {
    type Transformation: Transformation;

    fn transformation(&self) -> &Self::Transformation;
}

/// Access to the scoring function of the innermost problem.
///
/// Forwarded by the same wrappers as [`HasTransformation`].
pub trait HasScoringFunction {
    type ScoringFunction;

    fn scoring_function(&self) -> &Self::ScoringFunction;
}

/// A log density defined by a transformation and a scoring function on the
/// transformed parameters.
///
/// The log density at `x` is `score(t(x)) + log|det J_t(x)|`. If either the
/// transformation or the scoring function returns a [`Rejection`](crate::Rejection),
/// the log density is negative infinity. All other errors are returned.
pub struct TransformedLogDensity<T, F> {
    transformation: T,
    scoring_function: F,
}

impl<T, F> TransformedLogDensity<T, F>
where
    T: Transformation,
    F: Fn(&T::Output) -> anyhow::Result<f64> + Send + Sync,
{
    pub fn new(transformation: T, scoring_function: F) -> Self {
        TransformedLogDensity {
            transformation,
            scoring_function,
        }
    }

    fn score(&self, position: &[f64]) -> std::result::Result<f64, CallbackError> {
        let (params, log_jacobian) = self
            .transformation
            .transform_with_jacobian(position)
            .map_err(CallbackError::transformation)?;
        let score = (self.scoring_function)(&params).map_err(CallbackError::scoring)?;
        Ok(score + log_jacobian)
    }
}

impl<T, F> HasTransformation for TransformedLogDensity<T, F>
where
    T: Transformation,
{
    type Transformation = T;

    fn transformation(&self) -> &T {
        &self.transformation
    }
}

impl<T, F> HasScoringFunction for TransformedLogDensity<T, F> {
    type ScoringFunction = F;

    fn scoring_function(&self) -> &F {
        &self.scoring_function
    }
}

impl<T, F> LogDensity for TransformedLogDensity<T, F>
where
    T: Transformation,
    F: Fn(&T::Output) -> anyhow::Result<f64> + Send + Sync,
{
    fn dim(&self) -> usize {
        self.transformation.dim()
    }

    fn logdensity(&self, position: &[f64]) -> Result<Value> {
        Value::new(catch_rejection(self.score(position))?)
    }
}

impl<T: Debug, F> Debug for TransformedLogDensity<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformedLogDensity")
            .field("transformation", &self.transformation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        problem::{evaluate, GradientKind, ValueKind},
        rejection::{reject, reject_if},
    };
    use pretty_assertions::assert_eq;
    use thiserror::Error;

    /// Maps `R` to the positive reals with `exp`.
    struct Positive;

    impl Transformation for Positive {
        type Output = f64;

        fn dim(&self) -> usize {
            1
        }

        fn transform_with_jacobian(&self, position: &[f64]) -> anyhow::Result<(f64, f64)> {
            match position {
                [x] => Ok((x.exp(), *x)),
                _ => Err(LogDensityError::DimensionMismatch {
                    expected: 1,
                    found: position.len(),
                }
                .into()),
            }
        }
    }

    #[derive(Error, Debug)]
    #[error("bug in model")]
    struct ModelBug;

    #[test]
    fn value_includes_log_jacobian() {
        // Exponential(1) on the unconstrained scale
        let problem = TransformedLogDensity::new(Positive, |&y: &f64| Ok(-y));
        assert_eq!(problem.dim(), 1);
        let value = evaluate(ValueKind, &problem, &[0.5]).unwrap();
        assert_eq!(value.value(), -(0.5f64.exp()) + 0.5);
    }

    #[test]
    fn identity_problem() {
        let problem = TransformedLogDensity::new(Identity::new(3), |x: &Vec<f64>| {
            Ok(x.iter().sum::<f64>())
        });
        assert_eq!(problem.dim(), 3);
        assert_eq!(problem.transformation(), &Identity::new(3));
        assert_eq!(problem.logdensity(&[1., 2., 3.]).unwrap().value(), 6.);
    }

    #[test]
    fn scoring_function_is_accessible() {
        let problem = TransformedLogDensity::new(Positive, |&y: &f64| Ok(-2. * y));
        assert_eq!((problem.scoring_function())(&1.5).unwrap(), -3.);
    }

    #[test]
    fn rejection_gives_neg_infinity() {
        let problem = TransformedLogDensity::new(Identity::new(1), |x: &Vec<f64>| {
            reject_if(x[0] < 0.)?;
            Ok(x[0].ln())
        });
        let value = problem.logdensity(&[-1.]).unwrap();
        assert!(value.is_infinite());
        assert_eq!(problem.logdensity(&[1.]).unwrap().value(), 0.);
    }

    #[test]
    fn rejection_in_transformation() {
        struct Rejecting;

        impl Transformation for Rejecting {
            type Output = ();

            fn dim(&self) -> usize {
                0
            }

            fn transform_with_jacobian(&self, _position: &[f64]) -> anyhow::Result<((), f64)> {
                reject()
            }
        }

        let problem = TransformedLogDensity::new(Rejecting, |_: &()| Ok(0.));
        assert_eq!(problem.logdensity(&[]).unwrap(), Value::neg_infinity());
    }

    #[test]
    fn other_errors_propagate() {
        let problem = TransformedLogDensity::new(Identity::new(1), |_: &Vec<f64>| {
            Err(ModelBug.into())
        });
        let err = problem.logdensity(&[0.]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Scoring);
        assert!(err.delegated().unwrap().is::<ModelBug>());
    }

    #[test]
    fn dimension_mismatch_is_a_domain_error() {
        let problem = TransformedLogDensity::new(Identity::new(2), |x: &Vec<f64>| Ok(x[0] + x[1]));
        let err = problem.logdensity(&[1.]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
        let err = problem.logdensity(&[1., 2., 3.]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
    }

    #[test]
    fn invalid_scores_are_reported() {
        let problem = TransformedLogDensity::new(Identity::new(1), |x: &Vec<f64>| {
            Ok(if x[0] > 0. { f64::NAN } else { f64::INFINITY })
        });
        for x in [1., -1.] {
            match problem.logdensity(&[x]).unwrap_err() {
                LogDensityError::InvalidResult { index, .. } => assert_eq!(index, 0),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn gradient_is_unsupported() {
        let problem = TransformedLogDensity::new(Identity::new(1), |x: &Vec<f64>| Ok(x[0]));
        let err = evaluate(GradientKind, &problem, &[1.]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedKind);
    }
}
