use std::{fmt::Debug, sync::Arc};

use crate::{
    error::{LogDensityError, Result},
    value::{Value, ValueGradient},
};

/// The highest result kind a log density can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// Only the value of the log density.
    Value,
    /// The value and the gradient.
    Gradient,
}

/// An unnormalized log density of a real vector.
///
/// Inference algorithms only talk to this trait. Implementations must be safe
/// to evaluate from several threads at once, evaluations do not share state.
pub trait LogDensity: Send + Sync {
    /// The length of the input vector.
    fn dim(&self) -> usize;

    fn capability(&self) -> Capability {
        Capability::Value
    }

    fn logdensity(&self, position: &[f64]) -> Result<Value>;

    /// Problems that only implement the value fail with `UnsupportedKind`.
    fn logdensity_and_gradient(&self, _position: &[f64]) -> Result<ValueGradient> {
        Err(LogDensityError::UnsupportedKind {
            kind: GradientKind::NAME,
        })
    }
}

/// A log density that wraps another one.
pub trait Wrapper: LogDensity {
    type Parent: LogDensity;

    fn parent(&self) -> &Self::Parent;
    fn into_parent(self) -> Self::Parent;
}

mod private {
    pub trait Sealed {}

    impl Sealed for super::ValueKind {}
    impl Sealed for super::GradientKind {}
}

/// Selects the shape of the result of [`evaluate`].
pub trait ResultKind: private::Sealed + Copy + Debug + Send + Sync + 'static {
    type Output: Debug + Clone + Send;

    const NAME: &'static str;

    fn evaluate<P: LogDensity + ?Sized>(problem: &P, position: &[f64]) -> Result<Self::Output>;

    /// The result for a point that is outside the support.
    fn rejected(dim: usize) -> Self::Output;
}

/// Request only the value of the log density.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueKind;

/// Request the value and the gradient of the log density.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradientKind;

impl ResultKind for ValueKind {
    type Output = Value;

    const NAME: &'static str = "value";

    fn evaluate<P: LogDensity + ?Sized>(problem: &P, position: &[f64]) -> Result<Value> {
        problem.logdensity(position)
    }

    fn rejected(_dim: usize) -> Value {
        Value::neg_infinity()
    }
}

impl ResultKind for GradientKind {
    type Output = ValueGradient;

    const NAME: &'static str = "gradient";

    fn evaluate<P: LogDensity + ?Sized>(problem: &P, position: &[f64]) -> Result<ValueGradient> {
        problem.logdensity_and_gradient(position)
    }

    fn rejected(dim: usize) -> ValueGradient {
        ValueGradient::neg_infinity(dim)
    }
}

/// Evaluate `problem` at `position`, returning a result of the requested kind.
///
/// ```
/// use logdensity::{evaluate, Identity, TransformedLogDensity, ValueKind};
///
/// let problem = TransformedLogDensity::new(Identity::new(2), |x: &Vec<f64>| {
///     Ok(-x.iter().map(|v| v * v).sum::<f64>() / 2.)
/// });
/// let value = evaluate(ValueKind, &problem, &[1., 1.]).unwrap();
/// assert_eq!(value.value(), -1.);
/// ```
pub fn evaluate<K: ResultKind, P: LogDensity + ?Sized>(
    _kind: K,
    problem: &P,
    position: &[f64],
) -> Result<K::Output> {
    K::evaluate(problem, position)
}

macro_rules! forward_log_density {
    ($($target:ty),*) => {
        $(
            impl<P: LogDensity + ?Sized> LogDensity for $target {
                fn dim(&self) -> usize {
                    (**self).dim()
                }

                fn capability(&self) -> Capability {
                    (**self).capability()
                }

                fn logdensity(&self, position: &[f64]) -> Result<Value> {
                    (**self).logdensity(position)
                }

                fn logdensity_and_gradient(&self, position: &[f64]) -> Result<ValueGradient> {
                    (**self).logdensity_and_gradient(position)
                }
            }
        )*
    };
}

forward_log_density!(&P, Box<P>, Arc<P>);
