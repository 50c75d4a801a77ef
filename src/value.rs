use crate::{
    error::{LogDensityError, Result},
    real::{Promote, Real, RealKind},
};

/// A validated log density value.
///
/// The value is either finite or negative infinity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Value<T: Real = f64> {
    value: T,
}

impl<T: Real> Value<T> {
    pub fn new(value: T) -> Result<Self> {
        if value.is_finite() || value == T::NEG_INFINITY {
            Ok(Value { value })
        } else {
            Err(LogDensityError::InvalidResult {
                index: 0,
                value: value.to_f64(),
            })
        }
    }

    /// The value of a point outside the support.
    pub fn neg_infinity() -> Self {
        Value {
            value: T::NEG_INFINITY,
        }
    }

    pub fn value(&self) -> T {
        self.value
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }

    pub fn is_infinite(&self) -> bool {
        !self.value.is_finite()
    }

    pub fn real_kind(&self) -> RealKind {
        T::KIND
    }
}

impl TryFrom<f64> for Value<f64> {
    type Error = LogDensityError;

    fn try_from(value: f64) -> Result<Self> {
        Value::new(value)
    }
}

/// A validated log density value together with its gradient.
///
/// If the value is finite, all entries of the gradient are finite. If the
/// value is negative infinity the contents of the gradient are unspecified
/// and must not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueGradient<T: Real = f64> {
    value: T,
    gradient: Box<[T]>,
}

impl<T: Real> ValueGradient<T> {
    pub fn new(value: T, gradient: impl Into<Box<[T]>>) -> Result<Self> {
        let gradient = gradient.into();
        if value.is_finite() {
            if let Some((i, &bad)) = gradient.iter().enumerate().find(|(_, g)| !g.is_finite()) {
                return Err(LogDensityError::InvalidResult {
                    index: i + 1,
                    value: bad.to_f64(),
                });
            }
        } else if value != T::NEG_INFINITY {
            return Err(LogDensityError::InvalidResult {
                index: 0,
                value: value.to_f64(),
            });
        }
        Ok(ValueGradient { value, gradient })
    }

    /// The value and gradient of a point outside the support.
    ///
    /// The gradient has length `dim` and is filled with NaN.
    pub fn neg_infinity(dim: usize) -> Self {
        ValueGradient {
            value: T::NEG_INFINITY,
            gradient: vec![T::NAN; dim].into(),
        }
    }

    pub fn value(&self) -> T {
        self.value
    }

    pub fn gradient(&self) -> &[T] {
        &self.gradient
    }

    pub fn into_parts(self) -> (T, Box<[T]>) {
        (self.value, self.gradient)
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }

    pub fn is_infinite(&self) -> bool {
        !self.value.is_finite()
    }

    pub fn real_kind(&self) -> RealKind {
        T::KIND
    }

    /// Construct from a value and gradient of possibly different numeric types.
    ///
    /// Both are converted to their common type `T` before validation, so `T`
    /// is determined by the inputs (see [`Promote`]).
    ///
    /// ```
    /// use logdensity::{RealKind, ValueGradient};
    ///
    /// let single = ValueGradient::<f32>::promoted(1i64, [0.5f32]).unwrap();
    /// assert_eq!(single.gradient(), &[0.5]);
    /// assert_eq!(ValueGradient::promoted(1, [2.0]).unwrap().real_kind(), RealKind::F64);
    /// ```
    pub fn promoted<V, G>(value: V, gradient: impl IntoIterator<Item = G>) -> Result<Self>
    where
        V: Promote<G, Output = T>,
    {
        let gradient: Box<[T]> = gradient.into_iter().map(V::promote_rhs).collect();
        ValueGradient::new(value.promote_lhs(), gradient)
    }
}

impl<T: Real> From<ValueGradient<T>> for Value<T> {
    fn from(value: ValueGradient<T>) -> Self {
        Value { value: value.value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn invalid_index(err: LogDensityError) -> (usize, f64) {
        match err {
            LogDensityError::InvalidResult { index, value } => (index, value),
            other => panic!("expected an invalid result error, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn finite_values_are_accepted(x in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            let value = Value::new(x).unwrap();
            prop_assert!(value.is_finite());
            prop_assert!(!value.is_infinite());
            prop_assert_eq!(value.value(), x);
        }

        #[test]
        fn neg_infinity_ignores_gradient(
            g in proptest::collection::vec(proptest::num::f64::ANY, 0..8)
        ) {
            let value = ValueGradient::new(f64::NEG_INFINITY, g.clone()).unwrap();
            prop_assert!(value.is_infinite());
            prop_assert_eq!(value.gradient().len(), g.len());
        }
    }

    #[test]
    fn invalid_values() {
        let (index, value) = invalid_index(Value::new(f64::INFINITY).unwrap_err());
        assert_eq!(index, 0);
        assert_eq!(value, f64::INFINITY);

        let (index, value) = invalid_index(Value::new(f64::NAN).unwrap_err());
        assert_eq!(index, 0);
        assert!(value.is_nan());

        let value = Value::new(f64::NEG_INFINITY).unwrap();
        assert!(value.is_infinite());
        assert!(!value.is_finite());
        assert_eq!(value, Value::neg_infinity());
    }

    #[test]
    fn invalid_gradients() {
        let (index, _) = invalid_index(ValueGradient::new(f64::NAN, vec![1., 2.]).unwrap_err());
        assert_eq!(index, 0);

        let (index, _) =
            invalid_index(ValueGradient::new(f64::INFINITY, vec![f64::NAN]).unwrap_err());
        assert_eq!(index, 0);

        let (index, value) =
            invalid_index(ValueGradient::new(1., vec![1., f64::INFINITY, f64::NAN]).unwrap_err());
        assert_eq!(index, 2);
        assert_eq!(value, f64::INFINITY);

        let err = ValueGradient::new(0f32, vec![f32::NAN]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResult);
        assert_eq!(invalid_index(err).0, 1);
    }

    #[test]
    fn promotion() {
        let promoted = ValueGradient::promoted(1, [2.0]).unwrap();
        let direct = ValueGradient::new(1.0, vec![2.0]).unwrap();
        assert_eq!(promoted, direct);
        assert_eq!(promoted.real_kind(), RealKind::F64);

        let single = ValueGradient::promoted(1, [2f32]).unwrap();
        assert_eq!(single.real_kind(), RealKind::F32);
        assert_eq!(single, ValueGradient::new(1f32, vec![2f32]).unwrap());

        let mixed = ValueGradient::promoted(1f32, [2f64, 3f64]).unwrap();
        assert_eq!(mixed.real_kind(), RealKind::F64);
        assert_eq!(mixed.gradient(), &[2., 3.]);

        let declared = ValueGradient::<f32>::promoted(3i64, [0.5f32, 1.5]).unwrap();
        assert_eq!(declared, ValueGradient::new(3f32, vec![0.5, 1.5]).unwrap());

        let err = ValueGradient::<f32>::promoted(1i32, [f32::INFINITY]).unwrap_err();
        assert_eq!(invalid_index(err).0, 1);
    }

    #[test]
    fn neg_infinity_constructor() {
        let value = ValueGradient::<f64>::neg_infinity(3);
        assert!(value.is_infinite());
        assert_eq!(value.gradient().len(), 3);
        let value: Value = value.into();
        assert_eq!(value, Value::neg_infinity());
    }

    #[test]
    fn try_from_f64() {
        let value = Value::try_from(-1.5).unwrap();
        assert_eq!(value.value(), -1.5);
        assert!(Value::try_from(f64::NAN).is_err());
    }
}
