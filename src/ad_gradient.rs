use std::fmt::Debug;

use crate::{
    backend::{BackendOptions, BackendRegistry, GradientBackend},
    error::{LogDensityError, Result},
    problem::{Capability, LogDensity, Wrapper},
    transformed::{HasScoringFunction, HasTransformation},
    value::{Value, ValueGradient},
};

/// Adds gradients to a log density that only provides values.
///
/// The gradient is computed by a [`GradientBackend`] from the value-only
/// evaluation of the parent, so both evaluation kinds always agree on the
/// value.
///
/// ```
/// use logdensity::{
///     evaluate, ADGradient, BackendRegistry, GradientKind, Identity, TransformedLogDensity,
/// };
///
/// let problem = TransformedLogDensity::new(Identity::new(2), |x: &Vec<f64>| {
///     Ok(-x.iter().map(|v| v * v).sum::<f64>() / 2.)
/// });
/// let registry = BackendRegistry::with_defaults();
/// let problem = ADGradient::new(&registry, "finite_difference", problem).unwrap();
/// let result = evaluate(GradientKind, &problem, &[1., -2.]).unwrap();
/// assert!((result.gradient()[1] - 2.).abs() < 1e-6);
/// ```
pub struct ADGradient<P> {
    parent: P,
    backend: Box<dyn GradientBackend>,
}

impl<P: LogDensity> ADGradient<P> {
    /// Wrap `parent` using the backend registered under `name` with default options.
    ///
    /// Fails immediately if no such backend is registered.
    pub fn new(registry: &BackendRegistry, name: &str, parent: P) -> Result<Self> {
        Self::with_options(registry, name, &BackendOptions::new(), parent)
    }

    pub fn with_options(
        registry: &BackendRegistry,
        name: &str,
        options: &BackendOptions,
        parent: P,
    ) -> Result<Self> {
        let backend = registry.create(name, options, parent.dim())?;
        Ok(Self::from_backend(backend, parent))
    }

    pub fn from_backend(backend: Box<dyn GradientBackend>, parent: P) -> Self {
        ADGradient { parent, backend }
    }

    pub fn backend(&self) -> &dyn GradientBackend {
        self.backend.as_ref()
    }
}

impl<P: LogDensity> LogDensity for ADGradient<P> {
    fn dim(&self) -> usize {
        self.parent.dim()
    }

    fn capability(&self) -> Capability {
        Capability::Gradient
    }

    fn logdensity(&self, position: &[f64]) -> Result<Value> {
        self.parent.logdensity(position)
    }

    fn logdensity_and_gradient(&self, position: &[f64]) -> Result<ValueGradient> {
        let value_fn = |x: &[f64]| self.parent.logdensity(x).map(|val| val.value());
        let (value, gradient) = self.backend.gradient_of(&value_fn, position)?;
        if gradient.len() != position.len() {
            return Err(LogDensityError::Backend(anyhow::anyhow!(
                "gradient backend {:?} returned {} gradient entries for an input of length {}",
                self.backend.name(),
                gradient.len(),
                position.len()
            )));
        }
        ValueGradient::new(value, gradient)
    }
}

impl<P: LogDensity> Wrapper for ADGradient<P> {
    type Parent = P;

    fn parent(&self) -> &P {
        &self.parent
    }

    fn into_parent(self) -> P {
        self.parent
    }
}

impl<P: HasTransformation> HasTransformation for ADGradient<P> {
    type Transformation = P::Transformation;

    fn transformation(&self) -> &Self::Transformation {
        self.parent.transformation()
    }
}

impl<P: HasScoringFunction> HasScoringFunction for ADGradient<P> {
    type ScoringFunction = P::ScoringFunction;

    fn scoring_function(&self) -> &Self::ScoringFunction {
        self.parent.scoring_function()
    }
}

impl<P: Debug> Debug for ADGradient<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ADGradient")
            .field("backend", &self.backend)
            .field("parent", &self.parent)
            .finish()
    }
}
