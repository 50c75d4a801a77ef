use std::{
    collections::{BTreeMap, HashMap},
    fmt::{Debug, Display},
    sync::Arc,
};

use crate::{
    error::{LogDensityError, Result},
    finite_diff::FiniteDifference,
};

/// The value-only evaluation a backend differentiates.
pub type ValueFn<'a> = dyn Fn(&[f64]) -> Result<f64> + Sync + 'a;

/// A strategy for computing gradients of a log density.
pub trait GradientBackend: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Return `f(x)` and the gradient of `f` at `x`.
    ///
    /// The returned value must be exactly the value returned by `f(x)`.
    /// Errors returned by `f` must be passed on unchanged.
    fn gradient_of(&self, f: &ValueFn<'_>, x: &[f64]) -> Result<(f64, Vec<f64>)>;
}

/// The value of a backend option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Float(f64),
    Int(i64),
    Text(String),
}

impl Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionValue::Float(val) => write!(f, "{val}"),
            OptionValue::Int(val) => write!(f, "{val}"),
            OptionValue::Text(val) => write!(f, "{val:?}"),
        }
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<usize> for OptionValue {
    fn from(value: usize) -> Self {
        OptionValue::Int(value as i64)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

/// Backend specific configuration, passed to the backend factory.
///
/// The options are not interpreted outside of the backend, each backend
/// checks that it knows all options it is given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendOptions {
    values: BTreeMap<String, OptionValue>,
}

impl BackendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(name, val)| (name.as_str(), val))
    }

    /// Fail on the first option that is not in `known`.
    pub fn check_known(&self, backend: &str, known: &[&str]) -> Result<()> {
        match self.values.keys().find(|name| !known.contains(&name.as_str())) {
            Some(name) => Err(LogDensityError::InvalidBackendOption {
                backend: backend.to_string(),
                option: name.clone(),
                reason: format!("unknown option, expected one of {known:?}"),
            }),
            None => Ok(()),
        }
    }
}

impl Display for BackendOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (name, val) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{name}={val}")?;
            first = false;
        }
        Ok(())
    }
}

/// Builds a backend for a problem with `dim` parameters.
pub type BackendFactory =
    dyn Fn(&BackendOptions, usize) -> Result<Box<dyn GradientBackend>> + Send + Sync;

/// Gradient backends by name.
///
/// There is no global registry. Backends are registered explicitly and the
/// registry is passed to `ADGradient` when it is constructed.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    factories: HashMap<String, Arc<BackendFactory>>,
}

impl BackendRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry containing the backends shipped with this crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(FiniteDifference::NAME, |options, dim| {
            Ok(Box::new(FiniteDifference::from_options(options, dim)?))
        });
        registry
    }

    /// Register a backend under `name`, replacing any previous backend of that name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&BackendOptions, usize) -> Result<Box<dyn GradientBackend>> + Send + Sync + 'static,
    {
        let name = name.into();
        log::debug!("registering gradient backend {name:?}");
        if self.factories.insert(name.clone(), Arc::new(factory)).is_some() {
            log::debug!("gradient backend {name:?} replaced a previous registration");
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// The registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build the backend `name` for a problem with `dim` parameters.
    pub fn create(
        &self,
        name: &str,
        options: &BackendOptions,
        dim: usize,
    ) -> Result<Box<dyn GradientBackend>> {
        let factory =
            self.factories
                .get(name)
                .ok_or_else(|| LogDensityError::UnsupportedBackend {
                    name: name.to_string(),
                })?;
        let backend = factory(options, dim)?;
        log::debug!("created gradient backend {name:?} ({options}) for dimension {dim}");
        Ok(backend)
    }
}

impl Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .finish()
    }
}
