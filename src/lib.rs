//! A common interface for unnormalized log densities and their gradients.
//!
//! Inference algorithms work with anything that implements [`LogDensity`].
//! Problems are usually built from a [`Transformation`] and a scoring function
//! with [`TransformedLogDensity`], and then wrapped in [`ADGradient`] to add
//! gradients from one of the backends of a [`BackendRegistry`]. Scoring
//! functions return a [`Rejection`] through [`reject`] for points outside of
//! the support, which evaluate to negative infinity.

pub(crate) mod ad_gradient;
pub(crate) mod backend;
pub(crate) mod benchmark;
pub(crate) mod error;
pub(crate) mod finite_diff;
pub(crate) mod problem;
pub(crate) mod real;
pub(crate) mod reject_errors;
pub(crate) mod rejection;
pub(crate) mod stresstest;
pub(crate) mod transformed;
pub(crate) mod value;

pub use ad_gradient::ADGradient;
pub use backend::{
    BackendFactory, BackendOptions, BackendRegistry, GradientBackend, OptionValue, ValueFn,
};
pub use benchmark::{benchmark_backends, BenchmarkResult, BenchmarkSettings};
pub use error::{ErrorKind, LogDensityError, Result};
pub use finite_diff::{default_chunk_size, FiniteDifference, FiniteDifferenceSettings, Stencil};
pub use problem::{evaluate, Capability, GradientKind, LogDensity, ResultKind, ValueKind, Wrapper};
pub use real::{Promote, Real, RealKind};
pub use reject_errors::RejectErrors;
pub use rejection::{reject, reject_if, Rejection};
pub use stresstest::{stresstest, Scale, StressTestSettings};
pub use transformed::{
    HasScoringFunction, HasTransformation, Identity, Transformation, TransformedLogDensity,
};
pub use value::{Value, ValueGradient};
