//! Gradients by finite differences.
//!
//! This is the backend registered by
//! [`BackendRegistry::with_defaults`](crate::BackendRegistry::with_defaults).
//! Coordinates are differentiated in blocks of `chunk_size`, blocks are
//! computed in parallel.

use rayon::prelude::*;

use crate::{
    backend::{BackendOptions, GradientBackend, OptionValue, ValueFn},
    error::{LogDensityError, Result},
};

/// The difference quotient used for each partial derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stencil {
    /// `(f(x + h) - f(x)) / h`, one extra evaluation per coordinate.
    Forward,
    /// `(f(x + h) - f(x - h)) / 2h`, two extra evaluations per coordinate.
    #[default]
    Central,
    /// The fourth order five point stencil, four extra evaluations per coordinate.
    FivePoint,
}

impl Stencil {
    fn parse(name: &str) -> Option<Stencil> {
        match name {
            "forward" => Some(Stencil::Forward),
            "central" => Some(Stencil::Central),
            "five_point" => Some(Stencil::FivePoint),
            _ => None,
        }
    }

    /// A relative step that balances truncation and rounding error.
    pub fn default_step(&self) -> f64 {
        match self {
            Stencil::Forward => f64::EPSILON.sqrt(),
            Stencil::Central => f64::EPSILON.cbrt(),
            Stencil::FivePoint => f64::EPSILON.powf(0.2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FiniteDifferenceSettings {
    pub stencil: Stencil,
    /// The step relative to `max(|x_i|, 1)`. Chosen by the stencil if `None`.
    pub step: Option<f64>,
    /// The number of coordinates per parallel block. Chosen from the
    /// dimension if `None`.
    pub chunk_size: Option<usize>,
}

/// Block size for a problem of dimension `dim`.
///
/// Small problems are differentiated sequentially, large ones are split into
/// one block per thread.
pub fn default_chunk_size(dim: usize) -> usize {
    const SEQUENTIAL_BELOW: usize = 64;
    const MIN_CHUNK: usize = 16;

    if dim < SEQUENTIAL_BELOW {
        return dim.max(1);
    }
    dim.div_ceil(rayon::current_num_threads()).max(MIN_CHUNK)
}

#[derive(Debug, Clone)]
pub struct FiniteDifference {
    stencil: Stencil,
    step: f64,
    chunk_size: usize,
}

impl FiniteDifference {
    pub const NAME: &'static str = "finite_difference";

    const OPTIONS: [&'static str; 3] = ["stencil", "step", "chunk_size"];

    pub fn new(settings: FiniteDifferenceSettings, dim: usize) -> Result<Self> {
        let step = settings
            .step
            .unwrap_or_else(|| settings.stencil.default_step());
        if !(step.is_finite() && step > 0.) {
            return Err(invalid_option("step", format!("must be positive, got {step}")));
        }
        let chunk_size = match settings.chunk_size {
            Some(0) => return Err(invalid_option("chunk_size", "must be positive")),
            Some(size) => size,
            None => default_chunk_size(dim),
        };
        Ok(FiniteDifference {
            stencil: settings.stencil,
            step,
            chunk_size,
        })
    }

    /// Build the backend from the options given at wrap construction.
    pub fn from_options(options: &BackendOptions, dim: usize) -> Result<Self> {
        options.check_known(Self::NAME, &Self::OPTIONS)?;
        let mut settings = FiniteDifferenceSettings::default();
        if let Some(val) = options.get("stencil") {
            settings.stencil = match val {
                OptionValue::Text(name) => Stencil::parse(name),
                _ => None,
            }
            .ok_or_else(|| {
                invalid_option(
                    "stencil",
                    format!("expected \"forward\", \"central\" or \"five_point\", got {val}"),
                )
            })?;
        }
        if let Some(val) = options.get("step") {
            settings.step = Some(match *val {
                OptionValue::Float(step) => step,
                OptionValue::Int(step) => step as f64,
                _ => return Err(invalid_option("step", format!("expected a number, got {val}"))),
            });
        }
        if let Some(val) = options.get("chunk_size") {
            settings.chunk_size = Some(match *val {
                OptionValue::Int(size) if size > 0 => size as usize,
                _ => {
                    return Err(invalid_option(
                        "chunk_size",
                        format!("expected a positive integer, got {val}"),
                    ))
                }
            });
        }
        Self::new(settings, dim)
    }

    pub fn stencil(&self) -> Stencil {
        self.stencil
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// The partial derivative in direction `i`. `point` must equal `x` and is
    /// restored before returning.
    fn partial(&self, f: &ValueFn<'_>, point: &mut [f64], i: usize, f0: f64) -> Result<f64> {
        let xi = point[i];
        let h = self.step * xi.abs().max(1.);
        // Use the step that is actually representable at xi
        let h = (xi + h) - xi;

        let mut at = |offset: f64| -> Result<f64> {
            point[i] = xi + offset;
            let val = f(&*point);
            point[i] = xi;
            val
        };

        let derivative = match self.stencil {
            Stencil::Forward => (at(h)? - f0) / h,
            Stencil::Central => (at(h)? - at(-h)?) / (2. * h),
            Stencil::FivePoint => {
                let near = at(h)? - at(-h)?;
                let far = at(2. * h)? - at(-2. * h)?;
                (8. * near - far) / (12. * h)
            }
        };
        Ok(derivative)
    }

    fn fill_chunk(
        &self,
        f: &ValueFn<'_>,
        x: &[f64],
        start: usize,
        out: &mut [f64],
        f0: f64,
    ) -> Result<()> {
        let mut point = x.to_vec();
        for (offset, grad) in out.iter_mut().enumerate() {
            *grad = self.partial(f, &mut point, start + offset, f0)?;
        }
        Ok(())
    }
}

impl GradientBackend for FiniteDifference {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn gradient_of(&self, f: &ValueFn<'_>, x: &[f64]) -> Result<(f64, Vec<f64>)> {
        let f0 = f(x)?;
        let dim = x.len();
        if f0 == f64::NEG_INFINITY {
            return Ok((f0, vec![f64::NAN; dim]));
        }

        let mut gradient = vec![0f64; dim];
        if self.chunk_size >= dim {
            self.fill_chunk(f, x, 0, &mut gradient, f0)?;
        } else {
            let chunk_size = self.chunk_size;
            gradient
                .par_chunks_mut(chunk_size)
                .enumerate()
                .try_for_each(|(chunk, out)| self.fill_chunk(f, x, chunk * chunk_size, out, f0))?;
        }
        Ok((f0, gradient))
    }
}

fn invalid_option(option: &str, reason: impl Into<String>) -> LogDensityError {
    LogDensityError::InvalidBackendOption {
        backend: FiniteDifference::NAME.to_string(),
        option: option.to_string(),
        reason: reason.into(),
    }
}
