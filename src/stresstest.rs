use itertools::Itertools;
use rand::Rng;
use rand_distr::{Cauchy, Distribution};

use crate::{
    error::{LogDensityError, Result},
    problem::{LogDensity, ResultKind},
};

/// The scale of the random points drawn by [`stresstest`].
#[derive(Debug, Clone, PartialEq)]
pub enum Scale {
    Scalar(f64),
    PerDimension(Vec<f64>),
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Scalar(1.)
    }
}

impl Scale {
    fn resolve(&self, dim: usize) -> Result<Vec<f64>> {
        let scales = match self {
            Scale::Scalar(scale) => vec![*scale; dim],
            Scale::PerDimension(scales) => {
                if scales.len() != dim {
                    return Err(LogDensityError::InvalidSettings(format!(
                        "expected {dim} scales, got {}",
                        scales.len()
                    )));
                }
                scales.clone()
            }
        };
        if let Some(bad) = scales.iter().find(|s| !(s.is_finite() && **s > 0.)) {
            return Err(LogDensityError::InvalidSettings(format!(
                "scales must be positive and finite, got {bad}"
            )));
        }
        Ok(scales)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StressTestSettings {
    /// The number of random points.
    pub draws: usize,
    pub scale: Scale,
}

impl Default for StressTestSettings {
    fn default() -> Self {
        StressTestSettings {
            draws: 1000,
            scale: Scale::default(),
        }
    }
}

/// Evaluate `problem` at random points and collect the points where it fails.
///
/// Points are drawn independently from a Cauchy distribution centered at zero
/// with the given scale. Any error counts as a failure, rejected points do not
/// (they already evaluated to negative infinity). The returned points are in
/// the order they were drawn.
///
/// This is a diagnostic tool, an empty result does not mean the implementation
/// is correct. The outer `Result` only reports invalid settings.
pub fn stresstest<K, P, R>(
    _kind: K,
    problem: &P,
    settings: &StressTestSettings,
    rng: &mut R,
) -> Result<Vec<Vec<f64>>>
where
    K: ResultKind,
    P: LogDensity + ?Sized,
    R: Rng + ?Sized,
{
    let dim = problem.dim();
    let scales = settings.scale.resolve(dim)?;
    let cauchy = Cauchy::new(0f64, 1f64)
        .map_err(|err| LogDensityError::InvalidSettings(err.to_string()))?;

    let mut failures = Vec::new();
    for _ in 0..settings.draws {
        let position: Vec<f64> = scales
            .iter()
            .map(|scale| scale * cauchy.sample(&mut *rng))
            .collect();
        if let Err(err) = K::evaluate(problem, &position) {
            log::debug!(
                "{} evaluation failed at [{}]: {err}",
                K::NAME,
                position.iter().join(", ")
            );
            failures.push(position);
        }
    }
    log::debug!(
        "stress test found {} failures in {} draws",
        failures.len(),
        settings.draws
    );
    Ok(failures)
}
