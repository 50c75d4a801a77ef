use std::time::{Duration, Instant};

use rand::Rng;
use rand_distr::{Cauchy, Distribution};

use crate::{
    ad_gradient::ADGradient,
    backend::{BackendOptions, BackendRegistry},
    error::{LogDensityError, Result},
    problem::LogDensity,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkSettings {
    /// Gradient evaluations per backend configuration.
    pub evaluations: usize,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        BenchmarkSettings { evaluations: 100 }
    }
}

#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub backend: String,
    pub options: BackendOptions,
    /// The number of timed gradient evaluations.
    pub evaluations: usize,
    /// Total time spent in gradient evaluations.
    pub elapsed: Duration,
    /// Evaluations that returned an error.
    pub failures: usize,
}

impl BenchmarkResult {
    /// Mean time per gradient evaluation, zero if nothing was timed.
    pub fn per_evaluation(&self) -> Duration {
        if self.evaluations == 0 {
            return Duration::ZERO;
        }
        self.elapsed.div_f64(self.evaluations as f64)
    }
}

/// Time gradient evaluations of `problem` for several backend configurations.
///
/// All configurations are evaluated at the same standard Cauchy points.
/// Invalid configurations fail before anything is timed, errors during
/// evaluation are counted but otherwise ignored.
pub fn benchmark_backends<P, R>(
    problem: &P,
    registry: &BackendRegistry,
    configs: &[(&str, BackendOptions)],
    settings: &BenchmarkSettings,
    rng: &mut R,
) -> Result<Vec<BenchmarkResult>>
where
    P: LogDensity + ?Sized,
    R: Rng + ?Sized,
{
    let wrapped = configs
        .iter()
        .map(|(name, options)| ADGradient::with_options(registry, name, options, problem))
        .collect::<Result<Vec<_>>>()?;

    let cauchy = Cauchy::new(0f64, 1f64)
        .map_err(|err| LogDensityError::InvalidSettings(err.to_string()))?;
    let dim = problem.dim();
    let points: Vec<Vec<f64>> = (0..settings.evaluations)
        .map(|_| (0..dim).map(|_| cauchy.sample(&mut *rng)).collect())
        .collect();

    let results = configs
        .iter()
        .zip(wrapped.iter())
        .map(|((name, options), problem)| {
            let mut failures = 0;
            let start = Instant::now();
            for point in points.iter() {
                if problem.logdensity_and_gradient(point).is_err() {
                    failures += 1;
                }
            }
            let elapsed = start.elapsed();
            log::debug!("backend {name:?} ({options}): {elapsed:?}, {failures} failures");
            BenchmarkResult {
                backend: name.to_string(),
                options: options.clone(),
                evaluations: points.len(),
                elapsed,
                failures,
            }
        })
        .collect();
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        transformed::{Identity, TransformedLogDensity},
    };
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn one_result_per_config() {
        let problem = TransformedLogDensity::new(Identity::new(4), |x: &Vec<f64>| {
            Ok(-x.iter().map(|v| (1. + v * v).ln()).sum::<f64>())
        });
        let registry = BackendRegistry::with_defaults();
        let configs = [
            ("finite_difference", BackendOptions::new()),
            (
                "finite_difference",
                BackendOptions::new().set("stencil", "five_point"),
            ),
            (
                "finite_difference",
                BackendOptions::new().set("chunk_size", 1usize),
            ),
        ];
        let settings = BenchmarkSettings { evaluations: 20 };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let results =
            benchmark_backends(&problem, &registry, &configs, &settings, &mut rng).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|res| res.failures == 0));
        assert_eq!(results[1].options, configs[1].1);
        assert!(results.iter().all(|res| res.evaluations == 20));
        assert!(results[0].per_evaluation() <= results[0].elapsed);
    }

    #[test]
    fn mean_time_per_evaluation() {
        let mut result = BenchmarkResult {
            backend: "finite_difference".to_string(),
            options: BackendOptions::new(),
            evaluations: 5_000_000_000,
            elapsed: Duration::from_secs(10),
            failures: 0,
        };
        // More evaluations than fit in a u32
        let mean = result.per_evaluation().as_secs_f64();
        assert!((mean - 2e-9).abs() < 1e-10, "{mean}");

        result.evaluations = 0;
        assert_eq!(result.per_evaluation(), Duration::ZERO);
    }

    #[test]
    fn invalid_configs_fail_early() {
        let problem = TransformedLogDensity::new(Identity::new(1), |x: &Vec<f64>| Ok(x[0]));
        let registry = BackendRegistry::with_defaults();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let err = benchmark_backends(
            &problem,
            &registry,
            &[("dual_numbers", BackendOptions::new())],
            &BenchmarkSettings::default(),
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedBackend);
    }
}
