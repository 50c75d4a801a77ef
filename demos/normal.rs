use anyhow::Result;
use logdensity::{
    benchmark_backends, evaluate, reject_if, stresstest, ADGradient, BackendOptions,
    BackendRegistry, BenchmarkSettings, GradientKind, RejectErrors, StressTestSettings,
    Transformation, TransformedLogDensity, ValueKind, Wrapper,
};
use rand::SeedableRng;

/// Maps `(mu, log_sigma)` to `(mu, sigma)`.
struct LocationScale;

impl Transformation for LocationScale {
    type Output = (f64, f64);

    fn dim(&self) -> usize {
        2
    }

    fn transform_with_jacobian(&self, position: &[f64]) -> Result<((f64, f64), f64)> {
        let &[mu, log_sigma] = position else {
            anyhow::bail!("expected two parameters, got {}", position.len());
        };
        Ok(((mu, log_sigma.exp()), log_sigma))
    }
}

fn main() -> Result<()> {
    let data = [2.1, 1.4, 3.3, 2.8, 1.9, 2.5];

    let model = TransformedLogDensity::new(LocationScale, move |&(mu, sigma): &(f64, f64)| {
        reject_if(sigma > 1e4)?;
        let sq: f64 = data.iter().map(|x| (x - mu).powi(2)).sum();
        Ok(-(data.len() as f64) * sigma.ln() - sq / (2. * sigma * sigma))
    });

    let registry = BackendRegistry::with_defaults();
    let problem = RejectErrors::new(ADGradient::with_options(
        &registry,
        "finite_difference",
        &BackendOptions::new().set("stencil", "five_point"),
        model,
    )?);

    let point = [2., 0.];
    let value = evaluate(ValueKind, &problem, &point)?;
    let with_grad = evaluate(GradientKind, &problem, &point)?;
    println!("logp at {point:?}: {}", value.value());
    println!("gradient: {:?}", with_grad.gradient());

    let mut rng = rand::rngs::SmallRng::seed_from_u64(42);
    let failures = stresstest(
        GradientKind,
        &problem,
        &StressTestSettings::default(),
        &mut rng,
    )?;
    println!("stress test: {} failing points", failures.len());

    let configs = [
        ("finite_difference", BackendOptions::new().set("stencil", "forward")),
        ("finite_difference", BackendOptions::new().set("stencil", "central")),
        ("finite_difference", BackendOptions::new().set("stencil", "five_point")),
    ];
    let settings = BenchmarkSettings::default();
    // the value-only model, before any gradient backend is attached
    let model = problem.parent().parent();
    for result in benchmark_backends(model, &registry, &configs, &settings, &mut rng)? {
        println!(
            "{} ({}): {:?} per gradient",
            result.backend,
            result.options,
            result.per_evaluation()
        );
    }
    Ok(())
}
