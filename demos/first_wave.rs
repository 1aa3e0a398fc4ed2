//! Fitting a single epidemic wave.
//!
//! Generates noisy daily counts, estimates starting values from the data,
//! runs the multi-start fit and reports a 95% prediction band, the onset of
//! the wave and the likelihood criteria.

use epiwaves_rs::series::growth_rate_estimate;
use epiwaves_rs::{
    HyperParameters, MaximumLikelihood, RegressionEngine, TimeSeries, WaveModel, WaveShape,
};
use rand::Rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Single wave fit");
    println!("===============\n");

    // K = 10000 cases, r = 0.05 per day, peak at day 100
    let truth = [10_000.0, 0.05, 100.0];
    let mut rng = rand::thread_rng();
    let values = (1..=150)
        .map(|t| {
            let rate = WaveShape::SingleWave.evaluate(t as f64, &truth);
            (rate + rng.gen_range(-0.1..0.1) * rate).max(0.0).round()
        })
        .collect();
    let series = TimeSeries::from_values(1, values)?;

    // Starting point from the data: early growth, peak day and total so far
    let r0 = growth_rate_estimate(&series, 20, 60)?;
    let tau0 = series.argmax_time().unwrap_or(1) as f64;
    let k0: f64 = series.values().iter().sum();
    println!("Initial estimate: K = {:.0}, r = {:.4}, tau = {:.0}", k0, r0, tau0);

    let shape = WaveShape::SingleWave;
    let bounds = shape.default_bounds(&[k0, r0, tau0], &[])?;
    let hyper = HyperParameters::new(bounds, 30).with_seed(2020);

    let fit = RegressionEngine::new().fit(&series, &shape, &hyper)?;
    println!("\nBest fit (sample #{}): {}", fit.sample_index, fit.parameters);
    println!(
        "RMSE = {:.3}, R² = {:.5}, failed samples = {}",
        fit.diagnostics.rmse, fit.diagnostics.r_squared, fit.failed_samples
    );

    // Project 60 days beyond the data
    let grid: Vec<f64> = (1..=210).map(|t| t as f64).collect();
    let band = fit.prediction_band(&shape, &series, &grid, 0.95)?;
    println!("\n{:>5} {:>10} {:>10} {:>10}", "day", "lower", "fitted", "upper");
    for i in (0..band.len()).step_by(30) {
        println!(
            "{:>5} {:>10.1} {:>10.1} {:>10.1}",
            band.grid[i], band.lower[i], band.fitted[i], band.upper[i]
        );
    }

    let cumulative = band.cumulative();
    match cumulative.first_time_lower_exceeds(100.0) {
        Some(day) => println!("\nCumulative lower envelope passes 100 cases on day {}", day),
        None => println!("\nCumulative lower envelope never passes 100 cases"),
    }

    let k = fit.parameters.get("K").unwrap_or(k0);
    let r = fit.parameters.get("r").unwrap_or(r0);
    let tau = fit.parameters.get("tau").unwrap_or(tau0);
    let criteria = MaximumLikelihood::new().estimate(&series.times_f64(), tau, k, r)?;
    println!(
        "\nLikelihood refit: LL = {:.3}, AIC = {:.3}, BIC = {:.3} (r = {:.4})",
        criteria.log_likelihood, criteria.aic, criteria.bic, criteria.r
    );

    Ok(())
}
