//! Fitting a long series as a superposition of waves.
//!
//! Builds three overlapping waves, fits them with the inflection times held
//! fixed and then with every parameter free, and compares the two fits.

use epiwaves_rs::{HyperParameters, RegressionEngine, TimeSeries, WaveModel, WaveShape};
use rand::Rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Multi-wave fit");
    println!("==============\n");

    let shape = WaveShape::MultiWave(3);
    // [K1, K2, K3, r1, r2, r3, tau1, tau2, tau3]
    let truth = [
        4_000.0, 9_000.0, 6_000.0, 0.09, 0.06, 0.08, 60.0, 180.0, 290.0,
    ];

    let mut rng = rand::thread_rng();
    let values = (1..=360)
        .map(|t| {
            let rate = shape.evaluate(t as f64, &truth);
            (rate + rng.gen_range(-5.0..5.0)).max(0.0)
        })
        .collect();
    let series = TimeSeries::from_values(1, values)?;

    // Peaks read off the plot of the data
    let initial = [
        3_000.0, 10_000.0, 5_000.0, 0.1, 0.1, 0.1, 58.0, 185.0, 288.0,
    ];

    let fixed_taus = ["tau1", "tau2", "tau3"];
    let bounds = shape.default_bounds(&initial, &fixed_taus)?;
    let hyper = fixed_taus
        .iter()
        .zip(&initial[6..])
        .fold(HyperParameters::new(bounds, 20).with_seed(11), |h, (name, &tau)| {
            h.with_fixed(*name, tau)
        });

    let engine = RegressionEngine::new();
    let fixed_fit = engine.fit(&series, &shape, &hyper)?;
    println!("Fixed inflection times:\n  {}", fixed_fit.parameters);
    println!(
        "  RMSE = {:.3}, R² = {:.5}",
        fixed_fit.diagnostics.rmse, fixed_fit.diagnostics.r_squared
    );

    let bounds = shape.default_bounds(&initial, &[])?;
    let hyper = HyperParameters::new(bounds, 40).with_seed(11);
    let free_fit = engine.fit(&series, &shape, &hyper)?;
    println!("\nAll parameters free:\n  {}", free_fit.parameters);
    println!(
        "  RMSE = {:.3}, R² = {:.5}",
        free_fit.diagnostics.rmse, free_fit.diagnostics.r_squared
    );

    for (i, wave) in shape.waves(free_fit.parameters.values())?.iter().enumerate() {
        println!(
            "  wave {}: {:.0} cases, peak {:.1}/day on day {:.1}",
            i + 1,
            wave.k,
            wave.rate(wave.tau),
            wave.tau
        );
    }

    Ok(())
}
