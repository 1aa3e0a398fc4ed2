//! Prediction bands and likelihood criteria on fitted waves.

use approx::assert_relative_eq;
use epiwaves_rs::uncertainty::{aic, bic, prediction_band};
use epiwaves_rs::{
    HyperParameters, MaximumLikelihood, RegressionEngine, TimeSeries, WaveFitError, WaveShape,
};

use crate::test_helpers::{noisy_series, relative_bounds};

const TRUTH: [f64; 3] = [1_500.0, 0.25, 15.0];

fn fitted_wave() -> (TimeSeries, epiwaves_rs::FitResult) {
    let series = noisy_series(&WaveShape::SingleWave, &TRUTH, 30, 4.0, 21);
    let hyper = HyperParameters::new(relative_bounds(&TRUTH, 0.5, 1.5), 10).with_seed(5);
    let fit = RegressionEngine::new()
        .fit(&series, &WaveShape::SingleWave, &hyper)
        .unwrap();
    (series, fit)
}

#[test]
fn test_band_brackets_fit() {
    let (series, fit) = fitted_wave();
    let grid: Vec<f64> = (1..=60).map(|t| t as f64).collect();
    let band = fit
        .prediction_band(&WaveShape::SingleWave, &series, &grid, 0.95)
        .unwrap();

    assert_eq!(band.len(), grid.len());
    for i in 0..band.len() {
        assert!(band.lower[i] <= band.fitted[i] && band.fitted[i] <= band.upper[i]);
    }

    // Half-width grows away from the training mean (t = 15.5)
    let widths = band.half_widths();
    assert!(widths[59] > widths[30]);
    assert!(widths[0] > widths[14]);
}

#[test]
fn test_band_widens_with_confidence() {
    let (series, fit) = fitted_wave();
    let grid = [5.0, 20.0, 45.0];

    let mut previous: Option<Vec<f64>> = None;
    for &confidence in &[0.80, 0.90, 0.95, 0.99] {
        let band = fit
            .prediction_band(&WaveShape::SingleWave, &series, &grid, confidence)
            .unwrap();
        let widths = band.half_widths();
        if let Some(prev) = &previous {
            for (w, p) in widths.iter().zip(prev) {
                assert!(w > p, "half-width {} not above {} at {}", w, p, confidence);
            }
        }
        previous = Some(widths);
    }
}

#[test]
fn test_band_rejects_degenerate_and_bad_levels() {
    let short = TimeSeries::from_values(1, vec![1.0, 2.0]).unwrap();
    let err = prediction_band(&WaveShape::SingleWave, &TRUTH, &short, &[1.0], 0.95).unwrap_err();
    assert!(matches!(err, WaveFitError::DegenerateFit { n: 2, p: 3 }));

    // Fixed parameters still count towards p
    let three = TimeSeries::from_values(1, vec![1.0, 2.0, 3.0]).unwrap();
    assert!(matches!(
        prediction_band(&WaveShape::SingleWave, &TRUTH, &three, &[1.0], 0.95),
        Err(WaveFitError::DegenerateFit { n: 3, p: 3 })
    ));

    let (series, fit) = fitted_wave();
    for level in [0.0, 1.0, 1.5, -0.2] {
        assert!(matches!(
            fit.prediction_band(&WaveShape::SingleWave, &series, &[1.0], level),
            Err(WaveFitError::Configuration(_))
        ));
    }
}

#[test]
fn test_likelihood_after_fixed_tau_fit() {
    let truth = [2_000.0, 0.1, 40.0];
    let series = noisy_series(&WaveShape::SingleWave, &truth, 80, 2.0, 33);
    let hyper = HyperParameters::new(relative_bounds(&truth[..2], 0.5, 1.5), 10)
        .with_fixed("tau", 40.0)
        .with_seed(12);
    let fit = RegressionEngine::new()
        .fit(&series, &WaveShape::SingleWave, &hyper)
        .unwrap();

    let k0 = fit.parameters.get("K").unwrap();
    let r0 = fit.parameters.get("r").unwrap();
    let times = series.times_f64();
    let criteria = MaximumLikelihood::new()
        .estimate(&times, 40.0, k0, r0)
        .unwrap();

    assert!(criteria.log_likelihood.is_finite());
    assert_eq!(criteria.n, 80);
    assert_eq!(criteria.tau, 40.0);
    assert_relative_eq!(criteria.k, 1e7);
    assert!(criteria.r > 0.0 && criteria.r <= 1.0);
    assert!(criteria.domain.is_empty());
    assert_relative_eq!(criteria.aic, aic(criteria.log_likelihood, 2));
    assert_relative_eq!(criteria.bic, bic(criteria.log_likelihood, 2, 80));
}

#[test]
fn test_information_criteria_ordering() {
    // Higher likelihood means lower criteria
    assert!(aic(-100.0, 2) < aic(-120.0, 2));
    assert!(bic(-100.0, 2, 50) < bic(-120.0, 2, 50));
    // More observations penalize parameters more under BIC
    assert!(bic(-100.0, 2, 500) > bic(-100.0, 2, 50));
    assert_relative_eq!(aic(-10.0, 2), 24.0);
    assert_relative_eq!(bic(-10.0, 2, 100), 2.0 * 100.0_f64.ln() + 20.0);
}
