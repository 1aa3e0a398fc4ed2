//! Integration tests for the multi-start regression engine.

use approx::assert_relative_eq;
use epiwaves_rs::lm::{LevenbergMarquardt, LmConfig};
use epiwaves_rs::problem::CurveProblem;
use epiwaves_rs::regression::{draw_initial_guesses, select_best};
use epiwaves_rs::{
    HyperParameters, ParameterBounds, RegressionEngine, WaveFitError, WaveModel, WaveShape,
};

use crate::test_helpers::{noisy_series, relative_bounds, relative_error, synthetic_series};

const TRUTH: [f64; 3] = [10_000.0, 0.05, 100.0];

#[test]
fn test_recovers_noiseless_single_wave() {
    let series = synthetic_series(&WaveShape::SingleWave, &TRUTH, 200);
    let hyper = HyperParameters::new(relative_bounds(&TRUTH, 0.5, 1.5), 20).with_seed(42);

    let fit = RegressionEngine::new()
        .fit(&series, &WaveShape::SingleWave, &hyper)
        .unwrap();

    let values = fit.parameters.values();
    for (estimate, truth) in values.iter().zip(TRUTH.iter()) {
        assert!(
            relative_error(*estimate, *truth) < 0.01,
            "estimate {} vs truth {}",
            estimate,
            truth
        );
    }
    assert!(fit.diagnostics.rmse < 1e-3, "rmse {}", fit.diagnostics.rmse);
    assert_relative_eq!(fit.diagnostics.r_squared, 1.0, epsilon = 1e-9);
    assert_eq!(fit.predicted.times(), series.times());
    assert_eq!(fit.parameters.names(), &["K", "r", "tau"]);
}

#[test]
fn test_same_seed_gives_identical_result() {
    let series = noisy_series(&WaveShape::SingleWave, &TRUTH, 150, 5.0, 9);
    let hyper = HyperParameters::new(relative_bounds(&TRUTH, 0.5, 1.5), 12).with_seed(2024);

    let engine = RegressionEngine::new();
    let first = engine.fit(&series, &WaveShape::SingleWave, &hyper).unwrap();
    let second = engine.fit(&series, &WaveShape::SingleWave, &hyper).unwrap();
    assert_eq!(first, second);

    // Execution strategy does not change the reduction
    let serial = RegressionEngine::new()
        .parallel(false)
        .fit(&series, &WaveShape::SingleWave, &hyper)
        .unwrap();
    assert_eq!(first, serial);
}

#[test]
fn test_identical_samples_keep_the_first() {
    // A degenerate box makes every sample start (and stay) at the same point
    let series = noisy_series(&WaveShape::SingleWave, &TRUTH, 60, 3.0, 5);
    let bounds = ParameterBounds::new(TRUTH.to_vec(), TRUTH.to_vec()).unwrap();
    let hyper = HyperParameters::new(bounds, 5).with_seed(1);

    let fit = RegressionEngine::new()
        .fit(&series, &WaveShape::SingleWave, &hyper)
        .unwrap();
    assert_eq!(fit.sample_index, 0);
    assert_eq!(fit.parameters.values(), &TRUTH);

    assert_eq!(select_best(&[2.0, 1.5, 1.5, f64::INFINITY]), Some(1));
}

#[test]
fn test_fixed_inflection_time() {
    let series = synthetic_series(&WaveShape::SingleWave, &TRUTH, 200);
    let hyper = HyperParameters::new(relative_bounds(&TRUTH[..2], 0.5, 1.5), 15)
        .with_fixed("tau", 100.0)
        .with_seed(3);

    let fit = RegressionEngine::new()
        .fit(&series, &WaveShape::SingleWave, &hyper)
        .unwrap();

    assert_eq!(fit.parameters.get("tau"), Some(100.0));
    assert!(relative_error(fit.parameters.get("K").unwrap(), 10_000.0) < 0.01);
    assert!(relative_error(fit.parameters.get("r").unwrap(), 0.05) < 0.01);
}

#[test]
fn test_cumulative_shape_fit() {
    let series = synthetic_series(&WaveShape::SingleWaveCumulative, &TRUTH, 200);
    let hyper = HyperParameters::new(relative_bounds(&TRUTH, 0.5, 1.5), 15).with_seed(8);

    let fit = RegressionEngine::new()
        .fit(&series, &WaveShape::SingleWaveCumulative, &hyper)
        .unwrap();
    for (estimate, truth) in fit.parameters.values().iter().zip(TRUTH.iter()) {
        assert!(relative_error(*estimate, *truth) < 0.01);
    }
}

#[test]
fn test_two_wave_fit() {
    let shape = WaveShape::MultiWave(2);
    let truth = [6_000.0, 3_000.0, 0.08, 0.06, 70.0, 180.0];
    let series = synthetic_series(&shape, &truth, 260);
    let lower = vec![3_000.0, 1_500.0, 0.04, 0.03, 63.0, 162.0];
    let upper = vec![9_000.0, 4_500.0, 0.16, 0.12, 77.0, 198.0];
    let hyper = HyperParameters::new(ParameterBounds::new(lower, upper).unwrap(), 30).with_seed(17);

    let fit = RegressionEngine::new().fit(&series, &shape, &hyper).unwrap();
    assert_eq!(fit.parameters.len(), shape.parameter_count());
    assert!(fit.diagnostics.r_squared > 0.99, "R² {}", fit.diagnostics.r_squared);
}

#[test]
fn test_configuration_errors() {
    let series = synthetic_series(&WaveShape::SingleWave, &TRUTH, 50);
    let engine = RegressionEngine::new();

    let zero = HyperParameters::new(relative_bounds(&TRUTH, 0.5, 1.5), 0);
    assert!(matches!(
        engine.fit(&series, &WaveShape::SingleWave, &zero),
        Err(WaveFitError::Configuration(_))
    ));

    let short = HyperParameters::new(relative_bounds(&TRUTH[..2], 0.5, 1.5), 5);
    assert!(matches!(
        engine.fit(&series, &WaveShape::SingleWave, &short),
        Err(WaveFitError::Configuration(_))
    ));

    let inverted: WaveFitError = ParameterBounds::new(vec![2.0, 0.0, 0.0], vec![1.0, 1.0, 1.0])
        .unwrap_err()
        .into();
    assert!(matches!(inverted, WaveFitError::Configuration(_)));
}

#[test]
fn test_all_samples_failing() {
    let series = noisy_series(&WaveShape::SingleWave, &TRUTH, 80, 10.0, 4);
    let hyper = HyperParameters::new(relative_bounds(&TRUTH, 0.5, 1.5), 6).with_seed(6);
    let config = LmConfig {
        max_iterations: 0,
        require_convergence: true,
        ..LmConfig::default()
    };

    let err = RegressionEngine::new()
        .with_config(config)
        .fit(&series, &WaveShape::SingleWave, &hyper)
        .unwrap_err();
    assert!(matches!(err, WaveFitError::NoFeasibleFit { samples: 6 }));
}

#[test]
fn test_failed_samples_are_skipped() {
    let series = synthetic_series(&WaveShape::SingleWave, &TRUTH, 200);
    let hyper = HyperParameters::new(relative_bounds(&TRUTH, 0.5, 1.5), 20).with_seed(1);
    let config = LmConfig {
        max_iterations: 5,
        require_convergence: true,
        ..LmConfig::default()
    };

    let fit = RegressionEngine::new()
        .with_config(config.clone())
        .fit(&series, &WaveShape::SingleWave, &hyper)
        .unwrap();
    assert!(fit.failed_samples > 0);
    assert!(fit.failed_samples < 20);

    // The winning start converges on its own under the same settings
    let layout = hyper.layout_for(&WaveShape::SingleWave).unwrap();
    let times = series.times_f64();
    let problem =
        CurveProblem::new(&WaveShape::SingleWave, &layout, &times, series.values()).unwrap();
    let guesses = draw_initial_guesses(&hyper.bounds, 20, 1).unwrap();
    let local = LevenbergMarquardt::with_config(config)
        .minimize_bounded(
            &problem,
            guesses[fit.sample_index].clone(),
            hyper.bounds.lower(),
            hyper.bounds.upper(),
        )
        .unwrap();
    assert!(local.success);
    assert_eq!(local.params.to_vec(), fit.parameters.values());
}
