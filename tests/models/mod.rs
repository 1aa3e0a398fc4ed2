//! Properties of the logistic model library over randomly drawn parameters.

use approx::assert_relative_eq;
use epiwaves_rs::models::{
    logistic_cumulative, logistic_rate, multi_wave_cumulative, multi_wave_rate, Wave,
};
use epiwaves_rs::{WaveModel, WaveShape};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_wave(rng: &mut ChaCha8Rng) -> Wave {
    Wave::new(
        rng.gen_range(1.0..1e5),
        rng.gen_range(0.01..2.0),
        rng.gen_range(-100.0..300.0),
    )
}

#[test]
fn test_rate_non_negative_and_cumulative_bounded() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for _ in 0..200 {
        let w = random_wave(&mut rng);
        let mut previous = f64::NEG_INFINITY;
        for i in -50..=400 {
            let t = i as f64;
            let rate = logistic_rate(t, w.k, w.r, w.tau);
            let c = logistic_cumulative(t, w.k, w.r, w.tau);
            assert!(rate >= 0.0 && rate.is_finite(), "rate {} at t = {} for {:?}", rate, t, w);
            assert!(c >= previous, "cumulative decreased at t = {} for {:?}", t, w);
            assert!(c >= 0.0 && c <= w.k);
            previous = c;
        }
        assert_relative_eq!(logistic_cumulative(w.tau, w.k, w.r, w.tau), w.k / 2.0);
    }
}

#[test]
fn test_rate_is_derivative_of_cumulative() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let h = 1e-5;
    for _ in 0..50 {
        let w = random_wave(&mut rng);
        for _ in 0..20 {
            let t = rng.gen_range(-100.0..300.0);
            let numeric = (w.cumulative(t + h) - w.cumulative(t - h)) / (2.0 * h);
            let analytic = w.rate(t);
            assert_relative_eq!(numeric, analytic, epsilon = 1e-6 * w.k, max_relative = 1e-5);
        }
    }
}

#[test]
fn test_single_wave_superposition_is_exact() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for _ in 0..100 {
        let w = random_wave(&mut rng);
        let params = [w.k, w.r, w.tau];
        let t = rng.gen_range(-100.0..300.0);
        assert_eq!(multi_wave_rate(t, &[w]), logistic_rate(t, w.k, w.r, w.tau));
        assert_eq!(multi_wave_cumulative(t, &[w]), logistic_cumulative(t, w.k, w.r, w.tau));
        assert_eq!(
            WaveShape::MultiWave(1).evaluate(t, &params),
            WaveShape::SingleWave.evaluate(t, &params)
        );
    }
}

#[test]
fn test_six_wave_shape_sums_components() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let waves: Vec<Wave> = (0..6).map(|_| random_wave(&mut rng)).collect();
    let shape = WaveShape::six_wave();
    let params: Vec<f64> = waves
        .iter()
        .map(|w| w.k)
        .chain(waves.iter().map(|w| w.r))
        .chain(waves.iter().map(|w| w.tau))
        .collect();

    assert_eq!(shape.waves(&params).unwrap(), waves);
    for &t in &[0.0, 75.0, 150.0, 299.0] {
        assert_relative_eq!(
            shape.evaluate(t, &params),
            multi_wave_rate(t, &waves),
            max_relative = 1e-12
        );
    }
}

#[test]
fn test_cumulative_shape_matches_running_sum_of_rates() {
    // Daily rates summed over a long horizon approach the final size K
    let params = [10_000.0, 0.05, 100.0];
    let total: f64 = (-200..=400)
        .map(|t| WaveShape::SingleWave.evaluate(t as f64, &params))
        .sum();
    assert_relative_eq!(total, 10_000.0, max_relative = 1e-3);
    assert_relative_eq!(
        WaveShape::SingleWaveCumulative.evaluate(400.0, &params),
        10_000.0,
        max_relative = 1e-6
    );
}
