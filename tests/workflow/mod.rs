//! End-to-end: load a daily CSV, derive starting bounds, fit, then report
//! bands, onset and likelihood criteria.

use std::fs;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use epiwaves_rs::data::load_daily_counts;
use epiwaves_rs::series::growth_rate_estimate;
use epiwaves_rs::{HyperParameters, MaximumLikelihood, RegressionEngine, WaveModel, WaveShape};

use crate::test_helpers::relative_error;

const TRUTH: [f64; 3] = [80_000.0, 0.12, 60.0];
const DAYS: i64 = 120;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("epiwaves_{}_{}", std::process::id(), name))
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()
}

/// Rounded daily counts of one wave, as a surveillance file would hold them.
fn write_counts_csv(name: &str) -> PathBuf {
    let mut text = String::from("date,new_cases\n");
    for day in 0..DAYS {
        let date = start_date() + Duration::days(day);
        let count = WaveShape::SingleWave.evaluate((day + 1) as f64, &TRUTH).round();
        text.push_str(&format!("{},{}\n", date.format("%Y-%m-%d"), count));
    }
    let path = temp_path(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_fit_from_csv() {
    let path = write_counts_csv("counts.csv");
    let daily = load_daily_counts(&path, "date", "new_cases", "%Y-%m-%d").unwrap();
    fs::remove_file(&path).ok();

    let series = &daily.series;
    assert_eq!(series.len(), DAYS as usize);
    assert_eq!(daily.time_of(start_date() + Duration::days(59)), Some(60));

    // Starting estimates from the data itself
    let r0 = growth_rate_estimate(series, 10, 30).unwrap();
    assert!(relative_error(r0, TRUTH[1]) < 0.15, "r0 = {}", r0);
    let tau0 = series.argmax_time().unwrap() as f64;
    assert!((tau0 - TRUTH[2]).abs() <= 1.0);
    let k0: f64 = series.values().iter().sum();

    let shape = WaveShape::SingleWave;
    let bounds = shape.default_bounds(&[k0, r0, tau0], &[]).unwrap();
    let hyper = HyperParameters::new(bounds, 20).with_seed(99);
    let fit = RegressionEngine::new().fit(series, &shape, &hyper).unwrap();

    let k = fit.parameters.get("K").unwrap();
    let r = fit.parameters.get("r").unwrap();
    let tau = fit.parameters.get("tau").unwrap();
    assert!(relative_error(k, TRUTH[0]) < 0.02, "K = {}", k);
    assert!(relative_error(r, TRUTH[1]) < 0.02, "r = {}", r);
    assert!((tau - TRUTH[2]).abs() < 1.0, "tau = {}", tau);
    assert!(fit.diagnostics.r_squared > 0.999);

    // Projection beyond the data and onset of the cumulative wave
    let grid: Vec<f64> = (1..=150).map(|t| t as f64).collect();
    let band = fit.prediction_band(&shape, series, &grid, 0.95).unwrap();
    let cumulative = band.cumulative();
    let onset = cumulative.first_time_lower_exceeds(TRUTH[0] / 2.0).unwrap();
    assert!((55.0..=70.0).contains(&onset), "onset at {}", onset);
    assert!(cumulative.upper[149] > cumulative.lower[149]);

    let criteria = MaximumLikelihood::new()
        .estimate(&series.times_f64(), tau, k, r)
        .unwrap();
    assert!(criteria.log_likelihood.is_finite());
    assert!(criteria.aic < criteria.bic);
}

#[test]
fn test_hyperparameters_from_file() {
    let json = r#"{
        "bounds": {"lower": [40000.0, 0.06], "upper": [120000.0, 0.24]},
        "sample_count": 12,
        "fixed": {"tau": 60.0},
        "seed": 4
    }"#;
    let json_path = temp_path("hyper.json");
    fs::write(&json_path, json).unwrap();
    let hyper = HyperParameters::from_json_file(&json_path).unwrap();
    fs::remove_file(&json_path).ok();

    let csv_path = write_counts_csv("counts_fixed.csv");
    let daily = load_daily_counts(&csv_path, "date", "new_cases", "%Y-%m-%d").unwrap();
    fs::remove_file(&csv_path).ok();

    let fit = RegressionEngine::new()
        .fit(&daily.series, &WaveShape::SingleWave, &hyper)
        .unwrap();
    assert_eq!(fit.parameters.get("tau"), Some(60.0));
    assert!(relative_error(fit.parameters.get("r").unwrap(), TRUTH[1]) < 0.02);
}

#[test]
fn test_smoothing_and_weekly_totals() {
    let path = write_counts_csv("counts_weekly.csv");
    let daily = load_daily_counts(&path, "date", "new_cases", "%Y-%m-%d").unwrap();
    fs::remove_file(&path).ok();
    let series = &daily.series;

    let first_week: f64 = series.values()[..7].iter().sum();
    let weekly = series.aggregate(7).unwrap();
    assert_eq!(weekly.len(), DAYS as usize / 7);
    assert_eq!(weekly.times()[1], 8);
    assert_eq!(weekly.values()[0], first_week);

    let smoothed = series.moving_average(7).unwrap();
    assert_eq!(smoothed.len(), series.len());
    assert!(smoothed[5].is_none());
    assert_eq!(smoothed[6], Some(first_week / 7.0));

    // The weekly peak brackets the daily one
    let weekly_peak = weekly.argmax_time().unwrap();
    let daily_peak = series.argmax_time().unwrap();
    assert!(weekly_peak <= daily_peak && daily_peak < weekly_peak + 7);
}
