//! Time-indexed observation series.
//!
//! [`TimeSeries`] is the value type exchanged between the data loader, the
//! regression engine and the uncertainty estimators. The helpers here cover
//! the routine preparation steps applied to surveillance counts before a fit:
//! smoothing, accumulation, weekly aggregation, windowing and initial
//! estimates of the growth rate and peak time.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaveFitError};

/// Ordered `(time, value)` observations with strictly increasing integer times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSeries")]
pub struct TimeSeries {
    times: Vec<i64>,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct RawTimeSeries {
    times: Vec<i64>,
    values: Vec<f64>,
}

impl TryFrom<RawTimeSeries> for TimeSeries {
    type Error = WaveFitError;

    fn try_from(raw: RawTimeSeries) -> Result<Self> {
        TimeSeries::new(raw.times, raw.values)
    }
}

impl TimeSeries {
    /// Create a series, validating lengths, ordering and finiteness.
    pub fn new(times: Vec<i64>, values: Vec<f64>) -> Result<Self> {
        if times.len() != values.len() {
            return Err(WaveFitError::DimensionMismatch(format!(
                "{} times but {} values",
                times.len(),
                values.len()
            )));
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(WaveFitError::InvalidInput(format!(
                "times must be strictly increasing, got {} followed by {}",
                times[i],
                times[i + 1]
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(WaveFitError::InvalidInput(format!(
                "value at time {} is not finite ({})",
                times[i], values[i]
            )));
        }
        Ok(Self { times, values })
    }

    /// Series on consecutive times `start, start + 1, ...`.
    pub fn from_values(start: i64, values: Vec<f64>) -> Result<Self> {
        let times = (0..values.len() as i64).map(|i| start + i).collect();
        Self::new(times, values)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[i64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Times as floating point, the form consumed by the models.
    pub fn times_f64(&self) -> Vec<f64> {
        self.times.iter().map(|&t| t as f64).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// Observations with `start <= time <= end`.
    pub fn window(&self, start: i64, end: i64) -> TimeSeries {
        let (times, values) = self.iter().filter(|&(t, _)| t >= start && t <= end).unzip();
        TimeSeries { times, values }
    }

    /// Trailing moving average over `window` observations.
    ///
    /// The first `window - 1` entries have no full window and are `None`.
    pub fn moving_average(&self, window: usize) -> Result<Vec<Option<f64>>> {
        if window == 0 {
            return Err(WaveFitError::InvalidInput(
                "moving average window must be positive".to_string(),
            ));
        }
        let mut out = Vec::with_capacity(self.len());
        let mut sum = 0.0;
        for (i, &v) in self.values.iter().enumerate() {
            sum += v;
            if i >= window {
                sum -= self.values[i - window];
            }
            out.push((i + 1 >= window).then(|| sum / window as f64));
        }
        Ok(out)
    }

    /// Running total, turning incidence into prevalence.
    pub fn cumulative(&self) -> TimeSeries {
        let values = self
            .values
            .iter()
            .scan(0.0, |acc, &v| {
                *acc += v;
                Some(*acc)
            })
            .collect();
        TimeSeries {
            times: self.times.clone(),
            values,
        }
    }

    /// Sums over consecutive non-overlapping blocks of `block` observations,
    /// stamped with the time of each block's first observation. A trailing
    /// partial block is dropped.
    pub fn aggregate(&self, block: usize) -> Result<TimeSeries> {
        if block == 0 {
            return Err(WaveFitError::InvalidInput(
                "aggregation block must be positive".to_string(),
            ));
        }
        let (times, values) = self
            .times
            .chunks_exact(block)
            .zip(self.values.chunks_exact(block))
            .map(|(t, v)| (t[0], v.iter().sum::<f64>()))
            .unzip();
        Ok(TimeSeries { times, values })
    }

    /// Time of the largest observation; the earliest one on ties.
    pub fn argmax_time(&self) -> Option<i64> {
        self.iter()
            .fold(None, |best: Option<(i64, f64)>, (t, v)| match best {
                Some((_, bv)) if v <= bv => best,
                _ => Some((t, v)),
            })
            .map(|(t, _)| t)
    }
}

/// Exponential growth rate over `[start, end]`: the least-squares slope of
/// `ln(value)` against time.
///
/// Non-positive observations carry no information about the exponent and are
/// skipped; at least two distinct positive points are required.
pub fn growth_rate_estimate(series: &TimeSeries, start: i64, end: i64) -> Result<f64> {
    let points: Vec<(f64, f64)> = series
        .window(start, end)
        .iter()
        .filter(|&(_, v)| v > 0.0)
        .map(|(t, v)| (t as f64, v.ln()))
        .collect();

    if points.len() < 2 {
        return Err(WaveFitError::InvalidInput(format!(
            "growth rate over [{}, {}] needs two positive observations, found {}",
            start,
            end,
            points.len()
        )));
    }

    let n = points.len() as f64;
    let mean_t = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxy: f64 = points.iter().map(|(t, y)| (t - mean_t) * (y - mean_y)).sum();
    let sxx: f64 = points.iter().map(|(t, _)| (t - mean_t).powi(2)).sum();

    Ok(sxy / sxx)
}
