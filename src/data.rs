//! Loading daily surveillance counts from CSV.
//!
//! A file holds one row per calendar day with a date column and one or more
//! numeric count columns. Rows must cover consecutive days; the loaded series
//! uses the time index `1..=n` and keeps the dates alongside for lookup.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use csv::StringRecord;
use log::debug;

use crate::error::{Result, WaveFitError};
use crate::series::TimeSeries;

/// A daily series and the calendar dates of its time indices.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    /// Date of each observation; `dates[i]` has time `i + 1`
    pub dates: Vec<NaiveDate>,
    pub series: TimeSeries,
}

impl DailySeries {
    /// Time index of `date`, if it lies inside the loaded range.
    pub fn time_of(&self, date: NaiveDate) -> Option<i64> {
        let first = *self.dates.first()?;
        let offset = (date - first).num_days();
        (offset >= 0 && (offset as usize) < self.dates.len()).then_some(offset + 1)
    }

    /// Calendar date of time index `t`.
    pub fn date_of(&self, t: i64) -> Option<NaiveDate> {
        usize::try_from(t - 1).ok().and_then(|i| self.dates.get(i).copied())
    }
}

/// Load `value_column` of the CSV file at `path`, indexed by `date_column`
/// parsed with the chrono `date_format` (e.g. `"%Y-%m-%d"`).
pub fn load_daily_counts<P: AsRef<Path>>(
    path: P,
    date_column: &str,
    value_column: &str,
    date_format: &str,
) -> Result<DailySeries> {
    let path = path.as_ref();
    let file = File::open(path)?;
    debug!("loading daily counts from {}", path.display());
    read_daily_counts(file, date_column, value_column, date_format)
}

/// [`load_daily_counts`] over any reader.
pub fn read_daily_counts<R: Read>(
    reader: R,
    date_column: &str,
    value_column: &str,
    date_format: &str,
) -> Result<DailySeries> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let header_map = build_header_map(&headers);
    let date_index = column_index(&header_map, date_column)?;
    let value_index = column_index(&header_map, value_column)?;

    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut values = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1
        let line = idx + 2;
        let record = result?;

        let raw_date = record.get(date_index).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, date_format).map_err(|e| {
            WaveFitError::Data(format!("line {}: invalid date '{}': {}", line, raw_date, e))
        })?;

        if let Some(&previous) = dates.last() {
            if date != previous + Duration::days(1) {
                return Err(WaveFitError::Data(format!(
                    "line {}: date {} does not follow {}; rows must be consecutive days",
                    line, date, previous
                )));
            }
        }

        let raw_value = record.get(value_index).unwrap_or_default();
        let value: f64 = raw_value.parse().map_err(|_| {
            WaveFitError::Data(format!(
                "line {}: invalid value '{}' in column '{}'",
                line, raw_value, value_column
            ))
        })?;

        dates.push(date);
        values.push(value);
    }

    if dates.is_empty() {
        return Err(WaveFitError::Data("file contains no data rows".to_string()));
    }

    let series = TimeSeries::from_values(1, values)?;
    Ok(DailySeries { dates, series })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), i))
        .collect()
}

fn column_index(header_map: &HashMap<String, usize>, name: &str) -> Result<usize> {
    header_map.get(name).copied().ok_or_else(|| {
        let mut available: Vec<&str> = header_map.keys().map(String::as_str).collect();
        available.sort_unstable();
        WaveFitError::Data(format!(
            "missing column '{}' (available: {})",
            name,
            available.join(", ")
        ))
    })
}
