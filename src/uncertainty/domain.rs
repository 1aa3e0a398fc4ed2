//! Numeric-domain policy for likelihood evaluation.
//!
//! Logarithms of non-positive values and divisions by zero do not abort the
//! computation. They map to fixed sentinel outcomes and every occurrence is
//! counted, so a caller can see how many terms were suppressed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Counts of suppressed domain events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainReport {
    /// `ln(0)` evaluations, mapped to `-inf`
    pub log_of_zero: usize,
    /// `ln(x)` with `x < 0` or NaN, mapped to `-inf`
    pub log_of_negative: usize,
    /// Divisions with a zero denominator
    pub division_by_zero: usize,
}

impl DomainReport {
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn total(&self) -> usize {
        self.log_of_zero + self.log_of_negative + self.division_by_zero
    }
}

impl fmt::Display for DomainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} log of zero, {} log of negative, {} division by zero",
            self.log_of_zero, self.log_of_negative, self.division_by_zero
        )
    }
}

/// Evaluates `ln` and division under the suppression rules, recording events.
#[derive(Debug, Clone, Default)]
pub struct DomainPolicy {
    report: DomainReport,
}

impl DomainPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// `ln(x)` for `x > 0`; `-inf` otherwise.
    pub fn safe_ln(&mut self, x: f64) -> f64 {
        if x > 0.0 {
            x.ln()
        } else if x == 0.0 {
            self.report.log_of_zero += 1;
            f64::NEG_INFINITY
        } else {
            self.report.log_of_negative += 1;
            f64::NEG_INFINITY
        }
    }

    /// `a / b`; a zero `b` yields an infinity carrying the sign of `a`, or
    /// zero when `a` is zero as well.
    pub fn safe_div(&mut self, a: f64, b: f64) -> f64 {
        if b != 0.0 {
            return a / b;
        }
        self.report.division_by_zero += 1;
        if a == 0.0 {
            0.0
        } else {
            f64::INFINITY.copysign(a)
        }
    }

    pub fn report(&self) -> DomainReport {
        self.report
    }

    /// Consume the policy, returning its counts.
    pub fn into_report(self) -> DomainReport {
        self.report
    }
}
