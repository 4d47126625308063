//! Special functions and root finding for the Beta recall model.

use crate::error::{Result, SchedulerError};
use std::f64::consts::PI;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function for x > 0 (Lanczos approximation).
pub(crate) fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection: Γ(x)Γ(1-x) = π / sin(πx)
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut sum = LANCZOS_COEFFICIENTS[0];
    for (i, c) in LANCZOS_COEFFICIENTS.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }
    let t = x + LANCZOS_G + 0.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Natural log of the Beta function.
pub(crate) fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// `ln(Σ weight·e^log_value)` over terms that may carry negative weights.
///
/// Fails when the weighted sum is not positive.
pub(crate) fn ln_weighted_sum(terms: &[(f64, f64)]) -> Result<f64> {
    let max = terms
        .iter()
        .filter(|(weight, _)| *weight != 0.0)
        .map(|(_, log_value)| *log_value)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(SchedulerError::Numerical("empty weighted sum".to_string()));
    }
    let sum: f64 = terms
        .iter()
        .filter(|(weight, _)| *weight != 0.0)
        .map(|(weight, log_value)| weight * (log_value - max).exp())
        .sum();
    if sum > 0.0 && sum.is_finite() {
        Ok(max + sum.ln())
    } else {
        Err(SchedulerError::Numerical(format!(
            "weighted sum is not positive ({sum})"
        )))
    }
}

const MAX_BRACKET_STEPS: usize = 64;
const MAX_BISECTION_STEPS: usize = 200;
const RELATIVE_TOLERANCE: f64 = 1e-12;

/// Find `x > 0` with `f(x) == target` for `f` decreasing in `x`.
///
/// Brackets geometrically around 1.0 then bisects in log space.
pub(crate) fn solve_decreasing<F>(f: F, target: f64) -> Result<f64>
where
    F: Fn(f64) -> Result<f64>,
{
    let mut lo = 1.0;
    let mut hi = 1.0;
    let mut steps = 0;
    while f(lo)? < target {
        lo /= 2.0;
        steps += 1;
        if steps > MAX_BRACKET_STEPS {
            return Err(SchedulerError::Numerical(format!(
                "no lower bracket for target {target}"
            )));
        }
    }
    steps = 0;
    while f(hi)? > target {
        hi *= 2.0;
        steps += 1;
        if steps > MAX_BRACKET_STEPS {
            return Err(SchedulerError::Numerical(format!(
                "no upper bracket for target {target}"
            )));
        }
    }
    for _ in 0..MAX_BISECTION_STEPS {
        if hi / lo - 1.0 < RELATIVE_TOLERANCE {
            break;
        }
        let mid = (lo * hi).sqrt();
        if f(mid)? > target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok((lo * hi).sqrt())
}
