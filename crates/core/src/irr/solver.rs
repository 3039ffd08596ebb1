//! Annualized internal rate of return over irregularly dated cash flows.
//!
//! The root of `NPV(r) = sum(amount_i * (1 + r)^(-t_i))` is bracketed first and then
//! refined with Newton steps that fall back to bisection whenever a step would
//! leave the bracket. `t_i` is measured in years of 365 days from the earliest flow.

use chrono::NaiveDate;
use log::{debug, error};
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use super::irr_errors::IrrError;
use super::irr_model::{CashFlow, IrrResult};
use crate::constants::DAYS_PER_YEAR;
use crate::errors::Result;

/// Iteration budget shared by bracketing and refinement.
pub const MAX_ITERATIONS: u32 = 1000;

/// Convergence tolerance on |NPV|.
pub const NPV_TOLERANCE: f64 = 1e-6;

const BRACKET_WIDTH_TOLERANCE: f64 = 1e-12;
const LOWER_BOUND_CANDIDATES: [f64; 3] = [-0.9999, -0.99, -0.9];
const INITIAL_UPPER_BOUND: f64 = 1.0;
const MAX_UPPER_BOUND: f64 = 1e6;
const RATE_SCALE: u32 = 12;

#[derive(Debug, Clone, Copy)]
struct Flow {
    years: f64,
    amount: f64,
}

fn npv(flows: &[Flow], rate: f64) -> f64 {
    let base = 1.0 + rate;
    flows.iter().map(|f| f.amount * base.powf(-f.years)).sum()
}

fn npv_derivative(flows: &[Flow], rate: f64) -> f64 {
    let base = 1.0 + rate;
    flows
        .iter()
        .map(|f| -f.years * f.amount * base.powf(-f.years - 1.0))
        .sum()
}

/// Solves the series for its annualized rate.
///
/// Fails with `DegenerateInput` when the series lacks an outflow or an inflow side,
/// or spans zero days, and with `Convergence` when no root is found within
/// `MAX_ITERATIONS`. A series whose only inflow side is a zero terminal value is a
/// total loss and solves to -100% without iterating.
pub fn solve(series: &[CashFlow]) -> Result<IrrResult> {
    let (start, end) = match (
        series.iter().map(|f| f.date).min(),
        series.iter().map(|f| f.date).max(),
    ) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(IrrError::DegenerateInput("no cash flows".to_string()).into()),
    };

    let has_outflow = series.iter().any(|f| f.amount.is_sign_negative() && !f.amount.is_zero());
    let has_inflow = series.iter().any(|f| f.amount > Decimal::ZERO);
    let has_zero_terminal = series.iter().any(|f| f.is_terminal() && f.amount.is_zero());

    if !has_outflow {
        return Err(IrrError::DegenerateInput("series has no negative cash flow".to_string()).into());
    }
    if !has_inflow && !has_zero_terminal {
        return Err(IrrError::DegenerateInput(
            "series has no positive cash flow or closing value".to_string(),
        )
        .into());
    }
    if start == end {
        return Err(IrrError::DegenerateInput(format!(
            "all cash flows fall on {}, the period is zero days",
            start
        ))
        .into());
    }

    if !has_inflow {
        debug!("Series of {} flows ends in a zero valuation, treating as total loss", series.len());
        return Ok(IrrResult {
            rate: -Decimal::ONE,
            as_of_date: end,
            converged: true,
            iterations: 0,
        });
    }

    let flows = to_flows(series, start)?;
    let (rate, iterations) = find_root(&flows).map_err(|iterations| {
        error!(
            "IRR solver did not converge after {} iterations over {} cash flows",
            iterations,
            series.len()
        );
        IrrError::Convergence {
            iterations,
            flow_count: series.len(),
        }
    })?;

    let rate = Decimal::from_f64(rate)
        .map(|r| r.round_dp(RATE_SCALE))
        .ok_or(IrrError::Convergence {
            iterations,
            flow_count: series.len(),
        })?;

    Ok(IrrResult {
        rate,
        as_of_date: end,
        converged: true,
        iterations,
    })
}

fn to_flows(series: &[CashFlow], start: NaiveDate) -> Result<Vec<Flow>> {
    series
        .iter()
        .map(|f| {
            let amount = f.amount.to_f64().ok_or_else(|| {
                IrrError::DegenerateInput(format!("amount {} is out of range", f.amount))
            })?;
            Ok(Flow {
                years: (f.date - start).num_days() as f64 / DAYS_PER_YEAR,
                amount,
            })
        })
        .collect()
}

/// Returns the root and the iterations spent, or the iterations spent on failure.
fn find_root(flows: &[Flow]) -> std::result::Result<(f64, u32), u32> {
    let mut iterations = 0u32;

    let Some((mut lo, mut f_lo)) = LOWER_BOUND_CANDIDATES
        .iter()
        .map(|&lo| (lo, npv(flows, lo)))
        .find(|(_, f)| f.is_finite())
    else {
        return Err(iterations);
    };

    let mut hi = INITIAL_UPPER_BOUND;
    let mut f_hi = npv(flows, hi);
    while f_lo.signum() == f_hi.signum() {
        iterations += 1;
        if hi >= MAX_UPPER_BOUND || iterations >= MAX_ITERATIONS {
            return Err(iterations);
        }
        hi *= 10.0;
        f_hi = npv(flows, hi);
    }

    if f_lo.abs() < NPV_TOLERANCE {
        return Ok((lo, iterations));
    }
    if f_hi.abs() < NPV_TOLERANCE {
        return Ok((hi, iterations));
    }

    let mut rate = if lo < 0.1 && 0.1 < hi { 0.1 } else { (lo + hi) / 2.0 };
    while iterations < MAX_ITERATIONS {
        iterations += 1;
        let f = npv(flows, rate);
        if !f.is_finite() {
            return Err(iterations);
        }
        if f.abs() < NPV_TOLERANCE {
            return Ok((rate, iterations));
        }

        if f.signum() == f_lo.signum() {
            lo = rate;
            f_lo = f;
        } else {
            hi = rate;
        }
        if (hi - lo).abs() < BRACKET_WIDTH_TOLERANCE {
            return Ok(((lo + hi) / 2.0, iterations));
        }

        let df = npv_derivative(flows, rate);
        let newton = rate - f / df;
        rate = if df != 0.0 && newton.is_finite() && newton > lo && newton < hi {
            newton
        } else {
            (lo + hi) / 2.0
        };
    }

    Err(iterations)
}
