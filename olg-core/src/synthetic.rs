//! Auto-pilot for synthetic participants.
//!
//! Synthetic agents stand in for absent students so a round never waits on
//! them. Young ones publish a full borrowing schedule and borrow whatever it
//! says at the current rate; middle-aged ones mostly save a slice of their
//! disposable income; old ones simply consume.

use rand::Rng;

use crate::agent::Agent;
use crate::demand::{DemandCurve, RATE_GRID_PERCENT, fallback_amount};
use crate::types::{Decision, Stage, round_to};

// === CONSTANTS ===

pub const SAVE_PROBABILITY: f64 = 0.8;
pub const SAVE_FRACTION_MIN: f64 = 0.2;
pub const SAVE_FRACTION_MAX: f64 = 0.6;
/// Never save more than this share of disposable income.
pub const SAVE_CAP_FRACTION: f64 = 0.9;
pub const BORROW_FRACTION_MIN: f64 = 0.1;
pub const BORROW_FRACTION_MAX: f64 = 0.3;
/// Never borrow more than this share of the borrowing limit in middle age.
pub const BORROW_CAP_FRACTION: f64 = 0.3;

// === DEMAND CURVES ===

/// Largest loan that can be serviced at every grid rate.
pub fn optimal_curve(borrowing_limit: f64) -> DemandCurve {
    DemandCurve::from_samples(
        RATE_GRID_PERCENT
            .iter()
            .map(|&rate| (rate, round_to(borrowing_limit / (1.0 + rate / 100.0), 1))),
    )
}

/// A random, non-increasing schedule: full limit at 0%, then each point is
/// drawn below both the previous point and the serviceable maximum.
pub fn randomized_curve<R: Rng>(rng: &mut R, borrowing_limit: f64) -> DemandCurve {
    let mut previous = borrowing_limit;
    let samples = RATE_GRID_PERCENT.iter().map(|&rate| {
        if rate == 0.0 {
            return (rate, borrowing_limit);
        }
        let ceiling = previous.min(borrowing_limit / (1.0 + rate / 100.0));
        let amount = round_to(rng.random::<f64>() * ceiling, 1).min(previous);
        previous = amount;
        (rate, amount)
    });
    DemandCurve::from_samples(samples.collect::<Vec<_>>())
}

pub fn young_curve<R: Rng>(rng: &mut R, borrowing_limit: f64, optimal: bool) -> DemandCurve {
    if optimal {
        optimal_curve(borrowing_limit)
    } else {
        randomized_curve(rng, borrowing_limit)
    }
}

/// Borrowing realized from a schedule at `rate` (a fraction, not percent),
/// kept within `[0, borrowing_limit]`.
pub fn realize_borrowing(curve: &DemandCurve, rate: f64, borrowing_limit: f64) -> f64 {
    curve
        .amount_at(rate * 100.0, fallback_amount(borrowing_limit))
        .clamp(0.0, borrowing_limit.max(0.0))
}

// === MIDDLE / OLD ===

pub fn middle_decision<R: Rng>(rng: &mut R, disposable: f64, borrowing_limit: f64) -> Decision {
    if disposable <= 0.0 {
        return Decision::Save(0.0);
    }
    if rng.random_bool(SAVE_PROBABILITY) {
        let fraction = rng.random_range(SAVE_FRACTION_MIN..=SAVE_FRACTION_MAX);
        let amount = round_to(disposable * fraction, 2).min(disposable * SAVE_CAP_FRACTION);
        Decision::Save(amount.max(0.0))
    } else {
        let fraction = rng.random_range(BORROW_FRACTION_MIN..=BORROW_FRACTION_MAX);
        let amount = round_to(disposable * fraction, 2).min(borrowing_limit * BORROW_CAP_FRACTION);
        Decision::Borrow(amount.max(0.0))
    }
}

// === FULL CHOICE ===

/// What a synthetic agent wants to do this round.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticChoice {
    pub decision: Decision,
    /// Only young agents publish a schedule.
    pub curve: Option<DemandCurve>,
}

pub fn choose<R: Rng>(
    rng: &mut R,
    agent: &Agent,
    rate: f64,
    income: f64,
    borrowing_limit: f64,
    optimal: bool,
) -> SyntheticChoice {
    match agent.stage {
        Stage::Young => {
            let curve = young_curve(rng, borrowing_limit, optimal);
            let amount = round_to(realize_borrowing(&curve, rate, borrowing_limit), 1)
                .min(borrowing_limit.max(0.0));
            SyntheticChoice {
                decision: Decision::Borrow(amount),
                curve: Some(curve),
            }
        }
        Stage::Middle => SyntheticChoice {
            decision: middle_decision(rng, agent.disposable_income(rate, income), borrowing_limit),
            curve: None,
        },
        Stage::Old => SyntheticChoice {
            decision: Decision::Consume,
            curve: None,
        },
    }
}
