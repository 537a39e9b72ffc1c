use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::policy::{MAX_INTEREST_RATE, MIN_INTEREST_RATE, clamp_rate};

// === CONSTANTS ===

pub const CLEARING_TOLERANCE: f64 = 1e-6;
pub const MAX_BISECTION_STEPS: u32 = 100;

// === LOAN MARKET ===

/// Committed positions the loan market clears over. Captured once and then
/// solved against, so a solve never reads live agent state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanMarket {
    /// Each young agent's committed borrowing.
    pub young_borrowing: Vec<f64>,
    /// Each middle-aged agent's committed saving (positive entries only
    /// count as supply).
    pub middle_saving: Vec<f64>,
    pub borrowing_limit: f64,
    pub government_debt: f64,
}

impl LoanMarket {
    /// Young borrowing, each loan capped at what can be serviced at `rate`,
    /// plus government debt.
    pub fn demand(&self, rate: f64) -> f64 {
        let cap = self.borrowing_limit / (1.0 + clamp_rate(rate));
        let young: f64 = self.young_borrowing.iter().map(|&b| cap.min(b)).sum();
        young + self.government_debt
    }

    /// Middle-aged saving. Fixed at decision time, so it does not move with
    /// the rate.
    pub fn supply(&self, _rate: f64) -> f64 {
        self.middle_saving.iter().filter(|&&s| s > 0.0).sum()
    }

    /// Nothing borrowed, nothing saved and no public debt: any rate clears.
    pub fn is_empty(&self) -> bool {
        self.government_debt == 0.0
            && self.young_borrowing.iter().all(|&b| b == 0.0)
            && self.middle_saving.iter().all(|&s| s <= 0.0)
    }

    /// Excess demand for loans; positive means the rate must rise.
    pub fn imbalance(&self, rate: f64) -> f64 {
        self.demand(rate) - self.supply(rate)
    }
}

// === SOLVER ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct ClearingReport {
    pub interest_rate: f64,
    /// Imbalance left at `interest_rate`.
    pub imbalance: f64,
    pub iterations: u32,
    pub converged: bool,
    /// Whether the starting bracket had a sign change.
    pub bracketed: bool,
}

impl ClearingReport {
    /// Report for a market with nothing in it: the rate is left where it was.
    pub fn idle(rate: f64) -> Self {
        Self {
            interest_rate: rate,
            imbalance: 0.0,
            iterations: 0,
            converged: true,
            bracketed: true,
        }
    }
}

/// Find the rate in `[-1, 2]` at which loan demand meets loan supply, by
/// bisection.
///
/// Never fails: if the bracket holds no root or the step budget runs out,
/// the midpoint of the final bracket is returned as a best effort.
pub fn solve_equilibrium(market: &LoanMarket) -> ClearingReport {
    let mut lo = clamp_rate(MIN_INTEREST_RATE);
    let mut hi = MAX_INTEREST_RATE;

    let lo_imbalance = market.imbalance(lo);
    let hi_imbalance = market.imbalance(hi);
    let bracketed = lo_imbalance.signum() != hi_imbalance.signum()
        || lo_imbalance.abs() < CLEARING_TOLERANCE
        || hi_imbalance.abs() < CLEARING_TOLERANCE;
    if !bracketed {
        tracing::warn!(
            lo_imbalance,
            hi_imbalance,
            "loan market imbalance has the same sign at both ends of the rate range; \
             equilibrium may lie outside it"
        );
    }

    for step in 1..=MAX_BISECTION_STEPS {
        let mid = (lo + hi) / 2.0;
        let imbalance = market.imbalance(mid);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "clearing",
            step = step as u64,
            lo = lo,
            hi = hi,
            rate = mid,
            imbalance = imbalance,
        );

        if imbalance.abs() < CLEARING_TOLERANCE {
            return ClearingReport {
                interest_rate: mid,
                imbalance,
                iterations: step,
                converged: true,
                bracketed,
            };
        }

        if imbalance > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let rate = (lo + hi) / 2.0;
    let imbalance = market.imbalance(rate);
    tracing::warn!(
        rate,
        imbalance,
        "loan market did not clear within {MAX_BISECTION_STEPS} bisection steps"
    );
    ClearingReport {
        interest_rate: rate,
        imbalance,
        iterations: MAX_BISECTION_STEPS,
        converged: false,
        bracketed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demand_caps_each_loan_at_serviceable_amount() {
        let market = LoanMarket {
            young_borrowing: vec![100.0, 40.0],
            middle_saving: vec![],
            borrowing_limit: 100.0,
            government_debt: 5.0,
        };
        // cap at r=1.0 is 50
        assert_eq!(market.demand(1.0), 50.0 + 40.0 + 5.0);
        assert_eq!(market.demand(0.0), 145.0);
    }

    #[test]
    fn negative_saving_is_not_supply() {
        let market = LoanMarket {
            young_borrowing: vec![],
            middle_saving: vec![30.0, -10.0, 5.0],
            borrowing_limit: 100.0,
            government_debt: 0.0,
        };
        assert_eq!(market.supply(0.03), 35.0);
    }

    #[test]
    fn idle_market_is_empty() {
        let market = LoanMarket {
            young_borrowing: vec![0.0],
            middle_saving: vec![-4.0],
            borrowing_limit: 100.0,
            government_debt: 0.0,
        };
        assert!(market.is_empty());
        assert!(!LoanMarket { government_debt: 1.0, ..market }.is_empty());
    }

    #[test]
    fn converges_to_closed_form_rate() {
        // 100 / (1 + r) = 80  =>  r = 0.25
        let market = LoanMarket {
            young_borrowing: vec![100.0],
            middle_saving: vec![80.0],
            borrowing_limit: 100.0,
            government_debt: 0.0,
        };
        let report = solve_equilibrium(&market);
        assert!(report.converged);
        assert!(report.bracketed);
        assert!((report.interest_rate - 0.25).abs() < 1e-5, "{report:?}");
    }

    #[test]
    fn government_debt_raises_the_rate() {
        // 100 / (1 + r) + 10 = 60  =>  r = 1.0
        let market = LoanMarket {
            young_borrowing: vec![100.0],
            middle_saving: vec![60.0],
            borrowing_limit: 100.0,
            government_debt: 10.0,
        };
        let report = solve_equilibrium(&market);
        assert!((report.interest_rate - 1.0).abs() < 1e-5, "{report:?}");
    }

    #[test]
    fn unbracketed_market_returns_best_effort_edge() {
        // Supply dwarfs demand everywhere: rate is pushed to the floor.
        let market = LoanMarket {
            young_borrowing: vec![10.0],
            middle_saving: vec![1_000.0],
            borrowing_limit: 100.0,
            government_debt: 0.0,
        };
        let report = solve_equilibrium(&market);
        assert!(!report.bracketed);
        assert!(!report.converged);
        assert!(report.interest_rate < -0.99);
        assert!(report.interest_rate >= MIN_INTEREST_RATE);
    }
}
