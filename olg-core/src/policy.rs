use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::types::Stage;

// ============================================================================
// Policy - Parameters the professor controls
// ============================================================================

/// Lower edge of the admissible interest-rate domain.
pub const MIN_INTEREST_RATE: f64 = -1.0;
/// Upper edge of the admissible interest-rate domain.
pub const MAX_INTEREST_RATE: f64 = 2.0;
/// Substitute for -1.0, where `1 / (1 + r)` blows up.
pub const RATE_FLOOR_GUARD: f64 = -0.9999;

/// Keep a rate inside `[-1, 2]` and away from the `1 + r = 0` pole.
pub fn clamp_rate(rate: f64) -> f64 {
    if !rate.is_finite() {
        return 0.0;
    }
    let clamped = rate.clamp(MIN_INTEREST_RATE, MAX_INTEREST_RATE);
    if (clamped - MIN_INTEREST_RATE).abs() < 1e-8 {
        RATE_FLOOR_GUARD
    } else {
        clamped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct StageSchedule {
    pub young: f64,
    pub middle: f64,
    pub old: f64,
}

impl StageSchedule {
    pub fn for_stage(&self, stage: Stage) -> f64 {
        match stage {
            Stage::Young => self.young,
            Stage::Middle => self.middle,
            Stage::Old => self.old,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct Policy {
    /// Lump-sum tax taken from each stage's gross income.
    pub tax: StageSchedule,
    /// Share of middle-aged gross income paid to each old agent. A modelling
    /// choice: the pension is not funded from the taxes collected.
    pub pension_rate: f64,
    pub borrowing_limit: f64,
    pub target_stock: f64,
    pub income: StageSchedule,
    pub government_debt: f64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            tax: StageSchedule {
                young: 0.0,
                middle: 0.0,
                old: 0.0,
            },
            pension_rate: 0.0,
            borrowing_limit: 100.0,
            target_stock: 0.0,
            income: StageSchedule {
                young: 0.0,
                middle: 60.0,
                old: 0.0,
            },
            government_debt: 0.0,
        }
    }
}

impl Policy {
    /// Income a stage actually has to spend this round. Tax never takes
    /// income below zero.
    pub fn net_income(&self, stage: Stage) -> f64 {
        let gross = self.income.for_stage(stage);
        let after_tax = (gross - self.tax.for_stage(stage)).max(0.0);
        match stage {
            Stage::Old => after_tax + self.pension_rate * self.income.middle,
            Stage::Young | Stage::Middle => after_tax,
        }
    }

    /// Largest loan a young agent can service at `rate`.
    pub fn max_borrowing(&self, rate: f64) -> f64 {
        self.borrowing_limit / (1.0 + clamp_rate(rate))
    }

    /// Overwrite the fields present in `update`. Out-of-range values are
    /// clamped rather than rejected.
    pub fn apply(&mut self, update: &PolicyUpdate) {
        let non_negative = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };

        if let Some(v) = update.tax_young {
            self.tax.young = non_negative(v);
        }
        if let Some(v) = update.tax_middle {
            self.tax.middle = non_negative(v);
        }
        if let Some(v) = update.tax_old {
            self.tax.old = non_negative(v);
        }
        if let Some(v) = update.pension_rate {
            self.pension_rate = non_negative(v);
        }
        if let Some(v) = update.borrowing_limit {
            self.borrowing_limit = non_negative(v);
        }
        if let Some(v) = update.target_stock {
            self.target_stock = non_negative(v);
        }
        if let Some(v) = update.income_young {
            self.income.young = non_negative(v);
        }
        if let Some(v) = update.income_middle {
            self.income.middle = non_negative(v);
        }
        if let Some(v) = update.income_old {
            self.income.old = non_negative(v);
        }
        if let Some(v) = update.government_debt {
            self.government_debt = non_negative(v);
        }
    }
}

/// A partial policy change. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct PolicyUpdate {
    pub tax_young: Option<f64>,
    pub tax_middle: Option<f64>,
    pub tax_old: Option<f64>,
    pub pension_rate: Option<f64>,
    pub borrowing_limit: Option<f64>,
    pub target_stock: Option<f64>,
    pub income_young: Option<f64>,
    pub income_middle: Option<f64>,
    pub income_old: Option<f64>,
    pub government_debt: Option<f64>,
    /// Pin the interest rate instead of solving for it.
    pub interest_rate: Option<f64>,
    pub synthetic_count: Option<usize>,
}
