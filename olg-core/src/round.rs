use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::agent::AgentSnapshot;
use crate::aggregates::Aggregates;
use crate::clearing::{ClearingReport, LoanMarket, solve_equilibrium};
use crate::policy::Policy;

// === HISTORY ===

/// Everything about a closed round, as it stood when it closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct RoundRecord {
    pub round: u64,
    /// Rate the round's decisions were made at; replaced by the cleared
    /// rate once the background solve for this round lands.
    pub interest_rate: f64,
    pub rate_pinned: bool,
    pub policy: Policy,
    pub agents: Vec<AgentSnapshot>,
    pub aggregates: Aggregates,
    pub clearing: Option<ClearingReport>,
}

// === EQUILIBRIUM JOBS ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Fast state transition, sent right away.
    Initial,
    /// Equilibrium recomputed in the background.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquilibriumTrigger {
    RoundAdvance,
    PolicyUpdate,
}

/// A self-contained request to clear the loan market.
///
/// Carries a copy of the positions to clear over, so it can be solved on
/// any thread while the economy keeps taking decisions. `epoch` and
/// `generation` let the economy recognise results that were overtaken by a
/// reset or a newer request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumJob {
    pub epoch: u64,
    pub generation: u64,
    /// Round whose decisions are being cleared.
    pub round: u64,
    pub trigger: EquilibriumTrigger,
    pub market: LoanMarket,
    /// Live rate when the job was issued; kept if the market is empty.
    pub prior_rate: f64,
}

impl EquilibriumJob {
    pub fn solve(self) -> EquilibriumSolution {
        let report = if self.market.is_empty() {
            ClearingReport::idle(self.prior_rate)
        } else {
            solve_equilibrium(&self.market)
        };
        EquilibriumSolution { job: self, report }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumSolution {
    pub job: EquilibriumJob,
    pub report: ClearingReport,
}
