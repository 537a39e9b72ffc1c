use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::agent::Agent;
use crate::clearing::LoanMarket;
use crate::types::Stage;

/// Cross-sectional totals shown to clients and used to diagnose the solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Aggregates {
    pub young_count: usize,
    pub middle_count: usize,
    pub old_count: usize,
    pub total_young_borrowing: f64,
    pub total_middle_saving: f64,
    pub total_middle_borrowing: f64,
    /// Young borrowing plus government debt.
    pub loan_demand: f64,
    /// Positive middle-aged saving.
    pub loan_supply: f64,
    /// Supply minus demand; positive means loanable funds are left over.
    pub loan_balance: f64,
}

impl Aggregates {
    pub fn compute<'a>(agents: impl IntoIterator<Item = &'a Agent>, government_debt: f64) -> Self {
        let mut totals = Aggregates::default();
        for agent in agents {
            match agent.stage {
                Stage::Young => {
                    totals.young_count += 1;
                    totals.total_young_borrowing += agent.borrowing;
                }
                Stage::Middle => {
                    totals.middle_count += 1;
                    if agent.saving > 0.0 {
                        totals.total_middle_saving += agent.saving;
                    } else if agent.saving < 0.0 {
                        totals.total_middle_borrowing += agent.saving.abs();
                    }
                }
                Stage::Old => totals.old_count += 1,
            }
        }
        totals.loan_demand = totals.total_young_borrowing + government_debt;
        totals.loan_supply = totals.total_middle_saving;
        totals.loan_balance = totals.loan_supply - totals.loan_demand;
        totals
    }
}

/// Capture the committed positions the loan market clears over.
pub fn loan_market<'a>(
    agents: impl IntoIterator<Item = &'a Agent>,
    borrowing_limit: f64,
    government_debt: f64,
) -> LoanMarket {
    let mut market = LoanMarket {
        borrowing_limit,
        government_debt,
        ..LoanMarket::default()
    };
    for agent in agents {
        match agent.stage {
            Stage::Young => market.young_borrowing.push(agent.borrowing),
            Stage::Middle => market.middle_saving.push(agent.saving),
            Stage::Old => {}
        }
    }
    market
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentId, Decision};

    #[test]
    fn totals_split_middle_saving_and_borrowing() {
        let mut young = Agent::new(AgentId::from("y"), None, None);
        young.apply_decision(Decision::Borrow(30.0), 0.0, 0.0).unwrap();
        let mut saver = Agent::new(AgentId::from("s"), None, None).with_stage(Stage::Middle);
        saver.apply_decision(Decision::Save(20.0), 0.0, 60.0).unwrap();
        let mut borrower = Agent::new(AgentId::from("b"), None, None).with_stage(Stage::Middle);
        borrower.apply_decision(Decision::Borrow(5.0), 0.0, 60.0).unwrap();
        let old = Agent::new(AgentId::from("o"), None, None).with_stage(Stage::Old);

        let agents = [young, saver, borrower, old];
        let totals = Aggregates::compute(&agents, 10.0);
        assert_eq!(totals.young_count, 1);
        assert_eq!(totals.middle_count, 2);
        assert_eq!(totals.old_count, 1);
        assert_eq!(totals.total_young_borrowing, 30.0);
        assert_eq!(totals.total_middle_saving, 20.0);
        assert_eq!(totals.total_middle_borrowing, 5.0);
        assert_eq!(totals.loan_demand, 40.0);
        assert_eq!(totals.loan_supply, 20.0);
        assert_eq!(totals.loan_balance, -20.0);

        let market = loan_market(&agents, 100.0, 10.0);
        assert_eq!(market.young_borrowing, vec![30.0]);
        assert_eq!(market.middle_saving, vec![20.0, -5.0]);
    }
}
