use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::demand::DemandCurve;
use crate::error::DecisionError;
use crate::types::{AgentId, Decision, DecisionKind, Stage};

/// Consumption floor inside the log so a zero-consumption round scores
/// ln(0.1) instead of negative infinity.
pub const UTILITY_FLOOR: f64 = 0.1;

pub fn utility(consumption: f64) -> f64 {
    consumption.max(UTILITY_FLOOR).ln()
}

// === DECISION LOG ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct DecisionRecord {
    pub stage: Stage,
    pub kind: DecisionKind,
    pub amount: f64,
    pub consumption: f64,
    pub utility: f64,
}

/// What a successful decision did to the agent's round outputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct DecisionOutcome {
    pub consumption: f64,
    pub borrowing: f64,
    /// Signed: negative means a middle-aged agent borrowed.
    pub saving: f64,
    pub assets: f64,
    pub utility: f64,
}

// === AGENT ===

/// One participant occupying one life stage.
///
/// `assets` is signed: negative is debt carried forward, positive is
/// savings carried forward. Decisions are always evaluated against the
/// assets carried *into* the round, so a participant can resubmit within a
/// round and get the same result for the same input.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub avatar: String,
    pub synthetic: bool,
    pub stage: Stage,
    pub assets: f64,
    opening_assets: f64,

    pub consumption: f64,
    pub borrowing: f64,
    pub saving: f64,
    pub utility: f64,

    pub previous_consumption: f64,
    pub previous_decision: f64,
    pub previous_utility: f64,

    pub demand_curve: Option<DemandCurve>,
    pub decisions: Vec<DecisionRecord>,
}

impl Agent {
    pub fn new(id: AgentId, name: Option<String>, avatar: Option<String>) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Player {id}"));
        Self {
            id,
            name,
            avatar: avatar.unwrap_or_else(|| "default_avatar".to_string()),
            synthetic: false,
            stage: Stage::Young,
            assets: 0.0,
            opening_assets: 0.0,
            consumption: 0.0,
            borrowing: 0.0,
            saving: 0.0,
            utility: 0.0,
            previous_consumption: 0.0,
            previous_decision: 0.0,
            previous_utility: 0.0,
            demand_curve: None,
            decisions: Vec::new(),
        }
    }

    pub fn synthetic(id: AgentId, stage: Stage) -> Self {
        let name = format!("Test {id}");
        let mut agent = Self::new(id, Some(name), Some("robot".to_string()));
        agent.synthetic = true;
        agent.stage = stage;
        agent
    }

    pub fn with_assets(mut self, assets: f64) -> Self {
        self.assets = assets;
        self.opening_assets = assets;
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    /// Assets carried into the current round.
    pub fn opening_assets(&self) -> f64 {
        self.opening_assets
    }

    /// Income left after repaying debt carried in from youth.
    /// Only meaningful for middle-aged agents.
    pub fn disposable_income(&self, rate: f64, income: f64) -> f64 {
        let repayment = if self.opening_assets < 0.0 {
            (1.0 + rate) * self.opening_assets.abs()
        } else {
            0.0
        };
        income - repayment
    }

    /// Validate a decision against this agent's stage and budget and, if it
    /// holds, commit it. On error nothing about the agent changes.
    pub fn apply_decision(
        &mut self,
        decision: Decision,
        rate: f64,
        income: f64,
    ) -> Result<DecisionOutcome, DecisionError> {
        decision.check_stage(self.stage)?;

        let (consumption, borrowing, saving, assets) = match (self.stage, decision) {
            (Stage::Young, Decision::Borrow(amount)) => (amount + income, amount, 0.0, -amount),
            (Stage::Middle, decision) => {
                let disposable = self.disposable_income(rate, income);
                if disposable <= 0.0 {
                    // Debt swallows the whole income: nothing to save, nothing
                    // to borrow against.
                    (income, 0.0, 0.0, 0.0)
                } else {
                    match decision {
                        Decision::Save(amount) => {
                            if amount > disposable {
                                return Err(DecisionError::ExceedsDisposableIncome {
                                    amount,
                                    disposable,
                                });
                            }
                            (disposable - amount, 0.0, amount, amount)
                        }
                        borrow => {
                            let amount = borrow.amount();
                            (disposable + amount, 0.0, -amount, -amount)
                        }
                    }
                }
            }
            (Stage::Old, Decision::Consume) => {
                let payout = if self.opening_assets > 0.0 {
                    (1.0 + rate) * self.opening_assets
                } else {
                    0.0
                };
                (income + payout, 0.0, 0.0, 0.0)
            }
            (stage, decision) => {
                return Err(DecisionError::WrongKind {
                    stage,
                    kind: decision.kind(),
                });
            }
        };

        if consumption.is_nan() || consumption < 0.0 {
            return Err(DecisionError::NegativeConsumption { consumption });
        }

        let outcome = DecisionOutcome {
            consumption,
            borrowing,
            saving,
            assets,
            utility: utility(consumption),
        };

        self.consumption = outcome.consumption;
        self.borrowing = outcome.borrowing;
        self.saving = outcome.saving;
        self.assets = outcome.assets;
        self.utility = outcome.utility;
        self.decisions.push(DecisionRecord {
            stage: self.stage,
            kind: decision.kind(),
            amount: decision.amount(),
            consumption: outcome.consumption,
            utility: outcome.utility,
        });

        Ok(outcome)
    }

    /// Move to the next life stage. This round's outputs become the
    /// "previous" display values; Old agents are reborn Young with nothing.
    pub fn advance(&mut self) {
        self.previous_consumption = self.consumption;
        self.previous_decision = match self.stage {
            Stage::Young => self.borrowing,
            Stage::Middle => self.saving,
            Stage::Old => 0.0,
        };
        self.previous_utility = self.utility;

        self.consumption = 0.0;
        self.borrowing = 0.0;
        self.saving = 0.0;
        self.utility = 0.0;
        self.demand_curve = None;

        if self.stage == Stage::Old {
            self.assets = 0.0;
        }
        self.stage = self.stage.next();
        self.opening_assets = self.assets;
    }

    /// Attach a borrowing schedule. Only young agents borrow against one.
    pub fn set_demand_curve(&mut self, curve: DemandCurve) -> Result<(), DecisionError> {
        if self.stage != Stage::Young {
            return Err(DecisionError::WrongKind {
                stage: self.stage,
                kind: DecisionKind::Borrow,
            });
        }
        self.demand_curve = Some(curve);
        Ok(())
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id.to_string(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            synthetic: self.synthetic,
            stage: self.stage,
            assets: self.assets,
            consumption: self.consumption,
            borrowing: if self.stage == Stage::Young {
                self.borrowing
            } else {
                0.0
            },
            saving: if self.stage == Stage::Middle {
                self.saving
            } else {
                0.0
            },
            utility: self.utility,
            previous_consumption: self.previous_consumption,
            previous_decision: self.previous_decision,
            previous_utility: self.previous_utility,
            demand_curve: self.demand_curve.clone(),
            decisions: self.decisions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct AgentSnapshot {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub synthetic: bool,
    pub stage: Stage,
    pub assets: f64,
    pub consumption: f64,
    pub borrowing: f64,
    pub saving: f64,
    pub utility: f64,
    pub previous_consumption: f64,
    pub previous_decision: f64,
    pub previous_utility: f64,
    pub demand_curve: Option<DemandCurve>,
    pub decisions: Vec<DecisionRecord>,
}
