//! The round controller.
//!
//! Owns every agent, the policy, the pending set and the round history.
//! Advancing a round is split in two:
//!
//! 1. [`Economy::advance_round`] closes the round, ages everyone and opens
//!    the next one. It is cheap and returns immediately.
//! 2. The [`EquilibriumJob`] it hands back clears the loan market for the
//!    round that just closed. The caller runs it wherever it likes and feeds
//!    the result to [`Economy::apply_equilibrium`].

use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::agent::{Agent, AgentSnapshot};
use crate::aggregates::{Aggregates, loan_market};
use crate::clearing::ClearingReport;
use crate::config::EconomyConfig;
use crate::demand::{CurvePoint, DemandCurve, aggregate_demand};
use crate::error::{AdvanceError, AgentError, DecisionError};
use crate::events::Notification;
use crate::policy::{Policy, PolicyUpdate, clamp_rate};
use crate::round::{EquilibriumJob, EquilibriumSolution, EquilibriumTrigger, Phase, RoundRecord};
use crate::synthetic::{self, realize_borrowing};
use crate::types::{AgentId, Decision, DecisionKind, Stage};

// === RESULTS ===

/// Outcome of a successful round advance (phase 1).
#[derive(Debug, Clone)]
pub struct RoundAdvance {
    pub round: u64,
    pub aggregates: Aggregates,
    pub notification: Notification,
    /// Background clearing for the round that just closed. `None` when the
    /// rate is pinned or there was nothing to clear.
    pub job: Option<EquilibriumJob>,
}

/// Outcome of a policy update.
#[derive(Debug, Clone)]
pub struct PolicyChange {
    pub notifications: Vec<Notification>,
    /// `None` when the update pinned the rate.
    pub job: Option<EquilibriumJob>,
}

// === SNAPSHOTS ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct EconomySnapshot {
    pub round: u64,
    pub policy: Policy,
    pub interest_rate: f64,
    pub rate_pinned: bool,
    pub synthetic_optimal: bool,
    pub agents: Vec<AgentSnapshot>,
    pub aggregates: Aggregates,
    pub aggregate_demand: Vec<CurvePoint>,
    pub pending: Vec<String>,
    pub history: Vec<RoundRecord>,
}

/// What a single participant's screen needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct AgentView {
    pub round: u64,
    pub agent: AgentSnapshot,
    pub policy: Policy,
    pub interest_rate: f64,
    /// Serviceable loan at the current rate; zero unless young.
    pub max_borrowing: f64,
    pub has_decided: bool,
    pub waiting_for_decisions: bool,
}

// === ECONOMY ===

#[derive(Debug)]
pub struct Economy {
    config: EconomyConfig,
    /// Bumped on every reset so results computed before it are ignored.
    epoch: u64,
    agents: BTreeMap<AgentId, Agent>,
    round: u64,
    history: Vec<RoundRecord>,
    policy: Policy,
    interest_rate: f64,
    rate_pinned: bool,
    pending: BTreeSet<AgentId>,
    synthetic_optimal: bool,
    next_synthetic_index: u64,
    /// Id of the most recently issued equilibrium job.
    generation: u64,
    rng: StdRng,
}

impl Default for Economy {
    fn default() -> Self {
        Self::new(EconomyConfig::default())
    }
}

impl Economy {
    pub fn new(config: EconomyConfig) -> Self {
        Self::with_epoch(config, 0)
    }

    fn with_epoch(config: EconomyConfig, epoch: u64) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            epoch,
            agents: BTreeMap::new(),
            round: 1,
            history: Vec::new(),
            policy: config.policy.clone(),
            interest_rate: clamp_rate(config.initial_interest_rate),
            rate_pinned: false,
            pending: BTreeSet::new(),
            synthetic_optimal: false,
            next_synthetic_index: 1,
            generation: 0,
            rng,
            config,
        }
    }

    /// Throw everything away and start over from the config it was built with.
    pub fn reset(&mut self) -> Notification {
        let epoch = self.epoch + 1;
        *self = Self::with_epoch(self.config.clone(), epoch);
        tracing::info!(epoch, "economy reset");
        Notification::FullReset { round: self.round }
    }

    // === Accessors ===

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn interest_rate(&self) -> f64 {
        self.interest_rate
    }

    pub fn is_rate_pinned(&self) -> bool {
        self.rate_pinned
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn pending(&self) -> impl Iterator<Item = &AgentId> {
        self.pending.iter()
    }

    pub fn is_pending(&self, id: &AgentId) -> bool {
        self.pending.contains(id)
    }

    pub fn synthetic_optimal(&self) -> bool {
        self.synthetic_optimal
    }

    pub fn synthetic_count(&self) -> usize {
        self.agents.values().filter(|a| a.synthetic).count()
    }

    fn pending_list(&self) -> Vec<String> {
        self.pending.iter().map(ToString::to_string).collect()
    }

    // === Membership ===

    pub fn add_agent(
        &mut self,
        id: AgentId,
        name: Option<String>,
        avatar: Option<String>,
    ) -> Result<Notification, AgentError> {
        if self.agents.contains_key(&id) {
            return Err(AgentError::AlreadyExists(id));
        }
        let agent = Agent::new(id.clone(), name, avatar);
        let snapshot = agent.snapshot();
        self.agents.insert(id.clone(), agent);
        self.pending.insert(id.clone());
        tracing::info!(agent = %id, round = self.round, "agent joined");

        Ok(Notification::AgentJoined {
            agent: snapshot,
            pending: self.pending_list(),
        })
    }

    pub fn remove_agent(&mut self, id: &AgentId) -> Result<Notification, AgentError> {
        if self.agents.remove(id).is_none() {
            return Err(AgentError::NotFound(id.clone()));
        }
        self.pending.remove(id);
        tracing::info!(agent = %id, round = self.round, "agent removed");

        Ok(Notification::AgentRemoved {
            agent_id: id.to_string(),
            pending: self.pending_list(),
        })
    }

    // === Decision intake ===

    /// Validate and commit one participant's decision for the current round.
    pub fn record_decision(
        &mut self,
        id: &AgentId,
        decision: Decision,
    ) -> Result<Notification, DecisionError> {
        self.commit_decision(id, decision)?;
        Ok(self.decision_notification(id, decision))
    }

    /// Accept a young participant's borrowing schedule and borrow what it
    /// says at the current rate.
    pub fn record_demand_curve(
        &mut self,
        id: &AgentId,
        points: Vec<CurvePoint>,
    ) -> Result<Notification, DecisionError> {
        let limit = self.policy.borrowing_limit;
        let agent = self
            .agents
            .get(id)
            .ok_or_else(|| DecisionError::UnknownAgent(id.clone()))?;
        if agent.stage != Stage::Young {
            return Err(DecisionError::WrongKind {
                stage: agent.stage,
                kind: DecisionKind::Borrow,
            });
        }

        let curve = DemandCurve::from_points(points, limit)?;
        let decision = Decision::Borrow(realize_borrowing(&curve, self.interest_rate, limit));
        self.commit_decision(id, decision)?;
        if let Some(agent) = self.agents.get_mut(id) {
            agent.set_demand_curve(curve)?;
        }
        Ok(self.decision_notification(id, decision))
    }

    fn decision_notification(&self, id: &AgentId, decision: Decision) -> Notification {
        Notification::DecisionSubmitted {
            agent_id: id.to_string(),
            decision,
            aggregates: self.aggregates(),
            pending: self.pending_list(),
        }
    }

    fn commit_decision(&mut self, id: &AgentId, decision: Decision) -> Result<(), DecisionError> {
        let limit = self.policy.borrowing_limit;
        let rate = self.interest_rate;
        let agent = self
            .agents
            .get_mut(id)
            .ok_or_else(|| DecisionError::UnknownAgent(id.clone()))?;
        let income = self.policy.net_income(agent.stage);

        // Cheap rejects before the agent's own budget check.
        decision.check_stage(agent.stage)?;
        if let Decision::Borrow(amount) = decision {
            if amount > limit {
                return Err(DecisionError::ExceedsBorrowingLimit { amount, limit });
            }
        }

        agent.apply_decision(decision, rate, income)?;
        self.pending.remove(id);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "decision",
            round = self.round,
            agent = id.as_str(),
            synthetic = agent.synthetic,
            kind = %decision.kind(),
            amount = decision.amount(),
            consumption = agent.consumption,
            assets = agent.assets,
        );

        Ok(())
    }

    // === Synthetic agents ===

    pub fn set_synthetic_optimal(&mut self, optimal: bool) {
        self.synthetic_optimal = optimal;
    }

    /// Grow or shrink the synthetic population to exactly `target`.
    /// Shrinking drops the highest ids first.
    pub fn set_synthetic_count(&mut self, target: usize) -> Notification {
        let existing: Vec<AgentId> = self
            .agents
            .values()
            .filter(|a| a.synthetic)
            .map(|a| a.id.clone())
            .collect();

        let mut added = Vec::new();
        let mut removed = Vec::new();

        if target < existing.len() {
            for id in &existing[target..] {
                self.agents.remove(id);
                self.pending.remove(id);
                removed.push(id.to_string());
            }
        } else {
            for slot in existing.len()..target {
                let id = self.fresh_synthetic_id();
                let stage = Stage::ALL[slot % Stage::ALL.len()];
                self.agents
                    .insert(id.clone(), Agent::synthetic(id.clone(), stage));
                self.pending.insert(id.clone());
                added.push(id.to_string());
            }
            self.complete_synthetic_decisions();
        }

        tracing::info!(
            target_count = target,
            added = added.len(),
            removed = removed.len(),
            "synthetic population resized"
        );

        Notification::AgentsBatchAdded {
            added,
            removed,
            synthetic_count: self.synthetic_count(),
        }
    }

    fn fresh_synthetic_id(&mut self) -> AgentId {
        loop {
            let id = AgentId::new(format!(
                "{}{:04}",
                self.config.synthetic_prefix, self.next_synthetic_index
            ));
            self.next_synthetic_index += 1;
            if !self.agents.contains_key(&id) {
                return id;
            }
        }
    }

    /// Decide for every synthetic agent still pending. Never fails: a
    /// rejected choice is retried with the stage's safe default, and an
    /// agent whose fallback also fails is released from the pending set.
    pub fn complete_synthetic_decisions(&mut self) -> usize {
        let waiting: Vec<AgentId> = self
            .pending
            .iter()
            .filter(|id| self.agents.get(*id).is_some_and(|a| a.synthetic))
            .cloned()
            .collect();

        let limit = self.policy.borrowing_limit;
        let rate = self.interest_rate;
        for id in &waiting {
            let Some(agent) = self.agents.get(id) else {
                continue;
            };
            let stage = agent.stage;
            let income = self.policy.net_income(stage);
            let choice = synthetic::choose(
                &mut self.rng,
                agent,
                rate,
                income,
                limit,
                self.synthetic_optimal,
            );

            match self.commit_decision(id, choice.decision) {
                Ok(()) => {
                    if let (Some(curve), Some(agent)) = (choice.curve, self.agents.get_mut(id)) {
                        agent.demand_curve = Some(curve);
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        agent = %id,
                        error = %err,
                        "synthetic decision rejected; retrying with safe default"
                    );
                    if let Err(err) = self.commit_decision(id, Decision::safe_default(stage)) {
                        tracing::warn!(
                            agent = %id,
                            error = %err,
                            "synthetic fallback rejected; releasing agent from pending"
                        );
                        self.pending.remove(id);
                    }
                }
            }
        }

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "synthetic",
            round = self.round,
            completed = waiting.len() as u64,
            optimal = self.synthetic_optimal,
        );

        waiting.len()
    }

    // === Policy ===

    /// Apply a partial policy change. A supplied interest rate is pinned
    /// verbatim (clamped to the admissible range) and no solve is queued;
    /// otherwise the pin is lifted and a solve over the current round's
    /// decisions is returned.
    pub fn set_policy(&mut self, update: PolicyUpdate) -> PolicyChange {
        self.policy.apply(&update);

        let mut notifications = Vec::new();
        if let Some(count) = update.synthetic_count {
            notifications.push(self.set_synthetic_count(count));
        }

        let job = match update.interest_rate {
            Some(rate) => {
                self.interest_rate = clamp_rate(rate);
                self.rate_pinned = true;
                // Anything still in flight must not overwrite the pin.
                self.generation += 1;
                None
            }
            None => {
                self.rate_pinned = false;
                Some(self.issue_job(EquilibriumTrigger::PolicyUpdate, self.round))
            }
        };

        tracing::info!(
            round = self.round,
            interest_rate = self.interest_rate,
            pinned = self.rate_pinned,
            "policy updated"
        );

        notifications.push(Notification::PolicyUpdated {
            phase: Phase::Initial,
            policy: self.policy.clone(),
            interest_rate: self.interest_rate,
            rate_pinned: self.rate_pinned,
            aggregates: self.aggregates(),
            clearing: None,
        });

        PolicyChange { notifications, job }
    }

    fn issue_job(&mut self, trigger: EquilibriumTrigger, round: u64) -> EquilibriumJob {
        let market = loan_market(
            self.agents.values(),
            self.policy.borrowing_limit,
            self.policy.government_debt,
        );
        if market.is_empty() {
            tracing::debug!(round, "loan market is empty; the solve will keep the current rate");
        }
        self.generation += 1;
        EquilibriumJob {
            epoch: self.epoch,
            generation: self.generation,
            round,
            trigger,
            market,
            prior_rate: self.interest_rate,
        }
    }

    // === Round lifecycle ===

    /// Close the current round and open the next (phase 1).
    ///
    /// Fails with [`AdvanceError::PendingHumans`] when a human has not
    /// decided, unless `force` is set, in which case they are given the
    /// safe default for their stage. A failed advance leaves the round,
    /// the history and every stage untouched.
    pub fn advance_round(&mut self, force: bool) -> Result<RoundAdvance, AdvanceError> {
        self.complete_synthetic_decisions();

        if !self.pending.is_empty() {
            if !force {
                return Err(AdvanceError::PendingHumans {
                    pending: self.pending.iter().cloned().collect(),
                });
            }
            let stragglers: Vec<AgentId> = self.pending.iter().cloned().collect();
            for id in stragglers {
                let Some(stage) = self.agents.get(&id).map(|a| a.stage) else {
                    self.pending.remove(&id);
                    continue;
                };
                tracing::warn!(agent = %id, %stage, "forcing safe default for pending participant");
                if let Err(err) = self.commit_decision(&id, Decision::safe_default(stage)) {
                    tracing::warn!(agent = %id, error = %err, "forced decision rejected");
                    self.pending.remove(&id);
                }
            }
        }

        let closing_round = self.round;
        let closing_aggregates = self.aggregates();
        let job = if self.rate_pinned {
            None
        } else {
            Some(self.issue_job(EquilibriumTrigger::RoundAdvance, closing_round))
        };
        self.history.push(RoundRecord {
            round: closing_round,
            interest_rate: self.interest_rate,
            rate_pinned: self.rate_pinned,
            policy: self.policy.clone(),
            agents: self.agents.values().map(Agent::snapshot).collect(),
            aggregates: closing_aggregates,
            clearing: None,
        });

        self.round += 1;
        for agent in self.agents.values_mut() {
            agent.advance();
        }
        self.pending = self.agents.keys().cloned().collect();
        self.complete_synthetic_decisions();

        let aggregates = self.aggregates();

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "round",
            round = self.round,
            closed = closing_round,
            interest_rate = self.interest_rate,
            young = aggregates.young_count as u64,
            middle = aggregates.middle_count as u64,
            old = aggregates.old_count as u64,
            loan_demand = closing_aggregates.loan_demand,
            loan_supply = closing_aggregates.loan_supply,
            pending = self.pending.len() as u64,
        );

        Ok(RoundAdvance {
            round: self.round,
            aggregates,
            notification: Notification::RoundAdvanced {
                phase: Phase::Initial,
                round: self.round,
                interest_rate: self.interest_rate,
                aggregates,
                pending: self.pending_list(),
                clearing: None,
            },
            job,
        })
    }

    /// Fold a finished background solve back in (phase 2).
    ///
    /// Results from before a reset are dropped. A result overtaken by a
    /// newer job still fills in the cleared rate on its own history record
    /// but leaves the live rate alone. Returns the completion notification
    /// when the live rate changed.
    pub fn apply_equilibrium(&mut self, solution: EquilibriumSolution) -> Option<Notification> {
        let EquilibriumSolution { job, report } = solution;
        if job.epoch != self.epoch {
            tracing::debug!(
                job_epoch = job.epoch,
                epoch = self.epoch,
                "dropping pre-reset equilibrium"
            );
            return None;
        }

        let rate = clamp_rate(report.interest_rate);
        let report = ClearingReport {
            interest_rate: rate,
            ..report
        };
        if job.trigger == EquilibriumTrigger::RoundAdvance {
            if let Some(record) = self.history.iter_mut().find(|r| r.round == job.round) {
                record.interest_rate = rate;
                record.clearing = Some(report);
            }
        }

        if job.generation != self.generation {
            tracing::debug!(
                job_generation = job.generation,
                latest = self.generation,
                "equilibrium overtaken by a newer request; live rate unchanged"
            );
            return None;
        }

        self.interest_rate = rate;
        tracing::info!(
            round = job.round,
            interest_rate = rate,
            iterations = report.iterations,
            converged = report.converged,
            "equilibrium applied"
        );

        let aggregates = self.aggregates();
        Some(match job.trigger {
            EquilibriumTrigger::RoundAdvance => Notification::RoundAdvanced {
                phase: Phase::Complete,
                round: self.round,
                interest_rate: rate,
                aggregates,
                pending: self.pending_list(),
                clearing: Some(report),
            },
            EquilibriumTrigger::PolicyUpdate => Notification::PolicyUpdated {
                phase: Phase::Complete,
                policy: self.policy.clone(),
                interest_rate: rate,
                rate_pinned: self.rate_pinned,
                aggregates,
                clearing: Some(report),
            },
        })
    }

    // === Reporting ===

    pub fn aggregates(&self) -> Aggregates {
        Aggregates::compute(self.agents.values(), self.policy.government_debt)
    }

    pub fn agent_snapshot(&self, id: &AgentId) -> Option<AgentSnapshot> {
        self.agents.get(id).map(Agent::snapshot)
    }

    pub fn agent_view(&self, id: &AgentId) -> Option<AgentView> {
        let agent = self.agents.get(id)?;
        let max_borrowing = if agent.stage == Stage::Young {
            self.policy.max_borrowing(self.interest_rate)
        } else {
            0.0
        };
        Some(AgentView {
            round: self.round,
            agent: agent.snapshot(),
            policy: self.policy.clone(),
            interest_rate: self.interest_rate,
            max_borrowing,
            has_decided: !self.pending.contains(id),
            waiting_for_decisions: !self.pending.is_empty(),
        })
    }

    pub fn snapshot(&self) -> EconomySnapshot {
        EconomySnapshot {
            round: self.round,
            policy: self.policy.clone(),
            interest_rate: self.interest_rate,
            rate_pinned: self.rate_pinned,
            synthetic_optimal: self.synthetic_optimal,
            agents: self.agents.values().map(Agent::snapshot).collect(),
            aggregates: self.aggregates(),
            aggregate_demand: aggregate_demand(
                self.agents
                    .values()
                    .filter(|a| a.stage == Stage::Young)
                    .filter_map(|a| a.demand_curve.as_ref()),
            ),
            pending: self.pending_list(),
            history: self.history.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn economy() -> Economy {
        Economy::new(EconomyConfig::seeded(1))
    }

    fn point(interest_rate: f64, borrowing_amount: f64) -> CurvePoint {
        CurvePoint {
            interest_rate,
            borrowing_amount,
        }
    }

    fn id(s: &str) -> AgentId {
        AgentId::from(s)
    }

    #[test]
    fn duplicate_agents_are_rejected() {
        let mut eco = economy();
        assert!(eco.add_agent(id("alice"), None, None).is_ok());
        assert_eq!(
            eco.add_agent(id("alice"), None, None).unwrap_err(),
            AgentError::AlreadyExists(id("alice"))
        );
        assert!(eco.is_pending(&id("alice")));
    }

    #[test]
    fn removing_an_agent_clears_it_from_pending() {
        let mut eco = economy();
        eco.add_agent(id("bob"), None, None).unwrap();
        eco.remove_agent(&id("bob")).unwrap();
        assert_eq!(eco.pending().count(), 0);
        assert!(eco.remove_agent(&id("bob")).is_err());
    }

    #[test]
    fn young_borrowing_above_limit_is_rejected() {
        let mut eco = economy();
        eco.add_agent(id("a"), None, None).unwrap();
        let err = eco
            .record_decision(&id("a"), Decision::Borrow(100.5))
            .unwrap_err();
        assert!(matches!(err, DecisionError::ExceedsBorrowingLimit { .. }));
        assert!(eco.is_pending(&id("a")));
    }

    #[test]
    fn unknown_agent_is_rejected() {
        let mut eco = economy();
        let err = eco.record_decision(&id("ghost"), Decision::Consume).unwrap_err();
        assert_eq!(err, DecisionError::UnknownAgent(id("ghost")));
    }

    #[test]
    fn accepted_decision_leaves_pending() {
        let mut eco = economy();
        eco.add_agent(id("a"), None, None).unwrap();
        let note = eco.record_decision(&id("a"), Decision::Borrow(50.0)).unwrap();
        assert!(!eco.is_pending(&id("a")));
        match note {
            Notification::DecisionSubmitted { aggregates, pending, .. } => {
                assert_eq!(aggregates.total_young_borrowing, 50.0);
                assert!(pending.is_empty());
            }
            other => panic!("unexpected notification {other:?}"),
        }
    }

    #[test]
    fn pinned_rate_skips_the_solver() {
        let mut eco = economy();
        eco.add_agent(id("a"), None, None).unwrap();
        eco.record_decision(&id("a"), Decision::Borrow(50.0)).unwrap();
        let change = eco.set_policy(PolicyUpdate {
            interest_rate: Some(0.07),
            ..Default::default()
        });
        assert!(change.job.is_none());
        assert_eq!(eco.interest_rate(), 0.07);
        assert!(eco.is_rate_pinned());

        let advance = eco.advance_round(false).unwrap();
        assert!(advance.job.is_none());
        assert_eq!(eco.interest_rate(), 0.07);
    }

    #[test]
    fn stale_policy_solve_does_not_override_newer_pin() {
        let mut eco = economy();
        eco.add_agent(id("a"), None, None).unwrap();
        eco.record_decision(&id("a"), Decision::Borrow(50.0)).unwrap();
        let job = eco.set_policy(PolicyUpdate::default()).job.unwrap();
        eco.set_policy(PolicyUpdate {
            interest_rate: Some(0.01),
            ..Default::default()
        });
        assert!(eco.apply_equilibrium(job.solve()).is_none());
        assert_eq!(eco.interest_rate(), 0.01);
    }

    #[test]
    fn results_from_before_a_reset_are_dropped() {
        let mut eco = economy();
        eco.add_agent(id("a"), None, None).unwrap();
        eco.record_decision(&id("a"), Decision::Borrow(50.0)).unwrap();
        let job = eco.set_policy(PolicyUpdate::default()).job.unwrap();
        eco.reset();
        assert!(eco.apply_equilibrium(job.solve()).is_none());
        assert_eq!(eco.interest_rate(), 0.03);
        assert_eq!(eco.agents().count(), 0);
    }

    #[test]
    fn synthetic_count_shrinks_from_the_top() {
        let mut eco = economy();
        eco.set_synthetic_count(5);
        assert_eq!(eco.synthetic_count(), 5);
        eco.set_synthetic_count(2);
        let ids: Vec<String> = eco.agents().map(|a| a.id.to_string()).collect();
        assert_eq!(ids, vec!["synthetic-0001", "synthetic-0002"]);
    }

    #[test]
    fn new_synthetic_agents_decide_immediately() {
        let mut eco = economy();
        eco.set_synthetic_count(6);
        assert_eq!(eco.pending().count(), 0);
        let stages: Vec<Stage> = eco.agents().map(|a| a.stage).collect();
        assert_eq!(stages.iter().filter(|s| **s == Stage::Young).count(), 2);
        assert_eq!(stages.iter().filter(|s| **s == Stage::Old).count(), 2);
    }

    #[test]
    fn demand_curve_is_realized_at_current_rate() {
        let mut eco = economy();
        eco.add_agent(id("a"), None, None).unwrap();
        let points = vec![
            point(0.0, 90.0),
            point(6.0, 30.0),
        ];
        eco.record_demand_curve(&id("a"), points).unwrap();
        // 3% sits halfway between the samples.
        let agent = eco.agent(&id("a")).unwrap();
        assert!((agent.borrowing - 60.0).abs() < 1e-9);
        assert!(agent.demand_curve.is_some());
        assert_eq!(eco.snapshot().aggregate_demand[3].borrowing_amount, 60.0);
    }
}
