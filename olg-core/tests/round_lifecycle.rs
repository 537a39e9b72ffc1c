use std::collections::BTreeSet;

use olg_core::{
    AdvanceError, AgentId, Decision, DecisionKind, Economy, EconomyConfig, Notification, Phase,
    PolicyUpdate, Stage,
};

fn economy() -> Economy {
    Economy::new(EconomyConfig::seeded(42))
}

fn id(s: &str) -> AgentId {
    AgentId::from(s)
}

fn humans(eco: &Economy) -> BTreeSet<AgentId> {
    eco.agents()
        .filter(|a| !a.synthetic)
        .map(|a| a.id.clone())
        .collect()
}

fn pending(eco: &Economy) -> BTreeSet<AgentId> {
    eco.pending().cloned().collect()
}

#[test]
fn advance_shifts_every_stage_and_reopens_decisions() {
    let mut eco = economy();
    eco.add_agent(id("ana"), Some("Ana".into()), None).unwrap();
    eco.record_decision(&id("ana"), Decision::Borrow(20.0)).unwrap();
    eco.set_synthetic_count(3);

    let before: Vec<(AgentId, Stage)> = eco.agents().map(|a| (a.id.clone(), a.stage)).collect();
    let advance = eco.advance_round(false).unwrap();
    assert_eq!(advance.round, 2);
    assert_eq!(eco.round(), 2);

    for (agent_id, stage) in before {
        assert_eq!(eco.agent(&agent_id).unwrap().stage, stage.next(), "{agent_id}");
    }

    // Synthetic agents have already decided for the new round.
    assert_eq!(pending(&eco), humans(&eco));
    match advance.notification {
        Notification::RoundAdvanced { phase, round, pending, .. } => {
            assert_eq!(phase, Phase::Initial);
            assert_eq!(round, 2);
            assert_eq!(pending, vec!["ana".to_string()]);
        }
        other => panic!("unexpected notification {other:?}"),
    }
}

#[test]
fn blocked_advance_changes_nothing() {
    let mut eco = economy();
    eco.add_agent(id("ana"), None, None).unwrap();
    eco.add_agent(id("ben"), None, None).unwrap();
    eco.record_decision(&id("ana"), Decision::Borrow(10.0)).unwrap();

    let err = eco.advance_round(false).unwrap_err();
    assert_eq!(
        err,
        AdvanceError::PendingHumans {
            pending: vec![id("ben")]
        }
    );
    assert_eq!(eco.round(), 1);
    assert!(eco.history().is_empty());
    assert!(eco.agents().all(|a| a.stage == Stage::Young));
    assert_eq!(eco.agent(&id("ana")).unwrap().borrowing, 10.0);
}

#[test]
fn forced_advance_gives_stragglers_the_safe_default() {
    let mut eco = economy();
    eco.add_agent(id("ana"), None, None).unwrap();

    eco.advance_round(true).unwrap();
    let record = &eco.history()[0];
    assert_eq!(record.round, 1);
    assert_eq!(record.agents[0].borrowing, 0.0);
    assert_eq!(record.agents[0].decisions.len(), 1);

    let ana = eco.agent(&id("ana")).unwrap();
    assert_eq!(ana.stage, Stage::Middle);
    assert_eq!(ana.assets, 0.0);
}

#[test]
fn forced_advance_covers_every_stage() {
    let mut eco = economy();
    eco.set_policy(PolicyUpdate {
        interest_rate: Some(0.05),
        ..Default::default()
    });
    eco.add_agent(id("ana"), None, None).unwrap();
    eco.record_decision(&id("ana"), Decision::Borrow(20.0)).unwrap();
    eco.advance_round(false).unwrap();

    // Middle-aged and silent: saves nothing and spends what the debt leaves.
    assert!(eco.advance_round(false).is_err());
    eco.advance_round(true).unwrap();
    let middle = &eco.history()[1].agents[0];
    assert_eq!(middle.stage, Stage::Middle);
    assert_eq!(middle.decisions.last().unwrap().kind, DecisionKind::Save);
    assert!((middle.consumption - 39.0).abs() < 1e-9);
    assert_eq!(middle.assets, 0.0);

    // Old and silent: consumes, with nothing saved to collect.
    eco.advance_round(true).unwrap();
    let old = &eco.history()[2].agents[0];
    assert_eq!(old.stage, Stage::Old);
    assert_eq!(old.decisions.last().unwrap().kind, DecisionKind::Consume);
    assert_eq!(old.consumption, 0.0);

    assert_eq!(eco.agent(&id("ana")).unwrap().stage, Stage::Young);
    assert!(eco.is_pending(&id("ana")));
}

#[test]
fn history_keeps_the_closed_round_as_it_stood() {
    let mut eco = economy();
    eco.add_agent(id("ana"), None, None).unwrap();
    eco.record_decision(&id("ana"), Decision::Borrow(35.0)).unwrap();
    eco.advance_round(false).unwrap();

    let record = &eco.history()[0];
    assert_eq!(record.agents[0].stage, Stage::Young);
    assert_eq!(record.agents[0].borrowing, 35.0);
    assert_eq!(record.aggregates.total_young_borrowing, 35.0);
    assert_eq!(record.interest_rate, 0.03);

    // Outputs roll into the "previous" fields and reset.
    let ana = eco.agent(&id("ana")).unwrap();
    assert_eq!(ana.previous_decision, 35.0);
    assert_eq!(ana.previous_consumption, 35.0);
    assert_eq!(ana.consumption, 0.0);
    assert_eq!(ana.opening_assets(), -35.0);
}

fn play_synthetic_rounds(optimal: bool) -> Economy {
    let mut eco = economy();
    eco.set_synthetic_optimal(optimal);
    eco.set_synthetic_count(9);
    for round in 2..=8 {
        let advance = eco.advance_round(false).unwrap();
        assert_eq!(advance.round, round);
        assert_eq!(eco.pending().count(), 0);
        assert!(eco.agents().all(|a| a.consumption >= 0.0));
        // Apply whatever clearing came back so later rounds see a moving rate.
        if let Some(job) = advance.job {
            eco.apply_equilibrium(job.solve());
        }
        assert!(eco.interest_rate() > -1.0 && eco.interest_rate() <= 2.0);
    }
    assert_eq!(eco.history().len(), 7);
    eco
}

#[test]
fn synthetic_agents_never_hold_up_a_round() {
    play_synthetic_rounds(false);
}

#[test]
fn optimal_synthetic_agents_never_hold_up_a_round() {
    let eco = play_synthetic_rounds(true);
    assert!(eco.synthetic_optimal());
    // Every closed round was cleared.
    assert!(eco.history().iter().all(|r| r.clearing.is_some()));
}

#[test]
fn humans_joining_mid_game_start_young() {
    let mut eco = economy();
    eco.set_synthetic_count(3);
    eco.advance_round(false).unwrap();
    eco.add_agent(id("late"), None, None).unwrap();
    assert_eq!(eco.agent(&id("late")).unwrap().stage, Stage::Young);
    assert!(eco.is_pending(&id("late")));
}

#[test]
fn reset_restores_a_fresh_economy() {
    let mut eco = economy();
    eco.add_agent(id("ana"), None, None).unwrap();
    eco.set_synthetic_count(3);
    eco.advance_round(true).unwrap();

    let note = eco.reset();
    assert_eq!(note, Notification::FullReset { round: 1 });
    assert_eq!(eco.round(), 1);
    assert_eq!(eco.agents().count(), 0);
    assert!(eco.history().is_empty());
    assert_eq!(eco.interest_rate(), 0.03);
}
