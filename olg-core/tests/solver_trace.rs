//! Checks the economy's trace events through the instrument capture.

#![cfg(feature = "instrument")]

use olg_core::{AgentId, Decision, Economy, EconomyConfig};
use polars::prelude::*;

fn id(s: &str) -> AgentId {
    AgentId::from(s)
}

#[test]
fn bisection_trace_narrows_onto_the_clearing_rate() {
    let mut eco = Economy::new(EconomyConfig::seeded(3));
    eco.add_agent(id("ana"), None, None).unwrap();
    eco.record_decision(&id("ana"), Decision::Borrow(0.0)).unwrap();
    eco.advance_round(false).unwrap();
    eco.add_agent(id("ben"), None, None).unwrap();
    eco.record_decision(&id("ana"), Decision::Save(40.0)).unwrap();
    eco.record_decision(&id("ben"), Decision::Borrow(100.0)).unwrap();

    let (report, capture) = olg_core::instrument::capture(|| {
        let job = eco.advance_round(false).unwrap().job.unwrap();
        let solution = job.solve();
        let report = solution.report;
        eco.apply_equilibrium(solution);
        report
    });

    // 100 / (1 + r) = 40  =>  r = 1.5
    assert!((report.interest_rate - 1.5).abs() < 1e-5);

    let clearing = capture.table("clearing").expect("solver emits steps");
    assert_eq!(clearing.rows as u32, report.iterations);
    let steps = clearing.u64s("step").unwrap();
    assert_eq!(steps.first(), Some(&1));

    // The bracket only ever shrinks.
    let lo = clearing.f64s("lo").unwrap();
    let hi = clearing.f64s("hi").unwrap();
    for i in 1..clearing.rows {
        assert!(lo[i] >= lo[i - 1]);
        assert!(hi[i] <= hi[i - 1]);
        assert!(hi[i] - lo[i] < hi[i - 1] - lo[i - 1]);
    }
    let last_rate = *clearing.f64s("rate").unwrap().last().unwrap();
    assert!((last_rate - 1.5).abs() < 1e-5);

    let rounds = capture.table("round").unwrap();
    assert_eq!(rounds.u64s("round").unwrap(), &[3]);
    assert_eq!(rounds.f64s("loan_supply").unwrap(), &[40.0]);
}

#[test]
fn every_decision_is_traced() {
    let mut eco = Economy::new(EconomyConfig::seeded(8));
    let ((), capture) = olg_core::instrument::capture(|| {
        eco.set_synthetic_count(6);
        eco.add_agent(id("ana"), None, None).unwrap();
        eco.record_decision(&id("ana"), Decision::Borrow(12.5)).unwrap();
    });

    let decisions = capture.table("decision").unwrap();
    assert_eq!(decisions.rows, 7);
    let synthetic = decisions.bools("synthetic").unwrap();
    assert_eq!(synthetic.iter().filter(|s| **s).count(), 6);

    let df = decisions.to_dataframe().unwrap();
    let kinds = df
        .lazy()
        .group_by([col("kind")])
        .agg([col("amount").count().alias("n")])
        .sort(["kind"], Default::default())
        .collect()
        .unwrap();
    let kind_col = kinds.column("kind").unwrap().str().unwrap();
    let names: Vec<&str> = kind_col.into_iter().flatten().collect();
    assert!(names.contains(&"consume"));
    assert!(names.contains(&"borrow"));

    assert_eq!(capture.rows("synthetic"), 1);
}
