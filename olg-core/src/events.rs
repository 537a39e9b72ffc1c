use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::agent::AgentSnapshot;
use crate::aggregates::Aggregates;
use crate::clearing::ClearingReport;
use crate::policy::Policy;
use crate::round::Phase;
use crate::types::Decision;

/// Payloads pushed to every connected client when the economy changes.
/// The transport decides how they travel; the economy only builds them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    AgentJoined {
        agent: AgentSnapshot,
        pending: Vec<String>,
    },
    AgentRemoved {
        agent_id: String,
        pending: Vec<String>,
    },
    DecisionSubmitted {
        agent_id: String,
        decision: Decision,
        aggregates: Aggregates,
        pending: Vec<String>,
    },
    PolicyUpdated {
        phase: Phase,
        policy: Policy,
        interest_rate: f64,
        rate_pinned: bool,
        aggregates: Aggregates,
        clearing: Option<ClearingReport>,
    },
    RoundAdvanced {
        phase: Phase,
        round: u64,
        interest_rate: f64,
        aggregates: Aggregates,
        pending: Vec<String>,
        clearing: Option<ClearingReport>,
    },
    AgentsBatchAdded {
        added: Vec<String>,
        removed: Vec<String>,
        synthetic_count: usize,
    },
    FullReset {
        round: u64,
    },
}

impl Notification {
    /// Event name as clients see it.
    pub fn name(&self) -> &'static str {
        match self {
            Notification::AgentJoined { .. } => "agent_joined",
            Notification::AgentRemoved { .. } => "agent_removed",
            Notification::DecisionSubmitted { .. } => "decision_submitted",
            Notification::PolicyUpdated { .. } => "policy_updated",
            Notification::RoundAdvanced { .. } => "round_advanced",
            Notification::AgentsBatchAdded { .. } => "agents_batch_added",
            Notification::FullReset { .. } => "full_reset",
        }
    }
}
