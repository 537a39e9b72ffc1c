use thiserror::Error;

use crate::types::{AgentId, DecisionKind, Stage};

/// Why a decision was rejected. Rejection never mutates the agent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecisionError {
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),
    #[error("unknown decision type: {0:?}")]
    UnknownKind(String),
    #[error("{stage} agents cannot {kind}")]
    WrongKind { stage: Stage, kind: DecisionKind },
    #[error("amount must be a non-negative number, got {0}")]
    InvalidAmount(f64),
    #[error("amount {amount} exceeds the borrowing limit of {limit}")]
    ExceedsBorrowingLimit { amount: f64, limit: f64 },
    #[error("cannot save {amount} out of a disposable income of {disposable}")]
    ExceedsDisposableIncome { amount: f64, disposable: f64 },
    #[error("decision would leave consumption negative ({consumption})")]
    NegativeConsumption { consumption: f64 },
    #[error("invalid demand curve: {0}")]
    InvalidDemandCurve(String),
}

/// Membership changes that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    #[error("agent {0} already exists")]
    AlreadyExists(AgentId),
    #[error("agent {0} not found")]
    NotFound(AgentId),
}

/// A round could not close. This is the expected "not ready" outcome,
/// not a fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvanceError {
    #[error("waiting for {} participant(s) to decide", pending.len())]
    PendingHumans { pending: Vec<AgentId> },
}
