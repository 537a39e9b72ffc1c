use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::DecisionError;

// ============================================================================
// IDs
// ============================================================================

/// Opaque participant id, chosen by the client (humans) or the economy
/// (synthetic agents).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AgentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// Life Stage - Young -> Middle -> Old -> Young
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Young,
    Middle,
    Old,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Young, Stage::Middle, Stage::Old];

    /// Next stage in the fixed cycle. Old wraps to Young (rebirth).
    pub fn next(self) -> Stage {
        match self {
            Stage::Young => Stage::Middle,
            Stage::Middle => Stage::Old,
            Stage::Old => Stage::Young,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Young => "young",
            Stage::Middle => "middle",
            Stage::Old => "old",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Decisions - one tagged variant per thing a stage can do
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    Borrow,
    Save,
    Consume,
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecisionKind::Borrow => "borrow",
            DecisionKind::Save => "save",
            DecisionKind::Consume => "consume",
        };
        f.write_str(name)
    }
}

impl FromStr for DecisionKind {
    type Err = DecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "borrow" => Ok(DecisionKind::Borrow),
            "save" => Ok(DecisionKind::Save),
            "consume" => Ok(DecisionKind::Consume),
            other => Err(DecisionError::UnknownKind(other.to_string())),
        }
    }
}

/// A participant's choice for one round.
///
/// Which variants are legal depends on the stage:
/// - Young: `Borrow`
/// - Middle: `Save` or `Borrow`
/// - Old: `Consume`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "lowercase")]
pub enum Decision {
    Borrow(f64),
    Save(f64),
    Consume,
}

impl Decision {
    /// Build a decision from the loose `(kind, amount)` pair clients send.
    /// The amount is ignored for `consume`.
    pub fn from_parts(kind: DecisionKind, amount: f64) -> Self {
        match kind {
            DecisionKind::Borrow => Decision::Borrow(amount),
            DecisionKind::Save => Decision::Save(amount),
            DecisionKind::Consume => Decision::Consume,
        }
    }

    pub fn kind(&self) -> DecisionKind {
        match self {
            Decision::Borrow(_) => DecisionKind::Borrow,
            Decision::Save(_) => DecisionKind::Save,
            Decision::Consume => DecisionKind::Consume,
        }
    }

    pub fn amount(&self) -> f64 {
        match self {
            Decision::Borrow(amount) | Decision::Save(amount) => *amount,
            Decision::Consume => 0.0,
        }
    }

    /// The minimal decision that is valid for any stage and any policy:
    /// borrow nothing, save nothing, consume what you have.
    pub fn safe_default(stage: Stage) -> Self {
        match stage {
            Stage::Young => Decision::Borrow(0.0),
            Stage::Middle => Decision::Save(0.0),
            Stage::Old => Decision::Consume,
        }
    }

    /// Check that this decision is one the stage may make at all.
    pub fn check_stage(&self, stage: Stage) -> Result<(), DecisionError> {
        let allowed = matches!(
            (stage, self),
            (Stage::Young, Decision::Borrow(_))
                | (Stage::Middle, Decision::Save(_) | Decision::Borrow(_))
                | (Stage::Old, Decision::Consume)
        );
        if !allowed {
            return Err(DecisionError::WrongKind {
                stage,
                kind: self.kind(),
            });
        }
        let amount = self.amount();
        if !amount.is_finite() || amount < 0.0 {
            return Err(DecisionError::InvalidAmount(amount));
        }
        Ok(())
    }
}

/// Round to `places` decimal places.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
