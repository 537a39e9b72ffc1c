use serde::{Deserialize, Serialize};

use crate::policy::Policy;

/// Starting conditions for a fresh economy. A reset rebuilds from the same
/// config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub initial_interest_rate: f64,
    pub policy: Policy,
    /// Id prefix for economy-created synthetic agents. Purely cosmetic:
    /// synthetic agents are flagged explicitly.
    pub synthetic_prefix: String,
    /// Fixed seed for synthetic decisions. `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            initial_interest_rate: 0.03,
            policy: Policy::default(),
            synthetic_prefix: "synthetic-".to_string(),
            seed: None,
        }
    }
}

impl EconomyConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: EconomyConfig =
            serde_json::from_str(r#"{"seed": 9, "policy": {"borrowing_limit": 50.0}}"#).unwrap();
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.policy.borrowing_limit, 50.0);
        assert_eq!(config.policy.income.middle, 60.0);
        assert_eq!(config.initial_interest_rate, 0.03);
    }
}
