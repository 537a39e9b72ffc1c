use wasm_bindgen::prelude::*;

mod agent;
mod aggregates;
mod clearing;
mod config;
mod demand;
mod economy;
mod error;
mod events;
mod policy;
mod round;
pub mod synthetic;
mod types;

pub use agent::*;
pub use aggregates::*;
pub use clearing::*;
pub use config::*;
pub use demand::*;
pub use economy::*;
pub use error::*;
pub use events::*;
pub use policy::*;
pub use round::*;
pub use types::*;

#[cfg(feature = "instrument")]
pub use instrument;

// ============================================================================
// WASM API - Classroom
// ============================================================================

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// A whole classroom economy running in the browser.
///
/// Equilibrium is cleared inline: there is no background thread in wasm, so
/// each call that needs a solve returns the completed notifications.
#[wasm_bindgen]
pub struct Classroom {
    economy: Economy,
}

impl Default for Classroom {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Classroom {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();

        Self {
            economy: Economy::default(),
        }
    }

    /// Deterministic classroom for demos and replays.
    #[wasm_bindgen]
    pub fn with_seed(seed: u64) -> Self {
        console_error_panic_hook::set_once();
        Self {
            economy: Economy::new(EconomyConfig::seeded(seed)),
        }
    }

    #[wasm_bindgen]
    pub fn get_round(&self) -> u64 {
        self.economy.round()
    }

    #[wasm_bindgen]
    pub fn get_interest_rate(&self) -> f64 {
        self.economy.interest_rate()
    }

    #[wasm_bindgen]
    pub fn add_agent(
        &mut self,
        id: String,
        name: Option<String>,
        avatar: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let note = self
            .economy
            .add_agent(AgentId::new(id), name, avatar)
            .map_err(js_err)?;
        to_js(&note)
    }

    #[wasm_bindgen]
    pub fn remove_agent(&mut self, id: String) -> Result<JsValue, JsValue> {
        let note = self
            .economy
            .remove_agent(&AgentId::new(id))
            .map_err(js_err)?;
        to_js(&note)
    }

    /// `kind` is one of "borrow", "save" or "consume".
    #[wasm_bindgen]
    pub fn record_decision(
        &mut self,
        id: String,
        kind: &str,
        amount: f64,
    ) -> Result<JsValue, JsValue> {
        let kind: DecisionKind = kind.parse().map_err(js_err)?;
        let note = self
            .economy
            .record_decision(&AgentId::new(id), Decision::from_parts(kind, amount))
            .map_err(js_err)?;
        to_js(&note)
    }

    /// `points` is an array of `{ interestRate, borrowingAmount }`.
    #[wasm_bindgen]
    pub fn submit_demand_curve(&mut self, id: String, points: JsValue) -> Result<JsValue, JsValue> {
        let points: Vec<CurvePoint> = serde_wasm_bindgen::from_value(points).map_err(js_err)?;
        let note = self
            .economy
            .record_demand_curve(&AgentId::new(id), points)
            .map_err(js_err)?;
        to_js(&note)
    }

    /// Returns every notification the change produced, solve included.
    #[wasm_bindgen]
    pub fn set_policy(&mut self, update: JsValue) -> Result<JsValue, JsValue> {
        let update: PolicyUpdate = serde_wasm_bindgen::from_value(update).map_err(js_err)?;
        let PolicyChange {
            mut notifications,
            job,
        } = self.economy.set_policy(update);
        if let Some(job) = job {
            notifications.extend(self.economy.apply_equilibrium(job.solve()));
        }
        to_js(&notifications)
    }

    /// Close the round, age everyone and clear the loan market.
    #[wasm_bindgen]
    pub fn advance_round(&mut self, force: bool) -> Result<JsValue, JsValue> {
        let advance = self.economy.advance_round(force).map_err(js_err)?;
        let mut notifications = vec![advance.notification];
        if let Some(job) = advance.job {
            notifications.extend(self.economy.apply_equilibrium(job.solve()));
        }
        to_js(&notifications)
    }

    #[wasm_bindgen]
    pub fn set_synthetic_count(&mut self, count: usize) -> Result<JsValue, JsValue> {
        to_js(&self.economy.set_synthetic_count(count))
    }

    #[wasm_bindgen]
    pub fn set_synthetic_optimal(&mut self, optimal: bool) {
        self.economy.set_synthetic_optimal(optimal);
    }

    #[wasm_bindgen]
    pub fn get_snapshot(&self) -> EconomySnapshot {
        self.economy.snapshot()
    }

    /// `null` for an unknown id.
    #[wasm_bindgen]
    pub fn get_agent_view(&self, id: String) -> Result<JsValue, JsValue> {
        to_js(&self.economy.agent_view(&AgentId::new(id)))
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.economy.reset())
    }
}
