//! HTTP and WebSocket front end for the classroom economy.
//!
//! Requests mutate one shared [`olg_core::Economy`]; every change is pushed to
//! `/api/stream` subscribers. Equilibrium solves run on a background worker
//! so round advances and policy changes answer immediately.

use axum::Router;
use axum::routing::{delete, get, post};
use tokio::net::TcpListener;

mod config;
mod error;
mod routes;
mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::{HttpApiError, ServerError};
pub use routes::PROFESSOR_HEADER;
pub use state::AppState;

pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.addr()?;
    let state = AppState::new(config.economy);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "serving classroom economy");
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/join", post(routes::player::join))
        .route("/api/agents/{user_id}", delete(routes::player::leave))
        .route("/api/submit_decision", post(routes::player::submit_decision))
        .route(
            "/api/submit_demand_curve",
            post(routes::player::submit_demand_curve),
        )
        .route("/api/current_state", get(routes::player::current_state))
        .route("/api/set_policy", post(routes::professor::set_policy))
        .route("/api/advance_round", post(routes::professor::advance_round))
        .route("/api/test_players", post(routes::professor::test_players))
        .route("/api/reset", post(routes::professor::reset))
        .route("/api/stream", get(routes::stream::stream))
        .with_state(state)
}
