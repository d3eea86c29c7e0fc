//! HTTP/WebSocket surface of the relay.

mod http;
mod ws;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::relay::RelayServer;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayServer>,
}

pub fn router(relay: Arc<RelayServer>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(http::health))
        .route("/api", get(http::api_info))
        .route("/api/start-task", post(http::start_task))
        .route("/api/send-message", post(http::send_message))
        .route("/api/press-primary-button", post(http::press_primary_button))
        .route(
            "/api/press-secondary-button",
            post(http::press_secondary_button),
        )
        .route(
            "/api/custom-instructions",
            get(http::get_custom_instructions).post(http::set_custom_instructions),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { relay })
}
