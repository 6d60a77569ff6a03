//! Public API for interacting with the node.

use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::node::Node;

pub mod endpoints;
pub mod model;

#[derive(Clone)]
pub struct RouterState {
    node: Node,
}

pub struct RestApi {
    rest_addr: String,
    app: Option<Router>,
}

/// Every route of the API, without the listener.
pub fn router(node: Node) -> Router {
    Router::new()
        .route("/v1/info", get(endpoints::get_info))
        .route("/v1/token/:contract", get(endpoints::get_token))
        .route(
            "/v1/token/:contract/balance/:account",
            get(endpoints::get_balance),
        )
        .route(
            "/v1/token/:contract/allowance/:owner/:spender",
            get(endpoints::get_allowance),
        )
        .route("/v1/sale/:contract", get(endpoints::get_sale))
        .route(
            "/v1/native/balance/:account",
            get(endpoints::get_native_balance),
        )
        .route("/v1/history/:account", get(endpoints::get_history))
        .route("/v1/events/:account", get(endpoints::get_events))
        .route("/v1/tx/:hash", get(endpoints::get_receipt))
        .route("/v1/tx", post(endpoints::send_transaction))
        .route("/v1/tx/send/blob", post(endpoints::send_blob_transaction))
        .with_state(RouterState { node })
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

impl RestApi {
    pub fn new(rest_addr: String, node: Node) -> Self {
        RestApi {
            rest_addr,
            app: Some(router(node)),
        }
    }

    pub async fn serve(&mut self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.rest_addr)
            .await
            .context("Starting rest server")?;

        info!("rest listening on {}", self.rest_addr);

        let app = self.app.take().context("Rest server already started")?;
        axum::serve(listener, app)
            .await
            .context("Starting rest server")
    }
}

// Make our own error that wraps `anyhow::Error`.
pub struct AppError(pub StatusCode, pub anyhow::Error);

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, format!("{:#}", self.1)).into_response()
    }
}

// This enables using `?` on functions that return `Result<_, anyhow::Error>` to turn them into
// `Result<_, AppError>`. That way you don't need to do that manually.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}
