//! The secret boundary HTTP server.
//!
//! Exposes exactly one route, [`BOUNDARY_ROUTE`]. Each call is dispatched
//! with the full registry, tokens included, and the upstream status,
//! content type and body are passed back unchanged.

use std::future::Future;

use axum::Router;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use bytes::Bytes;
use tokio::net::TcpListener;
use tracing::{info, warn};
use uuid::Uuid;

use partyline_client::Dispatcher;
use partyline_common::{BOUNDARY_ROUTE, BoundaryRequest};

use crate::error::{DaemonError, Result};

/// Shared state of the boundary.
#[derive(Debug, Clone)]
pub struct BoundaryState {
    dispatcher: Dispatcher,
}

impl BoundaryState {
    /// Creates the state around a trusted dispatcher.
    pub const fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

/// Build the axum router for the boundary.
pub fn router(state: BoundaryState) -> Router {
    Router::new()
        .route(BOUNDARY_ROUTE, post(handle_call))
        .with_state(state)
}

/// Serves the boundary until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve<F>(listener: TcpListener, state: BoundaryState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, route = BOUNDARY_ROUTE, "Secret boundary listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn handle_call(State(state): State<BoundaryState>, body: Bytes) -> Response {
    let correlation_id = Uuid::new_v4();

    let call: BoundaryRequest = match serde_json::from_slice(&body) {
        Ok(call) => call,
        Err(e) => {
            warn!(%correlation_id, error = %e, "Rejected malformed boundary request");
            return DaemonError::InvalidBody(e.to_string()).into_response();
        }
    };
    let method = call.opts.method();

    match state
        .dispatcher
        .dispatch(&call.endpoint_id, &call.path, &call.opts)
        .await
    {
        Ok(upstream) => {
            info!(
                %correlation_id,
                endpoint = %call.endpoint_id,
                %method,
                status = upstream.status,
                "Dispatched call"
            );

            let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut headers = HeaderMap::new();
            if let Some(content_type) = upstream
                .content_type()
                .and_then(|ct| HeaderValue::from_str(ct).ok())
            {
                headers.insert(CONTENT_TYPE, content_type);
            }

            (status, headers, upstream.body).into_response()
        }
        Err(e) => {
            let err = DaemonError::from(e);
            let (status, kind) = err.classify();
            warn!(
                %correlation_id,
                endpoint = %call.endpoint_id,
                %method,
                status = status.as_u16(),
                kind,
                error = %err,
                "Call failed"
            );
            err.into_response()
        }
    }
}
