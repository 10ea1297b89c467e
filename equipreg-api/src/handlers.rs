//! API route handlers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use equipreg_core::error::EquipmentError;
use equipreg_core::types::{EquipmentId, Principal};

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Reads the caller identity set by the fronting gateway.
fn caller_identity(state: &AppState, headers: &HeaderMap) -> Result<Principal> {
    let raw = headers
        .get(&state.identity_header)
        .ok_or_else(|| {
            ApiError::unauthenticated(format!("missing {} header", state.identity_header.as_str()))
        })?
        .to_str()
        .map_err(|_| ApiError::unauthenticated("caller identity is not valid text"))?;

    Ok(Principal::new(raw)?)
}

/// POST /api/v1/equipment
pub async fn register_equipment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let registrant = caller_identity(&state, &headers)?;
    let Json(req) = body.map_err(|rejection| EquipmentError::ValidationError(rejection.body_text()))?;

    state
        .registry
        .register(req.id, req.name, req.document_ref, registrant.clone())
        .await?;

    info!(id = req.id, registrant = %registrant, "Equipment registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: req.id,
            registrant,
        }),
    ))
}

/// GET /api/v1/equipment/:id
pub async fn get_equipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<EquipmentId>,
) -> Result<Json<EquipmentResponse>> {
    let details = state.registry.get_details(id).await?;
    Ok(Json(EquipmentResponse::new(id, details)))
}

/// GET /api/v1/equipment/events
///
/// Streams registrations committed after the client connects. Clients that
/// fall behind the event buffer skip ahead; they should reconcile through
/// lookups using the `id` of the events they did receive.
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let rx = state.events.subscribe();
    debug!(subscribers = state.events.subscriber_count(), "Event stream opened");

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let sse = Event::default()
                        .event("registered")
                        .id(event.sequence.to_string())
                        .json_data(&event);
                    match sse {
                        Ok(sse) => return Some((Ok(sse), rx)),
                        Err(e) => warn!(sequence = event.sequence, error = %e, "Unserializable event"),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event stream subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
