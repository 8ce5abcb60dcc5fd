//! SSE streaming endpoint.
//!
//! GET /components/:component_id/stream?token=JWT
//!
//! Forwards the component's `FictionEvent`s as SSE events named after their
//! `type` tag. Anyone may listen; admin-only events (private notes,
//! assignments, unpublished verdicts) are dropped unless the token belongs to
//! an organization admin. EventSource can't send custom headers, so the token
//! may come as a query param; the Authorization header is read as well.

use std::convert::Infallible;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::debug;

use crate::common::ComponentId;
use crate::domains::fictions::FictionEvent;
use crate::kernel::traits::*;
use crate::server::app::AxumAppState;
use crate::server::middleware::AuthUser;

#[derive(Deserialize)]
pub struct StreamQuery {
    token: Option<String>,
}

/// Whether a payload may be forwarded to a non-admin listener.
fn is_public(value: &JsonValue) -> bool {
    serde_json::from_value::<FictionEvent>(value.clone())
        .map(|event| !event.is_admin_only())
        .unwrap_or(false)
}

pub async fn stream_handler(
    Extension(state): Extension<AxumAppState>,
    Path(component_id): Path<ComponentId>,
    Query(query): Query<StreamQuery>,
    auth_user: Option<Extension<AuthUser>>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let is_admin = match (query.token, auth_user) {
        (Some(token), _) => {
            state
                .server_deps
                .jwt_service
                .verify_token(&token)
                .map_err(|_| StatusCode::UNAUTHORIZED)?
                .is_admin
        }
        (None, Some(Extension(user))) => user.is_admin,
        (None, None) => false,
    };

    state
        .server_deps
        .store
        .find_component(component_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    debug!(component_id = %component_id, is_admin, "stream subscriber connected");
    let rx = state.stream_hub.subscribe_component(component_id).await;

    let connected =
        stream::once(async { Ok::<_, Infallible>(Event::default().event("connected").data("ok")) });

    let events = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(value) => {
                if !is_admin && !is_public(&value) {
                    return None;
                }
                let event_name = value
                    .get("type")
                    .and_then(|t| t.as_str())
                    .unwrap_or("message");
                Event::default()
                    .event(event_name)
                    .json_data(&value)
                    .ok()
                    .map(Ok)
            }
            Err(BroadcastStreamRecvError::Lagged(n)) => Event::default()
                .event("lagged")
                .json_data(&serde_json::json!({"missed": n}))
                .ok()
                .map(Ok),
        }
    });

    Ok(Sse::new(connected.chain(events)).keep_alive(KeepAlive::default()))
}
