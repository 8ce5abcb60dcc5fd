//! Shared pieces of the JSON routes: error mapping and the actor extractor.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::common::auth::Actor;
use crate::common::{ActionError, ComponentId, StoreError};
use crate::domains::fictions::actions::support::load_component;
use crate::domains::fictions::{Fiction, FictionData};
use crate::kernel::ServerDeps;
use crate::server::middleware::AuthUser;

/// `ActionError` rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ActionError);

pub type ApiResult<T> = Result<Json<T>, ApiError>;

impl From<ActionError> for ApiError {
    fn from(err: ActionError) -> Self {
        Self(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(ActionError::Store(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            ActionError::Invalid(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors })),
            )
                .into_response(),
            ActionError::NotAuthorized => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "not authorized" })),
            )
                .into_response(),
            ActionError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("{} not found", what) })),
            )
                .into_response(),
            err @ (ActionError::Store(_) | ActionError::Internal(_)) => {
                error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}

/// The authenticated actor. Anonymous requests are denied like any other
/// unauthorized action.
pub struct RequireActor(pub Actor);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequireActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .map(|user| RequireActor(user.to_actor()))
            .ok_or(ApiError(ActionError::NotAuthorized))
    }
}

/// Citizen view of fictions, hiding vote counts when the step says so.
pub async fn present(
    component_id: ComponentId,
    fictions: Vec<Fiction>,
    deps: &ServerDeps,
) -> Result<Vec<FictionData>, ApiError> {
    let component = load_component(component_id, deps).await?;
    let votes_hidden = component.step_settings.votes_hidden;
    Ok(fictions
        .into_iter()
        .map(|f| FictionData::new(f, votes_hidden))
        .collect())
}

pub async fn present_one(
    component_id: ComponentId,
    fiction: Fiction,
    deps: &ServerDeps,
) -> ApiResult<FictionData> {
    let component = load_component(component_id, deps).await?;
    Ok(Json(FictionData::new(
        fiction,
        component.step_settings.votes_hidden,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let status = |err: ActionError| ApiError(err).into_response().status();

        assert_eq!(
            status(ActionError::invalid("title", "is too short")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status(ActionError::NotAuthorized), StatusCode::FORBIDDEN);
        assert_eq!(status(ActionError::NotFound("Fiction")), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ActionError::Store(StoreError::NotFound("Fiction"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
