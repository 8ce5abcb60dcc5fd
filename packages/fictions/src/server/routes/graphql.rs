//! GraphQL over HTTP. The schema is read-only, so every operation is a
//! query and anonymous requests are served like any other.

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use juniper::http::{GraphQLBatchRequest, GraphQLRequest};
use tracing::debug;

use crate::server::graphql::{GraphQLContext, Schema};

/// Failed executions answer 400 with the juniper error payload.
fn status_for(ok: bool) -> StatusCode {
    if ok {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    }
}

/// POST /graphql
pub async fn graphql_handler(
    State(schema): State<Arc<Schema>>,
    Extension(context): Extension<GraphQLContext>,
    Json(request): Json<GraphQLRequest>,
) -> Response {
    debug!(operation = ?request.operation_name, "graphql query");
    let response = request.execute(&schema, &context).await;

    (status_for(response.is_ok()), Json(response)).into_response()
}

/// POST /graphql/batch
pub async fn graphql_batch_handler(
    State(schema): State<Arc<Schema>>,
    Extension(context): Extension<GraphQLContext>,
    Json(batch): Json<GraphQLBatchRequest>,
) -> Response {
    let response = batch.execute(&schema, &context).await;

    (status_for(response.is_ok()), Json(response)).into_response()
}

/// GraphiQL page, mounted in debug builds only
pub async fn graphql_playground() -> Html<String> {
    Html(juniper::http::graphiql::graphiql_source("/graphql", None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_execution_is_a_bad_request() {
        assert_eq!(status_for(true), StatusCode::OK);
        assert_eq!(status_for(false), StatusCode::BAD_REQUEST);
    }
}
