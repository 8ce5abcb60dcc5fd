use std::time::Duration;

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::server::app::AxumAppState;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: DatabaseHealth,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    /// `ok`, `error` or `not_configured` on the in-memory store
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DatabaseHealth {
    fn status(status: &'static str) -> Self {
        Self { status, error: None }
    }

    fn failed(error: String) -> Self {
        Self {
            status: "error",
            error: Some(error),
        }
    }

    fn is_failed(&self) -> bool {
        self.status == "error"
    }
}

async fn probe(pool: &PgPool) -> DatabaseHealth {
    match tokio::time::timeout(PROBE_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
        Ok(Ok(_)) => DatabaseHealth::status("ok"),
        Ok(Err(e)) => DatabaseHealth::failed(format!("Query failed: {}", e)),
        Err(_) => DatabaseHealth::failed(format!("Query timeout (>{}s)", PROBE_TIMEOUT.as_secs())),
    }
}

/// 503 once the database stops answering.
pub async fn health_handler(
    Extension(state): Extension<AxumAppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.db_pool {
        Some(pool) => probe(pool).await,
        None => DatabaseHealth::status("not_configured"),
    };

    if database.is_failed() {
        tracing::warn!(error = ?database.error, "health check failed");
        let body = HealthResponse {
            status: "unhealthy",
            database,
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body));
    }

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            database,
        }),
    )
}
