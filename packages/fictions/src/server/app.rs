//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::{Extension, Request},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::{ServerDeps, StreamHub};
use crate::server::graphql::{create_schema, GraphQLContext, Schema};
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    admin, amendments, drafts, fictions, graphql_batch_handler, graphql_handler,
    graphql_playground, health_handler, stream_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub server_deps: Arc<ServerDeps>,
    pub stream_hub: StreamHub,
    /// `None` when the server runs on the in-memory store.
    pub db_pool: Option<PgPool>,
}

/// Middleware to create GraphQLContext per-request
async fn create_graphql_context(
    Extension(state): Extension<AxumAppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = GraphQLContext::new(state.server_deps.clone());
    request.extensions_mut().insert(context);

    next.run(request).await
}

fn citizen_routes() -> Router<Arc<Schema>> {
    Router::new()
        .route(
            "/components/:component_id/fictions",
            get(fictions::list_fictions).post(fictions::create_fiction),
        )
        .route(
            "/components/:component_id/similar_fictions",
            get(fictions::similar_fictions),
        )
        .route(
            "/components/:component_id/fictions/:fiction_id",
            get(fictions::show_fiction).put(fictions::edit_fiction),
        )
        .route(
            "/components/:component_id/fictions/:fiction_id/publish",
            post(fictions::publish_fiction),
        )
        .route(
            "/components/:component_id/fictions/:fiction_id/withdraw",
            post(fictions::withdraw_fiction),
        )
        .route(
            "/components/:component_id/fictions/:fiction_id/versions",
            get(fictions::fiction_versions),
        )
        .route(
            "/components/:component_id/fictions/:fiction_id/votes",
            post(fictions::vote_fiction).delete(fictions::unvote_fiction),
        )
        .route(
            "/components/:component_id/fictions/:fiction_id/endorsements",
            post(fictions::endorse_fiction).delete(fictions::unendorse_fiction),
        )
        // Amendments
        .route(
            "/components/:component_id/fictions/:fiction_id/amendments",
            post(amendments::amend_fiction),
        )
        .route(
            "/components/:component_id/amendments/:amendment_id/accept",
            post(amendments::accept_amendment),
        )
        .route(
            "/components/:component_id/amendments/:amendment_id/reject",
            post(amendments::reject_amendment),
        )
        .route(
            "/components/:component_id/amendments/:amendment_id/withdraw",
            post(amendments::withdraw_amendment),
        )
        .route(
            "/components/:component_id/amendments/:amendment_id/promote",
            post(amendments::promote_emendation),
        )
        // Collaborative drafts
        .route(
            "/components/:component_id/drafts",
            post(drafts::create_draft),
        )
        .route(
            "/components/:component_id/drafts/:draft_id",
            get(drafts::show_draft).put(drafts::edit_draft),
        )
        .route(
            "/components/:component_id/drafts/:draft_id/withdraw",
            post(drafts::withdraw_draft),
        )
        .route(
            "/components/:component_id/drafts/:draft_id/publish",
            post(drafts::publish_draft),
        )
        .route(
            "/components/:component_id/drafts/:draft_id/access_requests",
            post(drafts::request_access),
        )
        .route(
            "/components/:component_id/drafts/:draft_id/access_requests/:requester_id/accept",
            post(drafts::accept_access_request),
        )
        .route(
            "/components/:component_id/drafts/:draft_id/access_requests/:requester_id/reject",
            post(drafts::reject_access_request),
        )
        // Live events
        .route("/components/:component_id/stream", get(stream_handler))
}

fn admin_routes() -> Router<Arc<Schema>> {
    Router::new()
        .route(
            "/admin/components/:component_id/fictions",
            post(admin::create_official_fiction),
        )
        .route(
            "/admin/components/:component_id/fictions/:fiction_id",
            put(admin::edit_official_fiction),
        )
        .route(
            "/admin/components/:component_id/fictions/:fiction_id/answer",
            post(admin::answer_fiction),
        )
        .route(
            "/admin/components/:component_id/fictions/:fiction_id/notes",
            post(admin::create_note),
        )
        .route(
            "/admin/components/:component_id/publish_answers",
            post(admin::publish_answers),
        )
        .route(
            "/admin/components/:component_id/valuation_assignments",
            post(admin::assign_valuator).delete(admin::unassign_valuator),
        )
        .route(
            "/admin/components/:component_id/category",
            post(admin::update_category),
        )
        .route(
            "/admin/components/:component_id/scope",
            post(admin::update_scope),
        )
        .route(
            "/admin/components/:component_id/merge",
            post(admin::merge_fictions),
        )
        .route(
            "/admin/components/:component_id/split",
            post(admin::split_fictions),
        )
        .route(
            "/admin/components/:component_id/import",
            post(admin::import_fictions),
        )
        .route(
            "/admin/components/:component_id/export",
            get(admin::export_fictions),
        )
        .route(
            "/admin/components/:component_id/step_settings",
            put(admin::update_step_settings),
        )
}

/// Build the Axum application router
///
/// `server_deps` must share `stream_hub` with its `Notifier` for the stream
/// route to see events.
pub fn build_app(
    server_deps: Arc<ServerDeps>,
    stream_hub: StreamHub,
    db_pool: Option<PgPool>,
) -> Router {
    // Create GraphQL schema (singleton)
    let schema = Arc::new(create_schema());

    let jwt_service = server_deps.jwt_service.clone();
    let app_state = AxumAppState {
        server_deps,
        stream_hub,
        db_pool,
    };

    // CORS configuration - allow any origin; auth travels in the header
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    #[allow(unused_mut)]
    let mut router = Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/graphql/batch", post(graphql_batch_handler));

    // GraphQL playground only in debug builds (development)
    #[cfg(debug_assertions)]
    {
        router = router.route("/graphql", get(graphql_playground));
    }

    router
        .merge(citizen_routes())
        .merge(admin_routes())
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(create_graphql_context))
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(schema)
}
