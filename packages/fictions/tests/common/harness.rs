//! Test harness over the in-memory store.
//!
//! Each test gets its own store, stream hub and router; requests go through
//! the full middleware stack without binding a socket.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use fictions_core::common::{ComponentId, UserId};
use fictions_core::config::FictionsConfig;
use fictions_core::domains::auth::JwtService;
use fictions_core::domains::components::models::{Component, ComponentSettings, StepSettings};
use fictions_core::kernel::{MemoryFileStorage, MemoryStore, Notifier, ServerDeps, StreamHub};
use fictions_core::server::build_app;
use test_context::AsyncTestContext;

use super::{GraphQLClient, HttpClient};

pub const TEST_SECRET: &str = "integration-secret";
pub const TEST_ISSUER: &str = "fictions-integration";

/// Test harness that manages test infrastructure.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &mut TestHarness) {
///     let client = ctx.graphql();
///     // ... test code
/// }
/// ```
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub deps: Arc<ServerDeps>,
    pub hub: StreamHub,
    pub app: Router,
    jwt: Arc<JwtService>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        // Store and hub are dropped with the harness
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let store = Arc::new(MemoryStore::new());
        let hub = StreamHub::new();
        let jwt = Arc::new(JwtService::new(TEST_SECRET, TEST_ISSUER.to_string()));
        let deps = Arc::new(ServerDeps::new(
            store.clone(),
            Arc::new(MemoryFileStorage::new()),
            Notifier::spawn(hub.clone()),
            FictionsConfig::default(),
            jwt.clone(),
        ));
        let app = build_app(deps.clone(), hub.clone(), None);

        Ok(Self {
            store,
            deps,
            hub,
            app,
            jwt,
        })
    }

    /// A component in the `city` space.
    pub fn component(&self, settings: ComponentSettings, step: StepSettings) -> Component {
        self.store
            .insert_component("city", "Fictions", settings, step)
    }

    /// Component where citizens may create, vote and endorse.
    pub fn open_component(&self) -> Component {
        self.component(
            ComponentSettings::default(),
            StepSettings {
                creation_enabled: true,
                votes_enabled: true,
                endorsements_enabled: true,
                ..Default::default()
            },
        )
    }

    pub fn token(&self, user_id: i64, is_admin: bool) -> String {
        self.jwt
            .create_token(UserId::new(user_id), is_admin, Vec::new())
            .expect("Failed to create token")
    }

    pub fn http(&self) -> HttpClient {
        HttpClient::new(self.app.clone())
    }

    pub fn graphql(&self) -> GraphQLClient {
        GraphQLClient::new(self.deps.clone())
    }

    /// Give the notifier worker a chance to forward events to the hub.
    pub async fn settle(&self) {
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }
}

pub fn component_path(component_id: ComponentId, rest: &str) -> String {
    format!("/components/{}{}", component_id, rest)
}

pub fn admin_path(component_id: ComponentId, rest: &str) -> String {
    format!("/admin/components/{}{}", component_id, rest)
}
