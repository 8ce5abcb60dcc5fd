// TestDependencies - in-memory wiring for tests
//
// Builds a ServerDeps over MemoryStore and MemoryFileStorage and keeps the
// notifier's receiving end so tests can inspect dispatched events.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use chrono::Utc;

use super::{MemoryFileStorage, MemoryStore, Notifier, ServerDeps};
use crate::common::{ComponentId, StoreResult};
use crate::config::FictionsConfig;
use crate::domains::auth::JwtService;
use crate::domains::fictions::events::FictionEvent;
use crate::domains::fictions::factory::FictionFactory;
use crate::domains::fictions::models::{Coauthorship, Fiction, NewFiction};

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const TEST_JWT_ISSUER: &str = "fictions-test";

pub struct TestDependencies {
    pub store: Arc<MemoryStore>,
    pub files: Arc<MemoryFileStorage>,
    pub deps: ServerDeps,
    events: Mutex<mpsc::UnboundedReceiver<FictionEvent>>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self::with_config(FictionsConfig::default())
    }

    pub fn with_config(config: FictionsConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let files = Arc::new(MemoryFileStorage::new());
        let (notifier, rx) = Notifier::channel();
        let deps = ServerDeps::new(
            store.clone(),
            files.clone(),
            notifier,
            config,
            Arc::new(JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER.to_string())),
        );
        Self {
            store,
            files,
            deps,
            events: Mutex::new(rx),
        }
    }

    /// Events dispatched since the last call.
    pub fn events(&self) -> Vec<FictionEvent> {
        let mut rx = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// A published fiction with a valid body, created through the factory.
    pub async fn published_fiction(
        &self,
        component_id: ComponentId,
        author: Coauthorship,
        title: &str,
    ) -> StoreResult<Fiction> {
        let new = NewFiction::builder()
            .component_id(component_id)
            .title(title)
            .body("A body that is long enough to be valid.")
            .published_at(Utc::now())
            .build();
        FictionFactory::new(&self.deps)
            .create(&new, &[author], author.author.user_id())
            .await
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
