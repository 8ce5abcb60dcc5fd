//! Server dependencies for actions (using traits for testability)
//!
//! Central dependency container handed to every domain action. Storage and
//! files sit behind trait objects so tests can swap in memory versions.

use std::sync::Arc;

use crate::config::FictionsConfig;
use crate::domains::auth::JwtService;
use crate::kernel::notifier::Notifier;
use crate::kernel::permission_loader::PermissionContextLoader;
use crate::kernel::traits::{BaseFileStorage, Store};

#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn Store>,
    pub files: Arc<dyn BaseFileStorage>,
    pub notifier: Notifier,
    pub config: FictionsConfig,
    pub jwt_service: Arc<JwtService>,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn Store>,
        files: Arc<dyn BaseFileStorage>,
        notifier: Notifier,
        config: FictionsConfig,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            store,
            files,
            notifier,
            config,
            jwt_service,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn permissions(&self) -> PermissionContextLoader<'_> {
        PermissionContextLoader::new(self.store.as_ref())
    }
}
