//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod files;
pub mod memory_store;
pub mod notifier;
pub mod permission_loader;
pub mod pg_store;
pub mod stream_hub;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use files::{LocalFileStorage, MemoryFileStorage};
pub use memory_store::MemoryStore;
pub use notifier::Notifier;
pub use permission_loader::PermissionContextLoader;
pub use pg_store::PgStore;
pub use stream_hub::StreamHub;
pub use traits::*;
