// HTTP routes
pub mod admin;
pub mod amendments;
pub mod api;
pub mod drafts;
pub mod fictions;
pub mod graphql;
pub mod health;
pub mod stream;

pub use api::{ApiError, ApiResult, RequireActor};
pub use graphql::*;
pub use health::*;
pub use stream::*;
