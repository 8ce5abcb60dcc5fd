use std::sync::Arc;

use crate::kernel::ServerDeps;

/// GraphQL request context
///
/// The API is read-only and public, so resolvers only need the shared
/// dependencies.
#[derive(Clone)]
pub struct GraphQLContext {
    pub deps: Arc<ServerDeps>,
}

impl juniper::Context for GraphQLContext {}

impl GraphQLContext {
    pub fn new(deps: Arc<ServerDeps>) -> Self {
        Self { deps }
    }
}
