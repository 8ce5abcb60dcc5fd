//! Runs queries straight against the schema, skipping the HTTP layer.

use std::sync::Arc;

use fictions_core::kernel::ServerDeps;
use fictions_core::server::graphql::{create_schema, GraphQLContext, Schema};
use juniper::Variables;
use serde_json::Value;

pub struct GraphQLClient {
    schema: Schema,
    context: GraphQLContext,
}

#[derive(Debug)]
pub struct GraphQLResult {
    pub data: Option<Value>,
    pub errors: Vec<String>,
}

impl GraphQLResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// First error raised by `field`, if any.
    pub fn error_on(&self, field: &str) -> Option<&str> {
        let prefix = format!("{}: ", field);
        self.errors
            .iter()
            .find_map(|e| e.strip_prefix(prefix.as_str()))
    }

    pub fn unwrap(self) -> Value {
        if !self.errors.is_empty() {
            panic!("GraphQL errors: {:?}", self.errors);
        }
        self.data.expect("No data returned")
    }
}

impl GraphQLClient {
    pub fn new(deps: Arc<ServerDeps>) -> Self {
        Self {
            schema: create_schema(),
            context: GraphQLContext::new(deps),
        }
    }

    pub async fn execute_with_vars(&self, query: &str, variables: Variables) -> GraphQLResult {
        let (result, errors) =
            juniper::execute(query, None, &self.schema, &variables, &self.context)
                .await
                .expect("GraphQL execution failed");

        let data = serde_json::to_value(&result).ok();

        // "fictions: Invalid component id: abc"
        let errors = errors
            .iter()
            .map(|e| match e.path().first() {
                Some(field) => format!("{}: {}", field, e.error().message()),
                None => e.error().message().to_string(),
            })
            .collect();

        GraphQLResult { data, errors }
    }

    /// Panics on any GraphQL error.
    pub async fn query_with_vars(&self, query: &str, variables: Variables) -> Value {
        self.execute_with_vars(query, variables).await.unwrap()
    }
}
