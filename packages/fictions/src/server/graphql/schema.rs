//! GraphQL schema definition.

use juniper::{EmptyMutation, EmptySubscription, FieldError, FieldResult, RootNode, Value, ID};
use tracing::{debug, error};

use super::context::GraphQLContext;
use crate::common::{ComponentId, FictionId, Id};
use crate::domains::components::models::Component;
use crate::domains::fictions::data::{
    fiction_query, FictionConnection, FictionFilterInput, FictionNode, FictionOrderInput,
};
use crate::domains::fictions::queries::find_published_in_component;
use crate::kernel::traits::*;

fn parse_id<T>(id: &ID, what: &str) -> FieldResult<Id<T>> {
    Id::parse(id).map_err(|_| FieldError::new(format!("Invalid {} id: {}", what, &**id), Value::null()))
}

fn internal(e: impl std::fmt::Display) -> FieldError {
    error!(error = %e, "GraphQL resolver failed");
    FieldError::new("Internal error", Value::null())
}

async fn find_component(ctx: &GraphQLContext, id: ComponentId) -> FieldResult<Option<Component>> {
    ctx.deps.store.find_component(id).await.map_err(internal)
}

pub struct Query;

#[juniper::graphql_object(context = GraphQLContext)]
impl Query {
    /// Published fictions of a component; `null` for an unknown component
    async fn fictions(
        ctx: &GraphQLContext,
        component_id: ID,
        filter: Option<FictionFilterInput>,
        order: Option<FictionOrderInput>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> FieldResult<Option<FictionConnection>> {
        let component_id: ComponentId = parse_id(&component_id, "component")?;
        let Some(component) = find_component(ctx, component_id).await? else {
            return Ok(None);
        };

        let query = fiction_query(filter, order, limit, offset);
        let fictions = ctx
            .deps
            .store
            .find_published(component.id, &query)
            .await
            .map_err(internal)?;
        let total = ctx
            .deps
            .store
            .count_published(component.id, &query)
            .await
            .map_err(internal)?;
        debug!(component_id = %component.id, total, "listing fictions");

        let has_next_page = query.offset + (fictions.len() as i64) < total;
        let votes_hidden = component.step_settings.votes_hidden;
        Ok(Some(FictionConnection {
            nodes: fictions
                .into_iter()
                .map(|f| FictionNode::new(f, votes_hidden))
                .collect(),
            total_count: i32::try_from(total).unwrap_or(i32::MAX),
            has_next_page,
        }))
    }

    /// A published fiction, or `null`
    async fn fiction(
        ctx: &GraphQLContext,
        component_id: ID,
        id: ID,
    ) -> FieldResult<Option<FictionNode>> {
        let (Ok(component_id), Ok(fiction_id)) = (
            ComponentId::parse(&component_id),
            FictionId::parse(&id),
        ) else {
            return Ok(None);
        };
        let Some(component) = find_component(ctx, component_id).await? else {
            return Ok(None);
        };

        let fiction = find_published_in_component(ctx.deps.store(), component.id, fiction_id)
            .await
            .map_err(internal)?;
        Ok(fiction.map(|f| FictionNode::new(f, component.step_settings.votes_hidden)))
    }

    /// Fictions close to a draft title and body, shown before publishing
    async fn similar_fictions(
        ctx: &GraphQLContext,
        component_id: ID,
        title: String,
        body: String,
    ) -> FieldResult<Vec<FictionNode>> {
        let component_id: ComponentId = parse_id(&component_id, "component")?;
        let Some(component) = find_component(ctx, component_id).await? else {
            return Ok(Vec::new());
        };

        let config = &ctx.deps.config;
        let similar = ctx
            .deps
            .store
            .find_similar(
                component.id,
                &title,
                &body,
                config.similarity_threshold,
                config.similarity_limit,
            )
            .await
            .map_err(internal)?;
        let votes_hidden = component.step_settings.votes_hidden;
        Ok(similar
            .into_iter()
            .map(|f| FictionNode::new(f, votes_hidden))
            .collect())
    }
}

pub type Schema =
    RootNode<'static, Query, EmptyMutation<GraphQLContext>, EmptySubscription<GraphQLContext>>;

pub fn create_schema() -> Schema {
    Schema::new(Query, EmptyMutation::new(), EmptySubscription::new())
}
