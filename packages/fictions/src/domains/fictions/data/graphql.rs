use chrono::{DateTime, Utc};
use juniper::{FieldError, FieldResult, GraphQLEnum, GraphQLInputObject, GraphQLObject, Value, ID};

use crate::common::SortDirection;
use crate::domains::amendments::models::Amendment;
use crate::domains::fictions::models::coauthorship::is_official;
use crate::domains::fictions::models::{Author, Fiction};
use crate::domains::fictions::presenter::FictionPresenter;
use crate::domains::fictions::queries::{FictionOrder, FictionOrderField, FictionQuery};
use crate::domains::fictions::versions::{render_versions, AttributeDiff, DiffKind, VersionDiff};
use crate::kernel::traits::*;
use crate::server::graphql::GraphQLContext;

fn field_error(e: impl std::fmt::Display) -> FieldError {
    FieldError::new(e.to_string(), Value::null())
}

/// GraphQL type for a published fiction
#[derive(Debug, Clone)]
pub struct FictionNode {
    fiction: Fiction,
    votes_hidden: bool,
}

impl FictionNode {
    pub fn new(fiction: Fiction, votes_hidden: bool) -> Self {
        Self {
            fiction,
            votes_hidden,
        }
    }
}

#[juniper::graphql_object(name = "Fiction", context = GraphQLContext)]
impl FictionNode {
    fn id(&self) -> ID {
        ID::new(self.fiction.id.to_string())
    }

    fn title(&self) -> String {
        self.fiction.title.clone()
    }

    /// Body as HTML, mentions rendered as links
    async fn body(&self, ctx: &GraphQLContext) -> FieldResult<String> {
        FictionPresenter::new(&self.fiction, ctx.deps.store(), &ctx.deps.config)
            .display_body()
            .await
            .map_err(field_error)
    }

    fn address(&self) -> Option<String> {
        self.fiction.address.clone()
    }

    /// Visible state; `not_answered` while a verdict waits for publication
    fn state(&self) -> String {
        self.fiction.state().as_str().to_string()
    }

    fn answer(&self) -> Option<String> {
        self.fiction.visible_answer().map(str::to_string)
    }

    fn answered_at(&self) -> Option<DateTime<Utc>> {
        self.fiction.state_published_at.and(self.fiction.answered_at)
    }

    fn published_at(&self) -> Option<DateTime<Utc>> {
        self.fiction.published_at
    }

    fn reference(&self) -> Option<String> {
        self.fiction.reference.clone()
    }

    fn endorsements_count(&self) -> i32 {
        self.fiction.endorsement_count
    }

    /// `null` while the current step hides votes
    fn vote_count(&self) -> Option<i32> {
        (!self.votes_hidden).then_some(self.fiction.vote_count)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.fiction.created_at
    }

    async fn official(&self, ctx: &GraphQLContext) -> FieldResult<bool> {
        let coauthorships = ctx
            .deps
            .store
            .coauthorships(self.fiction.id)
            .await
            .map_err(field_error)?;
        Ok(is_official(&coauthorships))
    }

    async fn authors(&self, ctx: &GraphQLContext) -> FieldResult<Vec<AuthorNode>> {
        let coauthorships = ctx
            .deps
            .store
            .coauthorships(self.fiction.id)
            .await
            .map_err(field_error)?;
        Ok(coauthorships
            .into_iter()
            .map(|c| AuthorNode::from(c.author))
            .collect())
    }

    /// Change history with unpublished verdicts held back
    async fn versions(&self, ctx: &GraphQLContext) -> FieldResult<Vec<VersionNode>> {
        let versions = ctx
            .deps
            .store
            .versions(self.fiction.id)
            .await
            .map_err(field_error)?;
        Ok(render_versions(&versions)
            .into_iter()
            .map(VersionNode::from)
            .collect())
    }

    async fn amendments(&self, ctx: &GraphQLContext) -> FieldResult<Vec<AmendmentNode>> {
        let amendments = ctx
            .deps
            .store
            .amendments_for(self.fiction.id)
            .await
            .map_err(field_error)?;
        Ok(amendments.into_iter().map(AmendmentNode::from).collect())
    }
}

/// Page of fictions
#[derive(GraphQLObject)]
#[graphql(context = GraphQLContext)]
pub struct FictionConnection {
    pub nodes: Vec<FictionNode>,
    pub total_count: i32,
    pub has_next_page: bool,
}

#[derive(Debug, Clone, GraphQLObject)]
#[graphql(name = "Author")]
pub struct AuthorNode {
    /// `user`, `organization` or `meeting`
    pub kind: String,
    pub id: Option<ID>,
}

impl From<Author> for AuthorNode {
    fn from(author: Author) -> Self {
        let id = match author {
            Author::User(id) => Some(id.get()),
            Author::Meeting(id) => Some(id.get()),
            Author::Organization => None,
        };
        Self {
            kind: author.kind().to_string(),
            id: id.map(|id| ID::new(id.to_string())),
        }
    }
}

#[derive(Debug, Clone, GraphQLObject)]
#[graphql(name = "Version")]
pub struct VersionNode {
    pub id: ID,
    /// Position in the full history, starting at 1
    pub index: i32,
    pub event: String,
    pub whodunnit: Option<ID>,
    pub created_at: DateTime<Utc>,
    pub changes: Vec<ChangeNode>,
}

impl From<VersionDiff> for VersionNode {
    fn from(diff: VersionDiff) -> Self {
        Self {
            id: ID::new(diff.version_id.to_string()),
            index: i32::try_from(diff.index).unwrap_or(i32::MAX),
            event: diff.event.to_string(),
            whodunnit: diff.whodunnit.map(|u| ID::new(u.to_string())),
            created_at: diff.created_at,
            changes: diff.diffs.into_iter().map(ChangeNode::from).collect(),
        }
    }
}

#[derive(Debug, Clone, GraphQLObject)]
#[graphql(name = "Change")]
pub struct ChangeNode {
    pub attribute: String,
    pub label: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    /// `text`, `date`, `state` or `reference`
    pub kind: String,
}

impl From<AttributeDiff> for ChangeNode {
    fn from(diff: AttributeDiff) -> Self {
        let kind = match diff.kind {
            DiffKind::Text => "text",
            DiffKind::Date => "date",
            DiffKind::State => "state",
            DiffKind::Reference => "reference",
        };
        Self {
            attribute: diff.attribute,
            label: diff.label,
            old_value: diff.old_value,
            new_value: diff.new_value,
            kind: kind.to_string(),
        }
    }
}

#[derive(Debug, Clone, GraphQLObject)]
#[graphql(name = "Amendment")]
pub struct AmendmentNode {
    pub id: ID,
    pub emendation_id: ID,
    pub amender_id: ID,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

impl From<Amendment> for AmendmentNode {
    fn from(amendment: Amendment) -> Self {
        Self {
            id: ID::new(amendment.id.to_string()),
            emendation_id: ID::new(amendment.emendation_id.to_string()),
            amender_id: ID::new(amendment.amender_id.to_string()),
            state: amendment.state.to_string(),
            created_at: amendment.created_at,
        }
    }
}

#[derive(Debug, Clone, GraphQLInputObject)]
pub struct FictionFilterInput {
    pub published_since: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, GraphQLEnum)]
pub enum FictionOrderFieldData {
    Id,
    PublishedAt,
    EndorsementCount,
    VoteCount,
}

#[derive(Debug, Clone, Copy, GraphQLEnum)]
pub enum SortDirectionData {
    Asc,
    Desc,
}

#[derive(Debug, Clone, GraphQLInputObject)]
pub struct FictionOrderInput {
    pub field: FictionOrderFieldData,
    pub direction: Option<SortDirectionData>,
}

impl From<FictionOrderInput> for FictionOrder {
    fn from(input: FictionOrderInput) -> Self {
        Self {
            field: match input.field {
                FictionOrderFieldData::Id => FictionOrderField::Id,
                FictionOrderFieldData::PublishedAt => FictionOrderField::PublishedAt,
                FictionOrderFieldData::EndorsementCount => FictionOrderField::EndorsementCount,
                FictionOrderFieldData::VoteCount => FictionOrderField::VoteCount,
            },
            direction: match input.direction {
                Some(SortDirectionData::Desc) => SortDirection::Desc,
                Some(SortDirectionData::Asc) | None => SortDirection::Asc,
            },
        }
    }
}

/// Builds the store query from GraphQL arguments.
pub fn fiction_query(
    filter: Option<FictionFilterInput>,
    order: Option<FictionOrderInput>,
    limit: Option<i32>,
    offset: Option<i32>,
) -> FictionQuery {
    let defaults = FictionQuery::default();
    let (published_since, published_before) = filter
        .map(|f| (f.published_since, f.published_before))
        .unwrap_or_default();
    FictionQuery {
        published_since,
        published_before,
        order: order.map(Into::into).unwrap_or_default(),
        limit: limit.map(i64::from).unwrap_or(defaults.limit),
        offset: offset.map(i64::from).unwrap_or(defaults.offset),
    }
    .normalized()
}
