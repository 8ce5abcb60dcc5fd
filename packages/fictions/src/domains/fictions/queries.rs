//! Query objects over published fictions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{ComponentId, FictionId, SortDirection, StoreResult};
use crate::domains::fictions::models::Fiction;
use crate::kernel::traits::*;

/// Default page size for list queries.
pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FictionOrderField {
    #[default]
    Id,
    PublishedAt,
    EndorsementCount,
    VoteCount,
}

impl FictionOrderField {
    pub fn column(self) -> &'static str {
        match self {
            FictionOrderField::Id => "id",
            FictionOrderField::PublishedAt => "published_at",
            FictionOrderField::EndorsementCount => "endorsement_count",
            FictionOrderField::VoteCount => "vote_count",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FictionOrder {
    pub field: FictionOrderField,
    pub direction: SortDirection,
}

/// Filter, order and page over a component's published fictions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FictionQuery {
    pub published_since: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
    pub order: FictionOrder,
    pub limit: i64,
    pub offset: i64,
}

impl Default for FictionQuery {
    fn default() -> Self {
        Self {
            published_since: None,
            published_before: None,
            order: FictionOrder::default(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl FictionQuery {
    /// Clamps paging values into the accepted range.
    pub fn normalized(mut self) -> Self {
        self.limit = self.limit.clamp(1, MAX_LIMIT);
        self.offset = self.offset.max(0);
        self
    }

    /// In-memory counterpart of the SQL filter.
    pub fn matches(&self, fiction: &Fiction) -> bool {
        let Some(published_at) = fiction.published_at else {
            return false;
        };
        self.published_since.map_or(true, |since| published_at >= since)
            && self.published_before.map_or(true, |before| published_at <= before)
    }

    /// In-memory counterpart of the SQL order, ties broken by id.
    pub fn sort(&self, fictions: &mut [Fiction]) {
        fictions.sort_by(|a, b| {
            let ordering = match self.order.field {
                FictionOrderField::Id => a.id.cmp(&b.id),
                FictionOrderField::PublishedAt => a.published_at.cmp(&b.published_at),
                FictionOrderField::EndorsementCount => a.endorsement_count.cmp(&b.endorsement_count),
                FictionOrderField::VoteCount => a.vote_count.cmp(&b.vote_count),
            }
            .then_with(|| a.id.cmp(&b.id));
            match self.order.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }
}

/// A published fiction of the component. Drafts and fictions of other
/// components are `None`.
pub async fn find_published_in_component(
    store: &dyn Store,
    component_id: ComponentId,
    id: FictionId,
) -> StoreResult<Option<Fiction>> {
    Ok(store
        .find_fiction(id)
        .await?
        .filter(|f| f.component_id == component_id && f.is_published()))
}

/// Character-trigram similarity in `[0, 1]`, mirroring Postgres `pg_trgm`:
/// words are lower-cased, padded with two leading blanks and one trailing
/// blank, and compared as trigram sets.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let total = left.union(&right).count();
    shared as f64 / total as f64
}

fn trigrams(text: &str) -> std::collections::BTreeSet<[char; 3]> {
    let mut set = std::collections::BTreeSet::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.to_lowercase().chars())
            .chain(" ".chars())
            .collect();
        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }
    set
}
