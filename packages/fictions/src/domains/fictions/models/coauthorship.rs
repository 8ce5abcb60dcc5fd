use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};

use crate::common::{FictionId, MeetingId, ParseEnumError, StoreResult, UserGroupId, UserId};

/// Who a fiction is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Author {
    User(UserId),
    /// The organization itself (official fictions).
    Organization,
    /// A meeting (fictions born in a meeting).
    Meeting(MeetingId),
}

impl Author {
    pub fn kind(&self) -> &'static str {
        match self {
            Author::User(_) => "user",
            Author::Organization => "organization",
            Author::Meeting(_) => "meeting",
        }
    }

    fn raw_id(&self) -> Option<i64> {
        match self {
            Author::User(id) => Some(id.get()),
            Author::Organization => None,
            Author::Meeting(id) => Some(id.get()),
        }
    }

    fn from_parts(kind: &str, id: Option<i64>) -> Result<Self, ParseEnumError> {
        match (kind, id) {
            ("user", Some(id)) => Ok(Author::User(UserId::new(id))),
            ("organization", _) => Ok(Author::Organization),
            ("meeting", Some(id)) => Ok(Author::Meeting(MeetingId::new(id))),
            _ => Err(ParseEnumError::new("author", kind)),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Author::User(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coauthorship {
    pub author: Author,
    /// Group the user authored on behalf of.
    pub user_group_id: Option<UserGroupId>,
}

impl Coauthorship {
    pub fn new(author: Author) -> Self {
        Self {
            author,
            user_group_id: None,
        }
    }

    pub fn user(user_id: UserId) -> Self {
        Self::new(Author::User(user_id))
    }
}

/// User coauthors in authorship order.
pub fn user_authors(coauthorships: &[Coauthorship]) -> Vec<UserId> {
    coauthorships
        .iter()
        .filter_map(|c| c.author.user_id())
        .collect()
}

/// First coauthor, when it is a user.
pub fn creator(coauthorships: &[Coauthorship]) -> Option<UserId> {
    coauthorships.first().and_then(|c| c.author.user_id())
}

pub fn is_official(coauthorships: &[Coauthorship]) -> bool {
    coauthorships
        .iter()
        .any(|c| c.author == Author::Organization)
}

pub fn is_official_meeting(coauthorships: &[Coauthorship]) -> bool {
    coauthorships
        .iter()
        .any(|c| matches!(c.author, Author::Meeting(_)))
}

#[derive(sqlx::FromRow)]
struct CoauthorshipRow {
    author_kind: String,
    author_id: Option<i64>,
    user_group_id: Option<UserGroupId>,
}

// =============================================================================
// SQL Queries
// =============================================================================

impl Coauthorship {
    pub async fn insert(
        fiction_id: FictionId,
        coauthorship: &Coauthorship,
        position: i32,
        tx: &mut Transaction<'_, Postgres>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO coauthorships (fiction_id, author_kind, author_id, user_group_id, position)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(fiction_id)
        .bind(coauthorship.author.kind())
        .bind(coauthorship.author.raw_id())
        .bind(coauthorship.user_group_id)
        .bind(position)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn find_by_fiction(fiction_id: FictionId, pool: &PgPool) -> StoreResult<Vec<Self>> {
        let rows = sqlx::query_as::<_, CoauthorshipRow>(
            r#"
            SELECT author_kind, author_id, user_group_id
            FROM coauthorships
            WHERE fiction_id = $1
            ORDER BY position
            "#,
        )
        .bind(fiction_id)
        .fetch_all(pool)
        .await?;

        rows.into_iter()
            .map(|row| -> StoreResult<Self> {
                let author = Author::from_parts(&row.author_kind, row.author_id)
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
                Ok(Coauthorship {
                    author,
                    user_group_id: row.user_group_id,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_official_and_creator() {
        let coauthors = vec![Coauthorship::new(Author::Organization), Coauthorship::user(UserId::new(4))];
        assert!(is_official(&coauthors));
        assert!(!is_official_meeting(&coauthors));
        assert_eq!(creator(&coauthors), None);
        assert_eq!(user_authors(&coauthors), vec![UserId::new(4)]);
    }

    #[test]
    fn test_author_serializes_tagged() {
        let json = serde_json::to_value(Author::Meeting(MeetingId::new(3))).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "meeting", "id": 3}));
    }

    #[test]
    fn test_author_from_parts_rejects_unknown_kind() {
        assert!(Author::from_parts("robot", Some(1)).is_err());
        assert_eq!(Author::from_parts("organization", None), Ok(Author::Organization));
    }
}
