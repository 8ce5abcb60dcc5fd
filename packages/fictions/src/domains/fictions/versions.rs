//! Version history rendering.
//!
//! A fiction's verdict must not leak before it is published: while
//! `state_published_at` is unset, `state`, `answer` and `answered_at` changes
//! are held back and shown on the version that publishes the answer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::common::{UserId, VersionId};
use crate::domains::fictions::models::{FictionState, Version, VersionEvent};

/// Attributes hidden until the answer is published
const VERDICT: &[&str] = &["state", "answer", "answered_at"];

/// How a rendered value should be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Text,
    Date,
    State,
    Reference,
}

/// Tracked attributes in display order.
const TRACKED: &[(&str, &str, DiffKind)] = &[
    ("title", "Title", DiffKind::Text),
    ("body", "Body", DiffKind::Text),
    ("address", "Address", DiffKind::Text),
    ("state", "State", DiffKind::State),
    ("answer", "Answer", DiffKind::Text),
    ("answered_at", "Answered at", DiffKind::Date),
    ("state_published_at", "State published at", DiffKind::Date),
    ("published_at", "Published at", DiffKind::Date),
    ("category_id", "Category", DiffKind::Reference),
    ("scope_id", "Scope", DiffKind::Reference),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDiff {
    pub attribute: String,
    pub label: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub kind: DiffKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDiff {
    pub version_id: VersionId,
    /// Position of the version in the full history, starting at 1.
    pub index: usize,
    pub event: VersionEvent,
    pub whodunnit: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub diffs: Vec<AttributeDiff>,
}

/// Visible diffs of a fiction's history.
///
/// Pure: rendering the same history twice yields the same output.
pub fn render_versions(versions: &[Version]) -> Vec<VersionDiff> {
    let mut ordered: Vec<&Version> = versions.iter().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let mut state_published = false;
    let mut held: BTreeMap<&'static str, (JsonValue, JsonValue)> = BTreeMap::new();
    let mut rendered = Vec::new();

    for (position, version) in ordered.into_iter().enumerate() {
        let mut changes = version.changeset.0.clone();
        let published_change = changes
            .get("state_published_at")
            .map(|(_, new)| display_value(new).is_some());

        // A re-answer that is not published right away retracts the verdict.
        if state_published && published_change == Some(false) {
            state_published = false;
        }

        if !state_published {
            for attribute in VERDICT {
                if let Some((old, new)) = changes.remove(*attribute) {
                    held.entry(*attribute)
                        .and_modify(|(_, latest)| *latest = new.clone())
                        .or_insert((old, new));
                }
            }

            if published_change == Some(true) {
                state_published = true;
                for (attribute, change) in std::mem::take(&mut held) {
                    changes.insert(attribute.to_string(), change);
                }
            }
        }

        let diffs: Vec<AttributeDiff> = TRACKED
            .iter()
            .filter_map(|(attribute, label, kind)| {
                let (old, new) = changes.get(*attribute)?;
                let old_value = format_value(old, *kind);
                let new_value = format_value(new, *kind);
                (old_value != new_value).then(|| AttributeDiff {
                    attribute: attribute.to_string(),
                    label: label.to_string(),
                    old_value,
                    new_value,
                    kind: *kind,
                })
            })
            .collect();

        if !diffs.is_empty() {
            rendered.push(VersionDiff {
                version_id: version.id,
                index: position + 1,
                event: version.event,
                whodunnit: version.whodunnit,
                created_at: version.created_at,
                diffs,
            });
        }
    }

    rendered
}

/// Null and empty strings both render as `None`.
fn display_value(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) if s.is_empty() => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn format_value(value: &JsonValue, kind: DiffKind) -> Option<String> {
    let raw = display_value(value)?;
    let formatted = match kind {
        DiffKind::Date => match DateTime::parse_from_rfc3339(&raw) {
            Ok(date) => date.with_timezone(&Utc).format("%d/%m/%Y %H:%M").to_string(),
            Err(_) => raw,
        },
        DiffKind::State => match raw.parse::<FictionState>() {
            Ok(state) => state_label(state).to_string(),
            Err(_) => raw,
        },
        DiffKind::Text | DiffKind::Reference => raw,
    };
    Some(formatted)
}

pub fn state_label(state: FictionState) -> &'static str {
    match state {
        FictionState::NotAnswered => "Not answered",
        FictionState::Evaluating => "Evaluating",
        FictionState::Accepted => "Accepted",
        FictionState::Rejected => "Rejected",
        FictionState::Withdrawn => "Withdrawn",
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;
    use sqlx::types::Json;

    use super::*;
    use crate::common::FictionId;
    use crate::domains::fictions::models::Changeset;

    fn version(id: i64, minutes: i64, changes: &[(&str, JsonValue, JsonValue)]) -> Version {
        let changeset: Changeset = changes
            .iter()
            .map(|(k, old, new)| (k.to_string(), (old.clone(), new.clone())))
            .collect::<BTreeMap<_, _>>();
        Version {
            id: VersionId::new(id),
            fiction_id: FictionId::new(1),
            event: if id == 1 { VersionEvent::Create } else { VersionEvent::Update },
            changeset: Json(changeset),
            whodunnit: None,
            created_at: DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc)
                + Duration::minutes(minutes),
        }
    }

    fn history() -> Vec<Version> {
        vec![
            version(1, 0, &[("title", json!(null), json!("Plant more trees"))]),
            version(
                2,
                10,
                &[
                    ("state", json!("not_answered"), json!("accepted")),
                    ("answer", json!(null), json!("Good idea")),
                    ("answered_at", json!(null), json!("2024-03-01T10:10:00Z")),
                ],
            ),
            version(
                3,
                20,
                &[("state_published_at", json!(null), json!("2024-03-01T10:20:00Z"))],
            ),
        ]
    }

    #[test]
    fn test_unpublished_state_is_held_until_publication() {
        let rendered = render_versions(&history());

        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[1].version_id, VersionId::new(3));

        let published = &rendered[1];
        let attributes: Vec<&str> = published.diffs.iter().map(|d| d.attribute.as_str()).collect();
        assert_eq!(
            attributes,
            vec!["state", "answer", "answered_at", "state_published_at"]
        );
        assert_eq!(published.diffs[0].old_value.as_deref(), Some("Not answered"));
        assert_eq!(published.diffs[0].new_value.as_deref(), Some("Accepted"));
    }

    #[test]
    fn test_held_answer_keeps_first_old_and_latest_new() {
        let mut versions = history();
        versions.insert(
            2,
            version(5, 15, &[("answer", json!("Good idea"), json!("Great idea"))]),
        );
        let rendered = render_versions(&versions);

        let answer = rendered
            .last()
            .unwrap()
            .diffs
            .iter()
            .find(|d| d.attribute == "answer")
            .unwrap();
        assert_eq!(answer.old_value, None);
        assert_eq!(answer.new_value.as_deref(), Some("Great idea"));
    }

    #[test]
    fn test_unpublished_reanswer_is_held_again() {
        let mut versions = history();
        versions.push(version(
            4,
            30,
            &[
                ("state", json!("accepted"), json!("rejected")),
                ("answer", json!("Good idea"), json!("Not this year")),
                ("state_published_at", json!("2024-03-01T10:20:00Z"), json!(null)),
            ],
        ));
        let rendered = render_versions(&versions);

        let last = rendered.last().unwrap();
        assert_eq!(last.version_id, VersionId::new(4));
        let attributes: Vec<&str> = last.diffs.iter().map(|d| d.attribute.as_str()).collect();
        assert_eq!(attributes, vec!["state_published_at"]);

        versions.push(version(
            6,
            40,
            &[("state_published_at", json!(null), json!("2024-03-01T10:40:00Z"))],
        ));
        let rendered = render_versions(&versions);
        let released = rendered.last().unwrap();
        let state = released.diffs.iter().find(|d| d.attribute == "state").unwrap();
        assert_eq!(state.old_value.as_deref(), Some("Accepted"));
        assert_eq!(state.new_value.as_deref(), Some("Rejected"));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let versions = history();
        assert_eq!(render_versions(&versions), render_versions(&versions));
    }

    #[test]
    fn test_state_only_versions_are_dropped_while_unpublished() {
        let versions = vec![
            version(1, 0, &[("title", json!(null), json!("Plant more trees"))]),
            version(2, 5, &[("state", json!("not_answered"), json!("evaluating"))]),
        ];
        let rendered = render_versions(&versions);
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].version_id, VersionId::new(1));
    }

    #[test]
    fn test_state_changes_after_publication_show_in_place() {
        let mut versions = history();
        versions.push(version(4, 30, &[("state", json!("accepted"), json!("rejected"))]));
        let rendered = render_versions(&versions);
        let last = rendered.last().unwrap();
        assert_eq!(last.version_id, VersionId::new(4));
        assert_eq!(last.diffs[0].new_value.as_deref(), Some("Rejected"));
    }

    #[test]
    fn test_null_and_empty_are_equal() {
        let versions = vec![version(1, 0, &[("address", json!(null), json!(""))])];
        assert!(render_versions(&versions).is_empty());
    }

    #[test]
    fn test_untracked_attributes_are_ignored() {
        let versions = vec![version(1, 0, &[("vote_count", json!(0), json!(3))])];
        assert!(render_versions(&versions).is_empty());
    }
}
