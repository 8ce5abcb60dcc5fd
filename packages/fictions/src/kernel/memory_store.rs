//! In-memory store used by tests and local tooling.
//!
//! Mirrors the Postgres constraints that matter to the domain: unique votes,
//! endorsements, assignments and access requests, counter caches, and
//! cascading deletes.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;

use crate::common::{
    AmendmentId, AttachmentId, CollaborativeDraftId, ComponentId, EndorsementId, FictionId, Id,
    NoteId, StoreError, StoreResult, UserGroupId, UserId, ValuationAssignmentId, ValuatorRoleId,
    VersionId, VoteId,
};
use crate::domains::amendments::models::{Amendment, AmendmentState};
use crate::domains::collaborative_drafts::models::{CollaborativeDraft, DraftState};
use crate::domains::components::models::{Component, ComponentSettings, StepSettings};
use crate::domains::fictions::models::{
    Attachment, Coauthorship, Fiction, FictionState, NewAttachment, NewFiction, NewVersion,
    Version, COPIED_FROM_COMPONENT,
};
use crate::domains::fictions::models::coauthorship::Author;
use crate::domains::fictions::queries::{trigram_similarity, FictionQuery};
use crate::domains::valuations::models::{Note, ValuationAssignment, ValuatorRole};
use crate::domains::votes::models::{Endorsement, Vote};
use crate::kernel::traits::*;

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    components: BTreeMap<ComponentId, Component>,
    fictions: BTreeMap<FictionId, Fiction>,
    coauthorships: HashMap<FictionId, Vec<Coauthorship>>,
    links: Vec<(FictionId, FictionId, String)>,
    versions: Vec<Version>,
    attachments: Vec<Attachment>,
    votes: Vec<Vote>,
    endorsements: Vec<Endorsement>,
    valuator_roles: Vec<ValuatorRole>,
    assignments: Vec<ValuationAssignment>,
    notes: Vec<Note>,
    drafts: BTreeMap<CollaborativeDraftId, CollaborativeDraft>,
    draft_coauthors: HashMap<CollaborativeDraftId, Vec<UserId>>,
    draft_requesters: HashMap<CollaborativeDraftId, Vec<UserId>>,
    amendments: BTreeMap<AmendmentId, Amendment>,
}

impl MemoryState {
    fn next_id<T>(&mut self) -> Id<T> {
        self.next_id += 1;
        Id::new(self.next_id)
    }

    fn fiction_mut(&mut self, id: FictionId) -> StoreResult<&mut Fiction> {
        self.fictions
            .get_mut(&id)
            .ok_or(StoreError::NotFound("fiction"))
    }

    fn is_copied_into(&self, original: FictionId, target: ComponentId) -> bool {
        self.links.iter().any(|(from, to, name)| {
            *to == original
                && name == COPIED_FROM_COMPONENT
                && self
                    .fictions
                    .get(from)
                    .is_some_and(|copy| copy.component_id == target)
        })
    }
}

/// Store keeping every record in process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<R>(&self, f: impl FnOnce(&MemoryState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        f(&state)
    }

    fn write<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    pub fn insert_component(
        &self,
        space_slug: &str,
        name: &str,
        settings: ComponentSettings,
        step_settings: StepSettings,
    ) -> Component {
        self.write(|state| {
            let now = Utc::now();
            let component = Component {
                id: state.next_id(),
                space_slug: space_slug.to_string(),
                name: name.to_string(),
                settings: Json(settings),
                step_settings: Json(step_settings),
                created_at: now,
                updated_at: now,
            };
            state.components.insert(component.id, component.clone());
            component
        })
    }

    pub fn insert_valuator_role(&self, user_id: UserId, space_slug: &str) -> ValuatorRole {
        self.write(|state| {
            let role = ValuatorRole {
                id: state.next_id(),
                user_id,
                space_slug: space_slug.to_string(),
                created_at: Utc::now(),
            };
            state.valuator_roles.push(role.clone());
            role
        })
    }
}

#[async_trait]
impl BaseComponentStore for MemoryStore {
    async fn find_component(&self, id: ComponentId) -> StoreResult<Option<Component>> {
        Ok(self.read(|s| s.components.get(&id).cloned()))
    }

    async fn update_step_settings(
        &self,
        id: ComponentId,
        step_settings: &StepSettings,
    ) -> StoreResult<Component> {
        self.write(|s| {
            let component = s
                .components
                .get_mut(&id)
                .ok_or(StoreError::NotFound("component"))?;
            component.step_settings = Json(step_settings.clone());
            component.updated_at = Utc::now();
            Ok(component.clone())
        })
    }
}

#[async_trait]
impl BaseFictionStore for MemoryStore {
    async fn find_fiction(&self, id: FictionId) -> StoreResult<Option<Fiction>> {
        Ok(self.read(|s| s.fictions.get(&id).cloned()))
    }

    async fn find_fictions(&self, ids: &[FictionId]) -> StoreResult<Vec<Fiction>> {
        Ok(self.read(|s| {
            s.fictions
                .values()
                .filter(|f| ids.contains(&f.id))
                .cloned()
                .collect()
        }))
    }

    async fn find_published(
        &self,
        component_id: ComponentId,
        query: &FictionQuery,
    ) -> StoreResult<Vec<Fiction>> {
        let mut fictions: Vec<Fiction> = self.read(|s| {
            s.fictions
                .values()
                .filter(|f| f.component_id == component_id && query.matches(f))
                .cloned()
                .collect()
        });
        query.sort(&mut fictions);
        Ok(fictions
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect())
    }

    async fn count_published(
        &self,
        component_id: ComponentId,
        query: &FictionQuery,
    ) -> StoreResult<i64> {
        Ok(self.read(|s| {
            s.fictions
                .values()
                .filter(|f| f.component_id == component_id && query.matches(f))
                .count() as i64
        }))
    }

    async fn find_similar(
        &self,
        component_id: ComponentId,
        title: &str,
        body: &str,
        threshold: f64,
        limit: i64,
    ) -> StoreResult<Vec<Fiction>> {
        let mut scored: Vec<(f64, Fiction)> = self.read(|s| {
            s.fictions
                .values()
                .filter(|f| f.component_id == component_id && f.is_published() && !f.is_withdrawn())
                .filter_map(|f| {
                    let score = trigram_similarity(&f.title, title)
                        .max(trigram_similarity(&f.body, body));
                    (score >= threshold).then(|| (score, f.clone()))
                })
                .collect()
        });
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        Ok(scored
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(_, f)| f)
            .collect())
    }

    async fn find_importable(
        &self,
        origin: ComponentId,
        target: ComponentId,
        states: &[FictionState],
    ) -> StoreResult<Vec<Fiction>> {
        Ok(self.read(|s| {
            s.fictions
                .values()
                .filter(|f| {
                    f.component_id == origin
                        && f.is_published()
                        && !f.is_withdrawn()
                        && states.contains(&f.internal_state)
                        && !s.is_copied_into(f.id, target)
                })
                .cloned()
                .collect()
        }))
    }

    async fn count_published_by_author(
        &self,
        component_id: ComponentId,
        author_id: UserId,
    ) -> StoreResult<i64> {
        Ok(self.read(|s| {
            s.fictions
                .values()
                .filter(|f| f.component_id == component_id && f.is_published() && !f.is_withdrawn())
                .filter(|f| {
                    s.coauthorships
                        .get(&f.id)
                        .is_some_and(|c| c.iter().any(|c| c.author == Author::User(author_id)))
                })
                .count() as i64
        }))
    }

    async fn insert_fiction(
        &self,
        new: &NewFiction,
        coauthors: &[Coauthorship],
    ) -> StoreResult<Fiction> {
        Ok(self.write(|s| {
            let now = Utc::now();
            let fiction = Fiction {
                id: s.next_id(),
                component_id: new.component_id,
                title: new.title.clone(),
                body: new.body.clone(),
                address: new.address.clone(),
                internal_state: FictionState::NotAnswered,
                answer: None,
                answered_at: None,
                state_published_at: None,
                published_at: new.published_at,
                reference: None,
                category_id: new.category_id,
                scope_id: new.scope_id,
                collaborative_draft_id: new.collaborative_draft_id,
                meeting_id: new.meeting_id,
                vote_count: 0,
                endorsement_count: 0,
                notes_count: 0,
                created_at: now,
                updated_at: now,
            };
            s.fictions.insert(fiction.id, fiction.clone());
            s.coauthorships.insert(fiction.id, coauthors.to_vec());
            fiction
        }))
    }

    async fn save_fiction(&self, fiction: &Fiction) -> StoreResult<Fiction> {
        self.write(|s| {
            let stored = s.fiction_mut(fiction.id)?;
            // Counter caches are owned by the store.
            let (votes, endorsements, notes) =
                (stored.vote_count, stored.endorsement_count, stored.notes_count);
            *stored = fiction.clone();
            stored.vote_count = votes;
            stored.endorsement_count = endorsements;
            stored.notes_count = notes;
            stored.updated_at = Utc::now();
            Ok(stored.clone())
        })
    }

    async fn delete_fiction(&self, id: FictionId) -> StoreResult<()> {
        self.write(|s| {
            s.fictions.remove(&id);
            s.coauthorships.remove(&id);
            s.links.retain(|(from, to, _)| *from != id && *to != id);
            s.versions.retain(|v| v.fiction_id != id);
            s.attachments.retain(|a| a.fiction_id != id);
            s.votes.retain(|v| v.fiction_id != id);
            s.endorsements.retain(|e| e.fiction_id != id);
            s.notes.retain(|n| n.fiction_id != id);
            s.assignments.retain(|a| a.fiction_id != id);
            s.amendments
                .retain(|_, a| a.amendable_id != id && a.emendation_id != id);
        });
        Ok(())
    }

    async fn coauthorships(&self, id: FictionId) -> StoreResult<Vec<Coauthorship>> {
        Ok(self.read(|s| s.coauthorships.get(&id).cloned().unwrap_or_default()))
    }

    async fn link_fictions(&self, from: FictionId, to: FictionId, name: &str) -> StoreResult<()> {
        self.write(|s| {
            let exists = s
                .links
                .iter()
                .any(|(f, t, n)| *f == from && *t == to && n == name);
            if !exists {
                s.links.push((from, to, name.to_string()));
            }
        });
        Ok(())
    }

    async fn linked_fictions(&self, from: FictionId, name: &str) -> StoreResult<Vec<FictionId>> {
        Ok(self.read(|s| {
            let mut ids: Vec<FictionId> = s
                .links
                .iter()
                .filter(|(f, _, n)| *f == from && n == name)
                .map(|(_, t, _)| *t)
                .collect();
            ids.sort();
            ids
        }))
    }

    async fn record_version(&self, version: &NewVersion) -> StoreResult<Version> {
        Ok(self.write(|s| {
            let id: VersionId = s.next_id();
            let version = Version {
                id,
                fiction_id: version.fiction_id,
                event: version.event,
                changeset: Json(version.changeset.clone()),
                whodunnit: version.whodunnit,
                created_at: Utc::now(),
            };
            s.versions.push(version.clone());
            version
        }))
    }

    async fn versions(&self, id: FictionId) -> StoreResult<Vec<Version>> {
        Ok(self.read(|s| {
            s.versions
                .iter()
                .filter(|v| v.fiction_id == id)
                .cloned()
                .collect()
        }))
    }

    async fn attachments(&self, id: FictionId) -> StoreResult<Vec<Attachment>> {
        Ok(self.read(|s| {
            s.attachments
                .iter()
                .filter(|a| a.fiction_id == id)
                .cloned()
                .collect()
        }))
    }

    async fn insert_attachment(&self, attachment: &NewAttachment) -> StoreResult<Attachment> {
        Ok(self.write(|s| {
            let id: AttachmentId = s.next_id();
            let attachment = Attachment {
                id,
                fiction_id: attachment.fiction_id,
                title: attachment.title.clone(),
                content_type: attachment.content_type.clone(),
                file_key: attachment.file_key.clone(),
                created_at: Utc::now(),
            };
            s.attachments.push(attachment.clone());
            attachment
        }))
    }
}

#[async_trait]
impl BaseVoteStore for MemoryStore {
    async fn insert_vote(&self, fiction_id: FictionId, author_id: UserId) -> StoreResult<Vote> {
        self.write(|s| {
            if s.votes
                .iter()
                .any(|v| v.fiction_id == fiction_id && v.author_id == author_id)
            {
                return Err(StoreError::Conflict("vote"));
            }
            let id: VoteId = s.next_id();
            s.fiction_mut(fiction_id)?.vote_count += 1;
            let vote = Vote {
                id,
                fiction_id,
                author_id,
                created_at: Utc::now(),
            };
            s.votes.push(vote.clone());
            Ok(vote)
        })
    }

    async fn delete_vote(&self, fiction_id: FictionId, author_id: UserId) -> StoreResult<bool> {
        self.write(|s| {
            let before = s.votes.len();
            s.votes
                .retain(|v| !(v.fiction_id == fiction_id && v.author_id == author_id));
            let removed = s.votes.len() < before;
            if removed {
                let fiction = s.fiction_mut(fiction_id)?;
                fiction.vote_count = (fiction.vote_count - 1).max(0);
            }
            Ok(removed)
        })
    }

    async fn count_votes_in_component(
        &self,
        component_id: ComponentId,
        author_id: UserId,
    ) -> StoreResult<i64> {
        Ok(self.read(|s| {
            s.votes
                .iter()
                .filter(|v| v.author_id == author_id)
                .filter(|v| {
                    s.fictions
                        .get(&v.fiction_id)
                        .is_some_and(|f| f.component_id == component_id)
                })
                .count() as i64
        }))
    }

    async fn insert_endorsement(
        &self,
        fiction_id: FictionId,
        author_id: UserId,
        user_group_id: Option<UserGroupId>,
    ) -> StoreResult<Endorsement> {
        self.write(|s| {
            if s.endorsements
                .iter()
                .any(|e| e.fiction_id == fiction_id && e.author_id == author_id)
            {
                return Err(StoreError::Conflict("endorsement"));
            }
            let id: EndorsementId = s.next_id();
            s.fiction_mut(fiction_id)?.endorsement_count += 1;
            let endorsement = Endorsement {
                id,
                fiction_id,
                author_id,
                user_group_id,
                created_at: Utc::now(),
            };
            s.endorsements.push(endorsement.clone());
            Ok(endorsement)
        })
    }

    async fn delete_endorsement(
        &self,
        fiction_id: FictionId,
        author_id: UserId,
    ) -> StoreResult<bool> {
        self.write(|s| {
            let before = s.endorsements.len();
            s.endorsements
                .retain(|e| !(e.fiction_id == fiction_id && e.author_id == author_id));
            let removed = s.endorsements.len() < before;
            if removed {
                let fiction = s.fiction_mut(fiction_id)?;
                fiction.endorsement_count = (fiction.endorsement_count - 1).max(0);
            }
            Ok(removed)
        })
    }
}

#[async_trait]
impl BaseValuationStore for MemoryStore {
    async fn find_valuator_role(
        &self,
        user_id: UserId,
        space_slug: &str,
    ) -> StoreResult<Option<ValuatorRole>> {
        Ok(self.read(|s| {
            s.valuator_roles
                .iter()
                .find(|r| r.user_id == user_id && r.space_slug == space_slug)
                .cloned()
        }))
    }

    async fn find_valuator_role_by_id(
        &self,
        id: ValuatorRoleId,
    ) -> StoreResult<Option<ValuatorRole>> {
        Ok(self.read(|s| s.valuator_roles.iter().find(|r| r.id == id).cloned()))
    }

    async fn assign_valuator(
        &self,
        fiction_id: FictionId,
        role_id: ValuatorRoleId,
    ) -> StoreResult<Option<ValuationAssignment>> {
        Ok(self.write(|s| {
            if s.assignments
                .iter()
                .any(|a| a.fiction_id == fiction_id && a.valuator_role_id == role_id)
            {
                return None;
            }
            let id: ValuationAssignmentId = s.next_id();
            let assignment = ValuationAssignment {
                id,
                fiction_id,
                valuator_role_id: role_id,
                created_at: Utc::now(),
            };
            s.assignments.push(assignment.clone());
            Some(assignment)
        }))
    }

    async fn unassign_valuator(
        &self,
        fiction_id: FictionId,
        role_id: ValuatorRoleId,
    ) -> StoreResult<bool> {
        Ok(self.write(|s| {
            let before = s.assignments.len();
            s.assignments
                .retain(|a| !(a.fiction_id == fiction_id && a.valuator_role_id == role_id));
            s.assignments.len() < before
        }))
    }

    async fn is_assigned(&self, fiction_id: FictionId, role_id: ValuatorRoleId) -> StoreResult<bool> {
        Ok(self.read(|s| {
            s.assignments
                .iter()
                .any(|a| a.fiction_id == fiction_id && a.valuator_role_id == role_id)
        }))
    }

    async fn valuator_roles_for(&self, fiction_id: FictionId) -> StoreResult<Vec<ValuatorRoleId>> {
        Ok(self.read(|s| {
            s.assignments
                .iter()
                .filter(|a| a.fiction_id == fiction_id)
                .map(|a| a.valuator_role_id)
                .collect()
        }))
    }

    async fn insert_note(
        &self,
        fiction_id: FictionId,
        author_id: UserId,
        body: &str,
    ) -> StoreResult<Note> {
        self.write(|s| {
            let id: NoteId = s.next_id();
            s.fiction_mut(fiction_id)?.notes_count += 1;
            let note = Note {
                id,
                fiction_id,
                author_id,
                body: body.to_string(),
                created_at: Utc::now(),
            };
            s.notes.push(note.clone());
            Ok(note)
        })
    }

    async fn notes(&self, fiction_id: FictionId) -> StoreResult<Vec<Note>> {
        Ok(self.read(|s| {
            s.notes
                .iter()
                .filter(|n| n.fiction_id == fiction_id)
                .cloned()
                .collect()
        }))
    }
}

#[async_trait]
impl BaseDraftStore for MemoryStore {
    async fn find_draft(&self, id: CollaborativeDraftId) -> StoreResult<Option<CollaborativeDraft>> {
        Ok(self.read(|s| s.drafts.get(&id).cloned()))
    }

    async fn insert_draft(
        &self,
        component_id: ComponentId,
        title: &str,
        body: &str,
        creator: UserId,
    ) -> StoreResult<CollaborativeDraft> {
        Ok(self.write(|s| {
            let now = Utc::now();
            let draft = CollaborativeDraft {
                id: s.next_id(),
                component_id,
                title: title.to_string(),
                body: body.to_string(),
                state: DraftState::Open,
                published_at: None,
                fiction_id: None,
                created_at: now,
                updated_at: now,
            };
            s.drafts.insert(draft.id, draft.clone());
            s.draft_coauthors.insert(draft.id, vec![creator]);
            draft
        }))
    }

    async fn save_draft(&self, draft: &CollaborativeDraft) -> StoreResult<CollaborativeDraft> {
        self.write(|s| {
            let stored = s
                .drafts
                .get_mut(&draft.id)
                .ok_or(StoreError::NotFound("collaborative draft"))?;
            *stored = draft.clone();
            stored.updated_at = Utc::now();
            Ok(stored.clone())
        })
    }

    async fn draft_coauthors(&self, id: CollaborativeDraftId) -> StoreResult<Vec<UserId>> {
        Ok(self.read(|s| s.draft_coauthors.get(&id).cloned().unwrap_or_default()))
    }

    async fn add_draft_coauthor(&self, id: CollaborativeDraftId, user_id: UserId) -> StoreResult<()> {
        self.write(|s| {
            let coauthors = s.draft_coauthors.entry(id).or_default();
            if !coauthors.contains(&user_id) {
                coauthors.push(user_id);
            }
        });
        Ok(())
    }

    async fn draft_requesters(&self, id: CollaborativeDraftId) -> StoreResult<Vec<UserId>> {
        Ok(self.read(|s| s.draft_requesters.get(&id).cloned().unwrap_or_default()))
    }

    async fn add_access_request(&self, id: CollaborativeDraftId, user_id: UserId) -> StoreResult<()> {
        self.write(|s| {
            let requesters = s.draft_requesters.entry(id).or_default();
            if requesters.contains(&user_id) {
                return Err(StoreError::Conflict("access request"));
            }
            requesters.push(user_id);
            Ok(())
        })
    }

    async fn remove_access_request(
        &self,
        id: CollaborativeDraftId,
        user_id: UserId,
    ) -> StoreResult<bool> {
        Ok(self.write(|s| {
            let requesters = s.draft_requesters.entry(id).or_default();
            let before = requesters.len();
            requesters.retain(|u| *u != user_id);
            requesters.len() < before
        }))
    }
}

#[async_trait]
impl BaseAmendmentStore for MemoryStore {
    async fn insert_amendment(
        &self,
        amendable_id: FictionId,
        emendation_id: FictionId,
        amender_id: UserId,
        state: AmendmentState,
    ) -> StoreResult<Amendment> {
        Ok(self.write(|s| {
            let now = Utc::now();
            let amendment = Amendment {
                id: s.next_id(),
                amendable_id,
                emendation_id,
                amender_id,
                state,
                created_at: now,
                updated_at: now,
            };
            s.amendments.insert(amendment.id, amendment.clone());
            amendment
        }))
    }

    async fn find_amendment(&self, id: AmendmentId) -> StoreResult<Option<Amendment>> {
        Ok(self.read(|s| s.amendments.get(&id).cloned()))
    }

    async fn find_amendment_by_emendation(
        &self,
        emendation_id: FictionId,
    ) -> StoreResult<Option<Amendment>> {
        Ok(self.read(|s| {
            s.amendments
                .values()
                .find(|a| a.emendation_id == emendation_id)
                .cloned()
        }))
    }

    async fn amendments_for(&self, amendable_id: FictionId) -> StoreResult<Vec<Amendment>> {
        Ok(self.read(|s| {
            s.amendments
                .values()
                .filter(|a| a.amendable_id == amendable_id)
                .cloned()
                .collect()
        }))
    }

    async fn update_amendment_state(
        &self,
        id: AmendmentId,
        state: AmendmentState,
    ) -> StoreResult<Amendment> {
        self.write(|s| {
            let amendment = s
                .amendments
                .get_mut(&id)
                .ok_or(StoreError::NotFound("amendment"))?;
            amendment.state = state;
            amendment.updated_at = Utc::now();
            Ok(amendment.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published(component_id: ComponentId, title: &str) -> NewFiction {
        NewFiction::builder()
            .component_id(component_id)
            .title(title)
            .body("A body long enough to be a fiction.")
            .published_at(Some(Utc::now()))
            .build()
    }

    #[tokio::test]
    async fn test_duplicate_vote_is_conflict_and_counts_once() {
        let store = MemoryStore::new();
        let component = store.insert_component("space", "Fictions", Default::default(), Default::default());
        let fiction = store
            .insert_fiction(&published(component.id, "Plant more trees please"), &[])
            .await
            .unwrap();
        let voter = UserId::new(50);

        store.insert_vote(fiction.id, voter).await.unwrap();
        let duplicate = store.insert_vote(fiction.id, voter).await;
        assert!(matches!(duplicate, Err(StoreError::Conflict("vote"))));

        let stored = store.find_fiction(fiction.id).await.unwrap().unwrap();
        assert_eq!(stored.vote_count, 1);
        assert_eq!(store.count_votes_in_component(component.id, voter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_keeps_counter_caches() {
        let store = MemoryStore::new();
        let component = store.insert_component("space", "Fictions", Default::default(), Default::default());
        let fiction = store
            .insert_fiction(&published(component.id, "Plant more trees please"), &[])
            .await
            .unwrap();
        store.insert_vote(fiction.id, UserId::new(1)).await.unwrap();

        let mut stale = fiction.clone();
        stale.title = "Plant even more trees please".to_string();
        let saved = store.save_fiction(&stale).await.unwrap();
        assert_eq!(saved.vote_count, 1);
        assert_eq!(saved.title, "Plant even more trees please");
    }

    #[tokio::test]
    async fn test_importable_skips_already_copied() {
        let store = MemoryStore::new();
        let origin = store.insert_component("space", "Origin", Default::default(), Default::default());
        let target = store.insert_component("space", "Target", Default::default(), Default::default());
        let first = store
            .insert_fiction(&published(origin.id, "First fiction to import"), &[])
            .await
            .unwrap();
        let second = store
            .insert_fiction(&published(origin.id, "Second fiction to import"), &[])
            .await
            .unwrap();
        let copy = store
            .insert_fiction(&published(target.id, "First fiction to import"), &[])
            .await
            .unwrap();
        store
            .link_fictions(copy.id, first.id, COPIED_FROM_COMPONENT)
            .await
            .unwrap();

        let importable = store
            .find_importable(origin.id, target.id, &[FictionState::NotAnswered])
            .await
            .unwrap();
        assert_eq!(importable.iter().map(|f| f.id).collect::<Vec<_>>(), vec![second.id]);
    }
}
