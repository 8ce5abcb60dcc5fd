use serde::{Deserialize, Serialize};

use crate::common::{
    AmendmentId, CollaborativeDraftId, ComponentId, FictionId, NoteId, UserId, ValuatorRoleId,
};
use crate::domains::fictions::models::FictionState;

/// Fictions domain events
///
/// Immutable facts published after a state change has been persisted.
/// Delivery is fire-and-forget through `kernel::Notifier`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FictionEvent {
    // =========================================================================
    // Fiction lifecycle
    // =========================================================================
    FictionPublished {
        component_id: ComponentId,
        fiction_id: FictionId,
        author_ids: Vec<UserId>,
    },

    /// A published fiction's body mentions another fiction.
    FictionMentioned {
        component_id: ComponentId,
        fiction_id: FictionId,
        mentioned_fiction_id: FictionId,
    },

    FictionAnswered {
        component_id: ComponentId,
        fiction_id: FictionId,
        state: FictionState,
        /// `false` while the verdict waits for publication.
        published: bool,
    },

    FictionAnswerPublished {
        component_id: ComponentId,
        fiction_id: FictionId,
        state: FictionState,
    },

    FictionWithdrawn {
        component_id: ComponentId,
        fiction_id: FictionId,
    },

    // =========================================================================
    // Supports
    // =========================================================================
    FictionVoted {
        component_id: ComponentId,
        fiction_id: FictionId,
        voter_id: UserId,
    },

    FictionEndorsed {
        component_id: ComponentId,
        fiction_id: FictionId,
        endorser_id: UserId,
    },

    // =========================================================================
    // Valuation
    // =========================================================================
    NoteCreated {
        component_id: ComponentId,
        fiction_id: FictionId,
        note_id: NoteId,
        author_id: UserId,
    },

    ValuatorAssigned {
        component_id: ComponentId,
        fiction_ids: Vec<FictionId>,
        valuator_role_id: ValuatorRoleId,
    },

    ValuatorUnassigned {
        component_id: ComponentId,
        fiction_ids: Vec<FictionId>,
        valuator_role_id: ValuatorRoleId,
    },

    // =========================================================================
    // Admin bulk operations
    // =========================================================================
    FictionsMerged {
        component_id: ComponentId,
        merged_fiction_id: FictionId,
        original_ids: Vec<FictionId>,
    },

    FictionsSplit {
        component_id: ComponentId,
        original_ids: Vec<FictionId>,
        new_fiction_ids: Vec<FictionId>,
    },

    FictionsImported {
        component_id: ComponentId,
        origin_component_id: ComponentId,
        count: usize,
    },

    // =========================================================================
    // Amendments
    // =========================================================================
    AmendmentCreated {
        component_id: ComponentId,
        amendment_id: AmendmentId,
        amendable_id: FictionId,
        emendation_id: FictionId,
    },

    AmendmentAccepted {
        component_id: ComponentId,
        amendment_id: AmendmentId,
        amendable_id: FictionId,
    },

    AmendmentRejected {
        component_id: ComponentId,
        amendment_id: AmendmentId,
        amendable_id: FictionId,
    },

    EmendationPromoted {
        component_id: ComponentId,
        amendment_id: AmendmentId,
        fiction_id: FictionId,
    },

    // =========================================================================
    // Collaborative drafts
    // =========================================================================
    DraftAccessRequested {
        component_id: ComponentId,
        draft_id: CollaborativeDraftId,
        requester_id: UserId,
    },

    DraftAccessAccepted {
        component_id: ComponentId,
        draft_id: CollaborativeDraftId,
        requester_id: UserId,
    },

    DraftAccessRejected {
        component_id: ComponentId,
        draft_id: CollaborativeDraftId,
        requester_id: UserId,
    },

    DraftWithdrawn {
        component_id: ComponentId,
        draft_id: CollaborativeDraftId,
    },

    DraftPublished {
        component_id: ComponentId,
        draft_id: CollaborativeDraftId,
        fiction_id: FictionId,
    },

    // =========================================================================
    // Step settings changes
    // =========================================================================
    CreationEnabled {
        component_id: ComponentId,
    },

    VotingEnabled {
        component_id: ComponentId,
    },

    EndorsingEnabled {
        component_id: ComponentId,
    },
}

impl FictionEvent {
    pub fn component_id(&self) -> ComponentId {
        match self {
            FictionEvent::FictionPublished { component_id, .. }
            | FictionEvent::FictionMentioned { component_id, .. }
            | FictionEvent::FictionAnswered { component_id, .. }
            | FictionEvent::FictionAnswerPublished { component_id, .. }
            | FictionEvent::FictionWithdrawn { component_id, .. }
            | FictionEvent::FictionVoted { component_id, .. }
            | FictionEvent::FictionEndorsed { component_id, .. }
            | FictionEvent::NoteCreated { component_id, .. }
            | FictionEvent::ValuatorAssigned { component_id, .. }
            | FictionEvent::ValuatorUnassigned { component_id, .. }
            | FictionEvent::FictionsMerged { component_id, .. }
            | FictionEvent::FictionsSplit { component_id, .. }
            | FictionEvent::FictionsImported { component_id, .. }
            | FictionEvent::AmendmentCreated { component_id, .. }
            | FictionEvent::AmendmentAccepted { component_id, .. }
            | FictionEvent::AmendmentRejected { component_id, .. }
            | FictionEvent::EmendationPromoted { component_id, .. }
            | FictionEvent::DraftAccessRequested { component_id, .. }
            | FictionEvent::DraftAccessAccepted { component_id, .. }
            | FictionEvent::DraftAccessRejected { component_id, .. }
            | FictionEvent::DraftWithdrawn { component_id, .. }
            | FictionEvent::DraftPublished { component_id, .. }
            | FictionEvent::CreationEnabled { component_id }
            | FictionEvent::VotingEnabled { component_id }
            | FictionEvent::EndorsingEnabled { component_id } => *component_id,
        }
    }

    /// Events only admins and valuators may watch: private notes,
    /// assignments and verdicts that are not public yet.
    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            FictionEvent::NoteCreated { .. }
                | FictionEvent::ValuatorAssigned { .. }
                | FictionEvent::ValuatorUnassigned { .. }
                | FictionEvent::FictionAnswered {
                    published: false,
                    ..
                }
        )
    }

    /// Stream topic the event is published under.
    pub fn topic(&self) -> String {
        format!("fictions:{}", self.component_id())
    }
}
