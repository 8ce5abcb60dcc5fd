//! Typed ID definitions for all domain entities.
//!
//! ```rust
//! use fictions_core::common::{FictionId, VoteId};
//!
//! let fiction_id = FictionId::new(1);
//! // let wrong: VoteId = fiction_id; // compile error
//! # let _ = (fiction_id, VoteId::new(1));
//! ```

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Fiction records (citizen proposals).
pub struct Fiction;

/// Marker type for the host component a fiction lives in.
pub struct Component;

/// Marker type for host platform users.
pub struct User;

/// Marker type for host platform user groups.
pub struct UserGroup;

/// Marker type for meetings that originate official fictions.
pub struct Meeting;

pub struct Category;

pub struct Scope;

pub struct Vote;

pub struct Endorsement;

/// Marker type for private admin/valuator notes.
pub struct Note;

/// Marker type for a valuator role inside a participatory space.
pub struct ValuatorRole;

pub struct ValuationAssignment;

pub struct CollaborativeDraft;

pub struct Amendment;

/// Marker type for change-history entries.
pub struct Version;

pub struct Attachment;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type FictionId = Id<Fiction>;
pub type ComponentId = Id<Component>;
pub type UserId = Id<User>;
pub type UserGroupId = Id<UserGroup>;
pub type MeetingId = Id<Meeting>;
pub type CategoryId = Id<Category>;
pub type ScopeId = Id<Scope>;
pub type VoteId = Id<Vote>;
pub type EndorsementId = Id<Endorsement>;
pub type NoteId = Id<Note>;
pub type ValuatorRoleId = Id<ValuatorRole>;
pub type ValuationAssignmentId = Id<ValuationAssignment>;
pub type CollaborativeDraftId = Id<CollaborativeDraft>;
pub type AmendmentId = Id<Amendment>;
pub type VersionId = Id<Version>;
pub type AttachmentId = Id<Attachment>;
