/// Authorization module for the Fictions component
///
/// Provides a fluent API over a pure permission evaluator:
///
/// ```rust
/// use fictions_core::common::auth::{Action, Actor, PermissionAction, PermissionContext, Subject};
/// use fictions_core::common::UserId;
///
/// let actor = Actor::new(UserId::new(1), false);
/// let ctx = PermissionContext::new(chrono::Utc::now());
///
/// // No settings loaded: the create rule denies.
/// let result = actor
///     .can(PermissionAction::public(Action::Create, Subject::Fiction))
///     .on(&ctx)
///     .check();
/// assert!(result.is_err());
/// ```
///
/// Context (settings, fiction facts, vote counts) is loaded by
/// `kernel::PermissionContextLoader`; the evaluator itself never touches a
/// store.
mod admin;
mod builder;
mod capability;
mod errors;
mod permissions;
mod public;

pub use builder::{Actor, CapabilityBuilder, PermissionRequest};
pub use capability::{Action, PermissionAction, PermissionScope, Subject};
pub use errors::AuthError;
pub use permissions::{
    evaluate, remaining_votes, AmendmentFacts, Decision, DraftFacts, FictionFacts,
    PermissionContext,
};
