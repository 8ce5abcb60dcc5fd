use std::collections::BTreeSet;

use super::{evaluate, AuthError, Decision, PermissionAction, PermissionContext};
use crate::common::entity_ids::{UserId, ValuatorRoleId};

/// Entry point for authorization checks
///
/// Usage:
/// ```
/// # use fictions_core::common::auth::*;
/// # use fictions_core::common::UserId;
/// # let ctx = PermissionContext::new(chrono::Utc::now());
/// let actor = Actor::new(UserId::new(7), true);
/// actor
///     .can(PermissionAction::admin(Action::Export, Subject::Fictions))
///     .on(&ctx)
///     .check()?;
/// # Ok::<(), AuthError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    /// Organization admin flag from the verified token.
    pub is_admin: bool,
    /// Valuator role the user holds in the component's space, if any.
    pub valuator_role: Option<ValuatorRoleId>,
    /// Authorization handlers the user has been granted by the host.
    pub authorizations: BTreeSet<String>,
}

impl Actor {
    pub fn new(user_id: UserId, is_admin: bool) -> Self {
        Self {
            user_id,
            is_admin,
            valuator_role: None,
            authorizations: BTreeSet::new(),
        }
    }

    pub fn with_valuator_role(mut self, role: Option<ValuatorRoleId>) -> Self {
        self.valuator_role = role;
        self
    }

    pub fn with_authorizations<I, S>(mut self, handlers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authorizations
            .extend(handlers.into_iter().map(Into::into));
        self
    }

    /// Holds a valuator role without being an organization admin.
    pub fn is_valuator(&self) -> bool {
        !self.is_admin && self.valuator_role.is_some()
    }

    /// Holds every handler in `required`.
    pub fn holds_all(&self, required: &[String]) -> bool {
        required.iter().all(|h| self.authorizations.contains(h))
    }

    /// Specify what the actor wants to do
    pub fn can(&self, action: PermissionAction) -> CapabilityBuilder<'_> {
        CapabilityBuilder {
            actor: Some(self),
            action,
        }
    }
}

/// Builder after specifying the action
pub struct CapabilityBuilder<'a> {
    actor: Option<&'a Actor>,
    action: PermissionAction,
}

impl<'a> CapabilityBuilder<'a> {
    /// Requests made without a signed-in user.
    pub fn anonymous(action: PermissionAction) -> Self {
        Self {
            actor: None,
            action,
        }
    }

    /// Attach the context the decision depends on
    pub fn on(self, context: &'a PermissionContext) -> PermissionRequest<'a> {
        PermissionRequest {
            actor: self.actor,
            action: self.action,
            context,
        }
    }
}

/// Everything the evaluator looks at for a single decision.
#[derive(Debug, Clone, Copy)]
pub struct PermissionRequest<'a> {
    pub actor: Option<&'a Actor>,
    pub action: PermissionAction,
    pub context: &'a PermissionContext,
}

impl PermissionRequest<'_> {
    pub fn decide(&self) -> Decision {
        evaluate(self)
    }

    /// `Abstain` counts as a denial.
    pub fn check(&self) -> Result<(), AuthError> {
        match self.decide() {
            Decision::Allow => Ok(()),
            Decision::Deny | Decision::Abstain => {
                if self.actor.is_none() {
                    Err(AuthError::AuthenticationRequired)
                } else {
                    tracing::debug!(action = %self.action, "permission denied");
                    Err(AuthError::NotAuthorized)
                }
            }
        }
    }
}
