use std::fmt;

use serde::{Deserialize, Serialize};

/// Which rule set handles a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    /// Citizen-facing actions.
    Public,
    /// Admin and valuator back-office actions.
    Admin,
    /// Anything the host platform owns; the evaluator never has an opinion.
    Other,
}

/// The kind of record an action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Fiction,
    /// Bulk admin actions over a selection of fictions.
    Fictions,
    CollaborativeDraft,
    Amendment,
    FictionNote,
    FictionAnswer,
    FictionCategory,
    FictionScope,
    ComponentSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Edit,
    Update,
    Withdraw,
    Publish,
    Amend,
    Vote,
    Unvote,
    Endorse,
    Unendorse,
    RequestAccess,
    ReactToRequestAccess,
    Accept,
    Reject,
    Promote,
    Import,
    Export,
    Merge,
    Split,
    AssignToValuator,
    UnassignFromValuator,
    PublishAnswers,
}

impl Action {
    /// Name used as key in a component's authorization-handler map.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Update => "update",
            Action::Withdraw => "withdraw",
            Action::Publish => "publish",
            Action::Amend => "amend",
            Action::Vote => "vote",
            Action::Unvote => "unvote",
            Action::Endorse => "endorse",
            Action::Unendorse => "unendorse",
            Action::RequestAccess => "request_access",
            Action::ReactToRequestAccess => "react_to_request_access",
            Action::Accept => "accept",
            Action::Reject => "reject",
            Action::Promote => "promote",
            Action::Import => "import",
            Action::Export => "export",
            Action::Merge => "merge",
            Action::Split => "split",
            Action::AssignToValuator => "assign_to_valuator",
            Action::UnassignFromValuator => "unassign_from_valuator",
            Action::PublishAnswers => "publish_answers",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested (scope, action, subject) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionAction {
    pub scope: PermissionScope,
    pub action: Action,
    pub subject: Subject,
}

impl PermissionAction {
    pub fn new(scope: PermissionScope, action: Action, subject: Subject) -> Self {
        Self {
            scope,
            action,
            subject,
        }
    }

    pub fn public(action: Action, subject: Subject) -> Self {
        Self::new(PermissionScope::Public, action, subject)
    }

    pub fn admin(action: Action, subject: Subject) -> Self {
        Self::new(PermissionScope::Admin, action, subject)
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}:{:?}", self.scope, self.action, self.subject)
    }
}
