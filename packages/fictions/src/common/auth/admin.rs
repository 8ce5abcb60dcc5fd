//! Back-office rules for organization admins and space valuators.

use super::{Action, Actor, Decision, PermissionAction, PermissionContext, Subject};

pub(super) fn evaluate(actor: &Actor, action: PermissionAction, ctx: &PermissionContext) -> Decision {
    if actor.is_admin {
        admin(action, ctx)
    } else if actor.is_valuator() {
        valuator(actor, action, ctx)
    } else {
        Decision::Abstain
    }
}

fn answering_enabled(ctx: &PermissionContext) -> bool {
    ctx.settings()
        .is_some_and(|(c, s)| c.fiction_answering_enabled && s.fiction_answering_enabled)
}

/// Valuators act only on fictions assigned to their role.
fn valuator(actor: &Actor, action: PermissionAction, ctx: &PermissionContext) -> Decision {
    let assigned = ctx.fiction.is_some() && ctx.valuator_assigned;

    match (action.subject, action.action) {
        (Subject::FictionNote, Action::Create) => Decision::allow_if(assigned),
        (Subject::FictionAnswer, Action::Create) => {
            Decision::allow_if(assigned && answering_enabled(ctx))
        }
        (Subject::Fictions, Action::Export) => Decision::Allow,
        (Subject::Fictions, Action::UnassignFromValuator) => {
            if ctx.target_valuator_role.is_some() && ctx.target_valuator_role == actor.valuator_role {
                Decision::Allow
            } else {
                Decision::Abstain
            }
        }
        (Subject::Fictions, Action::PublishAnswers) => Decision::Deny,
        _ => Decision::Abstain,
    }
}

fn admin(action: PermissionAction, ctx: &PermissionContext) -> Decision {
    match (action.subject, action.action) {
        (Subject::FictionNote, Action::Create) => Decision::Allow,
        (Subject::Fiction, Action::Create) => Decision::allow_if(
            ctx.settings()
                .is_some_and(|(c, s)| s.creation_enabled && c.official_fictions_enabled),
        ),
        (Subject::Fiction, Action::Edit) => Decision::allow_if(
            ctx.fiction
                .as_ref()
                .is_some_and(|f| (f.official || f.official_meeting) && f.vote_count == 0),
        ),
        (Subject::FictionAnswer, Action::Create) => Decision::allow_if(answering_enabled(ctx)),
        (Subject::FictionCategory, Action::Update) | (Subject::FictionScope, Action::Update) => {
            Decision::Allow
        }
        (
            Subject::Fictions,
            Action::Import
            | Action::Export
            | Action::Merge
            | Action::Split
            | Action::AssignToValuator
            | Action::UnassignFromValuator
            | Action::PublishAnswers,
        ) => Decision::Allow,
        (Subject::ComponentSettings, Action::Update) => Decision::Allow,
        _ => Decision::Abstain,
    }
}
