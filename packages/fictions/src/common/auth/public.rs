//! Citizen-facing rules.

use super::permissions::remaining_votes;
use super::{Action, Actor, Decision, PermissionAction, PermissionContext, Subject};
use crate::domains::amendments::models::AmendmentState;

pub(super) fn evaluate(actor: &Actor, action: PermissionAction, ctx: &PermissionContext) -> Decision {
    match action.subject {
        Subject::Fiction => fiction(actor, action.action, ctx),
        Subject::CollaborativeDraft => collaborative_draft(actor, action.action, ctx),
        Subject::Amendment => amendment(actor, action.action, ctx),
        _ => Decision::Abstain,
    }
}

fn fiction(actor: &Actor, action: Action, ctx: &PermissionContext) -> Decision {
    let Some((component, step)) = ctx.settings() else {
        return match action {
            Action::Create
            | Action::Edit
            | Action::Withdraw
            | Action::Amend
            | Action::Vote
            | Action::Unvote
            | Action::Endorse
            | Action::Unendorse => Decision::Deny,
            _ => Decision::Abstain,
        };
    };

    match action {
        Action::Create => Decision::allow_if(
            ctx.authorized(actor, Action::Create.as_str()) && step.creation_enabled,
        ),
        Action::Edit => Decision::allow_if(
            ctx.fiction
                .as_ref()
                .is_some_and(|f| ctx.editable_by(f, actor.user_id)),
        ),
        Action::Withdraw => Decision::allow_if(
            ctx.fiction
                .as_ref()
                .is_some_and(|f| f.authored_by(actor.user_id)),
        ),
        Action::Amend => Decision::allow_if(
            ctx.fiction.is_some()
                && ctx.authorized(actor, Action::Amend.as_str())
                && component.amendments_enabled
                && step.amendment_creation_enabled,
        ),
        Action::Vote => Decision::allow_if(
            ctx.fiction.is_some()
                && ctx.authorized(actor, Action::Vote.as_str())
                && step.voting_enabled()
                && remaining_votes(component, ctx.votes_cast_in_component) > 0,
        ),
        Action::Unvote => Decision::allow_if(
            ctx.fiction.is_some()
                && ctx.authorized(actor, Action::Vote.as_str())
                && step.voting_enabled(),
        ),
        Action::Endorse | Action::Unendorse => Decision::allow_if(
            ctx.fiction.is_some()
                && ctx.authorized(actor, Action::Endorse.as_str())
                && step.endorsing_enabled(),
        ),
        _ => Decision::Abstain,
    }
}

fn collaborative_draft(actor: &Actor, action: Action, ctx: &PermissionContext) -> Decision {
    let Some((component, step)) = ctx.settings() else {
        return Decision::Deny;
    };
    if !component.collaborative_drafts_enabled {
        return Decision::Deny;
    }

    if action == Action::Create {
        return Decision::allow_if(
            ctx.authorized(actor, Action::Create.as_str()) && step.creation_enabled,
        );
    }

    let Some(draft) = &ctx.draft else {
        return Decision::Deny;
    };
    let user = actor.user_id;

    match action {
        Action::Edit => Decision::allow_if(draft.is_open() && draft.is_coauthor(user)),
        Action::Publish | Action::Withdraw => {
            Decision::allow_if(draft.is_open() && draft.created_by(user))
        }
        Action::RequestAccess => Decision::allow_if(
            draft.is_open() && !draft.is_requester(user) && !draft.is_coauthor(user),
        ),
        Action::ReactToRequestAccess => {
            Decision::allow_if(draft.is_open() && draft.created_by(user))
        }
        _ => Decision::Abstain,
    }
}

fn amendment(actor: &Actor, action: Action, ctx: &PermissionContext) -> Decision {
    let Some(amendment) = &ctx.amendment else {
        return Decision::Deny;
    };
    let user = actor.user_id;

    match action {
        Action::Accept | Action::Reject => Decision::allow_if(
            amendment.state == AmendmentState::Evaluating
                && amendment.amendable_author_ids.contains(&user),
        ),
        Action::Withdraw => Decision::allow_if(
            amendment.state == AmendmentState::Evaluating
                && amendment.emendation_author_ids.contains(&user),
        ),
        Action::Promote => Decision::allow_if(
            amendment.state == AmendmentState::Rejected
                && amendment.emendation_author_ids.contains(&user),
        ),
        _ => Decision::Abstain,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::common::auth::*;
    use crate::common::{CollaborativeDraftId, FictionId, UserId};
    use crate::domains::amendments::models::AmendmentState;
    use crate::domains::collaborative_drafts::models::DraftState;
    use crate::domains::components::models::{ComponentSettings, StepSettings};

    fn citizen() -> Actor {
        Actor::new(UserId::new(1), false)
    }

    fn facts(author: UserId) -> FictionFacts {
        FictionFacts {
            id: FictionId::new(10),
            author_ids: vec![author],
            creator_id: Some(author),
            official: false,
            official_meeting: false,
            published_at: Some(Utc::now()),
            withdrawn: false,
            answer_published: false,
            vote_count: 0,
            endorsement_count: 0,
            copied_from_other_component: false,
        }
    }

    fn open_step() -> StepSettings {
        StepSettings {
            creation_enabled: true,
            votes_enabled: true,
            endorsements_enabled: true,
            ..Default::default()
        }
    }

    fn decide(actor: &Actor, action: Action, subject: Subject, ctx: &PermissionContext) -> Decision {
        actor
            .can(PermissionAction::public(action, subject))
            .on(ctx)
            .decide()
    }

    #[test]
    fn test_create_denied_without_creation_enabled() {
        let actor = citizen();
        let ctx = PermissionContext::new(Utc::now())
            .with_settings(ComponentSettings::default(), StepSettings::default());
        assert_eq!(decide(&actor, Action::Create, Subject::Fiction, &ctx), Decision::Deny);

        let ctx = PermissionContext::new(Utc::now())
            .with_settings(ComponentSettings::default(), open_step());
        assert_eq!(decide(&actor, Action::Create, Subject::Fiction, &ctx), Decision::Allow);
    }

    #[test]
    fn test_create_requires_authorization_handlers() {
        let mut settings = ComponentSettings::default();
        settings
            .permissions
            .insert("create".to_string(), vec!["id_documents".to_string()]);
        let ctx = PermissionContext::new(Utc::now()).with_settings(settings, open_step());

        assert_eq!(decide(&citizen(), Action::Create, Subject::Fiction, &ctx), Decision::Deny);

        let verified = citizen().with_authorizations(["id_documents"]);
        assert_eq!(decide(&verified, Action::Create, Subject::Fiction, &ctx), Decision::Allow);
    }

    #[test]
    fn test_missing_settings_deny() {
        let ctx = PermissionContext::new(Utc::now()).with_fiction(facts(UserId::new(1)));
        assert_eq!(decide(&citizen(), Action::Vote, Subject::Fiction, &ctx), Decision::Deny);
        assert_eq!(decide(&citizen(), Action::Edit, Subject::Fiction, &ctx), Decision::Deny);
    }

    #[test]
    fn test_vote_limit_counts_component_votes() {
        let settings = ComponentSettings {
            vote_limit: Some(2),
            ..Default::default()
        };
        let base = PermissionContext::new(Utc::now())
            .with_settings(settings, open_step())
            .with_fiction(facts(UserId::new(2)));

        let spent = base.clone().with_votes_cast(2);
        assert_eq!(decide(&citizen(), Action::Vote, Subject::Fiction, &spent), Decision::Deny);

        let one_left = base.with_votes_cast(1);
        assert_eq!(decide(&citizen(), Action::Vote, Subject::Fiction, &one_left), Decision::Allow);
    }

    #[test]
    fn test_unvote_ignores_remaining_votes() {
        let settings = ComponentSettings {
            vote_limit: Some(1),
            ..Default::default()
        };
        let ctx = PermissionContext::new(Utc::now())
            .with_settings(settings, open_step())
            .with_fiction(facts(UserId::new(2)))
            .with_votes_cast(1);
        assert_eq!(decide(&citizen(), Action::Unvote, Subject::Fiction, &ctx), Decision::Allow);
    }

    #[test]
    fn test_blocked_votes_deny() {
        let step = StepSettings {
            votes_blocked: true,
            ..open_step()
        };
        let ctx = PermissionContext::new(Utc::now())
            .with_settings(ComponentSettings::default(), step)
            .with_fiction(facts(UserId::new(2)));
        assert_eq!(decide(&citizen(), Action::Vote, Subject::Fiction, &ctx), Decision::Deny);
        assert_eq!(decide(&citizen(), Action::Unvote, Subject::Fiction, &ctx), Decision::Deny);
    }

    #[test]
    fn test_edit_only_by_creator_within_time_limit() {
        let now = Utc::now();
        let settings = ComponentSettings::default();

        let ctx = PermissionContext::new(now)
            .with_settings(settings.clone(), open_step())
            .with_fiction(facts(UserId::new(1)));
        assert_eq!(decide(&citizen(), Action::Edit, Subject::Fiction, &ctx), Decision::Allow);

        let other = Actor::new(UserId::new(9), false);
        assert_eq!(decide(&other, Action::Edit, Subject::Fiction, &ctx), Decision::Deny);

        let mut stale = facts(UserId::new(1));
        stale.published_at = Some(now - Duration::minutes(30));
        let ctx = PermissionContext::new(now)
            .with_settings(settings.clone(), open_step())
            .with_fiction(stale.clone());
        assert_eq!(decide(&citizen(), Action::Edit, Subject::Fiction, &ctx), Decision::Deny);

        stale.published_at = None;
        let ctx = PermissionContext::new(now)
            .with_settings(settings, open_step())
            .with_fiction(stale);
        assert_eq!(decide(&citizen(), Action::Edit, Subject::Fiction, &ctx), Decision::Allow);
    }

    #[test]
    fn test_edit_denied_once_answer_published_or_copied() {
        let mut answered = facts(UserId::new(1));
        answered.answer_published = true;
        let ctx = PermissionContext::new(Utc::now())
            .with_settings(ComponentSettings::default(), open_step())
            .with_fiction(answered);
        assert_eq!(decide(&citizen(), Action::Edit, Subject::Fiction, &ctx), Decision::Deny);

        let mut copied = facts(UserId::new(1));
        copied.copied_from_other_component = true;
        let ctx = PermissionContext::new(Utc::now())
            .with_settings(ComponentSettings::default(), open_step())
            .with_fiction(copied);
        assert_eq!(decide(&citizen(), Action::Edit, Subject::Fiction, &ctx), Decision::Deny);
    }

    #[test]
    fn test_withdraw_by_any_coauthor() {
        let mut shared = facts(UserId::new(2));
        shared.author_ids.push(UserId::new(1));
        let ctx = PermissionContext::new(Utc::now())
            .with_settings(ComponentSettings::default(), open_step())
            .with_fiction(shared);
        assert_eq!(decide(&citizen(), Action::Withdraw, Subject::Fiction, &ctx), Decision::Allow);
        assert_eq!(
            decide(&Actor::new(UserId::new(3), false), Action::Withdraw, Subject::Fiction, &ctx),
            Decision::Deny
        );
    }

    #[test]
    fn test_amend_needs_both_settings() {
        let enabled = ComponentSettings {
            amendments_enabled: true,
            ..Default::default()
        };
        let ctx = PermissionContext::new(Utc::now())
            .with_settings(enabled.clone(), open_step())
            .with_fiction(facts(UserId::new(2)));
        assert_eq!(decide(&citizen(), Action::Amend, Subject::Fiction, &ctx), Decision::Allow);

        let closed_step = StepSettings {
            amendment_creation_enabled: false,
            ..open_step()
        };
        let ctx = PermissionContext::new(Utc::now())
            .with_settings(enabled, closed_step)
            .with_fiction(facts(UserId::new(2)));
        assert_eq!(decide(&citizen(), Action::Amend, Subject::Fiction, &ctx), Decision::Deny);
    }

    #[test]
    fn test_endorse_blocked() {
        let step = StepSettings {
            endorsements_blocked: true,
            ..open_step()
        };
        let ctx = PermissionContext::new(Utc::now())
            .with_settings(ComponentSettings::default(), step)
            .with_fiction(facts(UserId::new(2)));
        assert_eq!(decide(&citizen(), Action::Endorse, Subject::Fiction, &ctx), Decision::Deny);
    }

    fn draft(creator: UserId) -> DraftFacts {
        DraftFacts {
            id: CollaborativeDraftId::new(5),
            state: DraftState::Open,
            coauthor_ids: vec![creator, UserId::new(4)],
            requester_ids: vec![UserId::new(6)],
        }
    }

    fn drafts_enabled() -> ComponentSettings {
        ComponentSettings {
            collaborative_drafts_enabled: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_drafts_denied_when_disabled() {
        let ctx = PermissionContext::new(Utc::now())
            .with_settings(ComponentSettings::default(), open_step())
            .with_draft(draft(UserId::new(1)));
        assert_eq!(
            decide(&citizen(), Action::Edit, Subject::CollaborativeDraft, &ctx),
            Decision::Deny
        );
    }

    #[test]
    fn test_request_access_rules() {
        let ctx = PermissionContext::new(Utc::now())
            .with_settings(drafts_enabled(), open_step())
            .with_draft(draft(UserId::new(1)));

        let stranger = Actor::new(UserId::new(8), false);
        let requester = Actor::new(UserId::new(6), false);
        let coauthor = Actor::new(UserId::new(4), false);

        assert_eq!(
            decide(&stranger, Action::RequestAccess, Subject::CollaborativeDraft, &ctx),
            Decision::Allow
        );
        assert_eq!(
            decide(&requester, Action::RequestAccess, Subject::CollaborativeDraft, &ctx),
            Decision::Deny
        );
        assert_eq!(
            decide(&coauthor, Action::RequestAccess, Subject::CollaborativeDraft, &ctx),
            Decision::Deny
        );
    }

    #[test]
    fn test_only_creator_reacts_to_requests() {
        let ctx = PermissionContext::new(Utc::now())
            .with_settings(drafts_enabled(), open_step())
            .with_draft(draft(UserId::new(1)));

        assert_eq!(
            decide(&citizen(), Action::ReactToRequestAccess, Subject::CollaborativeDraft, &ctx),
            Decision::Allow
        );
        assert_eq!(
            decide(
                &Actor::new(UserId::new(4), false),
                Action::ReactToRequestAccess,
                Subject::CollaborativeDraft,
                &ctx
            ),
            Decision::Deny
        );
        assert_eq!(
            decide(
                &Actor::new(UserId::new(4), false),
                Action::Edit,
                Subject::CollaborativeDraft,
                &ctx
            ),
            Decision::Allow
        );
    }

    #[test]
    fn test_closed_draft_denies_edit() {
        let mut closed = draft(UserId::new(1));
        closed.state = DraftState::Withdrawn;
        let ctx = PermissionContext::new(Utc::now())
            .with_settings(drafts_enabled(), open_step())
            .with_draft(closed);
        assert_eq!(
            decide(&citizen(), Action::Edit, Subject::CollaborativeDraft, &ctx),
            Decision::Deny
        );
    }

    #[test]
    fn test_amendment_reactions() {
        let facts = AmendmentFacts {
            state: AmendmentState::Evaluating,
            amendable_author_ids: vec![UserId::new(1)],
            emendation_author_ids: vec![UserId::new(2)],
        };
        let ctx = PermissionContext::new(Utc::now()).with_amendment(facts.clone());
        let amender = Actor::new(UserId::new(2), false);

        assert_eq!(decide(&citizen(), Action::Accept, Subject::Amendment, &ctx), Decision::Allow);
        assert_eq!(decide(&amender, Action::Accept, Subject::Amendment, &ctx), Decision::Deny);
        assert_eq!(decide(&amender, Action::Withdraw, Subject::Amendment, &ctx), Decision::Allow);
        assert_eq!(decide(&amender, Action::Promote, Subject::Amendment, &ctx), Decision::Deny);

        let rejected = PermissionContext::new(Utc::now()).with_amendment(AmendmentFacts {
            state: AmendmentState::Rejected,
            ..facts
        });
        assert_eq!(decide(&amender, Action::Promote, Subject::Amendment, &rejected), Decision::Allow);
    }

    #[test]
    fn test_other_scope_abstains() {
        let ctx = PermissionContext::new(Utc::now());
        let decision = citizen()
            .can(PermissionAction::new(
                PermissionScope::Other,
                Action::Create,
                Subject::Fiction,
            ))
            .on(&ctx)
            .decide();
        assert_eq!(decision, Decision::Abstain);
    }
}
