//! Access requests - outsiders ask to join a draft, its creator decides.

use tracing::info;

use super::drafts::{authorize, load_draft};
use crate::common::auth::{Action, Actor};
use crate::common::{ActionError, CollaborativeDraftId, ComponentId, StoreError, UserId};
use crate::domains::collaborative_drafts::models::CollaborativeDraft;
use crate::domains::components::models::Component;
use crate::domains::fictions::actions::support::load_component;
use crate::domains::fictions::events::FictionEvent;
use crate::kernel::traits::*;
use crate::kernel::ServerDeps;

pub async fn request_access(
    component_id: ComponentId,
    draft_id: CollaborativeDraftId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<CollaborativeDraft, ActionError> {
    info!(draft_id = %draft_id, user_id = %actor.user_id, "Requesting draft access");

    let component = load_component(component_id, deps).await?;
    let draft = load_draft(&component, draft_id, deps).await?;
    authorize(&component, &draft, Action::RequestAccess, actor, deps).await?;

    match deps.store.add_access_request(draft.id, actor.user_id).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return Err(ActionError::invalid("base", "access has already been requested"));
        }
        Err(e) => return Err(e.into()),
    }

    deps.notifier.notify(FictionEvent::DraftAccessRequested {
        component_id: component.id,
        draft_id: draft.id,
        requester_id: actor.user_id,
    });
    Ok(draft)
}

/// Common part of accepting and rejecting: the creator reacts to a pending
/// request, which is consumed either way.
async fn react(
    component_id: ComponentId,
    draft_id: CollaborativeDraftId,
    requester_id: UserId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<(Component, CollaborativeDraft), ActionError> {
    let component = load_component(component_id, deps).await?;
    let draft = load_draft(&component, draft_id, deps).await?;
    authorize(&component, &draft, Action::ReactToRequestAccess, actor, deps).await?;

    if !deps.store.remove_access_request(draft.id, requester_id).await? {
        return Err(ActionError::invalid(
            "requester_id",
            "has not requested access",
        ));
    }
    Ok((component, draft))
}

pub async fn accept_access_request(
    component_id: ComponentId,
    draft_id: CollaborativeDraftId,
    requester_id: UserId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<CollaborativeDraft, ActionError> {
    info!(draft_id = %draft_id, requester_id = %requester_id, "Accepting draft access request");

    let (component, draft) = react(component_id, draft_id, requester_id, actor, deps).await?;
    deps.store.add_draft_coauthor(draft.id, requester_id).await?;

    deps.notifier.notify(FictionEvent::DraftAccessAccepted {
        component_id: component.id,
        draft_id: draft.id,
        requester_id,
    });
    Ok(draft)
}

pub async fn reject_access_request(
    component_id: ComponentId,
    draft_id: CollaborativeDraftId,
    requester_id: UserId,
    actor: &Actor,
    deps: &ServerDeps,
) -> Result<CollaborativeDraft, ActionError> {
    info!(draft_id = %draft_id, requester_id = %requester_id, "Rejecting draft access request");

    let (component, draft) = react(component_id, draft_id, requester_id, actor, deps).await?;

    deps.notifier.notify(FictionEvent::DraftAccessRejected {
        component_id: component.id,
        draft_id: draft.id,
        requester_id,
    });
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::collaborative_drafts::actions::drafts::tests::{
        drafts_component, open_draft, CREATOR,
    };
    use crate::kernel::test_dependencies::TestDependencies;

    const REQUESTER: UserId = UserId::new(12);

    #[tokio::test]
    async fn test_accepted_requester_becomes_coauthor() {
        let test = TestDependencies::new();
        let component = drafts_component(&test);
        let draft = open_draft(&test, &component).await;
        let requester = Actor::new(REQUESTER, false);

        request_access(component.id, draft.id, &requester, &test.deps)
            .await
            .unwrap();
        let twice = request_access(component.id, draft.id, &requester, &test.deps).await;
        assert!(matches!(twice, Err(ActionError::NotAuthorized)));

        let by_requester =
            accept_access_request(component.id, draft.id, REQUESTER, &requester, &test.deps).await;
        assert!(matches!(by_requester, Err(ActionError::NotAuthorized)));

        accept_access_request(
            component.id,
            draft.id,
            REQUESTER,
            &Actor::new(CREATOR, false),
            &test.deps,
        )
        .await
        .unwrap();

        assert_eq!(
            test.store.draft_coauthors(draft.id).await.unwrap(),
            vec![CREATOR, REQUESTER]
        );
        assert!(test.store.draft_requesters(draft.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejecting_unknown_request_is_invalid() {
        let test = TestDependencies::new();
        let component = drafts_component(&test);
        let draft = open_draft(&test, &component).await;
        let creator = Actor::new(CREATOR, false);

        let result =
            reject_access_request(component.id, draft.id, REQUESTER, &creator, &test.deps).await;
        assert!(matches!(result, Err(ActionError::Invalid(_))));

        request_access(component.id, draft.id, &Actor::new(REQUESTER, false), &test.deps)
            .await
            .unwrap();
        reject_access_request(component.id, draft.id, REQUESTER, &creator, &test.deps)
            .await
            .unwrap();
        assert!(test.store.draft_coauthors(draft.id).await.unwrap() == vec![CREATOR]);
    }
}
