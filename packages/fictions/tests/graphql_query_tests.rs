//! Read-only GraphQL API: listings, single fictions, history and similarity.

mod common;

use fictions_core::common::{Actor, UserId};
use fictions_core::domains::components::models::{Component, ComponentSettings, StepSettings};
use fictions_core::domains::fictions::actions::{
    answer_fiction, create_fiction, create_official_fiction, publish_fiction,
};
use fictions_core::domains::fictions::data::{AnswerInput, FictionInput};
use fictions_core::domains::fictions::{Fiction, FictionState};
use test_context::test_context;

use crate::common::TestHarness;

const FICTIONS_QUERY: &str = r#"
    query Fictions($componentId: ID!, $limit: Int, $offset: Int) {
        fictions(componentId: $componentId, limit: $limit, offset: $offset) {
            totalCount
            hasNextPage
            nodes { id title state voteCount official authors { kind id } }
        }
    }
"#;

const FICTION_QUERY: &str = r#"
    query Fiction($componentId: ID!, $id: ID!) {
        fiction(componentId: $componentId, id: $id) {
            id
            title
            body
            state
            answer
            voteCount
            versions { index event changes { attribute newValue } }
        }
    }
"#;

fn input(title: &str, body: &str) -> FictionInput {
    FictionInput {
        title: title.to_string(),
        body: body.to_string(),
        ..Default::default()
    }
}

async fn citizen_fiction(ctx: &TestHarness, component: &Component, user: i64, form: FictionInput) -> Fiction {
    let actor = Actor::new(UserId::new(user), false);
    let draft = create_fiction(component.id, form, &actor, &ctx.deps)
        .await
        .expect("Failed to create fiction");
    publish_fiction(component.id, draft.id, &actor, &ctx.deps)
        .await
        .expect("Failed to publish fiction")
}

fn creation_step() -> StepSettings {
    StepSettings {
        creation_enabled: true,
        ..Default::default()
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn fictions_are_paginated(ctx: &mut TestHarness) {
    let component = ctx.component(ComponentSettings::default(), creation_step());
    for (user, title) in [
        (2, "Keep the library open on Sundays"),
        (3, "Plant more trees along the river"),
        (4, "Paint the crossings near the school"),
    ] {
        citizen_fiction(
            ctx,
            &component,
            user,
            input(title, "A body long enough to pass validation."),
        )
        .await;
    }

    let data = ctx
        .graphql()
        .query_with_vars(
            FICTIONS_QUERY,
            vars! {
                "componentId" => component.id.to_string(),
                "limit" => 2,
                "offset" => 0,
            },
        )
        .await;

    assert_eq!(data["fictions"]["totalCount"], 3);
    assert_eq!(data["fictions"]["hasNextPage"], true);
    let nodes = data["fictions"]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0]["title"], "Keep the library open on Sundays");
    assert_eq!(nodes[0]["official"], false);
    assert_eq!(nodes[0]["authors"][0]["kind"], "user");
    assert_eq!(nodes[0]["authors"][0]["id"], "2");

    let data = ctx
        .graphql()
        .query_with_vars(
            FICTIONS_QUERY,
            vars! {
                "componentId" => component.id.to_string(),
                "limit" => 2,
                "offset" => 2,
            },
        )
        .await;
    assert_eq!(data["fictions"]["hasNextPage"], false);
    assert_eq!(data["fictions"]["nodes"].as_array().unwrap().len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn unknown_component_yields_null(ctx: &mut TestHarness) {
    let data = ctx
        .graphql()
        .query_with_vars(FICTIONS_QUERY, vars! { "componentId" => "31337" })
        .await;
    assert!(data["fictions"].is_null());

    let data = ctx
        .graphql()
        .query_with_vars(
            FICTION_QUERY,
            vars! { "componentId" => "31337", "id" => "1" },
        )
        .await;
    assert!(data["fiction"].is_null());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn malformed_component_id_is_an_error(ctx: &mut TestHarness) {
    let result = ctx
        .graphql()
        .execute_with_vars(FICTIONS_QUERY, vars! { "componentId" => "abc" })
        .await;

    assert!(!result.is_ok());
    let message = result.error_on("fictions").unwrap_or_default();
    assert!(message.contains("Invalid component id"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn unpublished_fiction_is_null(ctx: &mut TestHarness) {
    let component = ctx.component(ComponentSettings::default(), creation_step());
    let draft = create_fiction(
        component.id,
        input("Keep the library open on Sundays", "A body long enough to pass validation."),
        &Actor::new(UserId::new(2), false),
        &ctx.deps,
    )
    .await
    .unwrap();

    let data = ctx
        .graphql()
        .query_with_vars(
            FICTION_QUERY,
            vars! {
                "componentId" => component.id.to_string(),
                "id" => draft.id.to_string(),
            },
        )
        .await;
    assert!(data["fiction"].is_null());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn hidden_votes_are_null(ctx: &mut TestHarness) {
    let component = ctx.component(
        ComponentSettings::default(),
        StepSettings {
            votes_enabled: true,
            votes_hidden: true,
            ..Default::default()
        },
    );
    let admin = Actor::new(UserId::new(1), true);
    create_official_fiction(
        component.id,
        input("Extend the night bus network", "Two new lines serving the outer districts."),
        &admin,
        &ctx.deps,
    )
    .await
    .unwrap();

    let data = ctx
        .graphql()
        .query_with_vars(
            FICTIONS_QUERY,
            vars! { "componentId" => component.id.to_string() },
        )
        .await;

    let node = &data["fictions"]["nodes"][0];
    assert!(node["voteCount"].is_null());
    assert_eq!(node["official"], true);
    assert_eq!(node["authors"][0]["kind"], "organization");
    assert!(node["authors"][0]["id"].is_null());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn versions_hold_back_unpublished_answers(ctx: &mut TestHarness) {
    let component = ctx.component(
        ComponentSettings::default(),
        StepSettings {
            creation_enabled: true,
            publish_answers_immediately: false,
            ..Default::default()
        },
    );
    let fiction = citizen_fiction(
        ctx,
        &component,
        2,
        input("Keep the library open on Sundays", "A body long enough to pass validation."),
    )
    .await;
    answer_fiction(
        component.id,
        fiction.id,
        AnswerInput {
            state: FictionState::Accepted,
            answer: Some("Starting next month".to_string()),
        },
        &Actor::new(UserId::new(1), true),
        &ctx.deps,
    )
    .await
    .unwrap();

    let data = ctx
        .graphql()
        .query_with_vars(
            FICTION_QUERY,
            vars! {
                "componentId" => component.id.to_string(),
                "id" => fiction.id.to_string(),
            },
        )
        .await;

    let node = &data["fiction"];
    assert_eq!(node["state"], "not_answered");
    assert!(node["answer"].is_null());
    let versions = node["versions"].as_array().unwrap();
    assert_eq!(versions[0]["event"], "create");
    assert_eq!(versions[0]["index"], 1);
    assert!(versions
        .iter()
        .flat_map(|v| v["changes"].as_array().unwrap())
        .all(|c| c["attribute"] != "state"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn mentions_render_as_links(ctx: &mut TestHarness) {
    let component = ctx.component(ComponentSettings::default(), creation_step());
    let mentioned = citizen_fiction(
        ctx,
        &component,
        2,
        input("Keep the library open on Sundays", "A body long enough to pass validation."),
    )
    .await;
    let mentioning = citizen_fiction(
        ctx,
        &component,
        3,
        input(
            "Hire more staff for weekend openings",
            &format!("This would make ~{} possible.", mentioned.id),
        ),
    )
    .await;

    let data = ctx
        .graphql()
        .query_with_vars(
            FICTION_QUERY,
            vars! {
                "componentId" => component.id.to_string(),
                "id" => mentioning.id.to_string(),
            },
        )
        .await;

    let body = data["fiction"]["body"].as_str().unwrap();
    assert!(body.contains(&format!(
        "/components/{}/fictions/{}",
        component.id, mentioned.id
    )));
    assert!(body.contains(">Keep the library open on Sundays</a>"));
    assert!(!body.contains("gid://"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn similar_fictions_match_on_title(ctx: &mut TestHarness) {
    let component = ctx.component(ComponentSettings::default(), creation_step());
    citizen_fiction(
        ctx,
        &component,
        2,
        input("Keep the library open on Sundays", "A body long enough to pass validation."),
    )
    .await;
    citizen_fiction(
        ctx,
        &component,
        3,
        input("Paint the crossings near the school", "Drivers do not see the crossings at night."),
    )
    .await;

    let data = ctx
        .graphql()
        .query_with_vars(
            r#"
            query Similar($componentId: ID!, $title: String!, $body: String!) {
                similarFictions(componentId: $componentId, title: $title, body: $body) { title }
            }
            "#,
            vars! {
                "componentId" => component.id.to_string(),
                "title" => "Open the library on Sundays",
                "body" => "Something else entirely different here.",
            },
        )
        .await;

    let titles: Vec<&str> = data["similarFictions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Keep the library open on Sundays"]);
}
