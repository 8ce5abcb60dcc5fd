//! PgStore against a real Postgres.
//!
//! Needs Docker. Run with: cargo test --test pg_store_tests -- --ignored

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use fictions_core::common::{Actor, UserId};
use fictions_core::config::FictionsConfig;
use fictions_core::domains::auth::JwtService;
use fictions_core::domains::components::models::{Component, ComponentSettings, StepSettings};
use fictions_core::domains::fictions::actions::{create_fiction, publish_fiction, withdraw_fiction};
use fictions_core::domains::fictions::data::FictionInput;
use fictions_core::domains::fictions::queries::FictionQuery;
use fictions_core::domains::votes::actions::vote_fiction;
use fictions_core::kernel::traits::*;
use fictions_core::kernel::{MemoryFileStorage, Notifier, PgStore, ServerDeps};
use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Postgres container and migrated database shared by every test.
struct SharedDatabase {
    db_url: String,
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_DB: OnceCell<SharedDatabase> = OnceCell::const_new();

impl SharedDatabase {
    async fn init() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn pool() -> PgPool {
        let shared = SHARED_DB
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared database")
            })
            .await;
        PgPool::connect(&shared.db_url)
            .await
            .expect("Failed to connect to test database")
    }
}

async fn setup(step: StepSettings) -> (PgPool, ServerDeps, Component) {
    let pool = SharedDatabase::pool().await;
    let (notifier, _events) = Notifier::channel();
    let deps = ServerDeps::new(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(MemoryFileStorage::new()),
        notifier,
        FictionsConfig::default(),
        Arc::new(JwtService::new("pg-secret", "fictions-pg".to_string())),
    );
    let component = Component::create(
        "city",
        "Fictions",
        &ComponentSettings::default(),
        &step,
        &pool,
    )
    .await
    .expect("Failed to create component");
    (pool, deps, component)
}

fn input(title: &str) -> FictionInput {
    FictionInput {
        title: title.to_string(),
        body: "Benches every hundred metres along the promenade.".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn fiction_lifecycle_round_trips() {
    let (_pool, deps, component) = setup(StepSettings {
        creation_enabled: true,
        votes_enabled: true,
        ..Default::default()
    })
    .await;
    let author = Actor::new(UserId::new(2), false);

    let draft = create_fiction(component.id, input("More benches on the promenade"), &author, &deps)
        .await
        .unwrap();
    assert!(draft.published_at.is_none());

    let published = publish_fiction(component.id, draft.id, &author, &deps)
        .await
        .unwrap();
    assert!(published.published_at.is_some());
    assert_eq!(
        deps.store.coauthorships(published.id).await.unwrap()[0]
            .author
            .user_id(),
        Some(UserId::new(2))
    );

    let voted = vote_fiction(component.id, published.id, &Actor::new(UserId::new(5), false), &deps)
        .await
        .unwrap();
    assert_eq!(voted.vote_count, 1);

    let listed = deps
        .store
        .find_published(component.id, &FictionQuery::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(
        deps.store
            .count_published(component.id, &FictionQuery::default())
            .await
            .unwrap(),
        1
    );

    let versions = deps.store.versions(published.id).await.unwrap();
    assert!(versions.len() >= 2);

    // Supported fictions stay
    assert!(withdraw_fiction(component.id, published.id, &author, &deps)
        .await
        .is_err());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn similar_fictions_use_trigrams() {
    let (_pool, deps, component) = setup(StepSettings {
        creation_enabled: true,
        ..Default::default()
    })
    .await;
    let author = Actor::new(UserId::new(3), false);
    for title in ["More benches on the promenade", "Free water fountains in parks"] {
        let draft = create_fiction(component.id, input(title), &author, &deps)
            .await
            .unwrap();
        publish_fiction(component.id, draft.id, &author, &deps)
            .await
            .unwrap();
    }

    let similar = deps
        .store
        .find_similar(
            component.id,
            "Benches on the promenade",
            "Unrelated words only",
            0.25,
            10,
        )
        .await
        .unwrap();

    assert!(!similar.is_empty());
    assert_eq!(similar[0].title, "More benches on the promenade");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn draft_coauthors_are_stored() {
    let (_pool, deps, component) = setup(StepSettings::default()).await;

    let draft = deps
        .store
        .insert_draft(
            component.id,
            "Shared allotments for the estate",
            "Residents would grow vegetables together.",
            UserId::new(4),
        )
        .await
        .unwrap();
    deps.store
        .add_access_request(draft.id, UserId::new(7))
        .await
        .unwrap();
    assert!(deps
        .store
        .add_access_request(draft.id, UserId::new(7))
        .await
        .is_err());

    assert!(deps
        .store
        .remove_access_request(draft.id, UserId::new(7))
        .await
        .unwrap());
    deps.store
        .add_draft_coauthor(draft.id, UserId::new(7))
        .await
        .unwrap();

    let mut coauthors = deps.store.draft_coauthors(draft.id).await.unwrap();
    coauthors.sort();
    assert_eq!(coauthors, vec![UserId::new(4), UserId::new(7)]);
    assert!(deps.store.draft_requesters(draft.id).await.unwrap().is_empty());

    let found = deps.store.find_draft(draft.id).await.unwrap().unwrap();
    assert!(found.updated_at <= Utc::now());
}
