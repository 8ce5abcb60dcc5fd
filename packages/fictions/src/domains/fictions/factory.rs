//! Creating and copying fictions.
//!
//! Every fiction enters the store through here so that the reference, the
//! initial version and the copy link are always in place.

use chrono::{DateTime, Datelike, Utc};
use tracing::{debug, warn};

use crate::common::{ComponentId, StoreResult, UserId};
use crate::config::FictionsConfig;
use crate::domains::fictions::models::{
    Coauthorship, Fiction, NewAttachment, NewFiction, NewVersion, VersionEvent,
    COPIED_FROM_COMPONENT,
};
use crate::kernel::traits::*;
use crate::kernel::ServerDeps;

/// Authorship of a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authors {
    /// Same coauthors, same order.
    Copy,
    /// A single new author.
    Assign(Coauthorship),
}

/// Attributes replaced on the copy.
#[derive(Debug, Clone, Default)]
pub struct CopyOverrides {
    pub component_id: Option<ComponentId>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CopyOptions {
    pub authors: Authors,
    pub overrides: CopyOverrides,
    /// Do not link the copy back to the original.
    pub skip_link: bool,
    pub copy_attachments: bool,
    pub whodunnit: Option<UserId>,
}

impl CopyOptions {
    pub fn new(authors: Authors) -> Self {
        Self {
            authors,
            overrides: CopyOverrides::default(),
            skip_link: false,
            copy_attachments: false,
            whodunnit: None,
        }
    }

    pub fn into_component(mut self, component_id: ComponentId) -> Self {
        self.overrides.component_id = Some(component_id);
        self
    }

    pub fn with_attachments(mut self) -> Self {
        self.copy_attachments = true;
        self
    }

    pub fn without_link(mut self) -> Self {
        self.skip_link = true;
        self
    }

    pub fn by(mut self, whodunnit: Option<UserId>) -> Self {
        self.whodunnit = whodunnit;
        self
    }
}

pub struct FictionFactory<'a> {
    store: &'a dyn Store,
    files: &'a dyn BaseFileStorage,
    config: &'a FictionsConfig,
}

impl<'a> FictionFactory<'a> {
    pub fn new(deps: &'a ServerDeps) -> Self {
        Self {
            store: deps.store.as_ref(),
            files: deps.files.as_ref(),
            config: &deps.config,
        }
    }

    /// Inserts a fiction, stamps its reference and records the `create`
    /// version.
    pub async fn create(
        &self,
        new: &NewFiction,
        coauthors: &[Coauthorship],
        whodunnit: Option<UserId>,
    ) -> StoreResult<Fiction> {
        let inserted = self.store.insert_fiction(new, coauthors).await?;

        let mut fiction = inserted.clone();
        fiction.reference = Some(reference(&self.config.reference_prefix, &fiction));
        let fiction = self.store.save_fiction(&fiction).await?;

        self.store
            .record_version(&NewVersion {
                fiction_id: fiction.id,
                event: VersionEvent::Create,
                changeset: fiction.creation_changes(),
                whodunnit,
            })
            .await?;

        debug!(fiction_id = %fiction.id, reference = ?fiction.reference, "fiction created");
        Ok(fiction)
    }

    /// Copies `original` without its answer, state, counters, timestamps or
    /// identity. The copy is a draft unless `overrides.published_at` is set.
    pub async fn copy(&self, original: &Fiction, options: CopyOptions) -> StoreResult<Fiction> {
        let coauthors = match &options.authors {
            Authors::Copy => self.store.coauthorships(original.id).await?,
            Authors::Assign(author) => vec![*author],
        };

        let overrides = options.overrides;
        let new = NewFiction::builder()
            .component_id(overrides.component_id.unwrap_or(original.component_id))
            .title(overrides.title.unwrap_or_else(|| original.title.clone()))
            .body(overrides.body.unwrap_or_else(|| original.body.clone()))
            .address(original.address.clone())
            .category_id(original.category_id)
            .scope_id(original.scope_id)
            .collaborative_draft_id(original.collaborative_draft_id)
            .meeting_id(original.meeting_id)
            .published_at(overrides.published_at)
            .build();

        let copy = self.create(&new, &coauthors, options.whodunnit).await?;

        if !options.skip_link {
            self.store
                .link_fictions(copy.id, original.id, COPIED_FROM_COMPONENT)
                .await?;
        }
        if options.copy_attachments {
            self.copy_attachments(original, &copy).await?;
        }

        Ok(copy)
    }

    async fn copy_attachments(&self, original: &Fiction, copy: &Fiction) -> StoreResult<()> {
        for attachment in self.store.attachments(original.id).await? {
            let bytes = match self.files.read(&attachment.file_key).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        fiction_id = %original.id,
                        attachment_id = %attachment.id,
                        error = %e,
                        "attachment file missing, skipping"
                    );
                    continue;
                }
            };

            let file_key = format!("fictions/{}/{}", copy.id, attachment_file_name(&attachment.file_key));
            if let Err(e) = self.files.write(&file_key, &bytes).await {
                warn!(fiction_id = %copy.id, error = %e, "failed to store copied attachment");
                continue;
            }

            self.store
                .insert_attachment(&NewAttachment {
                    fiction_id: copy.id,
                    title: attachment.title.clone(),
                    content_type: attachment.content_type.clone(),
                    file_key,
                })
                .await?;
        }
        Ok(())
    }
}

/// `{prefix}-FICT-{YYYY}-{MM}-{id}`, dated by creation.
pub fn reference(prefix: &str, fiction: &Fiction) -> String {
    format!(
        "{}-FICT-{}-{:02}-{}",
        prefix,
        fiction.created_at.year(),
        fiction.created_at.month(),
        fiction.id
    )
}

fn attachment_file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::common::{CategoryId, FictionId};
    use crate::domains::fictions::models::{Author, FictionState};
    use crate::kernel::test_dependencies::TestDependencies;

    async fn answered_original(deps: &ServerDeps) -> Fiction {
        let component = ComponentId::new(100);
        let new = NewFiction::builder()
            .component_id(component)
            .title("Open the library on Sundays")
            .body("Many people can only study during weekends.")
            .category_id(Some(CategoryId::new(4)))
            .published_at(Some(Utc::now()))
            .build();
        let fiction = FictionFactory::new(deps)
            .create(&new, &[Coauthorship::user(UserId::new(9))], Some(UserId::new(9)))
            .await
            .unwrap();

        let mut answered = fiction.clone();
        answered.internal_state = FictionState::Accepted;
        answered.answer = Some("We will try it".to_string());
        answered.answered_at = Some(Utc::now());
        answered.state_published_at = Some(Utc::now());
        deps.store.save_fiction(&answered).await.unwrap()
    }

    #[test]
    fn test_reference_format() {
        let mut fiction = crate::domains::fictions::models::fiction::tests::fiction();
        fiction.id = FictionId::new(42);
        fiction.created_at = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        assert_eq!(reference("FIC", &fiction), "FIC-FICT-2024-05-42");
    }

    #[tokio::test]
    async fn test_create_stamps_reference_and_version() {
        let test = TestDependencies::new();
        let (deps, store) = (&test.deps, &test.store);
        let new = NewFiction::builder()
            .component_id(ComponentId::new(1))
            .title("Repaint the crosswalks")
            .body("The paint near the school is gone.")
            .build();
        let fiction = FictionFactory::new(deps)
            .create(&new, &[Coauthorship::user(UserId::new(2))], Some(UserId::new(2)))
            .await
            .unwrap();

        assert!(fiction.reference.as_deref().unwrap().starts_with("FIC-FICT-"));
        let versions = store.versions(fiction.id).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].event, VersionEvent::Create);
        assert_eq!(versions[0].whodunnit, Some(UserId::new(2)));
    }

    #[tokio::test]
    async fn test_copy_drops_answer_and_counters() {
        let test = TestDependencies::new();
        let (deps, store) = (&test.deps, &test.store);
        let original = answered_original(deps).await;
        store.insert_vote(original.id, UserId::new(50)).await.unwrap();

        let copy = FictionFactory::new(deps)
            .copy(
                &original,
                CopyOptions::new(Authors::Copy).into_component(ComponentId::new(200)),
            )
            .await
            .unwrap();

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.component_id, ComponentId::new(200));
        assert_eq!(copy.title, original.title);
        assert_eq!(copy.category_id, original.category_id);
        assert_eq!(copy.internal_state, FictionState::NotAnswered);
        assert_eq!(copy.answer, None);
        assert_eq!(copy.answered_at, None);
        assert_eq!(copy.state_published_at, None);
        assert_eq!(copy.vote_count, 0);
        assert!(original.published_at.is_some());
        assert_eq!(copy.published_at, None);
        assert_ne!(copy.reference, original.reference);
        assert_eq!(
            store.coauthorships(copy.id).await.unwrap(),
            vec![Coauthorship::user(UserId::new(9))]
        );
        assert_eq!(
            store.linked_fictions(copy.id, COPIED_FROM_COMPONENT).await.unwrap(),
            vec![original.id]
        );
    }

    #[tokio::test]
    async fn test_copy_can_assign_author_and_skip_link() {
        let test = TestDependencies::new();
        let (deps, store) = (&test.deps, &test.store);
        let original = answered_original(deps).await;

        let copy = FictionFactory::new(deps)
            .copy(
                &original,
                CopyOptions::new(Authors::Assign(Coauthorship::new(Author::Organization)))
                    .without_link(),
            )
            .await
            .unwrap();

        assert_eq!(
            store.coauthorships(copy.id).await.unwrap(),
            vec![Coauthorship::new(Author::Organization)]
        );
        assert!(store
            .linked_fictions(copy.id, COPIED_FROM_COMPONENT)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_copy_skips_missing_attachment_files() {
        let test = TestDependencies::new();
        let (deps, store, files) = (&test.deps, &test.store, &test.files);
        let original = answered_original(deps).await;
        files.write("fictions/1/plan.pdf", b"%PDF").await.unwrap();
        for key in ["fictions/1/plan.pdf", "fictions/1/missing.png"] {
            store
                .insert_attachment(&NewAttachment {
                    fiction_id: original.id,
                    title: key.to_string(),
                    content_type: "application/octet-stream".to_string(),
                    file_key: key.to_string(),
                })
                .await
                .unwrap();
        }

        let copy = FictionFactory::new(deps)
            .copy(&original, CopyOptions::new(Authors::Copy).with_attachments())
            .await
            .unwrap();

        let copied = store.attachments(copy.id).await.unwrap();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].file_key, format!("fictions/{}/plan.pdf", copy.id));
        assert!(files.contains(&copied[0].file_key));
    }
}
