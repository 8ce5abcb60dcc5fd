//! Fiction mentions in free text.
//!
//! On save, `~12` and `{base}/.../fictions/12` become `gid://{app}/Fiction/12`
//! when fiction 12 exists. On display, global ids become links; unknown ids
//! fall back to `~12`.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use pulldown_cmark::escape::escape_html;
use regex::{Captures, Regex};

use crate::common::{FictionId, StoreResult};
use crate::config::FictionsConfig;
use crate::domains::fictions::models::Fiction;
use crate::kernel::traits::*;

lazy_static! {
    static ref TILDE_MENTION: Regex = Regex::new(r"~(\d+)\b").expect("valid regex");
    static ref GLOBAL_ID: Regex =
        Regex::new(r"gid://([A-Za-z0-9_.\-]+)/Fiction/(\d+)\b").expect("valid regex");
}

pub fn to_global_id(app_name: &str, id: FictionId) -> String {
    format!("gid://{}/Fiction/{}", app_name, id)
}

/// Fiction id of a global id issued by `app_name`.
pub fn parse_global_id(app_name: &str, gid: &str) -> Option<FictionId> {
    let caps = GLOBAL_ID.captures(gid.trim())?;
    if caps.get(0)?.as_str().len() != gid.trim().len() || &caps[1] != app_name {
        return None;
    }
    caps[2].parse().ok()
}

/// Fiction ids referenced by global ids in `text`, unique, in order.
pub fn mentioned_ids(app_name: &str, text: &str) -> Vec<FictionId> {
    let mut ids = Vec::new();
    for caps in GLOBAL_ID.captures_iter(text) {
        if &caps[1] != app_name {
            continue;
        }
        if let Ok(id) = caps[2].parse::<FictionId>() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

/// Result of rewriting mentions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionRewrite {
    pub text: String,
    /// Resolved mentions, unique, in order of first appearance.
    pub mentioned: Vec<FictionId>,
}

pub struct MentionParser<'a> {
    store: &'a dyn Store,
    config: &'a FictionsConfig,
    url_mention: Regex,
}

impl<'a> MentionParser<'a> {
    pub fn new(store: &'a dyn Store, config: &'a FictionsConfig) -> Self {
        let pattern = format!(
            r"{}/[^\s<>]*?fictions/(\d+)\b",
            regex::escape(config.public_base_url.trim_end_matches('/'))
        );
        Self {
            store,
            config,
            // The base URL is escaped, so the pattern always compiles.
            url_mention: Regex::new(&pattern).unwrap_or_else(|_| TILDE_MENTION.clone()),
        }
    }

    pub async fn rewrite(&self, text: &str) -> StoreResult<MentionRewrite> {
        let mut candidates: Vec<(usize, FictionId)> = Vec::new();
        for regex in [&self.url_mention, &*TILDE_MENTION] {
            for caps in regex.captures_iter(text) {
                if let (Some(whole), Ok(id)) = (caps.get(0), caps[1].parse::<FictionId>()) {
                    candidates.push((whole.start(), id));
                }
            }
        }
        candidates.sort_by_key(|(start, _)| *start);

        let mut ids: Vec<FictionId> = Vec::new();
        for (_, id) in &candidates {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        if ids.is_empty() {
            return Ok(MentionRewrite {
                text: text.to_string(),
                mentioned: Vec::new(),
            });
        }

        let existing: BTreeSet<FictionId> = self
            .store
            .find_fictions(&ids)
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();

        let app = &self.config.app_name;
        let replace = |caps: &Captures| -> String {
            match caps[1].parse::<FictionId>() {
                Ok(id) if existing.contains(&id) => to_global_id(app, id),
                _ => caps[0].to_string(),
            }
        };
        let rewritten = self.url_mention.replace_all(text, &replace).into_owned();
        let rewritten = TILDE_MENTION.replace_all(&rewritten, &replace).into_owned();

        Ok(MentionRewrite {
            text: rewritten,
            mentioned: ids.into_iter().filter(|id| existing.contains(id)).collect(),
        })
    }
}

pub struct MentionRenderer<'a> {
    store: &'a dyn Store,
    config: &'a FictionsConfig,
}

impl<'a> MentionRenderer<'a> {
    pub fn new(store: &'a dyn Store, config: &'a FictionsConfig) -> Self {
        Self { store, config }
    }

    /// HTML for `text`: plain segments escaped, global ids turned into links.
    pub async fn render(&self, text: &str) -> StoreResult<String> {
        let ids: Vec<FictionId> = GLOBAL_ID
            .captures_iter(text)
            .filter(|caps| caps[1] == *self.config.app_name)
            .filter_map(|caps| caps[2].parse().ok())
            .collect();
        let fictions: BTreeMap<FictionId, Fiction> = if ids.is_empty() {
            BTreeMap::new()
        } else {
            self.store
                .find_fictions(&ids)
                .await?
                .into_iter()
                .map(|f| (f.id, f))
                .collect()
        };

        let mut html = String::with_capacity(text.len());
        let mut last = 0;
        for caps in GLOBAL_ID.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            push_escaped(&mut html, &text[last..whole.start()]);
            last = whole.end();

            let fiction = if caps[1] == *self.config.app_name {
                caps[2]
                    .parse::<FictionId>()
                    .ok()
                    .and_then(|id| fictions.get(&id))
            } else {
                None
            };
            match fiction {
                Some(fiction) => self.push_link(&mut html, fiction),
                None => {
                    html.push('~');
                    html.push_str(&caps[2]);
                }
            }
        }
        push_escaped(&mut html, &text[last..]);
        Ok(html)
    }

    fn push_link(&self, html: &mut String, fiction: &Fiction) {
        html.push_str(&format!(
            r#"<a class="fiction-mention" href="{}/components/{}/fictions/{}">"#,
            self.config.public_base_url, fiction.component_id, fiction.id
        ));
        push_escaped(html, &fiction.title);
        html.push_str("</a>");
    }
}

fn push_escaped(html: &mut String, text: &str) {
    // Writing into a String cannot fail.
    let _ = escape_html(&mut *html, text);
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::common::ComponentId;
    use crate::domains::fictions::models::NewFiction;
    use crate::kernel::memory_store::MemoryStore;

    async fn seeded() -> (MemoryStore, Fiction) {
        let store = MemoryStore::new();
        let component = store.insert_component("space", "Fictions", Default::default(), Default::default());
        let fiction = store
            .insert_fiction(
                &NewFiction::builder()
                    .component_id(component.id)
                    .title("Bikes <and> buses")
                    .body("More bike lanes on main street")
                    .published_at(Utc::now())
                    .build(),
                &[],
            )
            .await
            .unwrap();
        (store, fiction)
    }

    fn config() -> FictionsConfig {
        FictionsConfig {
            app_name: "test-app".to_string(),
            public_base_url: "https://participa.example.org".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_rewrites_existing_mentions_only() {
        let (store, fiction) = seeded().await;
        let config = config();
        let parser = MentionParser::new(&store, &config);

        let text = format!("See ~{} and ~999 please", fiction.id);
        let rewrite = parser.rewrite(&text).await.unwrap();

        assert_eq!(
            rewrite.text,
            format!("See gid://test-app/Fiction/{} and ~999 please", fiction.id)
        );
        assert_eq!(rewrite.mentioned, vec![fiction.id]);
    }

    #[tokio::test]
    async fn test_rewrites_urls_under_base() {
        let (store, fiction) = seeded().await;
        let config = config();
        let parser = MentionParser::new(&store, &config);

        let text = format!(
            "Related: https://participa.example.org/processes/a/f/3/fictions/{} and https://elsewhere.org/fictions/{}",
            fiction.id, fiction.id
        );
        let rewrite = parser.rewrite(&text).await.unwrap();
        assert!(rewrite
            .text
            .starts_with(&format!("Related: gid://test-app/Fiction/{} and", fiction.id)));
        assert!(rewrite.text.ends_with(&format!("https://elsewhere.org/fictions/{}", fiction.id)));
    }

    #[tokio::test]
    async fn test_renders_links_with_escaped_titles() {
        let (store, fiction) = seeded().await;
        let config = config();
        let renderer = MentionRenderer::new(&store, &config);

        let html = renderer
            .render(&format!("<b>x</b> {} and gid://test-app/Fiction/999", to_global_id("test-app", fiction.id)))
            .await
            .unwrap();

        assert_eq!(
            html,
            format!(
                "&lt;b&gt;x&lt;/b&gt; <a class=\"fiction-mention\" href=\"https://participa.example.org/components/{}/fictions/{}\">Bikes &lt;and&gt; buses</a> and ~999",
                ComponentId::new(1),
                fiction.id
            )
        );
    }

    #[tokio::test]
    async fn test_render_then_parse_recovers_id() {
        let (store, fiction) = seeded().await;
        let config = config();
        let parser = MentionParser::new(&store, &config);

        let rewrite = parser.rewrite(&format!("~{}", fiction.id)).await.unwrap();
        assert_eq!(parse_global_id("test-app", &rewrite.text), Some(fiction.id));
        assert_eq!(parse_global_id("other-app", &rewrite.text), None);
    }

    #[test]
    fn test_mentioned_ids_are_unique_and_scoped_to_app() {
        let text = "gid://test-app/Fiction/4 gid://other/Fiction/5 gid://test-app/Fiction/4 gid://test-app/Fiction/2";
        assert_eq!(
            mentioned_ids("test-app", text),
            vec![FictionId::new(4), FictionId::new(2)]
        );
    }
}
