//! Read-side view of a fiction for citizens.

use pulldown_cmark::escape::escape_html;

use crate::common::StoreResult;
use crate::config::FictionsConfig;
use crate::domains::fictions::mentions::MentionRenderer;
use crate::domains::fictions::models::{Fiction, FictionState};
use crate::domains::fictions::versions::state_label;
use crate::kernel::traits::*;

pub struct FictionPresenter<'a> {
    fiction: &'a Fiction,
    store: &'a dyn Store,
    config: &'a FictionsConfig,
}

impl<'a> FictionPresenter<'a> {
    pub fn new(fiction: &'a Fiction, store: &'a dyn Store, config: &'a FictionsConfig) -> Self {
        Self {
            fiction,
            store,
            config,
        }
    }

    /// HTML-escaped title.
    pub fn display_title(&self) -> String {
        let mut html = String::with_capacity(self.fiction.title.len());
        let _ = escape_html(&mut html, &self.fiction.title);
        html
    }

    /// Body as HTML, with mentions turned into links.
    pub async fn display_body(&self) -> StoreResult<String> {
        MentionRenderer::new(self.store, self.config)
            .render(&self.fiction.body)
            .await
    }

    pub fn state(&self) -> FictionState {
        self.fiction.state()
    }

    pub fn state_label(&self) -> &'static str {
        state_label(self.state())
    }

    pub fn answer(&self) -> Option<&str> {
        self.fiction.visible_answer()
    }
}
