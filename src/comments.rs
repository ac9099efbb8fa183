//! utterances comment widget.
//!
//! Comments live in GitHub issues of the configured repository. The embed is a
//! single `<script>` anchored on a post path; utterances maps the path to an
//! issue via `issue-term`.
//!
//! The embed is a function of the path alone. [`CommentInjector`] hands out
//! one embed per distinct path, so a page that is re-rendered for the same
//! post never carries two widgets and a page for a different post always gets
//! a fresh one.

use crate::config::CommentsConfig;
use maud::{Markup, html};

pub const CLIENT_SCRIPT: &str = "https://utteranc.es/client.js";

/// Markup for the widget of the post at `path`.
pub fn embed(config: &CommentsConfig, path: &str) -> Markup {
    html! {
        section.comments data-post-path=(path) {
            script
                src=(CLIENT_SCRIPT)
                repo=(config.repo)
                issue-term=(config.issue_term)
                theme=(config.theme)
                crossorigin="anonymous"
                async {}
        }
    }
}

/// Tracks the post path the widget is currently anchored on.
#[derive(Debug)]
pub struct CommentInjector<'a> {
    config: &'a CommentsConfig,
    current: Option<String>,
}

impl<'a> CommentInjector<'a> {
    pub fn new(config: &'a CommentsConfig) -> Self {
        Self {
            config,
            current: None,
        }
    }

    /// The embed for `path` when it differs from the path last injected.
    ///
    /// Returns `None` when comments are disabled or the widget is already
    /// anchored on `path`.
    pub fn inject(&mut self, path: &str) -> Option<Markup> {
        if !self.config.enabled || self.current.as_deref() == Some(path) {
            return None;
        }
        self.current = Some(path.to_string());
        Some(embed(self.config, path))
    }

    pub fn current_path(&self) -> Option<&str> {
        self.current.as_deref()
    }
}
