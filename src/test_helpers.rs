//! Shared test utilities for the spacetraveling test suite.
//!
//! Builders for content values with fixed, deterministic dates, the Prismic
//! JSON fixtures, and [`MemorySource`], an in-memory [`ContentSource`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let source = MemorySource::new(vec![
//!     document_at("older", "2021-03-01T10:00:00Z", vec![]),
//!     document_at("newer", "2021-03-20T10:00:00Z", vec![block("Intro", &["Olá"])]),
//! ]);
//! let page = source.query_posts_page(1, None).await.unwrap();
//! assert_eq!(page.results[0].uid, "newer");
//! ```

use std::path::Path;

use crate::rich_text::RichTextNode;
use crate::source::{ContentError, ContentSource, SchemaError};
use crate::types::{
    AdjacentPostRef, ContentBlock, Direction, Post, PostDocument, PostPage, Timestamp,
    parse_timestamp,
};

/// Publication date of every post built without an explicit one.
pub const FIXED_DATE: &str = "2021-03-15T19:25:28Z";

fn ts(value: &str) -> Timestamp {
    parse_timestamp(value).unwrap_or_else(|| panic!("bad test timestamp '{value}'"))
}

// =========================================================================
// Fixtures
// =========================================================================

/// Read a JSON fixture from `fixtures/prismic/`.
pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures/prismic")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("fixture {} unreadable: {e}", path.display()))
}

// =========================================================================
// Builders
// =========================================================================

/// A listing entry for `uid`.
pub fn post(uid: &str) -> Post {
    Post {
        uid: uid.to_string(),
        first_publication_date: Some(ts(FIXED_DATE)),
        title: format!("Post {uid}"),
        subtitle: format!("Sobre {uid}"),
        author: "Joseph Oliveira".to_string(),
    }
}

/// A listing page of posts with the given uids.
pub fn page(uids: &[&str], next_page: Option<&str>) -> PostPage {
    PostPage {
        results: uids.iter().map(|uid| post(uid)).collect(),
        next_page: next_page.map(str::to_string),
    }
}

/// `n` words separated by single spaces.
pub fn words(n: usize) -> String {
    vec!["palavra"; n].join(" ")
}

/// A content block with one paragraph node per entry of `paragraphs`.
pub fn block(heading: &str, paragraphs: &[&str]) -> ContentBlock {
    ContentBlock {
        heading: heading.to_string(),
        body: paragraphs
            .iter()
            .map(|text| RichTextNode::paragraph(*text))
            .collect(),
    }
}

/// A never-edited post first published at [`FIXED_DATE`].
pub fn document(uid: &str, content: Vec<ContentBlock>) -> PostDocument {
    document_at(uid, FIXED_DATE, content)
}

/// A never-edited post first published at `published`.
pub fn document_at(uid: &str, published: &str, content: Vec<ContentBlock>) -> PostDocument {
    PostDocument {
        id: format!("id-{uid}"),
        uid: uid.to_string(),
        first_publication_date: ts(published),
        last_publication_date: None,
        title: format!("Post {uid}"),
        subtitle: format!("Sobre {uid}"),
        author: "Joseph Oliveira".to_string(),
        banner_url: format!("https://images.prismic.io/spacetraveling/{uid}.png"),
        content,
    }
}

/// The listing entry the CMS would return for `doc`.
pub fn listing_entry(doc: &PostDocument) -> Post {
    Post {
        uid: doc.uid.clone(),
        first_publication_date: Some(doc.first_publication_date),
        title: doc.title.clone(),
        subtitle: doc.subtitle.clone(),
        author: doc.author.clone(),
    }
}

// =========================================================================
// In-memory content source
// =========================================================================

/// Documents held in memory, served newest first.
///
/// Page cursors are `page-<offset>`. Uids listed in `malformed` fail to
/// assemble with a schema error; `offline` makes every call a transport-level
/// failure.
#[derive(Debug, Default)]
pub struct MemorySource {
    pub documents: Vec<PostDocument>,
    pub malformed: Vec<String>,
    pub offline: bool,
}

impl MemorySource {
    pub fn new(mut documents: Vec<PostDocument>) -> Self {
        documents.sort_by(|a, b| b.first_publication_date.cmp(&a.first_publication_date));
        Self {
            documents,
            ..Self::default()
        }
    }

    fn ensure_online(&self) -> Result<(), ContentError> {
        if self.offline {
            return Err(ContentError::Status {
                url: "memory://".to_string(),
                status: 503,
            });
        }
        Ok(())
    }

    fn position(&self, uid: &str) -> Option<usize> {
        self.documents.iter().position(|doc| doc.uid == uid)
    }
}

impl ContentSource for MemorySource {
    async fn query_posts_page(
        &self,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<PostPage, ContentError> {
        self.ensure_online()?;
        let start = match cursor {
            None => 0,
            Some(c) => c
                .strip_prefix("page-")
                .and_then(|offset| offset.parse::<usize>().ok())
                .ok_or_else(|| ContentError::ForeignCursor(c.to_string()))?,
        };
        let end = (start + page_size as usize).min(self.documents.len());
        let results = self.documents[start.min(end)..end]
            .iter()
            .map(listing_entry)
            .collect();
        let next_page = (end < self.documents.len()).then(|| format!("page-{end}"));
        Ok(PostPage { results, next_page })
    }

    async fn get_post_by_uid(&self, uid: &str) -> Result<Option<PostDocument>, ContentError> {
        self.ensure_online()?;
        if self.malformed.iter().any(|m| m == uid) {
            return Err(SchemaError::MissingField("data.banner.url").into());
        }
        Ok(self.position(uid).map(|i| self.documents[i].clone()))
    }

    async fn query_adjacent(
        &self,
        uid: &str,
        direction: Direction,
    ) -> Result<Option<AdjacentPostRef>, ContentError> {
        self.ensure_online()?;
        let Some(i) = self.position(uid) else {
            return Ok(None);
        };
        let neighbour = match direction {
            Direction::Previous => self.documents.get(i + 1),
            Direction::Next => i.checked_sub(1).and_then(|j| self.documents.get(j)),
        };
        Ok(neighbour.map(|doc| AdjacentPostRef {
            uid: doc.uid.clone(),
            title: doc.title.clone(),
        }))
    }
}
