//! Validated blog content shared by every stage.
//!
//! These are the shapes the rest of the crate works with. They are only ever
//! produced from CMS responses by the conversions in [`crate::prismic`], which
//! reject or normalize anything that does not conform.

use crate::rich_text::RichTextNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publication timestamps are compared and stored in UTC.
pub type Timestamp = DateTime<Utc>;

/// Parse a CMS timestamp.
///
/// Accepts RFC 3339 (`2021-01-01T10:00:00Z`) and the `+0000` offset form the
/// Prismic API emits (`2021-03-25T19:25:28+0000`).
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A post as it appears in the listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub uid: String,
    pub first_publication_date: Option<Timestamp>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// One page of listing results.
///
/// `next_page` is the opaque locator of the following page; `None` or an
/// empty string means the listing is exhausted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPage {
    pub results: Vec<Post>,
    pub next_page: Option<String>,
}

/// A titled section of a post body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: Vec<RichTextNode>,
}

/// A full post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDocument {
    /// CMS document id, used for neighbour queries.
    pub id: String,
    pub uid: String,
    pub first_publication_date: Timestamp,
    pub last_publication_date: Option<Timestamp>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: String,
    pub content: Vec<ContentBlock>,
}

impl PostDocument {
    /// Site path of the post page. Comment threads are keyed on it.
    pub fn path(&self) -> String {
        post_path(&self.uid)
    }
}

pub fn post_path(uid: &str) -> String {
    format!("/post/{uid}")
}

/// Minimal pointer to a chronological neighbour of a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacentPostRef {
    pub uid: String,
    pub title: String,
}

/// Which neighbour to look up, in publication order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The post published just before (older).
    Previous,
    /// The post published just after (newer).
    Next,
}

/// Display-only values derived from a [`PostDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PostProjection {
    pub reading_time_minutes: u32,
    pub was_edited: bool,
}
