//! The content source seam.
//!
//! Everything that needs blog content goes through [`ContentSource`]. The
//! production implementation is [`crate::prismic::PrismicClient`]; tests use
//! in-memory sources.

use crate::types::{AdjacentPostRef, Direction, PostDocument, PostPage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed content: {0}")]
    Schema(#[from] SchemaError),
    #[error("Repository has no master ref")]
    NoMasterRef,
    #[error("Invalid CMS URL '{0}'")]
    InvalidUrl(String),
    #[error("Page locator '{0}' does not belong to the configured repository")]
    ForeignCursor(String),
}

impl ContentError {
    /// Whether the CMS answered but with content that could not be assembled.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ContentError::Json(_) | ContentError::Schema(_))
    }
}

/// A CMS response that does not have the shape a post needs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("document is missing `{0}`")]
    MissingField(&'static str),
    #[error("`{field}` is not a timestamp: '{value}'")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("uid '{0}' is not a URL slug")]
    InvalidUid(String),
}

/// Where posts come from.
#[allow(async_fn_in_trait)]
pub trait ContentSource {
    /// One listing page, newest first. `cursor` is a `next_page` locator
    /// from a previous page; `None` fetches the first page.
    async fn query_posts_page(
        &self,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<PostPage, ContentError>;

    /// The post with this uid, or `None` when there is none.
    async fn get_post_by_uid(&self, uid: &str) -> Result<Option<PostDocument>, ContentError>;

    /// The chronological neighbour of the post with this uid.
    async fn query_adjacent(
        &self,
        uid: &str,
        direction: Direction,
    ) -> Result<Option<AdjacentPostRef>, ContentError>;
}
