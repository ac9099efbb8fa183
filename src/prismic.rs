//! Prismic REST API v2 client.
//!
//! ## Requests
//!
//! ```text
//! GET {endpoint}                                   → refs (master ref)
//! GET {endpoint}/documents/search?ref=..&q=..      → documents + next_page
//! ```
//!
//! Listing pages are ordered newest first and only fetch the listing fields.
//! The `next_page` of a search response is a complete URL; following it
//! fetches that URL as-is, after checking it points at the configured host.
//!
//! ## Validation
//!
//! Responses are deserialized into loose `Raw*` shapes and then converted
//! into [`crate::types`] with `TryFrom`. Conversions reject documents without
//! the fields a page cannot do without (`uid`, `first_publication_date`,
//! `data.banner.url` for a full post) and normalize the rest: absent text
//! becomes an empty string, and text fields given as rich text are flattened
//! to plain text.
//!
//! ## Preview
//!
//! With a preview ref, every query reads from that ref instead of the master
//! ref, returning draft content. Preview responses bypass the cache.

use crate::cache::ResponseCache;
use crate::rich_text::{self, RichTextNode};
use crate::source::{ContentError, ContentSource, SchemaError};
use crate::types::{
    AdjacentPostRef, ContentBlock, Direction, Post, PostDocument, PostPage, parse_timestamp,
};
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Mutex;

/// Listing fields requested for each post.
const LISTING_FIELDS: [&str; 3] = ["title", "subtitle", "author"];

// ============================================================================
// Raw response shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiRoot {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub results: Vec<RawDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: RawPostData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPostData {
    pub title: Option<TextField>,
    pub subtitle: Option<TextField>,
    pub author: Option<TextField>,
    pub banner: Option<RawImage>,
    pub content: Option<Vec<RawContentBlock>>,
}

/// A text field configured either as key text or as rich text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextField {
    Plain(String),
    Rich(Vec<RichTextNode>),
}

impl TextField {
    fn into_text(self) -> String {
        match self {
            TextField::Plain(text) => text,
            TextField::Rich(nodes) => rich_text::as_text(&nodes),
        }
    }
}

fn text_or_empty(field: Option<TextField>) -> String {
    field.map(TextField::into_text).unwrap_or_default()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawImage {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawContentBlock {
    pub heading: Option<TextField>,
    pub body: Option<Vec<RichTextNode>>,
}

/// Uids name output directories, so they must stay a single path segment.
fn is_slug(uid: &str) -> bool {
    !uid.starts_with('.')
        && !uid.contains("..")
        && !uid
            .chars()
            .any(|c| c == '/' || c == '\\' || c == ':' || c.is_control() || c.is_whitespace())
}

fn required_uid(uid: Option<String>) -> Result<String, SchemaError> {
    let uid = uid
        .filter(|u| !u.is_empty())
        .ok_or(SchemaError::MissingField("uid"))?;
    if is_slug(&uid) {
        Ok(uid)
    } else {
        Err(SchemaError::InvalidUid(uid))
    }
}

fn timestamp(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<crate::types::Timestamp>, SchemaError> {
    match value {
        None => Ok(None),
        Some(value) => parse_timestamp(&value)
            .map(Some)
            .ok_or(SchemaError::InvalidTimestamp { field, value }),
    }
}

impl TryFrom<RawDocument> for Post {
    type Error = SchemaError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        Ok(Post {
            uid: required_uid(raw.uid)?,
            first_publication_date: timestamp(
                "first_publication_date",
                raw.first_publication_date,
            )?,
            title: text_or_empty(raw.data.title),
            subtitle: text_or_empty(raw.data.subtitle),
            author: text_or_empty(raw.data.author),
        })
    }
}

impl TryFrom<RawDocument> for PostDocument {
    type Error = SchemaError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        let uid = required_uid(raw.uid)?;
        let first_publication_date =
            timestamp("first_publication_date", raw.first_publication_date)?
                .ok_or(SchemaError::MissingField("first_publication_date"))?;
        let last_publication_date = timestamp("last_publication_date", raw.last_publication_date)?;
        let data = raw.data;
        let banner_url = data
            .banner
            .and_then(|b| b.url)
            .filter(|u| !u.is_empty())
            .ok_or(SchemaError::MissingField("data.banner.url"))?;
        let content = data
            .content
            .unwrap_or_default()
            .into_iter()
            .map(|block| ContentBlock {
                heading: text_or_empty(block.heading),
                body: block.body.unwrap_or_default(),
            })
            .collect();

        Ok(PostDocument {
            id: raw.id,
            uid,
            first_publication_date,
            last_publication_date,
            title: text_or_empty(data.title),
            subtitle: text_or_empty(data.subtitle),
            author: text_or_empty(data.author),
            banner_url,
            content,
        })
    }
}

impl TryFrom<RawDocument> for AdjacentPostRef {
    type Error = SchemaError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        Ok(AdjacentPostRef {
            uid: required_uid(raw.uid)?,
            title: text_or_empty(raw.data.title),
        })
    }
}

/// Convert a search response into a listing page.
pub fn post_page(response: SearchResponse) -> Result<PostPage, SchemaError> {
    let results = response
        .results
        .into_iter()
        .map(Post::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PostPage {
        results,
        next_page: response.next_page.filter(|n| !n.is_empty()),
    })
}

// ============================================================================
// Client
// ============================================================================

/// Connection settings for [`PrismicClient::connect`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API root, e.g. `https://spacetraveling.cdn.prismic.io/api/v2`.
    pub endpoint: String,
    /// Custom type of blog posts.
    pub document_type: String,
    pub access_token: Option<String>,
    /// Read drafts from this ref instead of the master ref.
    pub preview_ref: Option<String>,
}

pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: Url,
    document_type: String,
    access_token: Option<String>,
    reference: String,
    preview: bool,
    cache: Option<Mutex<ResponseCache>>,
}

impl PrismicClient {
    /// Resolve the ref to read from and build a client.
    ///
    /// Without a preview ref this fetches the API root to find the master ref.
    pub async fn connect(
        options: ClientOptions,
        cache: Option<ResponseCache>,
    ) -> Result<Self, ContentError> {
        let endpoint = Url::parse(options.endpoint.trim_end_matches('/'))
            .map_err(|_| ContentError::InvalidUrl(options.endpoint.clone()))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut client = Self {
            http,
            endpoint,
            document_type: options.document_type,
            access_token: options.access_token.filter(|t| !t.is_empty()),
            reference: String::new(),
            preview: options.preview_ref.is_some(),
            cache: cache.map(Mutex::new),
        };

        client.reference = match options.preview_ref {
            Some(preview_ref) => {
                tracing::info!("reading drafts from preview ref");
                preview_ref
            }
            None => {
                let root_url = client.with_token(client.endpoint.clone());
                let root: ApiRoot = client.fetch_json(root_url, false).await?;
                master_ref(root)?
            }
        };
        Ok(client)
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// Hand the cache back, e.g. to save it after a build.
    pub fn into_cache(self) -> Option<ResponseCache> {
        self.cache
            .map(|c| c.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    fn with_token(&self, mut url: Url) -> Url {
        if let Some(token) = &self.access_token
            && !url.query_pairs().any(|(k, _)| k == "access_token")
        {
            url.query_pairs_mut().append_pair("access_token", token);
        }
        url
    }

    fn search_url(&self, predicate: &str, params: &[(&str, String)]) -> Result<Url, ContentError> {
        let raw = format!(
            "{}/documents/search",
            self.endpoint.as_str().trim_end_matches('/')
        );
        let mut url = Url::parse(&raw).map_err(|_| ContentError::InvalidUrl(raw))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("ref", &self.reference);
            query.append_pair("q", &format!("[{predicate}]"));
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(self.with_token(url))
    }

    fn type_predicate(&self) -> String {
        format!("[at(document.type,\"{}\")]", self.document_type)
    }

    fn uid_predicate(&self, uid: &str) -> String {
        format!(
            "[at(my.{}.uid,\"{}\")]",
            self.document_type,
            uid.replace('\\', "\\\\").replace('"', "\\\"")
        )
    }

    fn listing_fetch(&self) -> String {
        LISTING_FIELDS
            .iter()
            .map(|field| format!("{}.{field}", self.document_type))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse a `next_page` locator and make sure it targets our repository.
    fn cursor_url(&self, cursor: &str) -> Result<Url, ContentError> {
        let url = Url::parse(cursor).map_err(|_| ContentError::InvalidUrl(cursor.to_string()))?;
        if url.scheme() != self.endpoint.scheme() || url.host_str() != self.endpoint.host_str() {
            return Err(ContentError::ForeignCursor(cursor.to_string()));
        }
        Ok(self.with_token(url))
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: Url,
        cacheable: bool,
    ) -> Result<T, ContentError> {
        let cacheable = cacheable && !self.preview;
        let now = chrono::Utc::now();
        if cacheable
            && let Some(cache) = &self.cache
            && let Some(body) = lock(cache).get_fresh(url.as_str(), now)
        {
            tracing::debug!(path = url.path(), "CMS cache hit");
            return Ok(serde_json::from_value(body)?);
        }

        tracing::debug!(path = url.path(), "fetching from CMS");
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                url: redact(&url),
                status: status.as_u16(),
            });
        }
        let body: serde_json::Value = response.json().await?;
        let parsed = serde_json::from_value(body.clone())?;
        if cacheable && let Some(cache) = &self.cache {
            lock(cache).insert(url.as_str(), body, now);
        }
        Ok(parsed)
    }

    async fn search(&self, url: Url) -> Result<SearchResponse, ContentError> {
        self.fetch_json(url, true).await
    }

    async fn raw_by_uid(&self, uid: &str) -> Result<Option<RawDocument>, ContentError> {
        let url = self.search_url(&self.uid_predicate(uid), &[("pageSize", "1".to_string())])?;
        Ok(self.search(url).await?.results.into_iter().next())
    }
}

impl ContentSource for PrismicClient {
    async fn query_posts_page(
        &self,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<PostPage, ContentError> {
        let url = match cursor.filter(|c| !c.is_empty()) {
            Some(cursor) => self.cursor_url(cursor)?,
            None => self.search_url(
                &self.type_predicate(),
                &[
                    ("pageSize", page_size.to_string()),
                    (
                        "orderings",
                        "[document.first_publication_date desc]".to_string(),
                    ),
                    ("fetch", self.listing_fetch()),
                ],
            )?,
        };
        Ok(post_page(self.search(url).await?)?)
    }

    async fn get_post_by_uid(&self, uid: &str) -> Result<Option<PostDocument>, ContentError> {
        match self.raw_by_uid(uid).await? {
            Some(raw) => Ok(Some(PostDocument::try_from(raw)?)),
            None => Ok(None),
        }
    }

    async fn query_adjacent(
        &self,
        uid: &str,
        direction: Direction,
    ) -> Result<Option<AdjacentPostRef>, ContentError> {
        let Some(current) = self.raw_by_uid(uid).await? else {
            return Ok(None);
        };
        let ordering = match direction {
            Direction::Previous => "[document.first_publication_date desc]",
            Direction::Next => "[document.first_publication_date]",
        };
        let url = self.search_url(
            &self.type_predicate(),
            &[
                ("pageSize", "1".to_string()),
                ("after", current.id),
                ("orderings", ordering.to_string()),
                ("fetch", format!("{}.title", self.document_type)),
            ],
        )?;
        match self.search(url).await?.results.into_iter().next() {
            Some(raw) => Ok(Some(AdjacentPostRef::try_from(raw)?)),
            None => Ok(None),
        }
    }
}

fn master_ref(root: ApiRoot) -> Result<String, ContentError> {
    root.refs
        .into_iter()
        .find(|r| r.is_master_ref)
        .map(|r| r.reference)
        .ok_or(ContentError::NoMasterRef)
}

fn lock(cache: &Mutex<ResponseCache>) -> std::sync::MutexGuard<'_, ResponseCache> {
    cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The URL without its query, which may hold the access token.
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}
