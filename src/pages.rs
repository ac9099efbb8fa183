//! Page data for the two routes of the blog.
//!
//! - `/` lists posts, newest first, one page at a time ([`home_props`]).
//! - `/post/{uid}` shows one post with its neighbours ([`post_props`]).
//!
//! A post whose CMS document cannot be assembled (missing required fields,
//! unparseable timestamps, unexpected JSON) resolves to
//! [`PostProps::NotFound`] instead of failing the build. Transport failures
//! are not content problems and propagate.

use crate::projector;
use crate::source::{ContentError, ContentSource};
use crate::types::{AdjacentPostRef, Direction, PostDocument, PostPage, PostProjection};

/// Data for the listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeProps {
    /// The first listing page.
    pub posts_pagination: PostPage,
}

/// Everything the post page renders.
#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    pub document: PostDocument,
    pub projection: PostProjection,
    /// The post published just before this one.
    pub previous: Option<AdjacentPostRef>,
    /// The post published just after this one.
    pub next: Option<AdjacentPostRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostProps {
    Found(Box<PostView>),
    /// No document, or one too malformed to show. Rendered as the 404 page.
    NotFound,
}

impl PostProps {
    pub fn found(&self) -> Option<&PostView> {
        match self {
            PostProps::Found(view) => Some(view),
            PostProps::NotFound => None,
        }
    }
}

pub async fn home_props<S: ContentSource>(
    source: &S,
    page_size: u32,
) -> Result<HomeProps, ContentError> {
    let posts_pagination = source.query_posts_page(page_size, None).await?;
    tracing::debug!(
        posts = posts_pagination.results.len(),
        more = posts_pagination.next_page.is_some(),
        "fetched first listing page"
    );
    Ok(HomeProps { posts_pagination })
}

pub async fn post_props<S: ContentSource>(source: &S, uid: &str) -> Result<PostProps, ContentError> {
    match assemble(source, uid).await {
        Ok(Some(view)) => Ok(PostProps::Found(Box::new(view))),
        Ok(None) => {
            tracing::info!(uid, "post not found");
            Ok(PostProps::NotFound)
        }
        Err(err) if err.is_malformed() => {
            tracing::warn!(uid, error = %err, "malformed post, rendering as not found");
            Ok(PostProps::NotFound)
        }
        Err(err) => Err(err),
    }
}

async fn assemble<S: ContentSource>(
    source: &S,
    uid: &str,
) -> Result<Option<PostView>, ContentError> {
    let Some(document) = source.get_post_by_uid(uid).await? else {
        return Ok(None);
    };
    let previous = neighbour(source, uid, Direction::Previous).await?;
    let next = neighbour(source, uid, Direction::Next).await?;
    let projection = projector::project(&document);
    Ok(Some(PostView {
        document,
        projection,
        previous,
        next,
    }))
}

/// A neighbour that cannot be assembled only drops its link.
async fn neighbour<S: ContentSource>(
    source: &S,
    uid: &str,
    direction: Direction,
) -> Result<Option<AdjacentPostRef>, ContentError> {
    match source.query_adjacent(uid, direction).await {
        Err(err) if err.is_malformed() => {
            tracing::warn!(uid, ?direction, error = %err, "malformed neighbour, omitting link");
            Ok(None)
        }
        result => result,
    }
}
