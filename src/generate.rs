//! Static site generation.
//!
//! Fetches everything the blog shows from a [`ContentSource`] and renders the
//! final static HTML site.
//!
//! ## Generated Pages
//!
//! - **Home** (`/index.html`): first listing page, newest first, with a
//!   "Carregar mais posts" link when the listing continues
//! - **Feed fragments** (`/feed/{n}.html`): listing page `n`, appended in
//!   place by `load-more.js`. Each fragment carries the link to the next one.
//! - **Post pages** (`/post/{uid}/index.html`): banner, reading time, edit
//!   note, content, previous/next links, comments
//! - **Not found** (`/404.html`): also what a malformed post resolves to
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── 404.html
//! ├── feed/
//! │   ├── 2.html
//! │   └── 3.html
//! ├── post/
//! │   └── como-utilizar-hooks/
//! │       └── index.html
//! └── images/logo.svg          # Copied from assets/
//! ```
//!
//! ## Crawling
//!
//! The listing is walked with [`PostFeed::load_more`] until the CMS stops
//! returning a cursor. Page boundaries are kept so every fetched page maps to
//! one fragment. A cursor seen twice aborts the build.
//!
//! ## CSS and JavaScript
//!
//! Embedded at compile time and inlined into pages:
//! - `static/style.css`: Base styles (colors injected from config)
//! - `static/load-more.js`: Appends feed fragments to the home listing
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping.

use crate::comments::CommentInjector;
use crate::config::{self, ConfigError, DatesConfig, SiteConfig};
use crate::feed::PostFeed;
use crate::pages::{self, PostProps, PostView};
use crate::projector;
use crate::rich_text;
use crate::source::{ContentError, ContentSource};
use crate::types::{AdjacentPostRef, Post, Timestamp, post_path};
use chrono::{FixedOffset, Locale};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Content error: {0}")]
    Content(#[from] ContentError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Asset copy error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Listing cursor '{0}' was returned twice")]
    PaginationCycle(String),
    #[error("Refusing to write outside the output directory: {0}")]
    OutsideOutput(PathBuf),
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const LOAD_MORE_JS: &str = include_str!("../static/load-more.js");

const LOAD_MORE_LABEL: &str = "Carregar mais posts";

// ============================================================================
// Collecting content
// ============================================================================

/// Everything fetched for one build.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteContent {
    /// Listing pages in fetch order. Page 1 is the home page.
    pub listing: Vec<Vec<Post>>,
    /// Found posts, in listing order.
    pub posts: Vec<PostView>,
    /// Listed uids whose page resolved to not found.
    pub not_found: Vec<String>,
}

impl SiteContent {
    pub fn listed_posts(&self) -> usize {
        self.listing.iter().map(Vec::len).sum()
    }
}

/// Fetch the full listing and every listed post.
pub async fn collect<S: ContentSource>(
    source: &S,
    page_size: u32,
) -> Result<SiteContent, GenerateError> {
    let home = pages::home_props(source, page_size).await?;
    let mut feed = PostFeed::new(home.posts_pagination);
    let mut boundaries = vec![feed.len()];
    let mut seen = HashSet::new();

    while let Some(cursor) = feed.next_page_token().map(str::to_string) {
        if !seen.insert(cursor.clone()) {
            return Err(GenerateError::PaginationCycle(cursor));
        }
        feed.load_more(|token| async move { source.query_posts_page(page_size, Some(&token)).await })
            .await?;
        boundaries.push(feed.len());
        tracing::debug!(page = boundaries.len(), posts = feed.len(), "loaded listing page");
    }

    let all = feed.into_posts();
    let mut listing = Vec::with_capacity(boundaries.len());
    let mut start = 0;
    for end in boundaries {
        listing.push(all[start..end].to_vec());
        start = end;
    }

    let mut posts = Vec::new();
    let mut not_found = Vec::new();
    let mut done = HashSet::new();
    for post in &all {
        if !done.insert(post.uid.as_str()) {
            continue;
        }
        match pages::post_props(source, &post.uid).await? {
            PostProps::Found(view) => posts.push(*view),
            PostProps::NotFound => not_found.push(post.uid.clone()),
        }
    }

    tracing::info!(
        pages = listing.len(),
        posts = posts.len(),
        not_found = not_found.len(),
        "collected site content"
    );
    Ok(SiteContent {
        listing,
        posts,
        not_found,
    })
}

// ============================================================================
// Writing the site
// ============================================================================

/// Build-wide rendering settings.
#[derive(Debug, Clone, Copy)]
pub struct SiteOptions<'a> {
    pub config: &'a SiteConfig,
    /// Directory copied verbatim to the output root, if it exists.
    pub assets_dir: Option<&'a Path>,
    /// Pages are rendered from a preview ref.
    pub preview: bool,
}

/// What [`write_site`] produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrittenSite {
    /// Generated HTML files, relative to the output directory.
    pub pages: Vec<PathBuf>,
    /// Files copied from the assets directory.
    pub assets: usize,
}

/// Fetch and write the whole site.
pub async fn build<S: ContentSource>(
    source: &S,
    options: &SiteOptions<'_>,
    output_dir: &Path,
) -> Result<(SiteContent, WrittenSite), GenerateError> {
    let content = collect(source, options.config.cms.page_size).await?;
    let written = write_site(&content, options, output_dir)?;
    Ok((content, written))
}

pub fn write_site(
    content: &SiteContent,
    options: &SiteOptions<'_>,
    output_dir: &Path,
) -> Result<WrittenSite, GenerateError> {
    let layout = Layout::new(options.config, options.preview)?;
    let mut written = WrittenSite::default();
    fs::create_dir_all(output_dir)?;

    if let Some(assets) = options.assets_dir.filter(|dir| dir.is_dir()) {
        written.assets = copy_assets(assets, output_dir)?;
    }

    let pages = content.listing.len();
    let first = content.listing.first().map(Vec::as_slice).unwrap_or(&[]);
    let index = render_index(&layout, first, feed_href(2, pages));
    write_page(output_dir, Path::new("index.html"), index, &mut written)?;

    for (idx, posts) in content.listing.iter().enumerate().skip(1) {
        let number = idx + 1;
        let fragment = render_feed_fragment(&layout, posts, feed_href(number + 1, pages));
        let rel = PathBuf::from("feed").join(format!("{number}.html"));
        write_page(output_dir, &rel, fragment, &mut written)?;
    }

    let mut injector = CommentInjector::new(&options.config.comments);
    for view in &content.posts {
        let comments = injector.inject(&view.document.path());
        let page = render_post_page(&layout, view, comments);
        let rel = PathBuf::from("post")
            .join(&view.document.uid)
            .join("index.html");
        write_page(output_dir, &rel, page, &mut written)?;
    }

    write_page(
        output_dir,
        Path::new("404.html"),
        render_not_found(&layout),
        &mut written,
    )?;

    tracing::info!(
        pages = written.pages.len(),
        assets = written.assets,
        output = %output_dir.display(),
        "site written"
    );
    Ok(written)
}

/// Link to listing page `number` when the listing has that many pages.
fn feed_href(number: usize, pages: usize) -> Option<String> {
    (number <= pages).then(|| format!("/feed/{number}.html"))
}

fn write_page(
    output_dir: &Path,
    rel: &Path,
    markup: Markup,
    written: &mut WrittenSite,
) -> Result<(), GenerateError> {
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(GenerateError::OutsideOutput(rel.to_path_buf()));
    }
    let path = output_dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, markup.into_string())?;
    tracing::debug!(path = %rel.display(), "generated page");
    written.pages.push(rel.to_path_buf());
    Ok(())
}

fn copy_assets(src: &Path, dst: &Path) -> Result<usize, GenerateError> {
    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

// ============================================================================
// Dates
// ============================================================================

/// Display formatting for publication dates.
#[derive(Debug, Clone)]
pub struct DateFormat {
    locale: Locale,
    offset: FixedOffset,
    pattern: String,
    edited_pattern: String,
}

impl DateFormat {
    pub fn from_config(dates: &DatesConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            locale: dates.locale()?,
            offset: dates.offset()?,
            pattern: dates.pattern.clone(),
            edited_pattern: dates.edited_pattern.clone(),
        })
    }

    pub fn publication(&self, ts: &Timestamp) -> String {
        projector::format_display_date(&ts.with_timezone(&self.offset), &self.pattern, self.locale)
    }

    pub fn edited(&self, ts: &Timestamp) -> String {
        projector::format_display_date(
            &ts.with_timezone(&self.offset),
            &self.edited_pattern,
            self.locale,
        )
    }
}

// ============================================================================
// HTML Components
// ============================================================================

/// Shared page chrome.
struct Layout<'a> {
    config: &'a SiteConfig,
    css: String,
    dates: DateFormat,
    preview: bool,
}

impl<'a> Layout<'a> {
    fn new(config: &'a SiteConfig, preview: bool) -> Result<Self, ConfigError> {
        let color_css = config::generate_color_css(&config.colors);
        Ok(Self {
            config,
            css: format!("{color_css}\n\n{CSS_STATIC}"),
            dates: DateFormat::from_config(&config.dates)?,
            preview,
        })
    }
}

/// Renders the base HTML document structure
fn base_document(layout: &Layout<'_>, title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(layout.config.site.lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                @if layout.preview {
                    meta name="robots" content="noindex";
                }
                title { (title) }
                style { (PreEscaped(&layout.css)) }
            }
            body {
                @if layout.preview {
                    div.preview-banner { "Modo preview" }
                }
                (site_header(layout))
                (content)
            }
        }
    }
}

/// Renders the site header: the logo, linking home
fn site_header(layout: &Layout<'_>) -> Markup {
    html! {
        header.site-header {
            div.container {
                a href="/" {
                    img src=(layout.config.site.logo) alt="logo";
                }
            }
        }
    }
}

fn post_list(layout: &Layout<'_>, posts: &[Post]) -> Markup {
    html! {
        ul.posts {
            @for post in posts {
                li {
                    a href=(post_path(&post.uid)) {
                        h2 { (post.title) }
                        p { (post.subtitle) }
                        div.info {
                            @if let Some(published) = &post.first_publication_date {
                                time datetime=(published.to_rfc3339()) {
                                    (layout.dates.publication(published))
                                }
                            }
                            span.author { (post.author) }
                        }
                    }
                }
            }
        }
    }
}

fn load_more_link(next: Option<&str>) -> Markup {
    html! {
        @if let Some(href) = next {
            a.load-more href=(href) { (LOAD_MORE_LABEL) }
        }
    }
}

fn adjacent_link(adjacent: Option<&AdjacentPostRef>, class: &str, label: &str) -> Markup {
    html! {
        @if let Some(post) = adjacent {
            a class=(class) href=(post_path(&post.uid)) {
                (post.title)
                span { (label) }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the home page with the first listing page
fn render_index(layout: &Layout<'_>, posts: &[Post], next: Option<String>) -> Markup {
    let content = html! {
        main.container {
            (post_list(layout, posts))
            (load_more_link(next.as_deref()))
        }
        script { (PreEscaped(LOAD_MORE_JS)) }
    };
    base_document(layout, &layout.config.site.title, content)
}

/// Renders a listing fragment: the posts of one page and the link to the next
fn render_feed_fragment(layout: &Layout<'_>, posts: &[Post], next: Option<String>) -> Markup {
    html! {
        (post_list(layout, posts))
        (load_more_link(next.as_deref()))
    }
}

/// Renders a post page
fn render_post_page(layout: &Layout<'_>, view: &PostView, comments: Option<Markup>) -> Markup {
    let doc = &view.document;
    let edited_at = doc
        .last_publication_date
        .filter(|_| view.projection.was_edited);
    let page_title = format!("{} | {}", doc.title, layout.config.site.title);

    let content = html! {
        img.banner src=(doc.banner_url) alt="banner";
        main.container {
            article.post {
                h1 { (doc.title) }
                div.info {
                    time datetime=(doc.first_publication_date.to_rfc3339()) {
                        (layout.dates.publication(&doc.first_publication_date))
                    }
                    span.author { (doc.author) }
                    span.reading-time { (view.projection.reading_time_minutes) " min" }
                }
                @if let Some(edited) = &edited_at {
                    p.edited { (layout.dates.edited(edited)) }
                }
                @for block in &doc.content {
                    section {
                        h2 { (block.heading) }
                        (rich_text::to_markup(&block.body))
                    }
                }
            }
            @if view.previous.is_some() || view.next.is_some() {
                nav.post-nav {
                    (adjacent_link(view.previous.as_ref(), "previous", "Post anterior"))
                    (adjacent_link(view.next.as_ref(), "next", "Próximo post"))
                }
            }
            @if let Some(comments) = comments {
                (comments)
            }
        }
    };

    base_document(layout, &page_title, content)
}

/// Renders the not-found page
fn render_not_found(layout: &Layout<'_>) -> Markup {
    let content = html! {
        main.container.not-found {
            h1 { "Página não encontrada" }
            p {
                a href="/" { "Voltar para o início" }
            }
        }
    };
    base_document(layout, &layout.config.site.title, content)
}

// ============================================================================
// Tests
// ============================================================================
