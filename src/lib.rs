//! # spacetraveling
//!
//! A static blog generator for posts kept in a Prismic repository. Posts are
//! listed newest first, a page at a time, and every post gets its own page
//! with a reading-time estimate, an edit note, links to its chronological
//! neighbours, and a comment thread.
//!
//! # Architecture: Fetch, Then Render
//!
//! ```text
//! 1. Collect   Prismic  →  SiteContent   (listing pages + post views)
//! 2. Write     SiteContent  →  dist/     (final HTML site)
//! ```
//!
//! Collecting talks to the CMS through the [`source::ContentSource`] trait, so
//! everything past the HTTP client is exercised in tests with in-memory
//! content. Writing is synchronous and never touches the network.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Validated content shared by every stage (`Post`, `PostPage`, `PostDocument`) |
//! | [`rich_text`] | Prismic rich-text nodes: plain text for word counts, HTML for pages |
//! | [`feed`] | Incremental listing pagination (`PostFeed`) |
//! | [`projector`] | Reading time, edit detection, localized dates |
//! | [`source`] | The `ContentSource` seam and its error types |
//! | [`prismic`] | Prismic REST client, raw response shapes, validation into [`types`] |
//! | [`cache`] | On-disk CMS response cache with a revalidation interval |
//! | [`pages`] | Page data for the listing and post routes, with the not-found boundary |
//! | [`comments`] | utterances embed anchored on a post path |
//! | [`generate`] | Crawls the listing and renders the site using Maud |
//! | [`config`] | `config.toml` loading, validation, merging, and CSS generation |
//! | [`output`] | CLI output formatting: content inventory for `check` and `build` |
//!
//! # Design Decisions
//!
//! ## Everything Is Pre-Rendered
//!
//! Every post reachable from the listing is rendered at build time, so there is
//! no route left for request-time rendering. "Load more" on the home page
//! appends pre-rendered listing fragments (`/feed/{n}.html`) with a few lines
//! of JavaScript; without JavaScript the link still opens the next page.
//!
//! ## Malformed Posts Degrade to 404
//!
//! A CMS document missing its uid, banner, or publication date cannot be shown,
//! but it should not take the rest of the blog down with it.
//! [`pages::post_props`] turns such documents into
//! [`pages::PostProps::NotFound`] and logs a warning. Network and HTTP status
//! failures still abort the build.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time HTML
//! macro system. Malformed HTML is a build error, template variables are Rust
//! expressions, and all interpolation is auto-escaped. CMS text ends up in
//! pages only through Maud or the escaping rich-text renderer.
//!
//! ## Preview Builds
//!
//! `--preview-ref` renders the site from a Prismic preview ref instead of the
//! master ref. Preview responses skip the response cache and every page carries
//! a banner and a `noindex` tag.

pub mod cache;
pub mod comments;
pub mod config;
pub mod feed;
pub mod generate;
pub mod output;
pub mod pages;
pub mod prismic;
pub mod projector;
pub mod rich_text;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
