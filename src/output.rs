//! CLI output formatting for `check` and `build`.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every post leads with
//! its positional index and title; uids, paths, and generated files are
//! secondary context on indented lines or after an arrow. The output reads as
//! a content inventory of the blog.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Listing
//! 001 Page 1 (2 posts)
//!     001 Como utilizar Hooks
//!     002 Criando um app CRA do zero
//! 002 Page 2 (1 post)
//!     001 Mapas com React usando Leaflet
//!
//! Posts
//! 001 Como utilizar Hooks (4 min, edited)
//!     Path: /post/como-utilizar-hooks
//!     Pensando em sincronização em vez de ciclos de vida
//!
//! Not found
//!     uid-without-banner
//! ```
//!
//! ## Build
//!
//! ```text
//! 001 Page 1 (2 posts) → index.html
//! 002 Page 2 (1 post) → feed/2.html
//! 001 Como utilizar Hooks (4 min, edited) → post/como-utilizar-hooks/index.html
//!
//! Generated 2 listing pages, 3 posts, 0 not found, 4 assets
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::generate::{SiteContent, WrittenSite};
use crate::pages::PostView;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Listing page header.
///
/// ```text
/// 001 Page 1 (2 posts)
/// ```
fn page_header(number: usize, count: usize) -> String {
    format!(
        "{} Page {} ({})",
        format_index(number),
        number,
        plural(count, "post")
    )
}

/// Post header: index, title, reading time and edit state.
///
/// ```text
/// 001 Como utilizar Hooks (4 min, edited)
/// 002 (sem-titulo) (1 min)      // untitled, uid IS the identity
/// ```
fn post_header(index: usize, view: &PostView) -> String {
    let doc = &view.document;
    let title = if doc.title.trim().is_empty() {
        format!("({})", doc.uid)
    } else {
        doc.title.clone()
    };
    let edited = if view.projection.was_edited {
        ", edited"
    } else {
        ""
    };
    format!(
        "{} {} ({} min{})",
        format_index(index),
        title,
        view.projection.reading_time_minutes,
        edited
    )
}

/// Output file of listing page `number`.
fn listing_file(number: usize) -> String {
    if number == 1 {
        "index.html".to_string()
    } else {
        format!("feed/{number}.html")
    }
}

// ============================================================================
// check
// ============================================================================

/// Format the content inventory found by `check`.
pub fn format_check_output(content: &SiteContent) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Listing".to_string());
    for (i, posts) in content.listing.iter().enumerate() {
        lines.push(page_header(i + 1, posts.len()));
        for (j, post) in posts.iter().enumerate() {
            lines.push(format!("{}{} {}", indent(1), format_index(j + 1), post.title));
        }
    }

    lines.push(String::new());
    lines.push("Posts".to_string());
    for (i, view) in content.posts.iter().enumerate() {
        lines.push(post_header(i + 1, view));
        lines.push(format!("{}Path: {}", indent(1), view.document.path()));
        let subtitle = truncate(view.document.subtitle.trim(), 60);
        if !subtitle.is_empty() {
            lines.push(format!("{}{}", indent(1), subtitle));
        }
    }

    if !content.not_found.is_empty() {
        lines.push(String::new());
        lines.push("Not found".to_string());
        for uid in &content.not_found {
            lines.push(format!("{}{}", indent(1), uid));
        }
    }

    lines
}

/// Print check output to stdout.
pub fn print_check_output(content: &SiteContent) {
    for line in format_check_output(content) {
        println!("{}", line);
    }
}

// ============================================================================
// build
// ============================================================================

/// Format what `build` wrote, entity first, file second.
pub fn format_build_output(content: &SiteContent, written: &WrittenSite) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, posts) in content.listing.iter().enumerate() {
        lines.push(format!(
            "{} → {}",
            page_header(i + 1, posts.len()),
            listing_file(i + 1)
        ));
    }
    for (i, view) in content.posts.iter().enumerate() {
        lines.push(format!(
            "{} → post/{}/index.html",
            post_header(i + 1, view),
            view.document.uid
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}, {} not found, {}",
        plural(content.listing.len(), "listing page"),
        plural(content.posts.len(), "post"),
        content.not_found.len(),
        plural(written.assets, "asset")
    ));

    lines
}

/// Print build output to stdout.
pub fn print_build_output(content: &SiteContent, written: &WrittenSite) {
    for line in format_build_output(content, written) {
        println!("{}", line);
    }
}
