//! Derived display values for a post: reading time, edit marker, dates.

use crate::rich_text;
use crate::types::{PostDocument, PostProjection};
use chrono::{DateTime, Locale, TimeZone};
use std::fmt;

/// Reading speed used for the estimate.
pub const WORDS_PER_MINUTE: usize = 200;

/// Compute every derived value for a post.
pub fn project(doc: &PostDocument) -> PostProjection {
    PostProjection {
        reading_time_minutes: reading_time(doc),
        was_edited: was_edited(doc),
    }
}

/// Whitespace-delimited words across all block headings and bodies.
pub fn word_count(doc: &PostDocument) -> usize {
    doc.content
        .iter()
        .map(|block| {
            block.heading.split_whitespace().count()
                + rich_text::as_text(&block.body).split_whitespace().count()
        })
        .sum()
}

/// Minutes needed to read the post, rounded up. Empty posts take 0 minutes.
pub fn reading_time(doc: &PostDocument) -> u32 {
    minutes_for_words(word_count(doc))
}

pub fn minutes_for_words(words: usize) -> u32 {
    u32::try_from(words.div_ceil(WORDS_PER_MINUTE)).unwrap_or(u32::MAX)
}

/// True when the post was republished at a different instant than its first
/// publication.
pub fn was_edited(doc: &PostDocument) -> bool {
    doc.last_publication_date
        .is_some_and(|last| last != doc.first_publication_date)
}

/// Format a timestamp with a strftime `pattern` in `locale`.
///
/// The pattern must already be known to be valid (see
/// [`crate::config::SiteConfig::validate`]); formatting an invalid pattern
/// panics inside chrono.
pub fn format_display_date<Tz>(ts: &DateTime<Tz>, pattern: &str, locale: Locale) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    ts.format_localized(pattern, locale).to_string()
}
