//! Incremental post listing.
//!
//! A [`PostFeed`] starts from the first listing page and grows one page at a
//! time through [`PostFeed::load_more`]. Fetched posts are appended after the
//! ones already shown, in the order the backend returned them; nothing is
//! reordered or deduplicated. The feed never fetches on its own: the caller
//! supplies the fetch as a closure taking the next-page locator.
//!
//! Both mutating operations take `&mut self`, so a second `load_more` cannot
//! start on a feed while the first one is still awaiting its page.

use crate::types::{Post, PostPage};
use std::future::Future;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFeed {
    posts: Vec<Post>,
    next_page: Option<String>,
}

impl PostFeed {
    /// Start a feed from the first listing page.
    pub fn new(first_page: PostPage) -> Self {
        Self {
            posts: first_page.results,
            next_page: first_page.next_page,
        }
    }

    /// Whether another page can be fetched.
    pub fn has_more(&self) -> bool {
        self.next_page_token().is_some()
    }

    /// The locator of the next page, if the feed is not exhausted.
    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page.as_deref().filter(|t| !t.is_empty())
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Append a fetched page and take over its next-page locator.
    ///
    /// An empty page with a locator is still applied: it moves the feed on.
    pub fn apply_page(&mut self, page: PostPage) {
        self.posts.extend(page.results);
        self.next_page = page.next_page;
    }

    /// Fetch the next page and merge it in.
    ///
    /// Returns `Ok(false)` without calling `fetch` when the feed is
    /// exhausted. A failed fetch leaves the feed as it was.
    pub async fn load_more<F, Fut, E>(&mut self, fetch: F) -> Result<bool, E>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<PostPage, E>>,
    {
        let Some(token) = self.next_page_token().map(str::to_owned) else {
            return Ok(false);
        };
        let page = fetch(token).await?;
        self.apply_page(page);
        Ok(true)
    }

    pub fn into_posts(self) -> Vec<Post> {
        self.posts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{page, post};
    use std::cell::Cell;
    use std::collections::HashMap;

    /// Pages keyed by locator; fetching an unknown locator is an error.
    fn pages(entries: &[(&str, PostPage)]) -> HashMap<String, PostPage> {
        entries
            .iter()
            .map(|(token, page)| (token.to_string(), page.clone()))
            .collect()
    }

    fn uids(feed: &PostFeed) -> Vec<&str> {
        feed.posts().iter().map(|p| p.uid.as_str()).collect()
    }

    #[test]
    fn new_takes_first_page() {
        let feed = PostFeed::new(page(&["a", "b"], Some("page2")));
        assert_eq!(uids(&feed), ["a", "b"]);
        assert_eq!(feed.next_page_token(), Some("page2"));
        assert!(feed.has_more());
    }

    #[test]
    fn has_more_false_without_token() {
        assert!(!PostFeed::new(page(&["a"], None)).has_more());
    }

    #[test]
    fn has_more_false_with_empty_token() {
        let feed = PostFeed::new(page(&["a"], Some("")));
        assert!(!feed.has_more());
        assert_eq!(feed.next_page_token(), None);
    }

    #[tokio::test]
    async fn load_more_appends_and_exhausts() {
        let remote = pages(&[("page2", page(&["b"], None))]);
        let mut feed = PostFeed::new(page(&["a"], Some("page2")));

        let loaded = feed
            .load_more(|token| async move { remote.get(&token).cloned().ok_or(token) })
            .await
            .unwrap();

        assert!(loaded);
        assert_eq!(uids(&feed), ["a", "b"]);
        assert!(!feed.has_more());
    }

    #[tokio::test]
    async fn load_more_concatenates_pages_in_fetch_order() {
        let remote = pages(&[
            ("p2", page(&["c", "d"], Some("p3"))),
            ("p3", page(&["e"], Some("p4"))),
            ("p4", page(&["f", "g"], None)),
        ]);
        let mut feed = PostFeed::new(page(&["a", "b"], Some("p2")));

        while feed.has_more() {
            feed.load_more(|token| {
                let fetched = remote.get(&token).cloned();
                async move { fetched.ok_or(token) }
            })
            .await
            .unwrap();
        }

        assert_eq!(uids(&feed), ["a", "b", "c", "d", "e", "f", "g"]);
        assert_eq!(feed.next_page_token(), None);
    }

    #[tokio::test]
    async fn load_more_keeps_last_token() {
        let remote = pages(&[("p2", page(&["b"], Some("p3")))]);
        let mut feed = PostFeed::new(page(&["a"], Some("p2")));
        feed.load_more(|token| async move { remote.get(&token).cloned().ok_or(token) })
            .await
            .unwrap();
        assert_eq!(feed.next_page_token(), Some("p3"));
    }

    #[tokio::test]
    async fn load_more_when_exhausted_is_noop() {
        let calls = Cell::new(0);
        let mut feed = PostFeed::new(page(&["a"], None));
        let before = feed.clone();

        let loaded = feed
            .load_more(|_| {
                calls.set(calls.get() + 1);
                async { Ok::<_, ()>(page(&["x"], None)) }
            })
            .await
            .unwrap();

        assert!(!loaded);
        assert_eq!(calls.get(), 0);
        assert_eq!(feed, before);
    }

    #[tokio::test]
    async fn empty_page_with_token_still_advances() {
        let remote = pages(&[
            ("p2", page(&[], Some("p3"))),
            ("p3", page(&["b"], None)),
        ]);
        let mut feed = PostFeed::new(page(&["a"], Some("p2")));

        feed.load_more(|token| async move { remote.get(&token).cloned().ok_or(token) })
            .await
            .unwrap();
        assert_eq!(uids(&feed), ["a"]);
        assert_eq!(feed.next_page_token(), Some("p3"));
    }

    #[tokio::test]
    async fn failed_fetch_leaves_feed_untouched() {
        let mut feed = PostFeed::new(page(&["a"], Some("p2")));
        let before = feed.clone();

        let result = feed
            .load_more(|_| async { Err::<PostPage, _>("connection reset") })
            .await;

        assert_eq!(result, Err("connection reset"));
        assert_eq!(feed, before);
    }

    #[test]
    fn apply_page_does_not_dedupe() {
        let mut feed = PostFeed::new(page(&["a"], Some("p2")));
        feed.apply_page(page(&["a"], None));
        assert_eq!(uids(&feed), ["a", "a"]);
    }

    #[test]
    fn into_posts_preserves_order() {
        let mut feed = PostFeed::new(page(&["a"], Some("p2")));
        feed.apply_page(page(&["b"], None));
        let posts = feed.into_posts();
        assert_eq!(posts, vec![post("a"), post("b")]);
    }
}
