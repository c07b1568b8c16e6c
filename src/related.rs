//! The related-content ranker.

use crate::locale::Locale;
use crate::post::{Mode, Post};
use crate::select::select_visible_posts;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;

/// The default number of related posts shown under a post.
pub const RELATED_POSTS_LIMIT: usize = 3;

/// Ranks the visible posts of `locale` (other than `exclude_slug`) by how
/// many of their tags appear in `tags`, then by date, newest first. Returns
/// at most `limit` posts.
///
/// Posts sharing no tag are never returned: a post with no overlap gets no
/// related posts at all rather than a list of recent ones.
pub fn related_posts<'a>(
    catalog: &'a [Post],
    locale: Locale,
    now: DateTime<Utc>,
    mode: Mode,
    exclude_slug: &str,
    tags: &[String],
    limit: usize,
) -> Vec<&'a Post> {
    let mut scored: Vec<(usize, &Post)> = select_visible_posts(catalog, locale, now, mode)
        .into_iter()
        .filter(|post| post.slug != exclude_slug)
        .map(|post| (overlap(&post.tags, tags), post))
        .filter(|(score, _)| *score > 0)
        .collect();

    // The feed is already newest first and the sort is stable, so equal
    // scores stay in date order.
    scored.sort_by_key(|(score, _)| Reverse(*score));
    scored.into_iter().take(limit).map(|(_, post)| post).collect()
}

/// The tag overlap score: how many of `candidate`'s tags appear in
/// `reference`.
pub fn overlap(candidate: &[String], reference: &[String]) -> usize {
    candidate.iter().filter(|t| reference.contains(t)).count()
}
