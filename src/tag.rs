//! Defines the [`Tag`] type, which represents a [`crate::post::Post`] tag,
//! along with the tag taxonomy helpers: slugging, per-locale tag counts and
//! tag-filtered listings.

use crate::locale::Locale;
use crate::post::Post;
use crate::url::SiteUrls;
use serde::Serialize;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use url::Url;

/// Maps tag slugs to the number of visible posts carrying them, for one
/// locale.
pub type TagCounts = BTreeMap<String, usize>;

/// Represents a [`Post`] tag as presented to renderers. Posts store tags as
/// plain labels; a [`Tag`] is derived from a label when a post is
/// summarized.
#[derive(Clone, Debug, Serialize)]
pub struct Tag {
    /// The tag as authored, e.g. `Bitcoin ETF`.
    pub name: String,

    /// The slugified tag, e.g. `bitcoin-etf`. Two labels with the same slug
    /// are the same tag.
    pub slug: String,

    /// The URL for the tag's first listing page.
    pub url: Url,
}

impl Tag {
    /// Builds a [`Tag`] from an authored label.
    pub fn new(name: &str, locale: Locale, urls: &SiteUrls) -> Result<Tag, url::ParseError> {
        let slug = tag_slug(name);
        Ok(Tag {
            url: urls.tag(locale, &slug)?,
            name: name.to_owned(),
            slug,
        })
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `slug`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slug.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by delegating directly
    /// to the `slug` field.
    fn eq(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}
impl Eq for Tag {}

/// Normalizes a tag label into its URL slug the way GitHub slugs headings:
/// lower-cased, punctuation and symbols dropped, each space turned into `-`.
/// Letters outside ASCII are kept as they are, so `Währung` → `währung` and
/// `Zinsen & Märkte` → `zinsen--märkte`.
pub fn tag_slug(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .map(|c| match c {
            ' ' => '-',
            c => c,
        })
        .collect()
}

/// The display title for a tag listing page: the first character upper-cased
/// and any spaces turned into `-`.
pub fn tag_title(tag: &str) -> String {
    let hyphenated = tag.split(' ').collect::<Vec<_>>().join("-");
    let mut chars = hyphenated.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Counts tags over a feed of visible posts. A post is counted once per
/// distinct tag slug even if two of its labels slug to the same value.
pub fn tag_counts<'a>(feed: impl IntoIterator<Item = &'a Post>) -> TagCounts {
    let mut counts = TagCounts::new();
    for post in feed {
        let mut slugs: Vec<String> = post.tags.iter().map(|t| tag_slug(t)).collect();
        slugs.sort();
        slugs.dedup();
        for slug in slugs.into_iter().filter(|s| !s.is_empty()) {
            *counts.entry(slug).or_insert(0) += 1;
        }
    }
    counts
}

/// Filters a feed down to the posts carrying `slug`, preserving the feed's
/// order.
pub fn posts_with_tag<'a>(feed: &[&'a Post], slug: &str) -> Vec<&'a Post> {
    feed.iter()
        .copied()
        .filter(|post| post.tags.iter().any(|t| tag_slug(t) == slug))
        .collect()
}
