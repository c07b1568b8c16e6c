//! The content selector: turns the catalog into the ordered, locale-scoped
//! feed every other part of the build works from.

use crate::locale::Locale;
pub use crate::post::Mode;
use crate::post::Post;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;

/// Selects the posts of `locale` that are visible at `now` under `mode`,
/// newest first.
///
/// The sort is stable: posts with equal dates keep their catalog order, and
/// posts without a date (which only pass the preview gate) come last, also
/// in catalog order. The same inputs always yield the same output.
pub fn select_visible_posts(
    catalog: &[Post],
    locale: Locale,
    now: DateTime<Utc>,
    mode: Mode,
) -> Vec<&Post> {
    let mut feed: Vec<&Post> = catalog
        .iter()
        .filter(|post| post.locale == locale && post.is_visible(now, mode))
        .collect();
    // `None < Some(_)`, so undated posts sort after every dated one.
    feed.sort_by_key(|post| Reverse(post.date));
    feed
}

/// Finds a post by locale and slug regardless of visibility.
pub fn find_post<'a>(catalog: &'a [Post], locale: Locale, slug: &str) -> Option<&'a Post> {
    catalog
        .iter()
        .find(|post| post.locale == locale && post.slug == slug)
}

/// Returns the neighbours of `slug` in a feed as `(prev, next)`: `prev` is
/// the next older post and `next` the next newer one. Both are `None` when
/// the slug isn't in the feed.
pub fn neighbours<'a>(feed: &[&'a Post], slug: &str) -> (Option<&'a Post>, Option<&'a Post>) {
    match feed.iter().position(|post| post.slug == slug) {
        None => (None, None),
        Some(i) => (
            feed.get(i + 1).copied(),
            match i {
                0 => None,
                _ => Some(feed[i - 1]),
            },
        ),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::{now, post};

    fn slugs(feed: &[&Post]) -> Vec<String> {
        feed.iter().map(|p| p.slug.clone()).collect()
    }

    fn catalog() -> Vec<Post> {
        let mut de = post("de-only", "2024-02-01", &[]);
        de.locale = Locale::De;
        let mut draft = post("draft", "2024-03-01", &[]);
        draft.draft = true;
        vec![
            post("old", "2024-01-01", &[]),
            post("new", "2024-01-20", &[]),
            de,
            draft,
            post("future", "2030-01-01", &[]),
            post("undated", "sometime", &[]),
            post("mid", "2024-01-10", &[]),
        ]
    }

    #[test]
    fn test_production_feed() {
        let catalog = catalog();
        let feed = select_visible_posts(&catalog, Locale::En, now(), Mode::Production);
        assert_eq!(vec!["new", "mid", "old"], slugs(&feed));
        assert!(feed.iter().all(|p| p.locale == Locale::En));
        assert!(feed.iter().all(|p| !p.draft && p.date.unwrap() <= now()));
    }

    #[test]
    fn test_preview_feed() {
        let catalog = catalog();
        let feed = select_visible_posts(&catalog, Locale::En, now(), Mode::Preview);
        assert_eq!(
            vec!["future", "draft", "new", "mid", "old", "undated"],
            slugs(&feed)
        );
    }

    #[test]
    fn test_no_locale_fallback() {
        let catalog = catalog();
        let feed = select_visible_posts(&catalog, Locale::Nl, now(), Mode::Preview);
        assert!(feed.is_empty());

        let feed = select_visible_posts(&catalog, Locale::De, now(), Mode::Production);
        assert_eq!(vec!["de-only"], slugs(&feed));
    }

    #[test]
    fn test_equal_dates_keep_catalog_order() {
        let catalog = vec![
            post("first", "2024-01-10", &[]),
            post("newer", "2024-01-11", &[]),
            post("second", "2024-01-10", &[]),
            post("third", "2024-01-10", &[]),
        ];
        let feed = select_visible_posts(&catalog, Locale::En, now(), Mode::Production);
        assert_eq!(vec!["newer", "first", "second", "third"], slugs(&feed));
    }

    #[test]
    fn test_deterministic() {
        let catalog = catalog();
        let a = select_visible_posts(&catalog, Locale::En, now(), Mode::Preview);
        let b = select_visible_posts(&catalog, Locale::En, now(), Mode::Preview);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_catalog() {
        assert!(select_visible_posts(&[], Locale::En, now(), Mode::Production).is_empty());
    }

    #[test]
    fn test_find_post_ignores_visibility() {
        let catalog = catalog();
        assert_eq!(
            Some("draft"),
            find_post(&catalog, Locale::En, "draft").map(|p| p.slug.as_str())
        );
        assert!(find_post(&catalog, Locale::Nl, "draft").is_none());
    }

    #[test]
    fn test_neighbours() {
        let catalog = catalog();
        let feed = select_visible_posts(&catalog, Locale::En, now(), Mode::Production);
        let (prev, next) = neighbours(&feed, "mid");
        assert_eq!(Some("old"), prev.map(|p| p.slug.as_str()));
        assert_eq!(Some("new"), next.map(|p| p.slug.as_str()));

        let (prev, next) = neighbours(&feed, "new");
        assert_eq!(Some("mid"), prev.map(|p| p.slug.as_str()));
        assert!(next.is_none());

        assert_eq!((None, None), neighbours(&feed, "missing"));
    }
}
