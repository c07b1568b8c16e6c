//! Builds the listing descriptors renderers use for index pages: the blog
//! index of each locale and one listing per tag. A [`Listing`] is a
//! paginated group of posts; each of its [`ListingPage`]s holds one page of
//! post summaries along with its pagination state and neighbour links.

use crate::locale::Locale;
use crate::pagination::{paginate_str, windows, NotFound, Pagination};
use crate::post::{Post, PostSummary};
use crate::tag::{tag_slug, tag_title};
use crate::url::SiteUrls;
use serde::Serialize;
use std::collections::BTreeMap;
use url::{ParseError, Url};

/// The title of every blog index page.
pub const BLOG_TITLE: &str = "All Posts";

/// One page of a [`Listing`].
#[derive(Clone, Debug, Serialize)]
pub struct ListingPage {
    pub locale: Locale,
    pub title: String,

    /// The tag slug for tag listings; `None` for the blog index.
    pub tag: Option<String>,

    pub url: Url,
    pub posts: Vec<PostSummary>,
    pub pagination: Pagination,

    /// The URL for the previous (newer) page, if any.
    pub prev: Option<Url>,

    /// The URL for the next (older) page, if any.
    pub next: Option<Url>,
}

/// A paginated group of posts: the blog index of a locale, or the posts of
/// one tag.
#[derive(Clone, Debug)]
pub struct Listing {
    pub locale: Locale,
    pub tag: Option<String>,
    pub item_count: usize,
    pub page_size: usize,

    /// One entry per valid page. An empty listing has a single page with no
    /// posts and `total_pages == 0`, so renderers can show an empty state on
    /// the listing's first URL.
    pub pages: Vec<ListingPage>,
}

impl Listing {
    /// The blog index of `locale` over its visible `feed`.
    pub fn blog(locale: Locale, feed: &[&Post], page_size: usize, urls: &SiteUrls) -> Result<Listing, ParseError> {
        Listing::build(
            locale,
            None,
            BLOG_TITLE.to_owned(),
            feed,
            page_size,
            |n| urls.blog_page(locale, n),
            urls,
        )
    }

    /// The listing of the posts in `feed` tagged `slug`. `feed` must already
    /// be filtered to the tag.
    pub fn tag(locale: Locale, slug: &str, feed: &[&Post], page_size: usize, urls: &SiteUrls) -> Result<Listing, ParseError> {
        Listing::build(
            locale,
            Some(slug.to_owned()),
            tag_title(slug),
            feed,
            page_size,
            |n| urls.tag_page(locale, slug, n),
            urls,
        )
    }

    fn build(
        locale: Locale,
        tag: Option<String>,
        title: String,
        feed: &[&Post],
        page_size: usize,
        page_url: impl Fn(usize) -> Result<Url, ParseError>,
        urls: &SiteUrls,
    ) -> Result<Listing, ParseError> {
        let mut pages = Vec::new();
        for window in windows(feed.len(), page_size) {
            let n = window.pagination.current_page;
            let total = window.pagination.total_pages;
            pages.push(ListingPage {
                locale,
                title: title.clone(),
                tag: tag.clone(),
                url: page_url(n)?,
                posts: window
                    .slice(feed)
                    .iter()
                    .map(|post| post.summarize(urls))
                    .collect::<Result<_, _>>()?,
                pagination: window.pagination,
                prev: match n {
                    1 => None,
                    _ => Some(page_url(n - 1)?),
                },
                next: match n < total {
                    false => None,
                    true => Some(page_url(n + 1)?),
                },
            });
        }

        if pages.is_empty() {
            pages.push(ListingPage {
                locale,
                title,
                tag: tag.clone(),
                url: page_url(1)?,
                posts: Vec::new(),
                pagination: Pagination {
                    current_page: 1,
                    total_pages: 0,
                },
                prev: None,
                next: None,
            });
        }

        Ok(Listing {
            locale,
            tag,
            item_count: feed.len(),
            page_size,
            pages,
        })
    }

    /// The listing's first page (or its empty state).
    pub fn first_page(&self) -> &ListingPage {
        // `build` always pushes at least one page.
        &self.pages[0]
    }

    /// The pages that exist as numbered paths (`/page/{n}`) beyond the first.
    pub fn numbered_pages(&self) -> impl Iterator<Item = &ListingPage> {
        self.pages
            .iter()
            .filter(|page| page.pagination.total_pages > 0 && page.pagination.current_page > 1)
    }

    /// Looks up a page by the page number taken from a request path. Pages
    /// outside `1..=total_pages`, including every numbered page of an empty
    /// listing, are [`NotFound`].
    pub fn lookup(&self, requested: &str) -> Result<&ListingPage, NotFound> {
        let window = paginate_str(self.item_count, self.page_size, requested)?;
        self.pages
            .get(window.pagination.current_page - 1)
            .ok_or(NotFound)
    }
}

/// Builds one [`Listing`] per tag found in `feed`, keyed (and ordered) by
/// tag slug.
pub fn tag_listings(
    locale: Locale,
    feed: &[&Post],
    page_size: usize,
    urls: &SiteUrls,
) -> Result<BTreeMap<String, Listing>, ParseError> {
    let mut indices: BTreeMap<String, Vec<&Post>> = BTreeMap::new();
    for post in feed {
        let mut slugs: Vec<String> = post.tags.iter().map(|t| tag_slug(t)).collect();
        slugs.sort();
        slugs.dedup();
        for slug in slugs.into_iter().filter(|s| !s.is_empty()) {
            indices.entry(slug).or_insert_with(Vec::new).push(*post);
        }
    }

    indices
        .into_iter()
        .map(|(slug, posts)| {
            let listing = Listing::tag(locale, &slug, &posts, page_size, urls)?;
            Ok((slug, listing))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::post;

    fn urls() -> SiteUrls {
        SiteUrls::new(&Url::parse("https://example.org/").unwrap())
    }

    fn posts(n: usize) -> Vec<Post> {
        (0..n)
            .map(|i| post(&format!("p{:02}", i), &format!("2024-01-{:02}", 28 - i), &["gold"]))
            .collect()
    }

    #[test]
    fn test_blog_pages() -> Result<(), ParseError> {
        let catalog = posts(12);
        let feed: Vec<&Post> = catalog.iter().collect();
        let listing = Listing::blog(Locale::En, &feed, 5, &urls())?;

        assert_eq!(3, listing.pages.len());
        let sizes: Vec<usize> = listing.pages.iter().map(|p| p.posts.len()).collect();
        assert_eq!(vec![5, 5, 2], sizes);

        let first = listing.first_page();
        assert_eq!("https://example.org/blog/", first.url.as_str());
        assert!(first.prev.is_none());
        assert_eq!(
            Some("https://example.org/blog/page/2/"),
            first.next.as_ref().map(Url::as_str)
        );

        let last = &listing.pages[2];
        assert_eq!(
            Pagination {
                current_page: 3,
                total_pages: 3
            },
            last.pagination
        );
        assert_eq!("p10", last.posts[0].slug);
        assert_eq!(
            Some("https://example.org/blog/page/2/"),
            last.prev.as_ref().map(Url::as_str)
        );
        assert!(last.next.is_none());
        assert_eq!(2, listing.numbered_pages().count());
        Ok(())
    }

    #[test]
    fn test_empty_blog_has_empty_state_only() -> Result<(), ParseError> {
        let listing = Listing::blog(Locale::Nl, &[], 5, &urls())?;
        assert_eq!(1, listing.pages.len());
        assert!(listing.first_page().posts.is_empty());
        assert_eq!(0, listing.first_page().pagination.total_pages);
        assert_eq!("https://example.org/nl/blog/", listing.first_page().url.as_str());
        assert_eq!(0, listing.numbered_pages().count());
        assert_eq!(Err(NotFound), listing.lookup("1").map(|_| ()));
        Ok(())
    }

    #[test]
    fn test_lookup() -> Result<(), ParseError> {
        let catalog = posts(12);
        let feed: Vec<&Post> = catalog.iter().collect();
        let listing = Listing::blog(Locale::En, &feed, 5, &urls())?;
        assert_eq!(
            Ok(3),
            listing.lookup("3").map(|p| p.pagination.current_page)
        );
        assert_eq!(Err(NotFound), listing.lookup("4").map(|_| ()));
        assert_eq!(Err(NotFound), listing.lookup("0").map(|_| ()));
        assert_eq!(Err(NotFound), listing.lookup("abc").map(|_| ()));
        Ok(())
    }

    #[test]
    fn test_tag_listings() -> Result<(), ParseError> {
        let catalog = vec![
            post("a", "2024-01-20", &["Gold", "Central Banks"]),
            post("b", "2024-01-10", &["crypto"]),
            post("c", "2024-01-05", &["gold"]),
        ];
        let feed: Vec<&Post> = catalog.iter().collect();
        let listings = tag_listings(Locale::De, &feed, 5, &urls())?;

        assert_eq!(
            vec!["central-banks", "crypto", "gold"],
            listings.keys().map(String::as_str).collect::<Vec<_>>()
        );
        let gold = &listings["gold"];
        assert_eq!(2, gold.item_count);
        assert_eq!("Gold", gold.first_page().title);
        assert_eq!(Some("gold".to_owned()), gold.first_page().tag);
        assert_eq!("https://example.org/de/tags/gold/", gold.first_page().url.as_str());
        assert_eq!(
            vec!["a", "c"],
            gold.first_page()
                .posts
                .iter()
                .map(|p| p.slug.as_str())
                .collect::<Vec<_>>()
        );
        Ok(())
    }
}
