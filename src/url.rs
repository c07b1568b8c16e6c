//! Defines [`SiteUrls`], which maps locales, posts, tags and page numbers
//! onto absolute URLs under the site root.
//!
//! Every path produced here ends in a trailing slash except feeds and other
//! files, matching the layout the renderer exports.

use crate::locale::Locale;
use url::{ParseError, Url};

/// Builds absolute URLs for site pages.
#[derive(Clone, Debug)]
pub struct SiteUrls {
    root: Url,
}

impl SiteUrls {
    /// Constructs a new `SiteUrls`. A trailing slash is appended to `root`
    /// if it doesn't have one already.
    ///
    /// NOTE: the trailing slash is significant. Without it, [`Url::join`]
    /// treats the last path component as a "file" name and replaces it, so
    /// `https://example.org/blog` joined with `de/` would become
    /// `https://example.org/de/` rather than `https://example.org/blog/de/`.
    pub fn new(root: &Url) -> SiteUrls {
        let mut root = root.clone();
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        SiteUrls { root }
    }

    /// The site root, always with a trailing slash.
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Joins a site-relative path onto the root. Leading slashes on `path`
    /// are ignored so the result always stays under the root.
    pub fn page(&self, path: &str) -> Result<Url> {
        self.root.join(path.trim_start_matches('/'))
    }

    /// The home page of a locale (`/` or `/de/`).
    pub fn locale_home(&self, locale: Locale) -> Result<Url> {
        self.page(locale.prefix())
    }

    /// The first page of a locale's blog index.
    pub fn blog_index(&self, locale: Locale) -> Result<Url> {
        self.page(&format!("{}blog/", locale.prefix()))
    }

    /// Page `n` (1-based) of a locale's blog index. Page 1 is the index
    /// itself.
    pub fn blog_page(&self, locale: Locale, n: usize) -> Result<Url> {
        match n {
            0 | 1 => self.blog_index(locale),
            _ => self.page(&format!("{}blog/page/{}/", locale.prefix(), n)),
        }
    }

    /// A post page.
    pub fn post(&self, locale: Locale, slug: &str) -> Result<Url> {
        self.page(&format!("{}blog/{}/", locale.prefix(), slug))
    }

    /// The tags overview of a locale.
    pub fn tags_index(&self, locale: Locale) -> Result<Url> {
        self.page(&format!("{}tags/", locale.prefix()))
    }

    /// The first page of a tag listing. `tag` must already be slugified.
    pub fn tag(&self, locale: Locale, tag: &str) -> Result<Url> {
        self.page(&format!("{}tags/{}/", locale.prefix(), tag))
    }

    /// Page `n` (1-based) of a tag listing.
    pub fn tag_page(&self, locale: Locale, tag: &str, n: usize) -> Result<Url> {
        match n {
            0 | 1 => self.tag(locale, tag),
            _ => self.page(&format!("{}tags/{}/page/{}/", locale.prefix(), tag, n)),
        }
    }

    /// A locale's RSS feed file, relative to the site root (`de/feed.xml`).
    pub fn feed_path(locale: Locale) -> String {
        format!("{}feed.xml", locale.prefix())
    }

    /// A tag's RSS feed file, relative to the site root.
    pub fn tag_feed_path(locale: Locale, tag: &str) -> String {
        format!("{}tags/{}/feed.xml", locale.prefix(), tag)
    }

    /// The canonical link of a locale's blog, used as the feed channel link.
    /// Unlike page URLs it has no trailing slash (`https://example.org/de/blog`).
    pub fn blog_link(&self, locale: Locale) -> Result<Url> {
        self.page(&format!("{}blog", locale.prefix()))
    }

    /// Converts a possibly site-relative asset path (e.g. an image under
    /// `/static/`) into an absolute URL. Absolute URLs are returned as-is.
    pub fn asset(&self, path: &str) -> Result<Url> {
        match Url::parse(path) {
            Ok(absolute) => Ok(absolute),
            Err(ParseError::RelativeUrlWithoutBase) => self.page(path),
            Err(e) => Err(e),
        }
    }
}

type Result<T> = std::result::Result<T, ParseError>;
