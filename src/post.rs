//! Defines the [`Post`] type, its visibility rules, and [`PostSummary`], the
//! serializable view of a post handed to renderers.

use crate::locale::Locale;
use crate::tag::Tag;
use crate::url::SiteUrls;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use url::Url;

/// The build mode. It decides whether drafts and future-dated posts are
/// included in the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Only published posts: not drafts, with a valid date that isn't in the
    /// future.
    Production,

    /// Everything, including drafts, future-dated posts and posts whose date
    /// couldn't be parsed. Used while authoring.
    Preview,
}

/// A blog post as read from the content directory. Posts are produced once
/// per build and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// Identifies the post within its locale. For `data/blog/en/foo/bar.mdx`
    /// this is `foo/bar`.
    pub slug: String,

    pub locale: Locale,

    /// The publish date. `None` when the front matter has no date or one
    /// that can't be parsed.
    pub date: Option<DateTime<Utc>>,

    /// The `lastmod` front matter date, if any.
    pub last_modified: Option<DateTime<Utc>>,

    pub draft: bool,

    /// Free-text labels in authoring order.
    pub tags: Vec<String>,

    pub title: String,

    pub summary: Option<String>,

    /// Image paths in authoring order; the first one is the cover.
    pub images: Vec<String>,

    /// Author identifiers from the front matter.
    pub authors: Vec<String>,

    /// The raw MDX body (everything after the front matter).
    pub body: String,
}

impl Post {
    /// Whether the post appears in the output for the given mode, with `now`
    /// as the gating instant.
    pub fn is_visible(&self, now: DateTime<Utc>, mode: Mode) -> bool {
        match mode {
            Mode::Preview => true,
            Mode::Production => {
                !self.draft && matches!(self.date, Some(date) if date <= now)
            }
        }
    }

    /// The cover (hero) image.
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// The modification date used for sitemaps and structured data: the
    /// `lastmod` date if there is one, else the publish date.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified.or(self.date)
    }

    /// Converts the post into a [`PostSummary`] for listings.
    pub fn summarize(&self, urls: &SiteUrls) -> Result<PostSummary, url::ParseError> {
        Ok(PostSummary {
            slug: self.slug.clone(),
            locale: self.locale,
            url: urls.post(self.locale, &self.slug)?,
            title: self.title.clone(),
            summary: self.summary.clone(),
            date: self.date,
            last_modified: self.last_modified,
            draft: self.draft,
            tags: self
                .tags
                .iter()
                .map(|t| Tag::new(t, self.locale, urls))
                .collect::<Result<_, _>>()?,
            cover_image: self.cover_image().map(str::to_owned),
        })
    }
}

/// The listing view of a [`Post`]: everything a card or feed entry needs,
/// without the body.
#[derive(Clone, Debug, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub locale: Locale,
    pub url: Url,
    pub title: String,
    pub summary: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub draft: bool,
    pub tags: Vec<Tag>,
    pub cover_image: Option<String>,
}

/// Parses a front matter date. Accepts RFC 3339 (`2024-01-10T08:00:00Z`), a
/// date-time without offset (read as UTC) and a plain date (midnight UTC).
/// Returns `None` for anything else.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
