//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the site's data: parsing the catalog
//! ([`crate::parser`]), writing tag counts, listing and post descriptors as
//! JSON, and generating the feeds ([`crate::feed`]), the sitemap and
//! `robots.txt` ([`crate::sitemap`]).
//!
//! The output directory is laid out as follows:
//!
//! ```text
//! tag-data-{locale}.json
//! data/{locale}/blog/{n}.json
//! data/{locale}/tags/{tag}/{n}.json
//! data/{locale}/posts/{slug}.json
//! {prefix}feed.xml
//! {prefix}tags/{tag}/feed.xml
//! sitemap.xml
//! robots.txt
//! ```

use crate::config::Config;
use crate::feed::{Error as FeedError, FeedWriter};
use crate::listing::{tag_listings, Listing, ListingPage};
use crate::locale::Locale;
use crate::parser::{Error as ParseError, Parser};
use crate::post::{Mode, Post};
use crate::select::select_visible_posts;
use crate::sitemap::{robots_txt, Error as SitemapError, Sitemap};
use crate::structured::PostPages;
use crate::tag::tag_counts;
use crate::url::SiteUrls;
use crate::util::{rmdir, write_file};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What a build wrote.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildSummary {
    pub posts: usize,
    pub listing_pages: usize,
    pub feeds: usize,
    pub sitemap_entries: usize,
}

/// Builds the site from a [`Config`] object. `now` gates scheduled posts
/// and `mode` decides whether drafts and scheduled posts are included in the
/// listings and post descriptors. Feeds and the sitemap only ever contain
/// published posts.
pub fn build_site(config: &Config, now: DateTime<Utc>, mode: Mode) -> Result<BuildSummary> {
    let catalog = Parser::new(&config.content_directory).parse_catalog()?;
    info!(posts = catalog.len(), "parsed catalog");

    // Blow away the previous data and tag feed directories so that removed
    // posts and tags don't linger.
    let output = &config.output_directory;
    clean(&output.join("data"))?;
    for locale in Locale::ALL.iter() {
        clean(&output.join(format!("{}tags", locale.prefix())))?;
    }

    let urls = SiteUrls::new(&config.site.url);
    let mut summary = BuildSummary::default();

    for locale in Locale::ALL.iter().copied() {
        let feed = select_visible_posts(&catalog, locale, now, mode);
        let data = output.join("data").join(locale.code());

        write_json(
            &output.join(format!("tag-data-{}.json", locale.code())),
            &tag_counts(feed.iter().copied()),
        )?;

        let blog = Listing::blog(locale, &feed, config.posts_per_page, &urls)?;
        summary.listing_pages += write_listing(&data.join("blog"), &blog)?;
        for (slug, listing) in tag_listings(locale, &feed, config.posts_per_page, &urls)? {
            summary.listing_pages += write_listing(&data.join("tags").join(slug), &listing)?;
        }

        let pages = PostPages {
            catalog: &catalog,
            site: &config.site,
            urls: &urls,
            now,
            mode,
            related_limit: config.related_posts,
        };
        for post in &feed {
            let page = pages.build(post, &feed)?;
            write_json(&data.join("posts").join(format!("{}.json", post.slug)), &page)?;
        }
        summary.posts += feed.len();
        info!(locale = %locale, posts = feed.len(), "wrote listings and posts");
    }

    let published: Vec<(Locale, Vec<&Post>)> = Locale::ALL
        .iter()
        .map(|&locale| (locale, select_visible_posts(&catalog, locale, now, Mode::Production)))
        .collect();

    let writer = FeedWriter {
        site: &config.site,
        urls: &urls,
        now,
    };
    for (locale, feed) in &published {
        for rendered in writer.feeds(*locale, feed)? {
            write(&output.join(&rendered.path), rendered.xml)?;
            summary.feeds += 1;
        }
    }
    info!(feeds = summary.feeds, "wrote feeds");

    let sitemap = Sitemap::build(
        &urls,
        &config.static_pages,
        &published,
        config.posts_per_page,
        now,
    )?;
    write(&output.join("sitemap.xml"), sitemap.to_xml())?;
    write(&output.join("robots.txt"), robots_txt(&urls)?)?;
    summary.sitemap_entries = sitemap.entries.len();
    info!(entries = summary.sitemap_entries, "wrote sitemap and robots.txt");

    Ok(summary)
}

/// Writes one `{n}.json` file per page of `listing` into `dir` and returns
/// the number of pages written.
fn write_listing(dir: &Path, listing: &Listing) -> Result<usize> {
    let pages: &[ListingPage] = &listing.pages;
    for page in pages {
        write_json(
            &dir.join(format!("{}.json", page.pagination.current_page)),
            page,
        )?;
    }
    Ok(pages.len())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).map_err(|err| Error::Serialize {
        path: path.to_owned(),
        err,
    })?;
    write(path, json)
}

fn write(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    debug!(path = %path.display(), "writing");
    write_file(path, contents).map_err(|err| Error::Write {
        path: path.to_owned(),
        err,
    })
}

fn clean(dir: &Path) -> Result<()> {
    rmdir(dir).map_err(|err| Error::Clean {
        path: dir.to_owned(),
        err,
    })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing,
/// building URLs, serializing descriptors, generating feeds or the sitemap,
/// cleaning output directories, and writing files.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned when a page URL can't be built.
    UrlParse(url::ParseError),

    /// Returned for errors serializing a descriptor to JSON.
    Serialize { path: PathBuf, err: serde_json::Error },

    /// Returned for errors generating a feed.
    Feed(FeedError),

    /// Returned for errors generating the sitemap.
    Sitemap(SitemapError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while writing output files.
    Write { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Serialize { path, err } => {
                write!(f, "Serializing '{}': {}", path.display(), err)
            }
            Error::Feed(err) => err.fmt(f),
            Error::Sitemap(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::Write { path, err } => {
                write!(f, "Writing file '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Serialize { path: _, err } => Some(err),
            Error::Feed(err) => Some(err),
            Error::Sitemap(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::Write { path: _, err } => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts [`url::ParseError`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

impl From<SitemapError> for Error {
    /// Converts [`SitemapError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: SitemapError) -> Error {
        Error::Sitemap(err)
    }
}
