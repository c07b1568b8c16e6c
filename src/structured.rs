//! Post page descriptors: everything a renderer needs for a single post
//! besides its body, including neighbour links, related posts and the
//! schema.org structured data embedded as JSON-LD.

use crate::config::Site;
use crate::locale::Locale;
use crate::post::{Mode, Post, PostSummary};
use crate::related::related_posts;
use crate::select::neighbours;
use crate::url::SiteUrls;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use url::{ParseError, Url};

/// The author id that stands for the site's own author.
const DEFAULT_AUTHOR: &str = "default";

/// A link to a neighbouring post.
#[derive(Clone, Debug, Serialize)]
pub struct PostLink {
    pub slug: String,
    pub title: String,
    pub url: Url,
}

/// The descriptor of a post page.
#[derive(Clone, Debug, Serialize)]
pub struct PostPage {
    #[serde(flatten)]
    pub post: PostSummary,

    /// Display names of the authors.
    pub authors: Vec<String>,

    pub canonical: Url,

    /// The post's URL in every locale, plus `x-default`.
    pub alternates: BTreeMap<String, Url>,

    /// The next older post.
    pub prev: Option<PostLink>,

    /// The next newer post.
    pub next: Option<PostLink>,

    pub related: Vec<PostSummary>,

    pub json_ld: Value,
}

/// Builds [`PostPage`]s for one catalog snapshot.
pub struct PostPages<'a> {
    pub catalog: &'a [Post],
    pub site: &'a Site,
    pub urls: &'a SiteUrls,
    pub now: DateTime<Utc>,
    pub mode: Mode,
    pub related_limit: usize,
}

impl PostPages<'_> {
    /// Builds the descriptor of `post`. `feed` is the visible feed of the
    /// post's locale and provides the neighbour links.
    pub fn build(&self, post: &Post, feed: &[&Post]) -> Result<PostPage, ParseError> {
        let (prev, next) = neighbours(feed, &post.slug);
        let related = related_posts(
            self.catalog,
            post.locale,
            self.now,
            self.mode,
            &post.slug,
            &post.tags,
            self.related_limit,
        );
        let authors = self.author_names(post);

        let mut alternates = BTreeMap::new();
        for locale in Locale::ALL.iter().copied() {
            alternates.insert(locale.code().to_owned(), self.urls.post(locale, &post.slug)?);
        }
        alternates.insert("x-default".to_owned(), self.urls.post(Locale::DEFAULT, &post.slug)?);

        Ok(PostPage {
            post: post.summarize(self.urls)?,
            canonical: self.urls.post(post.locale, &post.slug)?,
            alternates,
            prev: prev.map(|p| self.link(p)).transpose()?,
            next: next.map(|p| self.link(p)).transpose()?,
            related: related
                .iter()
                .map(|p| p.summarize(self.urls))
                .collect::<Result<_, _>>()?,
            json_ld: self.json_ld(post, &authors)?,
            authors,
        })
    }

    fn link(&self, post: &Post) -> Result<PostLink, ParseError> {
        Ok(PostLink {
            slug: post.slug.clone(),
            title: post.title.clone(),
            url: self.urls.post(post.locale, &post.slug)?,
        })
    }

    fn author_names(&self, post: &Post) -> Vec<String> {
        let names: Vec<String> = post
            .authors
            .iter()
            .map(|id| match id.as_str() {
                DEFAULT_AUTHOR => self.site.author.clone(),
                _ => id.clone(),
            })
            .collect();
        match names.is_empty() {
            true => vec![self.site.author.clone()],
            false => names,
        }
    }

    /// The schema.org `BlogPosting` for a post.
    fn json_ld(&self, post: &Post, authors: &[String]) -> Result<Value, ParseError> {
        let images = match post.images.is_empty() {
            false => post.images.iter().collect::<Vec<_>>(),
            true => self.site.social_banner.iter().collect(),
        };
        let images = images
            .into_iter()
            .map(|image| Ok(self.urls.asset(image)?.to_string()))
            .collect::<Result<Vec<String>, ParseError>>()?;

        Ok(json!({
            "@context": "https://schema.org",
            "@type": "BlogPosting",
            "headline": post.title,
            "description": post.summary,
            "inLanguage": post.locale.code(),
            "datePublished": post.date.map(iso),
            "dateModified": post.modified().map(iso),
            "url": self.urls.post(post.locale, &post.slug)?.to_string(),
            "image": images,
            "keywords": post.tags,
            "author": authors
                .iter()
                .map(|name| json!({ "@type": "Person", "name": name }))
                .collect::<Vec<_>>(),
            "publisher": { "@type": "Organization", "name": self.site.title },
        }))
    }
}

/// Formats a timestamp as ISO 8601 with milliseconds, e.g.
/// `2024-01-10T00:00:00.000Z`.
pub fn iso(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}
