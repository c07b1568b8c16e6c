//! Support for creating RSS 2.0 feeds: one per locale and one per tag
//! within each locale.

use crate::config::Site;
use crate::locale::Locale;
use crate::post::Post;
use crate::tag::posts_with_tag;
use crate::url::SiteUrls;
use chrono::{DateTime, Utc};
use rss::extension::atom::{AtomExtension, Link};
use rss::validation::{Validate, ValidationError};
use rss::{CategoryBuilder, Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;
use url::ParseError;

/// A generated feed and the site-relative path it belongs at.
#[derive(Clone, Debug)]
pub struct RenderedFeed {
    /// e.g. `de/feed.xml` or `tags/gold/feed.xml`.
    pub path: String,
    pub xml: String,
    pub items: usize,
}

/// Creates feeds for a site. `now` is used as the build date of a channel
/// whose posts carry no date.
pub struct FeedWriter<'a> {
    pub site: &'a Site,
    pub urls: &'a SiteUrls,
    pub now: DateTime<Utc>,
}

impl FeedWriter<'_> {
    /// Creates the feeds of `locale` from its visible, newest-first `feed`:
    /// the locale feed followed by one feed per tag, in tag-slug order.
    /// Returns nothing for an empty feed.
    pub fn feeds(&self, locale: Locale, feed: &[&Post]) -> Result<Vec<RenderedFeed>> {
        if feed.is_empty() {
            return Ok(Vec::new());
        }

        let mut feeds = vec![self.render(locale, feed, SiteUrls::feed_path(locale))?];

        let tags: BTreeSet<String> = feed
            .iter()
            .flat_map(|post| post.tags.iter().map(|t| crate::tag::tag_slug(t)))
            .filter(|slug| !slug.is_empty())
            .collect();
        for tag in tags {
            let posts = posts_with_tag(feed, &tag);
            feeds.push(self.render(locale, &posts, SiteUrls::tag_feed_path(locale, &tag))?);
        }
        Ok(feeds)
    }

    fn render(&self, locale: Locale, posts: &[&Post], path: String) -> Result<RenderedFeed> {
        let channel = self.channel(locale, posts, &path)?;
        channel.validate()?;
        debug!(feed = %path, items = posts.len(), "rendered feed");
        Ok(RenderedFeed {
            xml: channel.to_string(),
            items: posts.len(),
            path,
        })
    }

    /// Builds the channel for `posts`, whose feed lives at `self_path`.
    pub fn channel(&self, locale: Locale, posts: &[&Post], self_path: &str) -> Result<Channel> {
        let items = posts
            .iter()
            .map(|post| self.item(post))
            .collect::<Result<Vec<Item>>>()?;
        let last_build = posts
            .first()
            .and_then(|post| post.date)
            .unwrap_or(self.now);

        let mut channel = ChannelBuilder::default()
            .title(self.site.title.clone())
            .link(self.urls.blog_link(locale)?.to_string())
            .description(self.site.description.clone())
            .language(Some(locale.language_tag().to_owned()))
            .managing_editor(Some(self.site.rss_person()))
            .webmaster(Some(self.site.rss_person()))
            .last_build_date(Some(last_build.to_rfc2822()))
            .items(items)
            .build();

        channel.set_atom_ext(Some(AtomExtension {
            links: vec![Link {
                href: self.urls.page(self_path)?.to_string(),
                rel: "self".to_owned(),
                mime_type: Some("application/rss+xml".to_owned()),
                ..Default::default()
            }],
        }));
        Ok(channel)
    }

    fn item(&self, post: &Post) -> Result<Item> {
        let link = self.urls.post(post.locale, &post.slug)?.to_string();
        Ok(ItemBuilder::default()
            .title(Some(post.title.clone()))
            .link(Some(link.clone()))
            .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
            .description(post.summary.clone())
            .pub_date(post.date.map(|date| date.to_rfc2822()))
            .author(Some(self.site.rss_person()))
            .categories(
                post.tags
                    .iter()
                    .map(|tag| CategoryBuilder::default().name(tag.clone()).build())
                    .collect::<Vec<_>>(),
            )
            .build())
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a problem building a URL.
    UrlParse(ParseError),

    /// Returned when the generated channel isn't a valid RSS feed.
    Validation(ValidationError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UrlParse(err) => err.fmt(f),
            Error::Validation(err) => write!(f, "invalid feed: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UrlParse(err) => Some(err),
            Error::Validation(err) => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<ValidationError> for Error {
    /// Converts [`ValidationError`]s into [`Error`]. This allows us to use
    /// the `?` operator when validating channels.
    fn from(err: ValidationError) -> Error {
        Error::Validation(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::{now, post};
    use url::Url;

    fn site() -> Site {
        Site {
            title: "EuroCoinInvest".to_owned(),
            author: "Marcus Reinhardt".to_owned(),
            email: "editorial@eurocoinvest.com".to_owned(),
            description: "European financial intelligence & analysis".to_owned(),
            url: Url::parse("https://example.org/").unwrap(),
            social_banner: None,
        }
    }

    #[test]
    fn test_locale_and_tag_feeds() -> Result<()> {
        let site = site();
        let urls = SiteUrls::new(&site.url);
        let mut gold = post("gold", "2024-01-20", &["Gold", "markets"]);
        gold.locale = Locale::De;
        let mut btc = post("btc", "2024-01-10", &["bitcoin", "markets"]);
        btc.locale = Locale::De;
        let feed = vec![&gold, &btc];

        let writer = FeedWriter {
            site: &site,
            urls: &urls,
            now: now(),
        };
        let feeds = writer.feeds(Locale::De, &feed)?;
        let paths: Vec<&str> = feeds.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            vec![
                "de/feed.xml",
                "de/tags/bitcoin/feed.xml",
                "de/tags/gold/feed.xml",
                "de/tags/markets/feed.xml",
            ],
            paths
        );
        assert_eq!(vec![2, 1, 1, 2], feeds.iter().map(|f| f.items).collect::<Vec<_>>());

        let xml = &feeds[0].xml;
        assert_eq!(2, xml.matches("<item>").count());
        assert!(xml.contains("<link>https://example.org/de/blog</link>"));
        assert!(xml.contains("<language>de-de</language>"));
        assert!(xml.contains("<category>Gold</category>"));
        assert!(xml.contains("editorial@eurocoinvest.com (Marcus Reinhardt)"));
        assert!(xml.contains("https://example.org/de/feed.xml"));
        assert!(xml.contains("&amp; analysis"));
        Ok(())
    }

    #[test]
    fn test_channel_fields() -> Result<()> {
        let site = site();
        let urls = SiteUrls::new(&site.url);
        let gold = post("gold", "2024-01-20", &["gold"]);
        let writer = FeedWriter {
            site: &site,
            urls: &urls,
            now: now(),
        };
        let channel = writer.channel(Locale::En, &[&gold], "feed.xml")?;
        assert_eq!("https://example.org/blog", channel.link());
        assert_eq!(Some("Sat, 20 Jan 2024 00:00:00 +0000"), channel.last_build_date());

        let item = &channel.items()[0];
        assert_eq!(Some("https://example.org/blog/gold/"), item.link());
        assert_eq!(Some("Summary of gold"), item.description());
        assert_eq!(Some("https://example.org/blog/gold/"), item.guid().map(|g| g.value()));
        assert_eq!(1, item.categories().len());
        Ok(())
    }

    #[test]
    fn test_empty_feed_uses_now() -> Result<()> {
        let site = site();
        let urls = SiteUrls::new(&site.url);
        let writer = FeedWriter {
            site: &site,
            urls: &urls,
            now: now(),
        };
        assert!(writer.feeds(Locale::Nl, &[])?.is_empty());
        let channel = writer.channel(Locale::Nl, &[], "nl/feed.xml")?;
        assert_eq!(Some(now().to_rfc2822().as_str()), channel.last_build_date());
        Ok(())
    }
}
