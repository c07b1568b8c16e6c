//! Generates `sitemap.xml` and `robots.txt`.
//!
//! The sitemap lists the configured static pages, then for every locale its
//! home page, section indexes, blog pagination, the first page of every tag
//! and every visible post.

use crate::config::StaticPage;
use crate::locale::Locale;
use crate::pagination::total_pages;
use crate::post::Post;
use crate::structured::iso;
use crate::tag::tag_counts;
use crate::url::SiteUrls;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use url::{ParseError, Url};

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Priority of per-locale section pages, pagination, tags and posts.
const SECTION_PRIORITY: f32 = 0.64;

/// Priority of the home page of a non-default locale.
const LOCALE_HOME_PRIORITY: f32 = 0.8;

#[derive(Clone, Debug, PartialEq)]
pub struct SitemapEntry {
    pub loc: Url,
    pub lastmod: DateTime<Utc>,
    pub priority: f32,
}

/// The entries of a sitemap, de-duplicated and in output order.
#[derive(Clone, Debug)]
pub struct Sitemap {
    pub entries: Vec<SitemapEntry>,
}

impl Sitemap {
    /// Builds the sitemap. `feeds` holds the visible, newest-first posts of
    /// each locale; `now` stands in for pages without a better date.
    pub fn build(
        urls: &SiteUrls,
        static_pages: &[StaticPage],
        feeds: &[(Locale, Vec<&Post>)],
        page_size: usize,
        now: DateTime<Utc>,
    ) -> Result<Sitemap> {
        let mut entries = Vec::new();
        let mut push = |loc: Url, lastmod: DateTime<Utc>, priority: f32| {
            entries.push(SitemapEntry {
                loc,
                lastmod,
                priority,
            })
        };

        for page in static_pages {
            push(urls.page(&page.path)?, now, page.priority);
        }

        for (locale, feed) in feeds {
            let locale = *locale;
            if locale != Locale::DEFAULT {
                push(urls.locale_home(locale)?, now, LOCALE_HOME_PRIORITY);
            }
            push(urls.blog_index(locale)?, now, SECTION_PRIORITY);
            push(urls.tags_index(locale)?, now, SECTION_PRIORITY);
            push(urls.page(&format!("{}about/", locale.prefix()))?, now, SECTION_PRIORITY);

            let newest = feed.first().and_then(|post| post.date).unwrap_or(now);
            for n in 1..=total_pages(feed.len(), page_size).max(1) {
                push(urls.blog_page(locale, n)?, newest, SECTION_PRIORITY);
            }

            for tag in tag_counts(feed.iter().copied()).keys() {
                push(urls.tag(locale, tag)?, now, SECTION_PRIORITY);
            }

            for post in feed {
                push(
                    urls.post(locale, &post.slug)?,
                    post.modified().unwrap_or(now),
                    SECTION_PRIORITY,
                );
            }
        }

        // A URL added twice keeps its first position but takes the values of
        // the last entry.
        let mut positions: HashMap<Url, usize> = HashMap::new();
        let mut unique: Vec<SitemapEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            match positions.get(&entry.loc) {
                Some(&i) => unique[i] = entry,
                None => {
                    positions.insert(entry.loc.clone(), unique.len());
                    unique.push(entry);
                }
            }
        }
        let mut entries = unique;

        let home = urls.root();
        entries.sort_by(|a, b| match (&a.loc == home, &b.loc == home) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => b
                .priority
                .partial_cmp(&a.priority)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.loc.as_str().cmp(b.loc.as_str())),
        });
        Ok(Sitemap { entries })
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 * (self.entries.len() + 1));
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!("<urlset xmlns=\"{}\">\n", SITEMAP_NS));
        for entry in &self.entries {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(entry.loc.as_str())));
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", iso(entry.lastmod)));
            xml.push_str(&format!("    <priority>{:.2}</priority>\n", entry.priority));
            xml.push_str("  </url>\n");
        }
        xml.push_str("</urlset>\n");
        xml
    }
}

/// The `robots.txt` for the site: everything allowed, pointing at the
/// sitemap.
pub fn robots_txt(urls: &SiteUrls) -> Result<String> {
    Ok(format!(
        "User-agent: *\nAllow: /\n\nSitemap: {}\nHost: {}\n",
        urls.page("sitemap.xml")?,
        urls.root().as_str().trim_end_matches('/'),
    ))
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem generating the sitemap.
#[derive(Debug)]
pub enum Error {
    /// Returned when a page URL can't be built.
    UrlParse(ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UrlParse(err) => write!(f, "building sitemap URL: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::{now, post};

    fn urls() -> SiteUrls {
        SiteUrls::new(&Url::parse("https://example.org").unwrap())
    }

    fn static_pages() -> Vec<StaticPage> {
        vec![
            StaticPage {
                path: String::new(),
                priority: 1.0,
            },
            StaticPage {
                path: "blog/".to_owned(),
                priority: 0.8,
            },
            StaticPage {
                path: "privacy-policy".to_owned(),
                priority: 0.7,
            },
        ]
    }

    #[test]
    fn test_entries() -> Result<()> {
        let mut gold = post("gold", "2024-01-10", &["Gold", "markets"]);
        gold.last_modified = crate::post::parse_date("2024-02-01");
        let btc = post("btc", "2024-01-05", &["bitcoin"]);
        let feeds = vec![(Locale::En, vec![&gold, &btc]), (Locale::Nl, vec![])];
        let sitemap = Sitemap::build(&urls(), &static_pages(), &feeds, 1, now())?;

        let locs: Vec<&str> = sitemap.entries.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(
            vec![
                "https://example.org/",
                "https://example.org/nl/",
                "https://example.org/privacy-policy",
                "https://example.org/about/",
                "https://example.org/blog/",
                "https://example.org/blog/btc/",
                "https://example.org/blog/gold/",
                "https://example.org/blog/page/2/",
                "https://example.org/nl/about/",
                "https://example.org/nl/blog/",
                "https://example.org/nl/tags/",
                "https://example.org/tags/",
                "https://example.org/tags/bitcoin/",
                "https://example.org/tags/gold/",
                "https://example.org/tags/markets/",
            ],
            locs
        );

        // `blog/` is also the first page of the en blog, whose values replace
        // those of the static entry.
        let blog = &sitemap.entries[4];
        assert_eq!("https://example.org/blog/", blog.loc.as_str());
        assert_eq!(0.64, blog.priority);
        assert_eq!(crate::post::parse_date("2024-01-10"), Some(blog.lastmod));

        let gold = sitemap
            .entries
            .iter()
            .find(|e| e.loc.as_str().ends_with("/blog/gold/"))
            .unwrap();
        assert_eq!(crate::post::parse_date("2024-02-01"), Some(gold.lastmod));

        let page2 = sitemap
            .entries
            .iter()
            .find(|e| e.loc.as_str().ends_with("/page/2/"))
            .unwrap();
        assert_eq!(crate::post::parse_date("2024-01-10"), Some(page2.lastmod));
        Ok(())
    }

    #[test]
    fn test_xml() {
        let sitemap = Sitemap {
            entries: vec![SitemapEntry {
                loc: Url::parse("https://example.org/tags/a&b/").unwrap(),
                lastmod: crate::post::parse_date("2024-01-10").unwrap(),
                priority: 0.64,
            }],
        };
        let xml = sitemap.to_xml();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset"));
        assert!(xml.contains("<loc>https://example.org/tags/a&amp;b/</loc>"));
        assert!(xml.contains("<lastmod>2024-01-10T00:00:00.000Z</lastmod>"));
        assert!(xml.contains("<priority>0.64</priority>"));
        assert!(xml.ends_with("</urlset>\n"));
    }

    #[test]
    fn test_robots() -> Result<()> {
        assert_eq!(
            "User-agent: *\nAllow: /\n\nSitemap: https://example.org/sitemap.xml\nHost: https://example.org\n",
            robots_txt(&urls())?
        );
        Ok(())
    }
}
