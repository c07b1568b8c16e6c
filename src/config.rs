use crate::pagination::POSTS_PER_PAGE;
use crate::related::RELATED_POSTS_LIMIT;
use crate::validate::Limits;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

const PROJECT_FILE: &str = "site.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(POSTS_PER_PAGE)
    }
}

#[derive(Deserialize)]
struct RelatedLimit(usize);
impl Default for RelatedLimit {
    fn default() -> Self {
        RelatedLimit(RELATED_POSTS_LIMIT)
    }
}

fn default_content_directory() -> PathBuf {
    PathBuf::from("data/blog")
}

/// A page outside the blog that belongs in the sitemap, e.g. `about/`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StaticPage {
    /// The path relative to the site root. Empty for the home page.
    pub path: String,
    pub priority: f32,
}

fn default_static_pages() -> Vec<StaticPage> {
    let pages: [(&str, f32); 7] = [
        ("", 1.0),
        ("blog/", 0.8),
        ("tags/", 0.8),
        ("about/", 0.8),
        ("privacy-policy", 0.7),
        ("cookie-policy", 0.7),
        ("terms-of-service", 0.7),
    ];
    pages
        .iter()
        .map(|(path, priority)| StaticPage {
            path: path.to_string(),
            priority: *priority,
        })
        .collect()
}

#[derive(Deserialize)]
struct Project {
    title: String,
    author: String,
    email: String,
    #[serde(default)]
    description: String,
    site_url: Url,
    #[serde(default)]
    social_banner: Option<String>,

    #[serde(default = "default_content_directory")]
    content_directory: PathBuf,

    #[serde(default)]
    posts_per_page: PageSize,

    #[serde(default)]
    related_posts: RelatedLimit,

    #[serde(default = "default_static_pages")]
    static_pages: Vec<StaticPage>,

    #[serde(default)]
    validation: Limits,
}

/// Site metadata shared by feeds, the sitemap and structured data.
#[derive(Clone, Debug)]
pub struct Site {
    pub title: String,
    pub author: String,
    pub email: String,
    pub description: String,
    pub url: Url,
    /// The fallback image for posts without one.
    pub social_banner: Option<String>,
}

impl Site {
    /// The `email (name)` form RSS uses for people.
    pub fn rss_person(&self) -> String {
        format!("{} ({})", self.email, self.author)
    }
}

pub struct Config {
    pub site: Site,
    pub content_directory: PathBuf,
    pub output_directory: PathBuf,
    pub posts_per_page: usize,
    pub related_posts: usize,
    pub static_pages: Vec<StaticPage>,
    pub limits: Limits,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for `site.yaml` and loads
    /// the first one found.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
                .with_context(|| format!("Loading configuration from `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;
        if project.posts_per_page.0 == 0 {
            return Err(anyhow!("`posts_per_page` must be at least 1"));
        }
        Ok(Config {
            site: Site {
                title: project.title,
                author: project.author,
                email: project.email,
                description: project.description,
                url: project.site_url,
                social_banner: project.social_banner,
            },
            content_directory: project_root.join(project.content_directory),
            output_directory: output_directory.to_owned(),
            posts_per_page: project.posts_per_page.0,
            related_posts: project.related_posts.0,
            static_pages: project.static_pages,
            limits: project.validation,
        })
    }
}
