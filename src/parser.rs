//! Defines the [`Parser`] and [`Error`] types and the logic for reading the
//! post catalog from the content directory into memory.
//!
//! The content directory holds one subdirectory per locale:
//!
//! ```text
//! data/blog/
//! ├── en/
//! │   ├── gold-rally.mdx
//! │   └── ecb-outlook/index.mdx     (a bundle; slug `ecb-outlook`)
//! ├── de/
//! └── nl/
//! ```

use std::{
    collections::HashSet,
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    locale::Locale,
    post::{parse_date, Post},
};

const POST_EXTENSIONS: [&str; 2] = ["mdx", "md"];

/// Parses the [`Post`] catalog from source files.
pub struct Parser<'a> {
    /// The directory containing one subdirectory per locale.
    content_directory: &'a Path,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser over `content_directory`.
    pub fn new(content_directory: &'a Path) -> Parser<'a> {
        Parser { content_directory }
    }

    /// Reads every post of every locale. The catalog is ordered by locale
    /// (en, de, nl) and then by source path, so two runs over the same
    /// directory produce the same catalog.
    ///
    /// Each post file must be structured as follows:
    ///
    /// 1. Initial front matter fence (`---`)
    /// 2. YAML front matter with `title` and optionally `date`, `lastmod`,
    ///    `draft`, `tags`, `summary`, `images` and `authors`
    /// 3. Terminal front matter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Gold hits a record high
    /// date: '2024-01-10'
    /// tags: [gold, markets]
    /// ---
    /// ## Why it matters
    /// ```
    pub fn parse_catalog(&self) -> Result<Vec<Post>> {
        self.warn_unknown_directories()?;

        let mut catalog = Vec::new();
        let mut seen: HashSet<(Locale, String)> = HashSet::new();
        for locale in Locale::ALL.iter().copied() {
            let dir = self.content_directory.join(locale.code());
            if !dir.is_dir() {
                debug!(locale = %locale, dir = %dir.display(), "no content directory");
                continue;
            }
            for post in self.parse_locale(locale, &dir)? {
                if !seen.insert((post.locale, post.slug.clone())) {
                    return Err(Error::DuplicateSlug {
                        locale: post.locale,
                        slug: post.slug,
                    });
                }
                catalog.push(post);
            }
        }
        Ok(catalog)
    }

    fn parse_locale(&self, locale: Locale, dir: &Path) -> Result<Vec<Post>> {
        self.walk_locale(locale, dir)?
            .into_iter()
            .map(|(_, post)| post)
            .collect()
    }

    /// Reads every source file of `locale` without stopping at the first
    /// broken one. Each entry pairs the post's slug (or, when no slug can be
    /// derived, its relative path) with the result of parsing that file.
    /// Only failures to walk the directory itself are returned as an error.
    pub fn parse_locale_files(&self, locale: Locale) -> Result<Vec<(String, Result<Post>)>> {
        let dir = self.content_directory.join(locale.code());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        self.walk_locale(locale, &dir)
    }

    fn walk_locale(&self, locale: Locale, dir: &Path) -> Result<Vec<(String, Result<Post>)>> {
        let mut files = Vec::new();
        for result in WalkDir::new(dir).sort_by(|a, b| a.file_name().cmp(b.file_name())) {
            let entry = result?;
            if !entry.file_type().is_file() || !is_post_file(entry.path()) {
                continue;
            }
            // strip_prefix() should never fail since `dir` is the walk root
            let relative = entry
                .path()
                .strip_prefix(dir)
                .map_err(|_| InvalidFileNameError(entry.path().to_owned()))?;
            match slug_for(relative) {
                Ok(slug) => {
                    debug!(locale = %locale, slug = %slug, "parsing post");
                    let post = self.parse_post(locale, &slug, entry.path());
                    files.push((slug, post));
                }
                Err(err) => files.push((relative.display().to_string(), Err(err))),
            }
        }
        Ok(files)
    }

    fn parse_post(&self, locale: Locale, slug: &str, path: &Path) -> Result<Post> {
        let parse = || -> Result<Post> {
            use std::io::Read;
            let mut contents = String::new();
            File::open(path)?.read_to_string(&mut contents)?;
            parse_post_str(locale, slug, &contents)
        };
        parse().map_err(|e| Error::Annotated(format!("parsing post `{}`", path.display()), Box::new(e)))
    }

    fn warn_unknown_directories(&self) -> Result<()> {
        for result in std::fs::read_dir(self.content_directory)? {
            let entry = result?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if entry.file_type()?.is_dir() && name.parse::<Locale>().is_err() {
                warn!(directory = %entry.path().display(), "skipping directory for unsupported locale");
            }
        }
        Ok(())
    }
}

/// Parses a single [`Post`] from its source text.
pub fn parse_post_str(locale: Locale, slug: &str, input: &str) -> Result<Post> {
    let input = input.trim_start_matches('\u{feff}');
    let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
    let frontmatter: Frontmatter = serde_yaml::from_str(&input[yaml_start..yaml_stop])?;

    Ok(Post {
        slug: slug.to_owned(),
        locale,
        date: frontmatter.date.as_ref().and_then(yaml_date),
        last_modified: frontmatter.lastmod.as_ref().and_then(yaml_date),
        draft: frontmatter.draft.unwrap_or(false),
        tags: frontmatter.tags,
        title: frontmatter.title,
        summary: frontmatter.summary,
        images: frontmatter.images.map(OneOrMany::into_vec).unwrap_or_default(),
        authors: frontmatter.authors,
        body: input[body_start..].to_owned(),
    })
}

/// Returns `(yaml_start, yaml_stop, body_start)` for a source file.
fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
    const FENCE: &str = "---";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }
    match input[FENCE.len()..].find("\n---") {
        None => Err(Error::FrontmatterMissingEndFence),
        Some(offset) => {
            let yaml_stop = FENCE.len() + offset;
            let fence_end = yaml_stop + 1 + FENCE.len();
            let body_start = match input[fence_end..].find('\n') {
                Some(i) => fence_end + i + 1,
                None => input.len(),
            };
            Ok((FENCE.len(), yaml_stop, body_start))
        }
    }
}

fn is_post_file(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => POST_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Computes a post's slug from its path relative to the locale directory:
/// `foo/bar.mdx` → `foo/bar`, and for bundles `foo/index.mdx` → `foo`.
fn slug_for(relative: &Path) -> Result<String> {
    let without_extension = relative.with_extension("");
    let path = match without_extension.file_name().and_then(|n| n.to_str()) {
        Some("index") => without_extension
            .parent()
            .unwrap_or_else(|| without_extension.as_path()),
        _ => without_extension.as_path(),
    };
    let mut components = Vec::new();
    for component in path.components() {
        components.push(
            component
                .as_os_str()
                .to_str()
                .ok_or_else(|| InvalidFileNameError(relative.to_owned()))?,
        );
    }
    if components.is_empty() {
        return Err(Error::IndexWithoutBundle(relative.to_owned()));
    }
    Ok(components.join("/"))
}

/// Converts a YAML front matter date into a timestamp. Strings are parsed;
/// any other YAML value is treated as malformed.
fn yaml_date(value: &serde_yaml::Value) -> Option<chrono::DateTime<chrono::Utc>> {
    match value {
        serde_yaml::Value::String(s) => parse_date(s),
        _ => None,
    }
}

#[derive(Deserialize)]
struct Frontmatter {
    title: String,

    #[serde(default)]
    date: Option<serde_yaml::Value>,

    #[serde(default)]
    lastmod: Option<serde_yaml::Value>,

    #[serde(default)]
    draft: Option<bool>,

    #[serde(default)]
    tags: Vec<String>,

    #[serde(default)]
    summary: Option<String>,

    #[serde(default)]
    images: Option<OneOrMany>,

    #[serde(default)]
    authors: Vec<String>,
}

/// `images` may be authored as a single path or a list of paths.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {}

/// Represents the result of a catalog-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing the catalog.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting front matter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal front matter
    /// fence.
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the front matter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when two files in one locale produce the same slug.
    DuplicateSlug { locale: Locale, slug: String },

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source path isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// Returned for an `index` file directly inside a locale directory. Only
    /// a bundle directory (`foo/index.mdx`) gives an `index` file its slug.
    IndexWithoutBundle(PathBuf),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::DuplicateSlug { locale, slug } => {
                write!(f, "duplicate post `{}` in locale `{}`", slug, locale)
            }
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::IndexWithoutBundle(path) => write!(
                f,
                "`{}` has no slug: move it into a directory named after the post",
                path.display()
            ),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::DuplicateSlug { .. } => None,
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::IndexWithoutBundle(_) => None,
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator while walking locale directories.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_catalog() -> Result<()> {
        let catalog = Parser::new(Path::new("./testdata/blog")).parse_catalog()?;

        let keys: Vec<(Locale, &str)> = catalog
            .iter()
            .map(|p| (p.locale, p.slug.as_str()))
            .collect();
        assert_eq!(
            vec![
                (Locale::En, "bitcoin-halving"),
                (Locale::En, "ecb-rate-outlook"),
                (Locale::En, "gold-record-high"),
                (Locale::En, "markets/weekly-wrap"),
                (Locale::En, "upcoming-etf-decision"),
                (Locale::De, "goldpreis-rekord"),
                (Locale::Nl, "goudprijs-record"),
            ],
            keys
        );

        let gold = &catalog[2];
        assert_eq!("Gold hits a record high as central banks keep buying", gold.title);
        assert_eq!(parse_date("2024-01-10"), gold.date);
        assert_eq!(parse_date("2024-02-01"), gold.last_modified);
        assert_eq!(vec!["gold", "central banks", "markets"], gold.tags);
        assert_eq!(Some("/static/images/gold/hero.webp"), gold.cover_image());
        assert!(!gold.draft);
        Ok(())
    }

    #[test]
    fn test_parse_post_str() -> Result<()> {
        let post = parse_post_str(
            Locale::Nl,
            "hello",
            "---\ntitle: Hallo\ndate: '2024-01-10'\ndraft: true\nimages: /static/a.webp\n---\n## Kop\n\nTekst.\n",
        )?;
        assert_eq!("Hallo", post.title);
        assert!(post.draft);
        assert_eq!(vec!["/static/a.webp"], post.images);
        assert_eq!("## Kop\n\nTekst.\n", post.body);
        assert!(post.tags.is_empty());
        Ok(())
    }

    #[test]
    fn test_malformed_date_is_none() -> Result<()> {
        let post = parse_post_str(Locale::En, "x", "---\ntitle: X\ndate: soon\n---\n")?;
        assert_eq!(None, post.date);
        let post = parse_post_str(Locale::En, "x", "---\ntitle: X\ndate: 20240110\n---\n")?;
        assert_eq!(None, post.date);
        let post = parse_post_str(Locale::En, "x", "---\ntitle: X\n---\n")?;
        assert_eq!(None, post.date);
        Ok(())
    }

    #[test]
    fn test_missing_fences() {
        assert!(matches!(
            parse_post_str(Locale::En, "x", "title: X\n"),
            Err(Error::FrontmatterMissingStartFence)
        ));
        assert!(matches!(
            parse_post_str(Locale::En, "x", "---\ntitle: X\n"),
            Err(Error::FrontmatterMissingEndFence)
        ));
    }

    #[test]
    fn test_duplicate_slug() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let en = dir.path().join("en");
        std::fs::create_dir_all(en.join("dup"))?;
        std::fs::write(en.join("dup.mdx"), "---\ntitle: A\n---\n")?;
        std::fs::write(en.join("dup").join("index.mdx"), "---\ntitle: B\n---\n")?;

        match Parser::new(dir.path()).parse_catalog() {
            Err(Error::DuplicateSlug { locale, slug }) => {
                assert_eq!(Locale::En, locale);
                assert_eq!("dup", slug);
            }
            other => panic!("expected a duplicate slug error, got {:?}", other.map(|c| c.len())),
        }
        Ok(())
    }

    #[test]
    fn test_slug_for() -> Result<()> {
        assert_eq!("foo", slug_for(Path::new("foo.mdx"))?);
        assert_eq!("foo/bar", slug_for(Path::new("foo/bar.md"))?);
        assert_eq!("foo", slug_for(Path::new("foo/index.mdx"))?);
        Ok(())
    }

    #[test]
    fn test_index_without_bundle() -> std::io::Result<()> {
        assert!(matches!(
            slug_for(Path::new("index.mdx")),
            Err(Error::IndexWithoutBundle(_))
        ));

        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("en"))?;
        std::fs::write(dir.path().join("en").join("index.mdx"), "---\ntitle: A\n---\n")?;
        match Parser::new(dir.path()).parse_catalog() {
            Err(err) => assert!(err.to_string().contains("index.mdx` has no slug")),
            Ok(catalog) => panic!("expected an error, got {} posts", catalog.len()),
        }
        Ok(())
    }

    #[test]
    fn test_parse_locale_files_keeps_going() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let en = dir.path().join("en");
        std::fs::create_dir_all(&en)?;
        std::fs::write(en.join("bad.mdx"), "title: no fences\n")?;
        std::fs::write(en.join("good.mdx"), "---\ntitle: Good\n---\nBody.\n")?;

        let parser = Parser::new(dir.path());
        assert!(parser.parse_catalog().is_err());

        let files = parser.parse_locale_files(Locale::En)?;
        assert_eq!(2, files.len());
        assert_eq!("bad", files[0].0);
        assert!(files[0].1.is_err());
        assert_eq!("good", files[1].0);
        assert_eq!(Some("Good"), files[1].1.as_ref().ok().map(|p| p.title.as_str()));
        assert!(parser.parse_locale_files(Locale::De)?.is_empty());
        Ok(())
    }
}
