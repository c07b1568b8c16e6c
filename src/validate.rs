//! Editorial checks for posts: length, structure, images and front matter
//! limits. The result is a [`Report`] whose [`fmt::Display`] renders a
//! table with one row per post, followed by the problems of every post that
//! failed.

use crate::locale::Locale;
use crate::parser::{Error as ParseError, Result as ParseResult};
use crate::post::Post;
use pulldown_cmark::{Event, Parser, Tag};
use regex::Regex;
use serde::Deserialize;
use std::fmt;

const YES: char = '\u{2713}';
const NO: char = '\u{2717}';

/// The editorial limits a post must stay within. Every field can be
/// overridden individually in the `validation` section of `site.yaml`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Limits {
    pub word_min: usize,
    pub word_max: usize,
    pub h2_min: usize,
    pub h2_max: usize,
    pub paragraph_min: usize,
    pub paragraph_max: usize,
    pub paragraph_words_min: usize,
    pub paragraph_words_max: usize,
    pub images_min: usize,
    pub images_max: usize,
    pub hero_count: usize,
    pub body_images_min: usize,
    pub title_min: usize,
    pub title_max: usize,
    pub summary_min: usize,
    pub summary_max: usize,
    pub tags_min: usize,
    pub tags_max: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            word_min: 900,
            word_max: 1300,
            h2_min: 4,
            h2_max: 7,
            paragraph_min: 12,
            paragraph_max: 20,
            paragraph_words_min: 60,
            paragraph_words_max: 180,
            images_min: 3,
            images_max: 5,
            hero_count: 1,
            body_images_min: 2,
            title_min: 50,
            title_max: 60,
            summary_min: 150,
            summary_max: 160,
            tags_min: 3,
            tags_max: 5,
        }
    }
}

/// The outcome of a single check along with the measured value.
#[derive(Clone, Debug, PartialEq)]
pub struct Check {
    pub ok: bool,
    pub value: String,
}

impl Check {
    fn new(ok: bool, value: impl ToString) -> Check {
        Check {
            ok,
            value: value.to_string(),
        }
    }

    fn mark(&self) -> char {
        match self.ok {
            true => YES,
            false => NO,
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.value, self.mark())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Checklist {
    pub words: Check,
    pub h2: Check,
    pub paragraphs: Check,
    pub paragraph_length: Check,
    pub hero: Check,
    pub images: Check,
    pub placement: Check,
    pub clustering: Check,
    pub sections: Check,
    pub title: Check,
    pub summary: Check,
    pub tags: Check,
}

/// The checklist and problems found for one post.
#[derive(Clone, Debug)]
pub struct PostReport {
    pub slug: String,
    pub checklist: Checklist,
    pub errors: Vec<String>,
}

impl PostReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The report for a source file that couldn't be parsed: every check
    /// fails and there is nothing to measure.
    fn unparsable(slug: String, err: &ParseError) -> PostReport {
        let failed = || Check::new(false, "-");
        PostReport {
            slug,
            checklist: Checklist {
                words: failed(),
                h2: failed(),
                paragraphs: failed(),
                paragraph_length: failed(),
                hero: failed(),
                images: failed(),
                placement: failed(),
                clustering: failed(),
                sections: failed(),
                title: failed(),
                summary: failed(),
                tags: failed(),
            },
            errors: vec![format!("invalid front matter: {}", err)],
        }
    }
}

/// The validation results of every post in a locale, in catalog order.
#[derive(Clone, Debug)]
pub struct Report {
    pub locale: Locale,
    pub posts: Vec<PostReport>,
}

impl Report {
    pub fn valid_count(&self) -> usize {
        self.posts.iter().filter(|p| p.is_valid()).count()
    }

    pub fn is_valid(&self) -> bool {
        self.posts.iter().all(PostReport::is_valid)
    }

    pub fn invalid(&self) -> impl Iterator<Item = &PostReport> {
        self.posts.iter().filter(|p| !p.is_valid())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let slug_width = self
            .posts
            .iter()
            .map(|p| p.slug.chars().count())
            .max()
            .unwrap_or(0)
            .clamp(10, 40);
        let widths = [slug_width, 8, 5, 6, 9, 7, 8, 6, 10];
        let separator: String = widths
            .iter()
            .map(|w| format!("+{}", "-".repeat(w + 2)))
            .chain(std::iter::once("+".to_owned()))
            .collect();
        writeln!(f, "Validating blog/{} ({} posts)", self.locale, self.posts.len())?;
        writeln!(f, "{}", separator)?;
        write_row(
            f,
            &widths,
            ["Slug", "Words", "H2", "Paras", "Images", "Title", "Summary", "Tags", "OK"]
                .map(str::to_owned),
        )?;
        writeln!(f, "{}", separator)?;
        for post in &self.posts {
            let c = &post.checklist;
            let slug = match post.slug.chars().count() > slug_width {
                true => format!("{}..", post.slug.chars().take(slug_width - 2).collect::<String>()),
                false => post.slug.clone(),
            };
            let status = match post.is_valid() {
                true => format!("{} Valid", YES),
                false => format!("{} Invalid", NO),
            };
            write_row(
                f,
                &widths,
                [
                    slug,
                    format!("{} {}", c.words.value, c.words.mark()),
                    c.h2.to_string(),
                    c.paragraphs.to_string(),
                    c.images.to_string(),
                    c.title.to_string(),
                    c.summary.to_string(),
                    c.tags.to_string(),
                    status,
                ],
            )?;
        }
        writeln!(f, "{}", separator)?;

        for post in self.invalid() {
            writeln!(f, "\n{}:", post.slug)?;
            for error in &post.errors {
                writeln!(f, "  - {}", error)?;
            }
        }
        writeln!(
            f,
            "\nSummary: {}/{} posts valid.",
            self.valid_count(),
            self.posts.len()
        )
    }
}

/// Validates posts against a set of [`Limits`].
pub struct Validator {
    limits: Limits,
    image: Regex,
    data_source: Regex,
    emphasis: Regex,
    heading: Regex,
    blank_lines: Regex,
}

impl Validator {
    pub fn new(limits: Limits) -> Result<Validator, regex::Error> {
        Ok(Validator {
            limits,
            image: Regex::new(r"!\[[^\]]*\]\([^)]+\)")?,
            data_source: Regex::new(r"\*Data source:[^*]*\*")?,
            emphasis: Regex::new(r"\*[^*]+\*")?,
            heading: Regex::new(r"(?m)^#+\s.*$")?,
            blank_lines: Regex::new(r"\n\n+")?,
        })
    }

    /// Removes images, captions and headings, leaving the prose.
    fn prose(&self, text: &str) -> String {
        let text = self.image.replace_all(text, "");
        let text = self.data_source.replace_all(&text, "");
        let text = self.emphasis.replace_all(&text, "");
        self.heading.replace_all(&text, "").trim().to_owned()
    }

    /// The blank-line separated blocks of `body` with their byte offsets.
    fn blocks<'b>(&self, body: &'b str) -> Vec<(usize, &'b str)> {
        let mut blocks = Vec::new();
        let mut start = 0;
        for separator in self.blank_lines.find_iter(body) {
            blocks.push((start, &body[start..separator.start()]));
            start = separator.end();
        }
        blocks.push((start, &body[start..]));
        blocks
    }

    /// Narrative paragraphs are blocks with more than 20 characters of prose.
    fn narrative<'b>(&self, body: &'b str) -> Vec<(usize, &'b str)> {
        self.blocks(body)
            .into_iter()
            .filter(|(_, block)| self.prose(block).chars().count() > 20)
            .collect()
    }

    pub fn validate_post(&self, post: &Post) -> PostReport {
        let limits = &self.limits;
        let body = post.body.replace("\r\n", "\n");
        let mut errors = Vec::new();

        if body.trim().is_empty() {
            errors.push("empty body".to_owned());
        }

        let words = word_count(&self.prose(&body));
        let words_ok = within(words, limits.word_min, limits.word_max);
        if words < limits.word_min {
            errors.push(format!("words: {} (min {})", words, limits.word_min));
        } else if words > limits.word_max {
            errors.push(format!("words: {} (max {})", words, limits.word_max));
        }

        let (h2, images) = structure(&body);
        let h2_ok = within(h2.len(), limits.h2_min, limits.h2_max);
        if !h2_ok {
            errors.push(format!(
                "H2: {} (expected {}-{})",
                h2.len(),
                limits.h2_min,
                limits.h2_max
            ));
        }

        let narrative = self.narrative(&body);
        let paragraphs_ok = within(narrative.len(), limits.paragraph_min, limits.paragraph_max);
        if !paragraphs_ok {
            errors.push(format!(
                "narrative paragraphs: {} (expected {}-{})",
                narrative.len(),
                limits.paragraph_min,
                limits.paragraph_max
            ));
        }

        let mut paragraph_length_ok = true;
        for (i, (_, paragraph)) in narrative.iter().enumerate() {
            let n = word_count(&self.prose(paragraph));
            if n < limits.paragraph_words_min {
                paragraph_length_ok = false;
                errors.push(format!(
                    "paragraph {}: {} words (min {})",
                    i + 1,
                    n,
                    limits.paragraph_words_min
                ));
            } else if n > limits.paragraph_words_max {
                paragraph_length_ok = false;
                errors.push(format!(
                    "paragraph {}: {} words (max {})",
                    i + 1,
                    n,
                    limits.paragraph_words_max
                ));
            }
        }

        let hero = post.images.len();
        let hero_webp = post.cover_image().map_or(true, |path| path.ends_with(".webp"));
        if hero != limits.hero_count {
            errors.push(format!("hero images: {} (expected {})", hero, limits.hero_count));
        }
        if !hero_webp {
            errors.push("hero image must be .webp".to_owned());
        }

        let total_images = hero + images.len();
        if total_images < limits.images_min {
            errors.push(format!("images: {} (min {})", total_images, limits.images_min));
        } else if total_images > limits.images_max {
            errors.push(format!("images: {} (max {})", total_images, limits.images_max));
        }
        if images.len() < limits.body_images_min {
            errors.push(format!(
                "body images: {} (min {})",
                images.len(),
                limits.body_images_min
            ));
        }
        let images_ok = within(total_images, limits.images_min, limits.images_max)
            && images.len() >= limits.body_images_min;

        let mut placement_ok = true;
        if let (Some(&first_h2), Some(&first_image)) = (h2.first(), images.first()) {
            if first_image <= first_h2 {
                placement_ok = false;
                errors.push("first body image must follow the first H2".to_owned());
            }
        }
        if h2.len() >= 2 && images.len() >= 2 && images[1] <= h2[1] {
            placement_ok = false;
            errors.push("second body image must follow the second or third H2".to_owned());
        }

        let clustering_ok = !bottom_clustered(&narrative, &images, total_images);
        if !clustering_ok {
            errors.push("more than 50% of images in the last 20% of paragraphs".to_owned());
        }

        let mut sections_ok = true;
        for (i, &start) in h2.iter().enumerate() {
            let end = h2.get(i + 1).copied().unwrap_or(body.len());
            let paragraphs = narrative
                .iter()
                .filter(|(offset, _)| (start..end).contains(offset))
                .count();
            if paragraphs < 2 {
                sections_ok = false;
                errors.push(format!("section {}: {} paragraphs (min 2)", i + 1, paragraphs));
            }
        }

        let title = unquote(&post.title).chars().count();
        let title_ok = within(title, limits.title_min, limits.title_max);
        if !title_ok {
            errors.push(format!(
                "title: {} characters (expected {}-{})",
                title, limits.title_min, limits.title_max
            ));
        }

        let summary = unquote(post.summary.as_deref().unwrap_or("")).chars().count();
        let summary_ok = within(summary, limits.summary_min, limits.summary_max);
        if !summary_ok {
            errors.push(format!(
                "summary: {} characters (expected {}-{})",
                summary, limits.summary_min, limits.summary_max
            ));
        }

        let tags = post.tags.len();
        let tags_ok = within(tags, limits.tags_min, limits.tags_max);
        if !tags_ok {
            errors.push(format!(
                "tags: {} (expected {}-{})",
                tags, limits.tags_min, limits.tags_max
            ));
        }

        PostReport {
            slug: post.slug.clone(),
            checklist: Checklist {
                words: Check::new(words_ok, words),
                h2: Check::new(h2_ok, h2.len()),
                paragraphs: Check::new(paragraphs_ok, narrative.len()),
                paragraph_length: Check::new(paragraph_length_ok, ""),
                hero: Check::new(hero == limits.hero_count && hero_webp, hero),
                images: Check::new(
                    images_ok,
                    format!("{}+{}={}", hero, images.len(), total_images),
                ),
                placement: Check::new(placement_ok, ""),
                clustering: Check::new(clustering_ok, ""),
                sections: Check::new(sections_ok, ""),
                title: Check::new(title_ok, title),
                summary: Check::new(summary_ok, summary),
                tags: Check::new(tags_ok, tags),
            },
            errors,
        }
    }

    /// Validates the source files of one locale as read by
    /// [`crate::parser::Parser::parse_locale_files`]. A file that failed to
    /// parse is reported as invalid instead of ending the run.
    pub fn validate_files(&self, locale: Locale, files: Vec<(String, ParseResult<Post>)>) -> Report {
        Report {
            locale,
            posts: files
                .into_iter()
                .map(|(slug, post)| match post {
                    Ok(post) => self.validate_post(&post),
                    Err(err) => PostReport::unparsable(slug, &err),
                })
                .collect(),
        }
    }

    /// Validates every post of `locale` in `catalog`, drafts and scheduled
    /// posts included.
    pub fn validate_locale(&self, catalog: &[Post], locale: Locale) -> Report {
        Report {
            locale,
            posts: catalog
                .iter()
                .filter(|post| post.locale == locale)
                .map(|post| self.validate_post(post))
                .collect(),
        }
    }
}

fn write_row(f: &mut fmt::Formatter, widths: &[usize], cells: [String; 9]) -> fmt::Result {
    for (cell, width) in cells.iter().zip(widths.iter()) {
        let cell: String = cell.chars().take(*width).collect();
        write!(f, "| {:<width$} ", cell, width = width)?;
    }
    writeln!(f, "|")
}

fn within(value: usize, min: usize, max: usize) -> bool {
    (min..=max).contains(&value)
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn unquote(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'')
}

/// The byte offsets of every H2 heading and every image in `body`.
fn structure(body: &str) -> (Vec<usize>, Vec<usize>) {
    let mut h2 = Vec::new();
    let mut images = Vec::new();
    for (event, range) in Parser::new(body).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading(2)) => h2.push(range.start),
            Event::Start(Tag::Image(..)) => images.push(range.start),
            _ => {}
        }
    }
    (h2, images)
}

/// Whether more than half of all images sit in the last 20% of the narrative
/// paragraphs. An image belongs to the closest narrative paragraph at or
/// before it.
fn bottom_clustered(narrative: &[(usize, &str)], images: &[usize], total_images: usize) -> bool {
    if narrative.is_empty() || images.is_empty() || total_images == 0 {
        return false;
    }
    let tail_start = (narrative.len() * 4 + 4) / 5;
    let in_tail = images
        .iter()
        .map(|&pos| {
            narrative
                .partition_point(|(start, _)| *start <= pos)
                .saturating_sub(1)
        })
        .filter(|&index| index >= tail_start)
        .count();
    in_tail * 2 > total_images
}
