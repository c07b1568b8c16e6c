use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use kronieken::build::build_site;
use kronieken::config::Config;
use kronieken::locale::Locale;
use kronieken::parser::Parser as CatalogParser;
use kronieken::post::Mode;
use kronieken::validate::Validator;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Builds the data of a multi-locale blog and checks its posts
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write listings, post descriptors, feeds and the sitemap
    Build {
        /// Directory to search (along with its ancestors) for `site.yaml`
        #[arg(long, default_value = ".")]
        project: PathBuf,

        /// Output directory
        #[arg(long, default_value = "public")]
        output: PathBuf,

        /// Include drafts and scheduled posts in listings and post pages
        #[arg(long)]
        preview: bool,

        /// The instant that decides which posts are published (RFC 3339)
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,
    },

    /// Check posts against the editorial limits
    Validate {
        /// Directory to search (along with its ancestors) for `site.yaml`
        #[arg(long, default_value = ".")]
        project: PathBuf,

        /// Only check this locale
        #[arg(long)]
        lang: Option<Locale>,
    },
}

fn parse_now(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Build {
            project,
            output,
            preview,
            now,
        } => {
            let config = Config::from_directory(&project, &output)?;
            let mode = match preview {
                true => Mode::Preview,
                false => Mode::Production,
            };
            let summary = build_site(&config, now.unwrap_or_else(Utc::now), mode)
                .with_context(|| format!("Building into `{}`", output.display()))?;
            info!(
                posts = summary.posts,
                listing_pages = summary.listing_pages,
                feeds = summary.feeds,
                sitemap_entries = summary.sitemap_entries,
                "build finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { project, lang } => {
            let config = Config::from_directory(&project, &project.join("public"))?;
            let parser = CatalogParser::new(&config.content_directory);
            let validator = Validator::new(config.limits.clone())
                .map_err(|e| anyhow!("Compiling validation patterns: {}", e))?;

            let locales = match lang {
                Some(locale) => vec![locale],
                None => Locale::ALL.to_vec(),
            };
            let mut valid = true;
            for locale in locales {
                let files = parser.parse_locale_files(locale).with_context(|| {
                    format!("Reading `{}` posts from `{}`", locale, config.content_directory.display())
                })?;
                let report = validator.validate_files(locale, files);
                if report.posts.is_empty() {
                    info!(locale = %locale, "no posts to validate");
                    continue;
                }
                println!("{}", report);
                valid &= report.is_valid();
            }
            Ok(match valid {
                true => ExitCode::SUCCESS,
                false => ExitCode::FAILURE,
            })
        }
    }
}
