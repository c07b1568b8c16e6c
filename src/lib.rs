//! The content core of a statically generated, multi-locale (en, de, nl)
//! news blog. Building the site's data breaks down into a few steps:
//!
//! 1. Parsing the post catalog from the content directory
//!    ([`crate::parser`])
//! 2. Selecting the visible posts of each locale ([`crate::select`]) for a
//!    given instant and [`crate::post::Mode`]
//! 3. Building descriptors for renderers: paginated blog and tag listings
//!    ([`crate::listing`]) and post pages with related posts and structured
//!    data ([`crate::structured`], [`crate::related`])
//! 4. Generating the RSS feeds ([`crate::feed`]), the sitemap and
//!    `robots.txt` ([`crate::sitemap`])
//!
//! [`crate::build::build_site`] runs all of them and writes the results to
//! disk. Independently, [`crate::validate`] checks posts against editorial
//! limits.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod feed;
pub mod listing;
pub mod locale;
pub mod pagination;
pub mod parser;
pub mod post;
pub mod related;
pub mod select;
pub mod sitemap;
pub mod structured;
pub mod tag;
pub mod url;
mod util;
pub mod validate;
