//! Defines the [`Locale`] type, the closed set of languages the blog is
//! published in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported locale. The set is closed: content in any other language is
/// not part of the site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    De,
    Nl,
}

impl Locale {
    /// Every locale, in the order they are built and listed.
    pub const ALL: [Locale; 3] = [Locale::En, Locale::De, Locale::Nl];

    /// The default locale. Its pages live at the site root, without a URL
    /// prefix.
    pub const DEFAULT: Locale = Locale::En;

    /// The two-letter code, e.g. `de`.
    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::De => "de",
            Locale::Nl => "nl",
        }
    }

    /// The path prefix for pages in this locale, including the trailing
    /// slash (`de/`). Empty for the default locale.
    pub fn prefix(self) -> &'static str {
        match self {
            Locale::En => "",
            Locale::De => "de/",
            Locale::Nl => "nl/",
        }
    }

    /// The language tag used in feed channels.
    pub fn language_tag(self) -> &'static str {
        match self {
            Locale::En => "en-us",
            Locale::De => "de-de",
            Locale::Nl => "nl-nl",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            "nl" => Ok(Locale::Nl),
            _ => Err(UnknownLocale(s.to_owned())),
        }
    }
}

/// Returned when a string doesn't name one of the supported locales.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLocale(pub String);

impl fmt::Display for UnknownLocale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown locale `{}` (expected one of en, de, nl)", self.0)
    }
}

impl std::error::Error for UnknownLocale {}
