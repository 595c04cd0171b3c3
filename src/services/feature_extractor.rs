// URL feature extraction
// Pure conversion of a URL string into a fixed-order FeatureVector - no network access

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use crate::models::FeatureVector;
use crate::utils::{entropy::shannon_entropy, url_parts::UrlParts};

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtractionError {
    #[error("URL is required")]
    Empty,

    #[error("URL too long (max {max}, current {current})")]
    TooLong { max: usize, current: usize },

    #[error("URL has no scheme")]
    MissingScheme,

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),
}

// =============================================================================
// CONSTANTS
// =============================================================================

pub const DEFAULT_MAX_URL_LENGTH: usize = 2048;

/// Characters counted by `special_char_count`
const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Substrings that flag `has_redirect`
const REDIRECT_MARKERS: &[&str] = &["redirect", "go"];

const DEFAULT_SUSPICIOUS_TLDS: &[&str] = &[
    ".tk", ".ml", ".ga", ".cf", ".gq", ".xyz", ".top", ".club", ".online", ".site", ".web",
    ".tech", ".space",
];

// Credential and payment vocabulary common in phishing paths. Brand names that
// are also the hosts of well-known legitimate sites are left out.
const DEFAULT_SUSPICIOUS_WORDS: &[&str] = &[
    "login", "signin", "bank", "secure", "account", "update", "verify", "password", "credit",
    "card", "paypal", "ebay", "chase", "wells", "fargo", "citibank", "confirm", "suspend",
    "wallet",
];

const DEFAULT_SHORTENERS: &[&str] = &[
    "bit.ly",
    "tinyurl",
    "goo.gl",
    "t.co",
    "is.gd",
    "v.gd",
    "ow.ly",
    "short.to",
    "budurl.com",
    "ping.fm",
    "tr.im",
    "snipurl.com",
];

// =============================================================================
// FEATURE LISTS
// =============================================================================

/// Configurable substring lists used by the containment features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLists {
    pub suspicious_tlds: Vec<String>,
    pub suspicious_words: Vec<String>,
    pub shorteners: Vec<String>,
}

impl Default for FeatureLists {
    fn default() -> Self {
        Self::from_slices(
            DEFAULT_SUSPICIOUS_TLDS,
            DEFAULT_SUSPICIOUS_WORDS,
            DEFAULT_SHORTENERS,
        )
    }
}

impl FeatureLists {
    fn from_slices(tlds: &[&str], words: &[&str], shorteners: &[&str]) -> Self {
        let owned = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            suspicious_tlds: owned(tlds),
            suspicious_words: owned(words),
            shorteners: owned(shorteners),
        }
        .normalized()
    }

    /// Load lists from a JSON file, falling back to the built-in defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<FeatureLists>(&content) {
                Ok(lists) => {
                    let lists = lists.normalized();
                    info!(
                        "Loaded {} suspicious TLDs, {} keywords and {} shorteners from {}",
                        lists.suspicious_tlds.len(),
                        lists.suspicious_words.len(),
                        lists.shorteners.len(),
                        path.display()
                    );
                    lists
                },
                Err(e) => {
                    error!("Failed to parse feature lists JSON {}: {}", path.display(), e);
                    Self::default()
                },
            },
            Err(e) => {
                warn!(
                    "Failed to read feature lists file {}: {}. Using built-in lists.",
                    path.display(),
                    e
                );
                Self::default()
            },
        }
    }

    /// Lower-case every entry and drop blanks and duplicates, keeping order
    fn normalized(self) -> Self {
        fn clean(items: Vec<String>) -> Vec<String> {
            let mut seen = std::collections::HashSet::new();
            items
                .into_iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty() && seen.insert(s.clone()))
                .collect()
        }

        Self {
            suspicious_tlds: clean(self.suspicious_tlds),
            suspicious_words: clean(self.suspicious_words),
            shorteners: clean(self.shorteners),
        }
    }
}

// =============================================================================
// EXTRACTOR
// =============================================================================

/// Converts URL strings into [`FeatureVector`]s
#[derive(Debug, Clone)]
pub struct UrlFeatureExtractor {
    lists: FeatureLists,
    max_url_length: usize,
}

impl Default for UrlFeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureLists::default(), DEFAULT_MAX_URL_LENGTH)
    }
}

impl UrlFeatureExtractor {
    pub fn new(lists: FeatureLists, max_url_length: usize) -> Self {
        Self {
            lists,
            max_url_length,
        }
    }

    pub fn lists(&self) -> &FeatureLists {
        &self.lists
    }

    /// Extract all features from a URL.
    ///
    /// Surrounding whitespace is ignored. The URL must carry a scheme and a
    /// non-empty authority and be accepted by the WHATWG parser; everything
    /// else is measured on the string as typed.
    pub fn extract(&self, input: &str) -> Result<FeatureVector, ExtractionError> {
        let url = input.trim();
        if url.is_empty() {
            return Err(ExtractionError::Empty);
        }

        let url_length = url.chars().count();
        if url_length > self.max_url_length {
            return Err(ExtractionError::TooLong {
                max: self.max_url_length,
                current: url_length,
            });
        }

        let parts = UrlParts::split(url)
            .ok_or_else(|| ExtractionError::InvalidFormat("unrecognized URL structure".into()))?;
        let scheme = parts.scheme.ok_or(ExtractionError::MissingScheme)?;
        let authority = parts.host().ok_or(ExtractionError::MissingHost)?;

        Url::parse(url).map_err(|e| ExtractionError::InvalidFormat(e.to_string()))?;

        let scheme = scheme.to_ascii_lowercase();
        let url_lower = url.to_lowercase();
        let host_lower = authority.to_lowercase();

        let label_count = authority.split('.').count();
        let path_segments: Vec<&str> = parts.path.split('/').collect();

        Ok(FeatureVector {
            url_length,
            domain_length: authority.chars().count(),
            path_length: parts.path.chars().count(),
            query_length: parts.query.chars().count(),
            https: scheme == "https",
            http: scheme == "http",
            subdomain_count: label_count - 1,
            has_subdomain: label_count > 2,
            suspicious_tld: contains_any(&host_lower, &self.lists.suspicious_tlds),
            path_depth: path_segments.iter().filter(|s| !s.is_empty()).count(),
            has_file_extension: path_segments.last().is_some_and(|s| s.contains('.')),
            query_count: if parts.query.is_empty() {
                0
            } else {
                parts.query.split('&').count()
            },
            has_parameters: !parts.query.is_empty(),
            suspicious_words: self
                .lists
                .suspicious_words
                .iter()
                .filter(|word| url_lower.contains(word.as_str()))
                .count(),
            digit_count: url.chars().filter(|c| c.is_ascii_digit()).count(),
            special_char_count: url
                .chars()
                .filter(|c| SPECIAL_CHARACTERS.contains(*c))
                .count(),
            has_redirect: REDIRECT_MARKERS.iter().any(|m| url_lower.contains(m)),
            has_shortener: contains_any(&url_lower, &self.lists.shorteners),
            entropy: shannon_entropy(url),
        })
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}

// =============================================================================
// TESTS
// =============================================================================
