// Structural URL decomposition
// Slices a URL into scheme / authority / path / query / fragment exactly as typed

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Generic URI grammar from RFC 3986 appendix B
    static ref URI_PATTERN: Regex =
        Regex::new(r"(?s)^(?:([^:/?#]+):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$")
            .expect("Invalid URI pattern regex");
}

/// Borrowed components of a URL string.
///
/// Unlike `url::Url`, nothing is normalized: lengths measured on these slices
/// are lengths of what the caller supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlParts<'a> {
    pub scheme: Option<&'a str>,
    /// `None` when there is no `//`; `Some("")` for `scheme:///path`
    pub authority: Option<&'a str>,
    pub path: &'a str,
    pub query: &'a str,
    pub fragment: Option<&'a str>,
}

impl<'a> UrlParts<'a> {
    pub fn split(input: &'a str) -> Option<Self> {
        let captures = URI_PATTERN.captures(input)?;

        Some(Self {
            scheme: captures.get(1).map(|m| m.as_str()),
            authority: captures.get(2).map(|m| m.as_str()),
            path: captures.get(3).map_or("", |m| m.as_str()),
            query: captures.get(4).map_or("", |m| m.as_str()),
            fragment: captures.get(5).map(|m| m.as_str()),
        })
    }

    /// Authority, if present and non-empty
    pub fn host(&self) -> Option<&'a str> {
        self.authority.filter(|a| !a.is_empty())
    }
}
