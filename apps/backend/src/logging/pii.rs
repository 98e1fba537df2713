//! Masking of personal data and credentials before they reach the logs.

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const TOKEN_MASK: &str = "[REDACTED_TOKEN]";

// Vetted literals; a failure here is a programming error caught by the tests.
#[allow(clippy::unwrap_used)]
static JWT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\b").unwrap());

#[allow(clippy::unwrap_used)]
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z0-9._%+-]+)(@[A-Za-z0-9.-]+\.[A-Za-z]+)\b").unwrap());

#[allow(clippy::unwrap_used)]
static OPAQUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9+/$=]{20,}").unwrap());

/// Mask e-mail local parts (first character kept) and any token-like run:
/// signed tokens first, then e-mails, then long opaque strings such as hashes.
pub fn redact(input: &str) -> String {
    let no_jwt = JWT.replace_all(input, TOKEN_MASK);
    let no_email = EMAIL.replace_all(&no_jwt, |caps: &Captures| {
        let local = &caps[1];
        let first = local.chars().next().map(String::from).unwrap_or_default();
        format!("{first}***{}", &caps[2])
    });
    OPAQUE.replace_all(&no_email, TOKEN_MASK).into_owned()
}

/// Formats its contents through [`redact`]; use it for every user-supplied
/// identifier that goes into a log field.
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
