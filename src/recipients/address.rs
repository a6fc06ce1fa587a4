//! Email address value type and the ordered, duplicate-free set built from it.
//!
//! Two separate recognition rules live here:
//!
//! - [`EmailAddress::parse`] requires the whole trimmed token to be an address.
//!   It backs the manual entry and dispatch paths.
//! - [`recognize_embedded`] finds address-shaped substrings inside arbitrary
//!   text. It backs spreadsheet and CSV extraction, where a cell such as
//!   `"contact: j.doe@corp.com (sales)"` still yields `j.doe@corp.com`.

use regex::Regex;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use super::error::{RecipientError, RecipientResult};

static EXACT_REGEX: OnceLock<Regex> = OnceLock::new();
static EMBEDDED_REGEX: OnceLock<Regex> = OnceLock::new();

/// Whole-token rule: `local@domain.label`, no whitespace, exactly one `@`.
fn exact_regex() -> &'static Regex {
    EXACT_REGEX.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid exact address regex")
    })
}

/// Substring rule: word-bounded address whose last label has at least two letters.
fn embedded_regex() -> &'static Regex {
    EMBEDDED_REGEX.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
            .expect("Invalid embedded address regex")
    })
}

/// A trimmed, whitespace-free email address.
///
/// Equality is exact string equality; case is preserved and never folded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate a complete address token.
    pub fn parse(raw: &str) -> RecipientResult<Self> {
        let trimmed = raw.trim();
        if exact_regex().is_match(trimmed) {
            Ok(EmailAddress(trimmed.to_string()))
        } else {
            Err(RecipientError::InvalidAddress(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EmailAddress {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for EmailAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EmailAddress::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Find every address-shaped substring in `text`, left to right.
pub fn recognize_embedded(text: &str) -> impl Iterator<Item = EmailAddress> + '_ {
    embedded_regex()
        .find_iter(text)
        .map(|found| EmailAddress(found.as_str().to_string()))
}

/// Ordered collection of unique addresses, kept in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct AddressSet {
    ordered: Vec<EmailAddress>,
    seen: HashSet<EmailAddress>,
}

impl AddressSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an address, returning `false` when it was already present.
    pub fn insert(&mut self, address: EmailAddress) -> bool {
        if self.seen.contains(&address) {
            return false;
        }
        self.seen.insert(address.clone());
        self.ordered.push(address);
        true
    }

    pub fn contains(&self, address: &str) -> bool {
        self.seen.contains(address)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmailAddress> {
        self.ordered.iter()
    }

    pub fn as_slice(&self) -> &[EmailAddress] {
        &self.ordered
    }

    /// Plain strings in set order, as returned over the wire.
    pub fn to_strings(&self) -> Vec<String> {
        self.ordered.iter().map(|a| a.as_str().to_string()).collect()
    }

    pub fn into_vec(self) -> Vec<EmailAddress> {
        self.ordered
    }
}

impl PartialEq for AddressSet {
    fn eq(&self, other: &Self) -> bool {
        self.ordered == other.ordered
    }
}

impl Eq for AddressSet {}

impl Extend<EmailAddress> for AddressSet {
    fn extend<T: IntoIterator<Item = EmailAddress>>(&mut self, iter: T) {
        for address in iter {
            self.insert(address);
        }
    }
}

impl FromIterator<EmailAddress> for AddressSet {
    fn from_iter<T: IntoIterator<Item = EmailAddress>>(iter: T) -> Self {
        let mut set = AddressSet::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for AddressSet {
    type Item = EmailAddress;
    type IntoIter = std::vec::IntoIter<EmailAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered.into_iter()
    }
}

impl<'a> IntoIterator for &'a AddressSet {
    type Item = &'a EmailAddress;
    type IntoIter = std::slice::Iter<'a, EmailAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_preserves_case() {
        let address = EmailAddress::parse("  Jane.Doe@Example.COM \n").unwrap();
        assert_eq!(address.as_str(), "Jane.Doe@Example.COM");
    }

    #[test]
    fn test_parse_rejects_missing_at() {
        assert!(matches!(
            EmailAddress::parse("not-an-email"),
            Err(RecipientError::InvalidAddress(token)) if token == "not-an-email"
        ));
    }

    #[test]
    fn test_parse_rejects_missing_dot_label() {
        assert!(EmailAddress::parse("a@x").is_err());
    }

    #[test]
    fn test_parse_rejects_inner_whitespace_and_double_at() {
        assert!(EmailAddress::parse("a b@x.com").is_err());
        assert!(EmailAddress::parse("a@@x.com").is_err());
        assert!(EmailAddress::parse("").is_err());
    }

    #[test]
    fn test_embedded_finds_address_inside_text() {
        let found: Vec<_> = recognize_embedded("contact: j.doe@corp.com (sales)").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].as_str(), "j.doe@corp.com");
    }

    #[test]
    fn test_embedded_requires_alphabetic_tld() {
        assert_eq!(recognize_embedded("user@host.c1").count(), 0);
        assert_eq!(recognize_embedded("user@host.c").count(), 0);
        assert_eq!(recognize_embedded("no address here").count(), 0);
    }

    #[test]
    fn test_embedded_ignores_trailing_punctuation() {
        let found: Vec<_> = recognize_embedded("Write to ops@team.example.org.").collect();
        assert_eq!(found[0].as_str(), "ops@team.example.org");
    }

    #[test]
    fn test_embedded_finds_multiple_matches() {
        let found: Vec<String> = recognize_embedded("a@x.com; b@y.org")
            .map(EmailAddress::into_inner)
            .collect();
        assert_eq!(found, vec!["a@x.com", "b@y.org"]);
    }

    #[test]
    fn test_address_set_keeps_first_seen_order() {
        let mut set = AddressSet::new();
        assert!(set.insert(EmailAddress::parse("b@y.com").unwrap()));
        assert!(set.insert(EmailAddress::parse("a@x.com").unwrap()));
        assert!(!set.insert(EmailAddress::parse("b@y.com").unwrap()));
        assert_eq!(set.to_strings(), vec!["b@y.com", "a@x.com"]);
    }

    #[test]
    fn test_address_set_dedup_is_case_sensitive() {
        let set: AddressSet = ["a@x.com", "A@x.com"]
            .iter()
            .map(|raw| EmailAddress::parse(raw).unwrap())
            .collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains("A@x.com"));
    }

    #[test]
    fn test_address_set_contains_uses_exact_string() {
        let set: AddressSet = recognize_embedded("to b@y.com and a@x.com").collect();
        assert!(set.contains("a@x.com"));
        assert!(set.contains("b@y.com"));
        assert!(!set.contains("A@X.COM"));
        assert!(!set.contains("a@x.co"));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: EmailAddress = serde_json::from_str("\"a@x.com\"").unwrap();
        assert_eq!(ok.as_str(), "a@x.com");
        assert!(serde_json::from_str::<EmailAddress>("\"a@x\"").is_err());
    }
}
