//! Reduce raw candidate strings to a canonical [`AddressSet`].

use super::address::{AddressSet, EmailAddress, recognize_embedded};

/// Split a manually entered recipient list into trimmed, non-empty tokens.
///
/// Commas, semicolons and any whitespace (including newlines) separate
/// tokens; runs of separators collapse.
pub fn split_manual_entry(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Result of validating whole tokens at dispatch time.
#[derive(Debug, Default)]
pub struct Validation {
    pub accepted: AddressSet,
    /// Tokens that failed the exact rule, in input order, without repeats.
    pub rejected: Vec<String>,
}

impl Validation {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Apply the exact address rule to every token.
///
/// Blank tokens are skipped. Invalid tokens are collected instead of dropped
/// so the caller can reject the whole request with the full list.
pub fn validate_exact<I, S>(tokens: I) -> Validation
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut validation = Validation::default();

    for token in tokens {
        let token = token.as_ref().trim();
        if token.is_empty() {
            continue;
        }

        match EmailAddress::parse(token) {
            Ok(address) => {
                validation.accepted.insert(address);
            }
            Err(_) => {
                if !validation.rejected.iter().any(|seen| seen == token) {
                    validation.rejected.push(token.to_string());
                }
            }
        }
    }

    validation
}

/// Normalize a manual entry string: split, validate, deduplicate.
pub fn normalize_manual_entry(raw: &str) -> Validation {
    validate_exact(split_manual_entry(raw))
}

/// Collect every embedded address from free-text values, skipping values
/// without a match.
pub fn collect_embedded<'a, I>(values: I) -> AddressSet
where
    I: IntoIterator<Item = &'a str>,
{
    let mut set = AddressSet::new();
    for value in values {
        set.extend(recognize_embedded(value.trim()));
    }
    set
}
