//! Match predicates used by the search engine

use crate::{Error, Result};
use regex::{Regex, RegexBuilder};

/// A predicate over a candidate string
pub trait Filter: Send + Sync {
    fn matches(&self, candidate: &str) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, candidate: &str) -> bool {
        self(candidate)
    }
}

/// SAP-style wildcard pattern: `*` matches any run, `+` one character.
/// Matching is case-insensitive and anchored.
#[derive(Debug, Clone)]
pub struct WildcardFilter {
    pattern: String,
    regex: Regex,
}

impl WildcardFilter {
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let mut expression = String::with_capacity(pattern.len() + 8);
        expression.push('^');
        for c in pattern.chars() {
            match c {
                '*' => expression.push_str(".*"),
                '+' => expression.push('.'),
                other => expression.push_str(&regex::escape(&other.to_string())),
            }
        }
        expression.push('$');

        let regex = RegexBuilder::new(&expression)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Configuration(format!("invalid wildcard '{pattern}': {e}")))?;

        Ok(Self { pattern, regex })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Filter for WildcardFilter {
    fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

/// Case-insensitive substring match
#[derive(Debug, Clone)]
pub struct SubstringFilter {
    needle: String,
}

impl SubstringFilter {
    pub fn new(needle: impl AsRef<str>) -> Self {
        Self {
            needle: needle.as_ref().to_lowercase(),
        }
    }
}

impl Filter for SubstringFilter {
    fn matches(&self, candidate: &str) -> bool {
        candidate.to_lowercase().contains(&self.needle)
    }
}

/// Unanchored regular expression
#[derive(Debug, Clone)]
pub struct RegexFilter {
    regex: Regex,
}

impl RegexFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::Configuration(format!("invalid regex '{pattern}': {e}")))?;
        Ok(Self { regex })
    }
}

impl Filter for RegexFilter {
    fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_star_and_plus() {
        let filter = WildcardFilter::new("BAPI_*_GET+IST").unwrap();
        assert!(filter.matches("BAPI_CUSTOMER_GETLIST"));
        assert!(filter.matches("bapi_material_getlist"));
        assert!(!filter.matches("BAPI_CUSTOMER_GETDETAIL"));
        assert!(!filter.matches("Z_BAPI_CUSTOMER_GETLIST"));
    }

    #[test]
    fn wildcard_escapes_regex_metacharacters() {
        let filter = WildcardFilter::new("/ABC/Z.FUNC*").unwrap();
        assert!(filter.matches("/ABC/Z.FUNC_ONE"));
        assert!(!filter.matches("/ABC/ZXFUNC_ONE"));
        assert_eq!(filter.pattern(), "/ABC/Z.FUNC*");
    }

    #[test]
    fn substring_is_case_insensitive() {
        let filter = SubstringFilter::new("Sales Order");
        assert!(filter.matches("Create SALES ORDER from data"));
        assert!(!filter.matches("Purchase order"));
    }

    #[test]
    fn regex_filter_and_closures() {
        let filter = RegexFilter::new("^E1EDK[0-9]+$").unwrap();
        assert!(filter.matches("E1EDK01"));
        assert!(!filter.matches("E1EDP01"));
        assert!(RegexFilter::new("(").is_err());

        let closure = |candidate: &str| candidate.len() == 4;
        assert!(Filter::matches(&closure, "KNA1"));
    }
}
