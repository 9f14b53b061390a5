use crate::error::Result;
use regex::Regex;

/// Resource name filter shared by all domains
///
/// Names are upper-cased before matching and the pattern is applied verbatim,
/// so patterns are written against upper-case names: `^SVC` selects
/// `svc01`, while `^svc` selects nothing. Matching is unanchored: `PROD`
/// selects `DC1-prod-01`.
#[derive(Debug, Clone)]
pub struct NameFilter {
    regex: Regex,
}

impl NameFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        Ok(Self { regex })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(&name.to_uppercase())
    }

    /// Keeps the items whose name matches
    pub fn select<T, F>(&self, items: Vec<T>, name: F) -> Vec<T>
    where
        F: Fn(&T) -> &str,
    {
        items
            .into_iter()
            .filter(|item| self.matches(name(item)))
            .collect()
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
