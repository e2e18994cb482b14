use std::collections::BTreeSet;

use crate::error::TabliftError;

/// Which pages to extract from: `all`, or a list such as `1,3-5,7-end`.
///
/// The raw string is carried unchanged and only interpreted when a strategy
/// resolves it against the page count of the document at hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelector(String);

impl PageSelector {
    pub fn new(raw: impl Into<String>) -> Self {
        PageSelector(raw.into())
    }

    pub fn all() -> Self {
        PageSelector("all".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve to sorted, de-duplicated 1-based page numbers.
    ///
    /// Pages past the end of the document are dropped silently.
    pub fn resolve(&self, page_count: usize) -> Result<Vec<usize>, TabliftError> {
        let raw = self.0.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Ok((1..=page_count).collect());
        }

        let mut pages = BTreeSet::new();
        for part in raw.split(',') {
            let part = part.trim();
            let (start, end) = match part.split_once('-') {
                Some((a, b)) => (self.parse_page(a)?, self.parse_page(b)?),
                None => {
                    let p = self.parse_page(part)?;
                    (p, p)
                }
            };
            let start = start.unwrap_or(page_count);
            match end {
                Some(end) if start > end => return Err(self.invalid()),
                Some(end) => pages.extend(start..=end.min(page_count)),
                None => pages.extend(start..=page_count),
            }
        }

        Ok(pages.into_iter().filter(|p| *p >= 1).collect())
    }

    /// A page number, or `None` for the `end` keyword.
    fn parse_page(&self, s: &str) -> Result<Option<usize>, TabliftError> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("end") {
            return Ok(None);
        }
        match s.parse::<usize>() {
            Ok(0) | Err(_) => Err(self.invalid()),
            Ok(n) => Ok(Some(n)),
        }
    }

    fn invalid(&self) -> TabliftError {
        TabliftError::InvalidPageSelector(self.0.clone())
    }
}

impl Default for PageSelector {
    fn default() -> Self {
        Self::all()
    }
}
