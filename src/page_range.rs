use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Range expression selecting every page of the document.
pub const ALL_PAGES: &str = "all";

/// Inclusive, 1-based page interval validated against a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub stop: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("invalid page range '{0}'")]
    InvalidFormat(String),
    #[error("start position out of range")]
    StartOutOfRange,
    #[error("start position exceeds stop position")]
    StartExceedsStop,
    #[error("stop position out of range")]
    StopOutOfRange,
    #[error("document has no pages")]
    EmptyDocument,
}

impl PageRange {
    pub fn len(&self) -> u32 {
        self.stop - self.start + 1
    }

    pub fn contains(&self, page: u32) -> bool {
        (self.start..=self.stop).contains(&page)
    }

    pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.stop
    }
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.stop)
    }
}

/// Parses `all`, `N` or `A-B` into a range bounded by `total_pages`.
///
/// Checks run in a fixed order: number format, start bounds, start against
/// stop, then stop bounds.
pub fn parse(expr: &str, total_pages: u32) -> Result<PageRange, RangeError> {
    if total_pages < 1 {
        return Err(RangeError::EmptyDocument);
    }

    let expr = expr.trim();
    let (start, stop) = if expr == ALL_PAGES {
        (1, total_pages)
    } else if let Some((a, b)) = expr.split_once('-') {
        (parse_page(a, expr)?, parse_page(b, expr)?)
    } else {
        let n = parse_page(expr, expr)?;
        (n, n)
    };

    if start == 0 || start > total_pages {
        Err(RangeError::StartOutOfRange)
    } else if start > stop {
        Err(RangeError::StartExceedsStop)
    } else if stop > total_pages {
        Err(RangeError::StopOutOfRange)
    } else {
        Ok(PageRange { start, stop })
    }
}

fn parse_page(raw: &str, expr: &str) -> Result<u32, RangeError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| RangeError::InvalidFormat(expr.to_string()))
}
