//! Pure pagination over an already ordered sequence.
//!
//! Determinism is the caller's responsibility: the input must be
//! totally ordered (newest first, id descending as tie-break) before
//! it is sliced here.

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::str::FromStr;

/// Items per page in the observed configuration. The api layer may
/// override this through its config.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// 1-indexed page number. Parses leniently: absent, non-numeric or
/// zero input falls back to the first page instead of erroring.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct PageNumber(u32);

impl<'de> Deserialize<'de> for PageNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let number = u32::deserialize(deserializer)?;
        PageNumber::new(number).ok_or_else(|| {
            Error::invalid_value(Unexpected::Unsigned(number.into()), &"a 1-indexed page")
        })
    }
}

impl PageNumber {
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub fn new(number: u32) -> Option<Self> {
        (number > 0).then_some(Self(number))
    }

    /// Never fails: anything that does not parse as a positive integer
    /// becomes page 1.
    #[must_use]
    pub fn lenient(raw: Option<&str>) -> Self {
        raw.and_then(|raw| u32::from_str(raw).ok())
            .and_then(Self::new)
            .unwrap_or(Self::FIRST)
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

/// One page of an ordered collection, along with enough bookkeeping to
/// render pagination controls.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub total_pages: u32,
    pub total_items: usize,
}

/// Slices `items` into the requested page.
///
/// Page K holds positions [(K-1)*P, K*P). A page past the end is an
/// empty page, never an error. `total_pages` is at least 1 so an empty
/// collection still renders as one empty page.
#[must_use]
pub fn paginate<T>(items: Vec<T>, number: PageNumber, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = u32::try_from(total_items.div_ceil(page_size))
        .unwrap_or(u32::MAX)
        .max(1);

    let start = (number.get() as usize - 1).saturating_mul(page_size);
    let page_items = if start >= total_items {
        Vec::new()
    } else {
        items.into_iter().skip(start).take(page_size).collect()
    };

    Page {
        items: page_items,
        number: number.get(),
        total_pages,
        total_items,
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_PAGE_SIZE, Page, PageNumber, paginate};

    fn page_of(count: usize, number: PageNumber) -> Page<usize> {
        paginate((0..count).collect(), number, DEFAULT_PAGE_SIZE)
    }

    #[test]
    fn thirteen_items_across_three_pages() {
        let first = page_of(13, PageNumber::FIRST);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.total_items, 13);

        let second = page_of(13, PageNumber::new(2).unwrap());
        assert_eq!(second.items, vec![10, 11, 12]);

        let third = page_of(13, PageNumber::new(3).unwrap());
        assert!(third.items.is_empty());
        assert_eq!(third.number, 3);
        assert_eq!(third.total_pages, 2);
    }

    #[test]
    fn pages_preserve_input_order() {
        let page = page_of(13, PageNumber::FIRST);
        assert_eq!(page.items, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn empty_collection_is_one_empty_page() {
        let page = page_of(0, PageNumber::FIRST);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_items, 0);
    }

    #[test]
    fn deserialization_rejects_page_zero() {
        assert!(serde_json::from_str::<PageNumber>("0").is_err());
        assert_eq!(
            serde_json::from_str::<PageNumber>("2").unwrap(),
            PageNumber::new(2).unwrap()
        );
    }

    #[test]
    fn lenient_page_number_parsing() {
        assert_eq!(PageNumber::lenient(None), PageNumber::FIRST);
        assert_eq!(PageNumber::lenient(Some("2")).get(), 2);
        assert_eq!(PageNumber::lenient(Some("0")), PageNumber::FIRST);
        assert_eq!(PageNumber::lenient(Some("-3")), PageNumber::FIRST);
        assert_eq!(PageNumber::lenient(Some("banana")), PageNumber::FIRST);
    }
}
