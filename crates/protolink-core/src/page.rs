use serde::Serialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A request for one page of a listing.
///
/// Construction never fails: out-of-range or unparsable input is silently
/// corrected to a usable value instead of being rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Builds a request from numeric input.
    ///
    /// `page < 1` becomes 1. A `page_size` of 0 means "unspecified" and
    /// becomes the default; other values are clamped to `[1, 100]`.
    pub fn new(page: i64, page_size: i64) -> Self {
        let page = page.clamp(1, u32::MAX as i64) as u32;
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size.clamp(1, MAX_PAGE_SIZE as i64) as u32
        };

        Self { page, page_size }
    }

    /// Builds a request from raw query-string style input.
    ///
    /// Missing or non-numeric values fall back to the defaults before the
    /// numeric corrections of [`PageRequest::new`] apply, so
    /// `parse(Some("-1"), Some("abc"))` equals `PageRequest::default()`.
    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Self {
        let page = parse_leading_int(page).unwrap_or(DEFAULT_PAGE as i64);
        let page_size = parse_leading_int(page_size).unwrap_or(DEFAULT_PAGE_SIZE as i64);
        Self::new(page, page_size)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of items to skip before this page starts.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }

    /// Cuts this page out of an already sorted list.
    pub fn slice<T>(&self, sorted: Vec<T>) -> Page<T> {
        let total = sorted.len();
        let items = sorted
            .into_iter()
            .skip(self.offset())
            .take(self.page_size as usize)
            .collect();

        Page {
            items,
            total,
            page: self.page,
            page_size: self.page_size,
            total_pages: total.div_ceil(self.page_size as usize),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the size of the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

/// Parses an optional leading integer the way form input is usually read:
/// surrounding whitespace is ignored, trailing garbage after the digits is
/// dropped, and no digits at all means no value.
fn parse_leading_int(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw.strip_prefix('+').unwrap_or(raw)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    // saturate absurdly long inputs instead of failing
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * value)
}
