//! Paging request and response shapes.
//!
//! A [`PageRequest`] is validated before any record is read; a [`PageResult`]
//! carries the requested slice together with the size of the whole filtered
//! set, so callers can render pagers without a second count query.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::{PagewiseError, Result};

// ------------- PageRequest -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Builds a validated request. Both numbers start at one.
    pub fn new(page_number: u32, page_size: u32) -> Result<Self> {
        let page = Self {
            page_number,
            page_size,
        };
        page.validate()?;
        Ok(page)
    }
    /// Builds a request from signed input, which is what callers parsing
    /// user input usually hold.
    pub fn from_signed(page_number: i64, page_size: i64) -> Result<Self> {
        let number = u32::try_from(page_number)
            .map_err(|_| PagewiseError::InvalidArgument(format!("pageNumber {page_number} is out of range")))?;
        let size = u32::try_from(page_size)
            .map_err(|_| PagewiseError::InvalidArgument(format!("pageSize {page_size} is out of range")))?;
        Self::new(number, size)
    }
    pub fn first(page_size: u32) -> Result<Self> {
        Self::new(1, page_size)
    }
    pub fn validate(&self) -> Result<()> {
        if self.page_number < 1 {
            return Err(PagewiseError::InvalidArgument(
                "pageNumber must be at least 1".into(),
            ));
        }
        if self.page_size < 1 {
            return Err(PagewiseError::InvalidArgument(
                "pageSize must be at least 1".into(),
            ));
        }
        Ok(())
    }
    /// Index of the first record on this page. Saturates instead of overflowing.
    pub fn offset(&self) -> usize {
        let skipped = u64::from(self.page_number.saturating_sub(1)) * u64::from(self.page_size);
        usize::try_from(skipped).unwrap_or(usize::MAX)
    }
    pub fn limit(&self) -> usize {
        usize::try_from(self.page_size).unwrap_or(usize::MAX)
    }
}

// ------------- PageResult -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<T> {
    items: Vec<T>,
    page_number: u32,
    page_size: u32,
    total_records: u64,
    total_pages: u64,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, page: PageRequest, total_records: u64) -> Self {
        let total_pages = if page.page_size == 0 {
            0
        } else {
            total_records.div_ceil(u64::from(page.page_size))
        };
        Self {
            items,
            page_number: page.page_number,
            page_size: page.page_size,
            total_records,
            total_pages,
        }
    }
    pub fn items(&self) -> &[T] {
        &self.items
    }
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
    pub fn page_number(&self) -> u32 {
        self.page_number
    }
    pub fn page_size(&self) -> u32 {
        self.page_size
    }
    pub fn total_records(&self) -> u64 {
        self.total_records
    }
    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }
    pub fn has_previous_page(&self) -> bool {
        self.page_number > 1
    }
    pub fn has_next_page(&self) -> bool {
        u64::from(self.page_number) < self.total_pages
    }
    /// Converts the items, keeping the paging numbers.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_records: self.total_records,
            total_pages: self.total_pages,
        }
    }
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> std::result::Result<U, E>) -> std::result::Result<PageResult<U>, E> {
        Ok(PageResult {
            items: self.items.into_iter().map(f).collect::<std::result::Result<_, _>>()?,
            page_number: self.page_number,
            page_size: self.page_size,
            total_records: self.total_records,
            total_pages: self.total_pages,
        })
    }
}

impl<T: Serialize> Serialize for PageResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut page = serializer.serialize_struct("PageResult", 7)?;
        page.serialize_field("items", &self.items)?;
        page.serialize_field("pageNumber", &self.page_number)?;
        page.serialize_field("pageSize", &self.page_size)?;
        page.serialize_field("totalRecords", &self.total_records)?;
        page.serialize_field("totalPages", &self.total_pages)?;
        page.serialize_field("hasPreviousPage", &self.has_previous_page())?;
        page.serialize_field("hasNextPage", &self.has_next_page())?;
        page.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_requests_are_rejected() {
        assert!(matches!(PageRequest::new(0, 10), Err(PagewiseError::InvalidArgument(_))));
        assert!(matches!(PageRequest::new(1, 0), Err(PagewiseError::InvalidArgument(_))));
        assert!(matches!(PageRequest::from_signed(-1, 10), Err(PagewiseError::InvalidArgument(_))));
        assert!(matches!(
            PageRequest::from_signed(1, i64::from(i32::MIN)),
            Err(PagewiseError::InvalidArgument(_))
        ));
    }

    #[test]
    fn offset_saturates() {
        let page = PageRequest::new(u32::MAX, u32::MAX).unwrap();
        assert!(page.offset() >= usize::try_from(u32::MAX).unwrap());
        assert_eq!(PageRequest::new(3, 25).unwrap().offset(), 50);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PageRequest::new(1, 10).unwrap();
        assert_eq!(PageResult::<u8>::new(Vec::new(), page, 0).total_pages(), 0);
        assert_eq!(PageResult::<u8>::new(Vec::new(), page, 10).total_pages(), 1);
        assert_eq!(PageResult::<u8>::new(Vec::new(), page, 11).total_pages(), 2);
    }

    #[test]
    fn navigation_flags() {
        let first = PageResult::new(vec![1, 2], PageRequest::new(1, 2).unwrap(), 5);
        assert!(!first.has_previous_page());
        assert!(first.has_next_page());
        let last = PageResult::new(vec![5], PageRequest::new(3, 2).unwrap(), 5);
        assert!(last.has_previous_page());
        assert!(!last.has_next_page());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let page = PageResult::new(vec!["Road-150"], PageRequest::new(2, 1).unwrap(), 3);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "items": ["Road-150"],
                "pageNumber": 2,
                "pageSize": 1,
                "totalRecords": 3,
                "totalPages": 3,
                "hasPreviousPage": true,
                "hasNextPage": true
            })
        );
    }

    #[test]
    fn map_keeps_the_numbers() {
        let page = PageResult::new(vec![1i32, 2], PageRequest::new(1, 2).unwrap(), 7).map(|n| n * 10);
        assert_eq!(page.items(), &[10, 20]);
        assert_eq!(page.total_pages(), 4);
        let failed: std::result::Result<PageResult<u8>, String> =
            page.try_map(|n| u8::try_from(n * 100).map_err(|e| e.to_string()));
        assert!(failed.is_err());
    }
}
