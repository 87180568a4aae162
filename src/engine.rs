//! The query engine: filter, count, sort and slice in one pass over a source.
//!
//! The engine holds no state. Every call reads the source once, so the
//! reported total and the returned page always describe the same snapshot.

use tracing::debug;

use crate::construct::Record;
use crate::error::Result;
use crate::filter::FilterCriteria;
use crate::page::{PageRequest, PageResult};
use crate::sort::{SortSpec, sort_records};
use crate::source::RecordSource;

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEngine;

impl QueryEngine {
    pub fn new() -> Self {
        Self
    }

    /// Returns the requested page of the filtered, sorted source along with
    /// the size of the whole filtered set.
    ///
    /// Paging numbers and attribute names are checked before the source is
    /// read. A page past the end is empty but still reports the true total.
    /// Without a sort the source order is kept.
    pub fn query<S: RecordSource + ?Sized>(
        &self,
        source: &S,
        filter: Option<&FilterCriteria>,
        sort: Option<&SortSpec>,
        page: PageRequest,
    ) -> Result<PageResult<Record>> {
        page.validate()?;
        let schema = source.schema();
        let filter = filter.map(|criteria| criteria.compile(schema)).transpose()?;
        let order = sort
            .map(|spec| spec.resolve(schema).map(|field| (field, spec.direction)))
            .transpose()?;

        let mut matched: Vec<Record> = source
            .scan()?
            .into_iter()
            .filter(|record| filter.as_ref().is_none_or(|f| f.matches(record)))
            .collect();
        let total_records = matched.len() as u64;
        if let Some((field, direction)) = order {
            sort_records(&mut matched, field, direction);
        }
        let items: Vec<Record> = matched
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect();

        debug!(
            entity = schema.entity(),
            page = page.page_number,
            size = page.page_size,
            matched = total_records,
            returned = items.len(),
            "query complete"
        );
        Ok(PageResult::new(items, page, total_records))
    }

    /// Number of records matching the filter.
    pub fn count<S: RecordSource + ?Sized>(
        &self,
        source: &S,
        filter: Option<&FilterCriteria>,
    ) -> Result<u64> {
        let filter = filter.map(|criteria| criteria.compile(source.schema())).transpose()?;
        let records = source.scan()?;
        Ok(records
            .iter()
            .filter(|record| filter.as_ref().is_none_or(|f| f.matches(record)))
            .count() as u64)
    }
}
