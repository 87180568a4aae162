//! Typed access to one entity.
//!
//! A [`Repository`] pairs a record source with an [`Entity`] type. The
//! paging, filtering and sorting all happen in the [`QueryEngine`]; the
//! repository only turns a domain filter into [`FilterCriteria`] and the
//! resulting records into typed values.

use std::marker::PhantomData;

use crate::construct::{Record, Schema};
use crate::datatype::RecordId;
use crate::engine::QueryEngine;
use crate::error::{PagewiseError, Result};
use crate::filter::{FilterCriteria, Predicate};
use crate::page::{PageRequest, PageResult};
use crate::sort::SortSpec;
use crate::source::RecordSource;

/// A typed view of the records of one entity.
pub trait Entity: Sized {
    const ENTITY: &'static str;
    fn schema() -> Result<Schema>;
    fn from_record(record: &Record) -> Result<Self>;
}

/// Translates a domain filter into generic criteria. Unset fields add no clause.
pub trait EntityFilter {
    fn criteria(&self) -> FilterCriteria;
}

impl EntityFilter for FilterCriteria {
    fn criteria(&self) -> FilterCriteria {
        self.clone()
    }
}

pub struct Repository<E, S> {
    source: S,
    engine: QueryEngine,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity, S: RecordSource> Repository<E, S> {
    /// Wraps a source, which must serve the entity's own schema.
    pub fn new(source: S) -> Result<Self> {
        let expected = E::schema()?;
        if source.schema() != &expected {
            return Err(PagewiseError::Schema(format!(
                "source for '{}' does not serve the '{}' schema",
                source.schema().entity(),
                E::ENTITY
            )));
        }
        Ok(Self {
            source,
            engine: QueryEngine::new(),
            entity: PhantomData,
        })
    }

    /// One page of all records, ordered by identifier.
    pub fn get(&self, page: PageRequest) -> Result<PageResult<E>> {
        let sort = SortSpec::ascending(self.source.schema().identifier());
        self.engine
            .query(&self.source, None, Some(&sort), page)?
            .try_map(|record| E::from_record(&record))
    }

    pub fn search<F: EntityFilter + ?Sized>(
        &self,
        filter: &F,
        sort: Option<&SortSpec>,
        page: PageRequest,
    ) -> Result<PageResult<E>> {
        let criteria = filter.criteria();
        self.engine
            .query(&self.source, Some(&criteria), sort, page)?
            .try_map(|record| E::from_record(&record))
    }

    pub fn count<F: EntityFilter + ?Sized>(&self, filter: &F) -> Result<u64> {
        self.engine.count(&self.source, Some(&filter.criteria()))
    }

    pub fn find(&self, id: &RecordId) -> Result<Option<E>> {
        let criteria = FilterCriteria::new().with(
            self.source.schema().identifier(),
            Predicate::exact(id.to_value()),
        );
        let page = self.engine.query(&self.source, Some(&criteria), None, PageRequest::first(1)?)?;
        page.items().first().map(E::from_record).transpose()
    }
}
