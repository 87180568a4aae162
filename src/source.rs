//! Where records come from.
//!
//! A [`RecordSource`] is one entity's schema plus a way to read its records
//! in source order. A [`DataSourceProvider`] hands out sources by entity
//! name and may be backed by any storage: [`Catalog`] keeps collections in
//! memory, [`crate::persist::Persistor`] reads them from SQLite.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::construct::{Collection, Record, Schema};
use crate::error::{PagewiseError, Result};

pub trait RecordSource {
    fn schema(&self) -> &Schema;
    /// Reads every record, in source order, as one consistent snapshot.
    fn scan(&self) -> Result<Vec<Record>>;
}

impl RecordSource for Collection {
    fn schema(&self) -> &Schema {
        Collection::schema(self)
    }
    fn scan(&self) -> Result<Vec<Record>> {
        Ok(self.records().to_vec())
    }
}

impl<S: RecordSource + ?Sized> RecordSource for &S {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }
    fn scan(&self) -> Result<Vec<Record>> {
        (**self).scan()
    }
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }
    fn scan(&self) -> Result<Vec<Record>> {
        (**self).scan()
    }
}

impl<S: RecordSource + ?Sized> RecordSource for Arc<S> {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }
    fn scan(&self) -> Result<Vec<Record>> {
        (**self).scan()
    }
}

pub trait DataSourceProvider: Send + Sync {
    /// The source for an entity, or `UnknownEntity`.
    fn source(&self, entity: &str) -> Result<Box<dyn RecordSource + '_>>;
    /// Names of the entities this provider serves, sorted.
    fn entities(&self) -> Result<Vec<String>>;
}

// ------------- Catalog -------------
/// In-memory provider holding one collection per entity.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    collections: BTreeMap<String, Arc<Collection>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }
    /// Adds or replaces the collection for its entity.
    pub fn insert(&mut self, collection: Collection) {
        let entity = collection.schema().entity().to_string();
        self.collections.insert(entity, Arc::new(collection));
    }
    pub fn with(mut self, collection: Collection) -> Self {
        self.insert(collection);
        self
    }
}

impl DataSourceProvider for Catalog {
    fn source(&self, entity: &str) -> Result<Box<dyn RecordSource + '_>> {
        let collection = self
            .collections
            .get(entity)
            .ok_or_else(|| PagewiseError::UnknownEntity(entity.to_string()))?;
        Ok(Box::new(Arc::clone(collection)))
    }
    fn entities(&self) -> Result<Vec<String>> {
        Ok(self.collections.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::Attribute;
    use crate::datatype::ValueKind;

    #[test]
    fn catalog_serves_collections_by_entity() {
        let schema = Schema::new("Culture", "CultureID", vec![Attribute::new("Name", ValueKind::Text)]).unwrap();
        let collection = Collection::with_records(
            schema,
            vec![Record::new("en").with("Name", "English"), Record::new("fr").with("Name", "French")],
        )
        .unwrap();
        let catalog = Catalog::new().with(collection);
        assert_eq!(catalog.entities().unwrap(), vec!["Culture".to_string()]);
        let source = catalog.source("Culture").unwrap();
        assert_eq!(source.schema().identifier(), "CultureID");
        assert_eq!(source.scan().unwrap().len(), 2);
        assert!(matches!(
            catalog.source("Currency"),
            Err(PagewiseError::UnknownEntity(_))
        ));
    }
}
