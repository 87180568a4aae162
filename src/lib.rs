//! Pagewise – paginated, filtered and sorted reads over entity repositories.
//!
//! Every read answers the same question: given the records of one entity,
//! a set of filter criteria, an optional sort and a page request, which
//! records belong on the page and how many match in total?
//! * A [`construct::Schema`] names an entity, its identifier and its typed
//!   attributes. A [`construct::Record`] is one row of that entity.
//! * [`filter::FilterCriteria`] hold one [`filter::Predicate`] per attribute
//!   (exact, case-insensitive substring, or range). All of them must hold, and
//!   a null or absent value never matches.
//! * A [`sort::SortSpec`] orders by one attribute. Ties are broken by the
//!   record identifier, ascending, so repeated queries page identically.
//! * A [`page::PageRequest`] selects a one-based page, and a
//!   [`page::PageResult`] returns it together with `totalRecords` and
//!   `totalPages` of the filtered set.
//!
//! ## Modules
//! * [`datatype`] – Values, value kinds and record identifiers.
//! * [`construct`] – Schemas, records and in-memory collections.
//! * [`filter`], [`sort`], [`page`] – The three parts of a query.
//! * [`engine`] – The [`engine::QueryEngine`] that evaluates a query against a source.
//! * [`source`] – The [`source::RecordSource`] and [`source::DataSourceProvider`] seams,
//!   with the in-memory [`source::Catalog`].
//! * [`persist`] – SQLite storage for any schema, also usable as a provider.
//! * [`repository`] and [`adventure`] – Typed repositories for AdventureWorks entities.
//! * [`settings`] and [`server`] – Configuration and the HTTP surface of the binary.
//!
//! ## Quick Start
//! ```
//! use pagewise::construct::{Attribute, Collection, Record, Schema};
//! use pagewise::datatype::ValueKind;
//! use pagewise::engine::QueryEngine;
//! use pagewise::filter::FilterCriteria;
//! use pagewise::page::PageRequest;
//! use pagewise::sort::SortSpec;
//!
//! let schema = Schema::new("Store", "BusinessEntityID", vec![Attribute::new("Name", ValueKind::Text)]).unwrap();
//! let stores = Collection::with_records(schema, vec![
//!     Record::new(292).with("Name", "Next-Door Bike Store"),
//!     Record::new(294).with("Name", "Professional Sales and Service"),
//!     Record::new(296).with("Name", "Riders Company"),
//! ]).unwrap();
//! let filter = FilterCriteria::new().contains("Name", "ER");
//! let page = QueryEngine::new()
//!     .query(&stores, Some(&filter), Some(&SortSpec::descending("Name")), PageRequest::new(1, 1).unwrap())
//!     .unwrap();
//! assert_eq!(page.items()[0].id().to_string(), "296");
//! assert_eq!(page.total_records(), 2);
//! assert_eq!(page.total_pages(), 2);
//! ```

pub mod adventure;
pub mod construct;
pub mod datatype;
pub mod engine;
pub mod error;
pub mod filter;
pub mod page;
pub mod persist;
pub mod repository;
pub mod server;
pub mod settings;
pub mod sort;
pub mod source;

pub use engine::QueryEngine;
pub use error::{PagewiseError, Result};
pub use filter::{FilterCriteria, Predicate};
pub use page::{PageRequest, PageResult};
pub use sort::{Direction, SortSpec};
