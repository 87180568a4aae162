//! AdventureWorks entities served through [`Repository`](crate::repository::Repository).

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use std::ops::Bound;

use crate::construct::{Attribute, Record, Schema};
use crate::datatype::{RecordId, Value, ValueKind};
use crate::error::{PagewiseError, Result};
use crate::filter::{FilterCriteria, Predicate};
use crate::repository::{Entity, EntityFilter};

// Helper readers for typed fields
fn integer_id(record: &Record) -> Result<i64> {
    match record.id() {
        RecordId::Integer(id) => Ok(*id),
        RecordId::Text(id) => Err(PagewiseError::Source(format!(
            "expected an integer identifier, found '{id}'"
        ))),
    }
}

fn optional<'r>(record: &'r Record, name: &str) -> Option<&'r Value> {
    record.get(name).filter(|value| !value.is_null())
}

fn required<'r>(record: &'r Record, name: &str) -> Result<&'r Value> {
    optional(record, name).ok_or_else(|| {
        PagewiseError::Source(format!("record {} has no value for '{name}'", record.id()))
    })
}

fn mismatch(name: &str, expected: ValueKind, found: &Value) -> PagewiseError {
    PagewiseError::KindMismatch {
        attribute: name.to_string(),
        expected,
        found: found.kind_name().to_string(),
    }
}

fn text(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        other => Err(mismatch(name, ValueKind::Text, other)),
    }
}

fn integer(name: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Integer(i) => Ok(*i),
        other => Err(mismatch(name, ValueKind::Integer, other)),
    }
}

fn decimal(name: &str, value: &Value) -> Result<BigDecimal> {
    match value {
        Value::Decimal(d) => Ok(d.clone()),
        Value::Integer(i) => Ok(BigDecimal::from(*i)),
        other => Err(mismatch(name, ValueKind::Decimal, other)),
    }
}

fn date(name: &str, value: &Value) -> Result<NaiveDate> {
    match value {
        Value::Date(d) => Ok(*d),
        other => Err(mismatch(name, ValueKind::Date, other)),
    }
}

fn timestamp(name: &str, value: &Value) -> Result<NaiveDateTime> {
    match value {
        Value::Timestamp(t) => Ok(*t),
        other => Err(mismatch(name, ValueKind::Timestamp, other)),
    }
}

// ------------- Store -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    pub business_entity_id: i64,
    pub name: String,
    pub sales_person_id: Option<i64>,
    pub modified_date: NaiveDateTime,
}

impl Entity for Store {
    const ENTITY: &'static str = "Store";
    fn schema() -> Result<Schema> {
        Schema::new(
            Self::ENTITY,
            "BusinessEntityID",
            vec![
                Attribute::new("Name", ValueKind::Text),
                Attribute::new("SalesPersonID", ValueKind::Integer),
                Attribute::new("ModifiedDate", ValueKind::Timestamp),
            ],
        )
    }
    fn from_record(record: &Record) -> Result<Self> {
        Ok(Store {
            business_entity_id: integer_id(record)?,
            name: text("Name", required(record, "Name")?)?,
            sales_person_id: optional(record, "SalesPersonID")
                .map(|v| integer("SalesPersonID", v))
                .transpose()?,
            modified_date: timestamp("ModifiedDate", required(record, "ModifiedDate")?)?,
        })
    }
}

impl From<&Store> for Record {
    fn from(store: &Store) -> Self {
        Record::new(store.business_entity_id)
            .with("Name", store.name.as_str())
            .with("SalesPersonID", store.sales_person_id)
            .with("ModifiedDate", store.modified_date)
    }
}

/// Name is a substring match, the sales person must match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreFilter {
    pub name: Option<String>,
    pub sales_person_id: Option<i64>,
    pub modified_since: Option<NaiveDateTime>,
}

impl EntityFilter for StoreFilter {
    fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria::new();
        if let Some(name) = &self.name {
            criteria.insert("Name", Predicate::contains(name.as_str()));
        }
        if let Some(id) = self.sales_person_id {
            criteria.insert("SalesPersonID", Predicate::exact(id));
        }
        if let Some(since) = self.modified_since {
            criteria.insert("ModifiedDate", Predicate::at_least(since));
        }
        criteria
    }
}

// ------------- Product -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub product_id: i64,
    pub name: String,
    pub product_number: String,
    pub color: Option<String>,
    pub list_price: BigDecimal,
    pub sell_start_date: NaiveDate,
}

impl Entity for Product {
    const ENTITY: &'static str = "Product";
    fn schema() -> Result<Schema> {
        Schema::new(
            Self::ENTITY,
            "ProductID",
            vec![
                Attribute::new("Name", ValueKind::Text),
                Attribute::new("ProductNumber", ValueKind::Text),
                Attribute::new("Color", ValueKind::Text),
                Attribute::new("ListPrice", ValueKind::Decimal),
                Attribute::new("SellStartDate", ValueKind::Date),
            ],
        )
    }
    fn from_record(record: &Record) -> Result<Self> {
        Ok(Product {
            product_id: integer_id(record)?,
            name: text("Name", required(record, "Name")?)?,
            product_number: text("ProductNumber", required(record, "ProductNumber")?)?,
            color: optional(record, "Color").map(|v| text("Color", v)).transpose()?,
            list_price: decimal("ListPrice", required(record, "ListPrice")?)?,
            sell_start_date: date("SellStartDate", required(record, "SellStartDate")?)?,
        })
    }
}

impl From<&Product> for Record {
    fn from(product: &Product) -> Self {
        Record::new(product.product_id)
            .with("Name", product.name.as_str())
            .with("ProductNumber", product.product_number.as_str())
            .with("Color", product.color.clone())
            .with("ListPrice", product.list_price.clone())
            .with("SellStartDate", product.sell_start_date)
    }
}

/// Name and product number are substring matches, color is exact and the
/// price bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub product_number: Option<String>,
    pub color: Option<String>,
    pub min_list_price: Option<BigDecimal>,
    pub max_list_price: Option<BigDecimal>,
}

impl EntityFilter for ProductFilter {
    fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria::new();
        if let Some(name) = &self.name {
            criteria.insert("Name", Predicate::contains(name.as_str()));
        }
        if let Some(number) = &self.product_number {
            criteria.insert("ProductNumber", Predicate::contains(number.as_str()));
        }
        if let Some(color) = &self.color {
            criteria.insert("Color", Predicate::exact(color.as_str()));
        }
        let bound = |price: &Option<BigDecimal>| match price {
            Some(price) => Bound::Included(Value::Decimal(price.clone())),
            None => Bound::Unbounded,
        };
        if self.min_list_price.is_some() || self.max_list_price.is_some() {
            criteria.insert(
                "ListPrice",
                Predicate::range(bound(&self.min_list_price), bound(&self.max_list_price)),
            );
        }
        criteria
    }
}
