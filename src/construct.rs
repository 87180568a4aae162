// used to check entity and attribute names
use lazy_static::lazy_static;
use regex::Regex;

// records keep their attributes sorted by name
use std::collections::{BTreeMap, HashSet};
use std::borrow::Cow;

use serde::Serialize;

// our own stuff that we need
use crate::datatype::{RecordId, Value, ValueKind};
use crate::error::{PagewiseError, Result};

lazy_static! {
    static ref NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

pub fn is_valid_name(name: &str) -> bool {
    NAME.is_match(name)
}

// ------------- Attribute -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    kind: ValueKind,
}

impl Attribute {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

// ------------- Field -------------
/// A name resolved against a schema: either the record identifier or one of the attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
    Identifier,
    Attribute(&'a Attribute),
}

impl Field<'_> {
    /// Kind of the field, `None` for the identifier which may hold integers or text.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Field::Identifier => None,
            Field::Attribute(attribute) => Some(attribute.kind()),
        }
    }
}

// ------------- Schema -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    entity: String,
    identifier: String,
    attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(
        entity: impl Into<String>,
        identifier: impl Into<String>,
        attributes: Vec<Attribute>,
    ) -> Result<Self> {
        let entity = entity.into();
        let identifier = identifier.into();
        if let Some(name) = std::iter::once(entity.as_str())
            .chain(std::iter::once(identifier.as_str()))
            .chain(attributes.iter().map(Attribute::name))
            .find(|name| !is_valid_name(name))
        {
            return Err(PagewiseError::Schema(format!("'{name}' is not a valid name")));
        }
        {
            let mut seen = HashSet::new();
            for name in std::iter::once(identifier.as_str()).chain(attributes.iter().map(Attribute::name)) {
                if !seen.insert(name) {
                    return Err(PagewiseError::Schema(format!(
                        "'{name}' is declared twice in entity '{entity}'"
                    )));
                }
            }
        }
        Ok(Self {
            entity,
            identifier,
            attributes,
        })
    }
    pub fn entity(&self) -> &str {
        &self.entity
    }
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
    pub fn resolve(&self, name: &str) -> Result<Field<'_>> {
        if name == self.identifier {
            return Ok(Field::Identifier);
        }
        self.attribute(name)
            .map(Field::Attribute)
            .ok_or_else(|| self.unknown(name))
    }
    pub(crate) fn unknown(&self, name: &str) -> PagewiseError {
        PagewiseError::UnknownAttribute {
            entity: self.entity.clone(),
            attribute: name.to_string(),
        }
    }
    /// Checks that every attribute of the record is declared and holds a value of the declared kind.
    pub fn validate(&self, record: &Record) -> Result<()> {
        for (name, value) in &record.attributes {
            let attribute = self.attribute(name).ok_or_else(|| self.unknown(name))?;
            if let Some(found) = value.kind() {
                if found != attribute.kind {
                    return Err(PagewiseError::KindMismatch {
                        attribute: name.clone(),
                        expected: attribute.kind,
                        found: found.name().to_string(),
                    });
                }
            }
        }
        Ok(())
    }
    /// Builds a record from a JSON object, taking the identifier from the
    /// member named like the schema identifier.
    pub fn record_from_json(&self, json: &serde_json::Value) -> Result<Record> {
        let object = json.as_object().ok_or_else(|| {
            PagewiseError::Source(format!("a '{}' record must be a JSON object", self.entity))
        })?;
        let id = object
            .get(&self.identifier)
            .and_then(RecordId::from_json)
            .ok_or_else(|| {
                PagewiseError::Source(format!(
                    "a '{}' record is missing its '{}' identifier",
                    self.entity, self.identifier
                ))
            })?;
        let mut record = Record::new(id);
        for (name, member) in object {
            if name == &self.identifier {
                continue;
            }
            let attribute = self.attribute(name).ok_or_else(|| self.unknown(name))?;
            let value = Value::from_json(attribute.kind, member).ok_or_else(|| {
                PagewiseError::KindMismatch {
                    attribute: name.clone(),
                    expected: attribute.kind,
                    found: member.to_string(),
                }
            })?;
            record.attributes.insert(name.clone(), value);
        }
        Ok(record)
    }
}

// ------------- Record -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    id: RecordId,
    attributes: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
    pub fn id(&self) -> &RecordId {
        &self.id
    }
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }
    /// Value of a resolved field. Absent attributes read as `None`, same as null.
    pub fn field(&self, field: Field<'_>) -> Option<Cow<'_, Value>> {
        match field {
            Field::Identifier => Some(Cow::Owned(self.id.to_value())),
            Field::Attribute(attribute) => self
                .attributes
                .get(attribute.name())
                .filter(|value| !value.is_null())
                .map(Cow::Borrowed),
        }
    }
}

// ------------- Collection -------------
/// An in-memory, ordered set of records of one entity.
#[derive(Debug, Clone)]
pub struct Collection {
    schema: Schema,
    records: Vec<Record>,
    ids: HashSet<RecordId>,
}

impl Collection {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            records: Vec::new(),
            ids: HashSet::new(),
        }
    }
    pub fn with_records(schema: Schema, records: impl IntoIterator<Item = Record>) -> Result<Self> {
        let mut collection = Self::new(schema);
        for record in records {
            collection.insert(record)?;
        }
        Ok(collection)
    }
    pub fn insert(&mut self, record: Record) -> Result<()> {
        self.schema.validate(&record)?;
        if !self.ids.insert(record.id.clone()) {
            return Err(PagewiseError::DuplicateRecord {
                entity: self.schema.entity.clone(),
                id: record.id.to_string(),
            });
        }
        self.records.push(record);
        Ok(())
    }
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
    pub fn records(&self) -> &[Record] {
        &self.records
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
