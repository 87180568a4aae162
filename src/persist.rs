// used for persistence
use rusqlite::{Connection, OptionalExtension, params};
// used for seed files
use serde::Deserialize;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::construct::{Attribute, Collection, Record, Schema};
use crate::datatype::{RecordId, Value, ValueKind};
use crate::error::{PagewiseError, Result};
use crate::source::{DataSourceProvider, RecordSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    InMemory,
    File(String),
}

impl PersistenceMode {
    /// "memory" (or an empty string) selects an in-memory database, anything else is a file path.
    pub fn from_setting(setting: &str) -> Self {
        match setting.trim() {
            "" | "memory" | ":memory:" => PersistenceMode::InMemory,
            path => PersistenceMode::File(path.to_string()),
        }
    }
}

/// SQLite-backed storage for entities and their records.
///
/// Records are kept in generic tables (one row per record, one row per
/// non-null attribute value) so that any schema can be stored without DDL.
/// The connection sits behind a mutex, and each scan is a single statement,
/// which gives every query one consistent snapshot.
pub struct Persistor {
    db: Mutex<Connection>,
}

impl Persistor {
    pub fn new(mode: PersistenceMode) -> Result<Self> {
        let connection = match &mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        // values keep the storage class they were written with (blob affinity)
        connection.execute_batch(
            "
            create table if not exists DataType (
                DataType_Identity integer not null,
                DataType text not null,
                constraint referenceable_DataType_Identity primary key (
                    DataType_Identity
                ),
                constraint unique_DataType unique (
                    DataType
                )
            );
            create table if not exists Entity (
                Entity text not null,
                Identifier text not null,
                constraint referenceable_Entity primary key (
                    Entity
                )
            );
            create table if not exists Attribute (
                Entity text not null,
                Attribute text not null,
                Ordinal integer not null,
                DataType_Identity integer not null,
                constraint Attribute_of_Entity foreign key (
                    Entity
                ) references Entity(Entity),
                constraint Attribute_has_DataType foreign key (
                    DataType_Identity
                ) references DataType(DataType_Identity),
                constraint referenceable_Attribute primary key (
                    Entity,
                    Attribute
                )
            );
            create table if not exists Record (
                Entity text not null,
                Record_Identity blob not null,
                Ordinal integer not null,
                constraint Record_of_Entity foreign key (
                    Entity
                ) references Entity(Entity),
                constraint referenceable_Record primary key (
                    Entity,
                    Record_Identity
                )
            );
            create table if not exists AttributeValue (
                Entity text not null,
                Record_Identity blob not null,
                Attribute text not null,
                AppearingValue blob null,
                constraint AttributeValue_of_Record foreign key (
                    Entity,
                    Record_Identity
                ) references Record(Entity, Record_Identity),
                constraint AttributeValue_of_Attribute foreign key (
                    Entity,
                    Attribute
                ) references Attribute(Entity, Attribute),
                constraint referenceable_AttributeValue primary key (
                    Entity,
                    Record_Identity,
                    Attribute
                )
            );
            ",
        )?;
        for kind in ValueKind::ALL {
            connection.execute(
                "insert or ignore into DataType (DataType_Identity, DataType) values (?, ?)",
                params![kind.uid(), kind.name()],
            )?;
        }
        debug!(?mode, "persistor ready");
        Ok(Self {
            db: Mutex::new(connection),
        })
    }

    /// Registers an entity. Returns true if an identical schema was already stored.
    pub fn create_entity(&self, schema: &Schema) -> Result<bool> {
        let mut db = self.db.lock()?;
        let tx = db.transaction()?;
        let existed = store_entity(&tx, schema)?;
        tx.commit()?;
        Ok(existed)
    }

    pub fn schema(&self, entity: &str) -> Result<Schema> {
        let db = self.db.lock()?;
        read_schema(&db, entity)?.ok_or_else(|| PagewiseError::UnknownEntity(entity.to_string()))
    }

    pub fn persist_record(&self, entity: &str, record: &Record) -> Result<()> {
        let schema = self.schema(entity)?;
        schema.validate(record)?;
        let mut db = self.db.lock()?;
        let tx = db.transaction()?;
        insert_record(&tx, &schema, record)?;
        tx.commit()?;
        Ok(())
    }

    /// Stores the collection's entity (if new) and all of its records in one transaction.
    pub fn persist_collection(&self, collection: &Collection) -> Result<usize> {
        self.store_collection(collection, false).map(|written| written.unwrap_or(0))
    }

    /// Loads a seed document: a JSON array of entities, each with its
    /// identifier, ordered attributes and records. Entities that are already
    /// stored are left untouched. Returns the number of records written.
    ///
    /// Every record of an entity is checked before anything is written, and
    /// an entity is stored together with its records or not at all.
    pub fn load_json(&self, json: &str) -> Result<usize> {
        let seeds: Vec<SeedEntity> = serde_json::from_str(json)?;
        let mut written = 0;
        for seed in seeds {
            let attributes = seed
                .attributes
                .iter()
                .map(|a| Ok(Attribute::new(a.name.as_str(), a.kind.parse()?)))
                .collect::<Result<Vec<_>>>()?;
            let schema = Schema::new(seed.entity, seed.identifier, attributes)?;
            let records = seed
                .records
                .iter()
                .map(|json| schema.record_from_json(json))
                .collect::<Result<Vec<_>>>()?;
            let collection = Collection::with_records(schema, records)?;
            match self.store_collection(&collection, true)? {
                Some(count) => written += count,
                None => info!(entity = collection.schema().entity(), "entity already stored, seed skipped"),
            }
        }
        Ok(written)
    }

    /// Writes entity and records in one transaction. With `skip_existing`, an
    /// entity that is already stored is left alone and `None` is returned.
    fn store_collection(&self, collection: &Collection, skip_existing: bool) -> Result<Option<usize>> {
        let schema = collection.schema();
        let mut db = self.db.lock()?;
        let tx = db.transaction()?;
        if store_entity(&tx, schema)? && skip_existing {
            return Ok(None);
        }
        for record in collection.records() {
            insert_record(&tx, schema, record)?;
        }
        tx.commit()?;
        debug!(entity = schema.entity(), records = collection.len(), "collection persisted");
        Ok(Some(collection.len()))
    }

    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| PagewiseError::Source(format!("cannot read {}: {e}", path.display())))?;
        self.load_json(&json)
    }

    fn scan(&self, schema: &Schema) -> Result<Vec<Record>> {
        let db = self.db.lock()?;
        let mut statement = db.prepare_cached(
            "
            select r.Record_Identity,
                    v.Attribute,
                    v.AppearingValue
                from Record r
                left join AttributeValue v
                on v.Entity = r.Entity
                and v.Record_Identity = r.Record_Identity
                where r.Entity = ?
                order by r.Ordinal
            ",
        )?;
        let mut rows = statement.query(params![schema.entity()])?;
        let mut records: Vec<Record> = Vec::new();
        while let Some(row) = rows.next()? {
            let id = RecordId::from_sql(row.get_ref(0)?)?;
            if records.last().is_none_or(|last| last.id() != &id) {
                records.push(Record::new(id));
            }
            let Some(name) = row.get::<_, Option<String>>(1)? else {
                continue;
            };
            let attribute = schema.attribute(&name).ok_or_else(|| {
                PagewiseError::Persistence(format!(
                    "stored value for undeclared attribute '{name}' in entity '{}'",
                    schema.entity()
                ))
            })?;
            let value = Value::from_sql(attribute.kind(), row.get_ref(2)?)?;
            if let Some(last) = records.pop() {
                records.push(last.with(name, value));
            }
        }
        Ok(records)
    }
}

#[derive(Deserialize)]
struct SeedEntity {
    entity: String,
    identifier: String,
    attributes: Vec<SeedAttribute>,
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct SeedAttribute {
    name: String,
    kind: String,
}

fn store_entity(db: &Connection, schema: &Schema) -> Result<bool> {
    if let Some(existing) = read_schema(db, schema.entity())? {
        if &existing == schema {
            return Ok(true);
        }
        return Err(PagewiseError::Schema(format!(
            "entity '{}' is already stored with a different schema",
            schema.entity()
        )));
    }
    db.execute(
        "insert into Entity (Entity, Identifier) values (?, ?)",
        params![schema.entity(), schema.identifier()],
    )?;
    for (ordinal, attribute) in schema.attributes().iter().enumerate() {
        db.execute(
            "
            insert into Attribute (
                Entity,
                Attribute,
                Ordinal,
                DataType_Identity
            ) values (?, ?, ?, ?)
            ",
            params![schema.entity(), attribute.name(), ordinal as i64, attribute.kind().uid()],
        )?;
    }
    debug!(entity = schema.entity(), attributes = schema.attributes().len(), "entity created");
    Ok(false)
}

fn read_schema(db: &Connection, entity: &str) -> Result<Option<Schema>> {
    let identifier: Option<String> = db
        .query_row(
            "select Identifier from Entity where Entity = ?",
            params![entity],
            |row| row.get(0),
        )
        .optional()?;
    let Some(identifier) = identifier else {
        return Ok(None);
    };
    let mut statement = db.prepare_cached(
        "
        select Attribute,
                DataType_Identity
            from Attribute
            where Entity = ?
            order by Ordinal
        ",
    )?;
    let mut rows = statement.query(params![entity])?;
    let mut attributes = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        let uid: u8 = row.get(1)?;
        let kind = ValueKind::from_uid(uid).ok_or_else(|| {
            PagewiseError::Persistence(format!("attribute '{name}' has unknown data type {uid}"))
        })?;
        attributes.push(Attribute::new(name, kind));
    }
    Schema::new(entity, identifier, attributes).map(Some)
}

fn insert_record(db: &Connection, schema: &Schema, record: &Record) -> Result<()> {
    let existing = db
        .query_row(
            "select Ordinal from Record where Entity = ? and Record_Identity = ?",
            params![schema.entity(), record.id()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(PagewiseError::DuplicateRecord {
            entity: schema.entity().to_string(),
            id: record.id().to_string(),
        });
    }
    let ordinal: i64 = db.query_row(
        "select coalesce(max(Ordinal), 0) + 1 from Record where Entity = ?",
        params![schema.entity()],
        |row| row.get(0),
    )?;
    db.execute(
        "insert into Record (Entity, Record_Identity, Ordinal) values (?, ?, ?)",
        params![schema.entity(), record.id(), ordinal],
    )?;
    for (name, value) in record.attributes() {
        if value.is_null() {
            continue;
        }
        db.execute(
            "
            insert into AttributeValue (
                Entity,
                Record_Identity,
                Attribute,
                AppearingValue
            ) values (?, ?, ?, ?)
            ",
            params![schema.entity(), record.id(), name, value],
        )?;
    }
    Ok(())
}

// ------------- SqliteSource -------------
/// One entity of a [`Persistor`], read as a record source.
pub struct SqliteSource<'p> {
    persistor: &'p Persistor,
    schema: Schema,
}

impl RecordSource for SqliteSource<'_> {
    fn schema(&self) -> &Schema {
        &self.schema
    }
    fn scan(&self) -> Result<Vec<Record>> {
        self.persistor.scan(&self.schema)
    }
}

impl Persistor {
    pub fn entity_source(&self, entity: &str) -> Result<SqliteSource<'_>> {
        Ok(SqliteSource {
            persistor: self,
            schema: self.schema(entity)?,
        })
    }
}

impl DataSourceProvider for Persistor {
    fn source(&self, entity: &str) -> Result<Box<dyn RecordSource + '_>> {
        Ok(Box::new(self.entity_source(entity)?))
    }
    fn entities(&self) -> Result<Vec<String>> {
        let db = self.db.lock()?;
        let mut statement = db.prepare_cached("select Entity from Entity order by Entity")?;
        let names = statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }
}
