// used for persistence
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};

// used for timestamps and dates in records
use chrono::{NaiveDate, NaiveDateTime};
// used for decimal numbers (money columns and such)
use bigdecimal::BigDecimal;
// used when rendering records as JSON
use serde::{Serialize, Serializer};

// used for the total ordering of values
use std::cmp::Ordering;
// used to print out readable forms of a value
use std::fmt;
// used when parsing strings into typed values
use std::str::FromStr;

use crate::error::{PagewiseError, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const ISO_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// ------------- ValueKind -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Boolean,
    Integer,
    Decimal,
    Text,
    Date,
    Timestamp,
}

impl ValueKind {
    pub const ALL: [ValueKind; 6] = [
        ValueKind::Boolean,
        ValueKind::Integer,
        ValueKind::Decimal,
        ValueKind::Text,
        ValueKind::Date,
        ValueKind::Timestamp,
    ];
    /// Stable identifier used in the persisted DataType table.
    pub const fn uid(self) -> u8 {
        match self {
            ValueKind::Boolean => 1,
            ValueKind::Integer => 2,
            ValueKind::Decimal => 3,
            ValueKind::Text => 4,
            ValueKind::Date => 5,
            ValueKind::Timestamp => 6,
        }
    }
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Boolean => "Boolean",
            ValueKind::Integer => "Integer",
            ValueKind::Decimal => "Decimal",
            ValueKind::Text => "Text",
            ValueKind::Date => "Date",
            ValueKind::Timestamp => "Timestamp",
        }
    }
    pub fn from_uid(uid: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.uid() == uid)
    }
    pub const fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Decimal)
    }
    /// Whether a value of kind `other` may be compared against an attribute of this kind.
    pub const fn accepts(self, other: ValueKind) -> bool {
        self as u8 == other as u8 || (self.is_numeric() && other.is_numeric())
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueKind {
    type Err = PagewiseError;
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PagewiseError::Schema(format!("'{s}' is not a known data type")))
    }
}

// ------------- Value -------------
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(BigDecimal),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(ValueKind::Boolean),
            Value::Integer(_) => Some(ValueKind::Integer),
            Value::Decimal(_) => Some(ValueKind::Decimal),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Date(_) => Some(ValueKind::Date),
            Value::Timestamp(_) => Some(ValueKind::Timestamp),
        }
    }
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    /// Kind name for messages, "Null" for the absent value.
    pub fn kind_name(&self) -> &'static str {
        self.kind().map_or("Null", ValueKind::name)
    }
    // Integers and decimals share a rank so they interleave numerically.
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) | Value::Decimal(_) => 2,
            Value::Text(_) => 3,
            Value::Date(_) => 4,
            Value::Timestamp(_) => 5,
        }
    }

    /// Parses raw user input (query strings and the like) as a value of the given kind.
    pub fn parse(kind: ValueKind, raw: &str) -> Result<Value> {
        let invalid = || PagewiseError::InvalidArgument(format!("'{raw}' is not a valid {kind}"));
        let trimmed = raw.trim();
        match kind {
            ValueKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Boolean(true)),
                "false" | "0" => Ok(Value::Boolean(false)),
                _ => Err(invalid()),
            },
            ValueKind::Integer => trimmed.parse().map(Value::Integer).map_err(|_| invalid()),
            ValueKind::Decimal => BigDecimal::from_str(trimmed)
                .map(Value::Decimal)
                .map_err(|_| invalid()),
            ValueKind::Text => Ok(Value::Text(raw.to_string())),
            ValueKind::Date => NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| invalid()),
            ValueKind::Timestamp => parse_timestamp(trimmed).map(Value::Timestamp).ok_or_else(invalid),
        }
    }

    /// Converts a JSON value into a value of the given kind. Returns `None`
    /// when the JSON value cannot represent that kind.
    pub fn from_json(kind: ValueKind, json: &serde_json::Value) -> Option<Value> {
        if json.is_null() {
            return Some(Value::Null);
        }
        match kind {
            ValueKind::Boolean => json.as_bool().map(Value::Boolean),
            ValueKind::Integer => json.as_i64().map(Value::Integer),
            ValueKind::Decimal => match json {
                serde_json::Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok().map(Value::Decimal),
                serde_json::Value::String(s) => BigDecimal::from_str(s).ok().map(Value::Decimal),
                _ => None,
            },
            ValueKind::Text => json.as_str().map(|s| Value::Text(s.to_string())),
            ValueKind::Date | ValueKind::Timestamp => {
                json.as_str().and_then(|s| Value::parse(kind, s).ok())
            }
        }
    }

    pub(crate) fn from_sql(kind: ValueKind, value: ValueRef<'_>) -> Result<Value> {
        if let ValueRef::Null = value {
            return Ok(Value::Null);
        }
        let corrupt = |e: rusqlite::types::FromSqlError| {
            PagewiseError::Persistence(format!("stored {kind} value is unreadable: {e}"))
        };
        match kind {
            ValueKind::Boolean => Ok(Value::Boolean(value.as_i64().map_err(corrupt)? != 0)),
            ValueKind::Integer => Ok(Value::Integer(value.as_i64().map_err(corrupt)?)),
            ValueKind::Text => Ok(Value::Text(value.as_str().map_err(corrupt)?.to_string())),
            ValueKind::Decimal | ValueKind::Date | ValueKind::Timestamp => {
                let text = value.as_str().map_err(corrupt)?;
                Value::parse(kind, text).map_err(|_| {
                    PagewiseError::Persistence(format!("stored {kind} value '{text}' is unreadable"))
                })
            }
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, ISO_TIMESTAMP_FORMAT))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Integer(a), Value::Decimal(b)) => BigDecimal::from(*a).cmp(b),
            (Value::Decimal(a), Value::Integer(b)) => a.cmp(&BigDecimal::from(*b)),
            (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::Timestamp(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
        }
    }
}

// Decimals and temporal values go out as strings to keep their precision.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Decimal(_) | Value::Date(_) | Value::Timestamp(_) => {
                serializer.collect_str(self)
            }
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
            Value::Boolean(b) => ToSqlOutput::from(*b),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Decimal(_) | Value::Date(_) | Value::Timestamp(_) => {
                ToSqlOutput::from(self.to_string())
            }
        })
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}
impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}
impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Decimal(d)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}
impl From<NaiveDateTime> for Value {
    fn from(t: NaiveDateTime) -> Self {
        Value::Timestamp(t)
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map_or(Value::Null, Into::into)
    }
}

// ------------- RecordId -------------
// Integer identifiers order before text identifiers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordId {
    Integer(i64),
    Text(String),
}

impl RecordId {
    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Integer(i) => Value::Integer(*i),
            RecordId::Text(s) => Value::Text(s.clone()),
        }
    }
    pub fn from_json(json: &serde_json::Value) -> Option<RecordId> {
        match json {
            serde_json::Value::Number(n) => n.as_i64().map(RecordId::Integer),
            serde_json::Value::String(s) => Some(RecordId::Text(s.clone())),
            _ => None,
        }
    }
    /// Parses an identifier from user input, preferring the integer form.
    pub fn parse(raw: &str) -> RecordId {
        raw.trim()
            .parse()
            .map_or_else(|_| RecordId::Text(raw.to_string()), RecordId::Integer)
    }
    pub(crate) fn from_sql(value: ValueRef<'_>) -> Result<RecordId> {
        match value {
            ValueRef::Integer(i) => Ok(RecordId::Integer(i)),
            ValueRef::Text(_) => value
                .as_str()
                .map(|s| RecordId::Text(s.to_string()))
                .map_err(|e| PagewiseError::Persistence(e.to_string())),
            _ => Err(PagewiseError::Persistence(
                "record identity must be an integer or text".into(),
            )),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordId::Integer(i) => write!(f, "{i}"),
            RecordId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            RecordId::Integer(i) => serializer.serialize_i64(*i),
            RecordId::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl ToSql for RecordId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            RecordId::Integer(i) => ToSqlOutput::from(*i),
            RecordId::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl From<i64> for RecordId {
    fn from(i: i64) -> Self {
        RecordId::Integer(i)
    }
}
impl From<i32> for RecordId {
    fn from(i: i32) -> Self {
        RecordId::Integer(i64::from(i))
    }
}
impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}
impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Text(s)
    }
}
