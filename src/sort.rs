use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::construct::{Field, Record, Schema};
use crate::error::{PagewiseError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

impl FromStr for Direction {
    type Err = PagewiseError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Ascending),
            "desc" | "descending" => Ok(Direction::Descending),
            other => Err(PagewiseError::InvalidArgument(format!(
                "'{other}' is not a sort direction"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::Ascending => write!(f, "asc"),
            Direction::Descending => write!(f, "desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub attribute: String,
    pub direction: Direction,
}

impl SortSpec {
    pub fn new(attribute: impl Into<String>, direction: Direction) -> Self {
        Self {
            attribute: attribute.into(),
            direction,
        }
    }
    pub fn ascending(attribute: impl Into<String>) -> Self {
        Self::new(attribute, Direction::Ascending)
    }
    pub fn descending(attribute: impl Into<String>) -> Self {
        Self::new(attribute, Direction::Descending)
    }

    pub(crate) fn resolve<'s>(&self, schema: &'s Schema) -> Result<Field<'s>> {
        schema.resolve(&self.attribute)
    }
}

/// Sorts records by the field in the given direction. Nulls come first when
/// ascending. Equal keys fall back to the record identifier, always
/// ascending, so the order is total and repeatable.
pub(crate) fn sort_records(records: &mut Vec<Record>, field: Field<'_>, direction: Direction) {
    let mut keyed: Vec<_> = records
        .drain(..)
        .map(|record| {
            let key = record.field(field).map(|value| value.into_owned());
            (key, record)
        })
        .collect();
    keyed.sort_by(|(a_key, a), (b_key, b)| {
        direction
            .apply(a_key.cmp(b_key))
            .then_with(|| a.id().cmp(b.id()))
    });
    records.extend(keyed.into_iter().map(|(_, record)| record));
}
