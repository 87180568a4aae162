//! Filter criteria: one predicate per attribute, all of which must hold.
//!
//! Criteria are plain data built by the caller. Before evaluation they are
//! compiled against a [`Schema`], which resolves attribute names, checks
//! that each predicate suits the attribute's kind and case-folds substring
//! needles once instead of once per record.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::ops::Bound;

use crate::construct::{Field, Record, Schema};
use crate::datatype::{Value, ValueKind};
use crate::error::{PagewiseError, Result};

// ------------- Predicate -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Equality. Text is compared case-sensitively.
    Exact(Value),
    /// Case-insensitive substring match on text. On the identifier, integer
    /// ids are matched by their decimal digits.
    Contains(String),
    /// Values within the bounds, compared in value order.
    Range { lower: Bound<Value>, upper: Bound<Value> },
}

impl Predicate {
    pub fn exact(value: impl Into<Value>) -> Self {
        Predicate::Exact(value.into())
    }
    pub fn contains(needle: impl Into<String>) -> Self {
        Predicate::Contains(needle.into())
    }
    pub fn range(lower: Bound<Value>, upper: Bound<Value>) -> Self {
        Predicate::Range { lower, upper }
    }
    pub fn at_least(value: impl Into<Value>) -> Self {
        Self::range(Bound::Included(value.into()), Bound::Unbounded)
    }
    pub fn at_most(value: impl Into<Value>) -> Self {
        Self::range(Bound::Unbounded, Bound::Included(value.into()))
    }
    /// Inclusive on both ends.
    pub fn between(lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Self::range(Bound::Included(lower.into()), Bound::Included(upper.into()))
    }

    fn literals(&self) -> Vec<&Value> {
        match self {
            Predicate::Exact(value) => vec![value],
            Predicate::Contains(_) => Vec::new(),
            Predicate::Range { lower, upper } => [lower, upper]
                .into_iter()
                .filter_map(|bound| match bound {
                    Bound::Included(value) | Bound::Excluded(value) => Some(value),
                    Bound::Unbounded => None,
                })
                .collect(),
        }
    }

    fn check(&self, name: &str, field: Field<'_>) -> Result<()> {
        let mismatch = |found: &str| PagewiseError::KindMismatch {
            attribute: name.to_string(),
            expected: field.kind().unwrap_or(ValueKind::Text),
            found: found.to_string(),
        };
        if let Predicate::Contains(_) = self {
            return match field.kind() {
                None | Some(ValueKind::Text) => Ok(()),
                Some(_) => Err(mismatch("a substring predicate")),
            };
        }
        for literal in self.literals() {
            let Some(found) = literal.kind() else {
                continue;
            };
            let accepted = match field.kind() {
                // identifiers are integers or text
                None => matches!(found, ValueKind::Integer | ValueKind::Text),
                Some(kind) => kind.accepts(found),
            };
            if !accepted {
                return Err(mismatch(found.name()));
            }
        }
        Ok(())
    }
}

// ------------- FilterCriteria -------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    clauses: BTreeMap<String, Predicate>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }
    /// Sets the predicate for an attribute, replacing any earlier one.
    pub fn insert(&mut self, attribute: impl Into<String>, predicate: Predicate) -> Option<Predicate> {
        self.clauses.insert(attribute.into(), predicate)
    }
    pub fn with(mut self, attribute: impl Into<String>, predicate: Predicate) -> Self {
        self.insert(attribute, predicate);
        self
    }
    pub fn exact(self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(attribute, Predicate::exact(value))
    }
    pub fn contains(self, attribute: impl Into<String>, needle: impl Into<String>) -> Self {
        self.with(attribute, Predicate::contains(needle))
    }
    pub fn between(
        self,
        attribute: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        self.with(attribute, Predicate::between(lower, upper))
    }
    pub fn get(&self, attribute: &str) -> Option<&Predicate> {
        self.clauses.get(attribute)
    }
    pub fn len(&self) -> usize {
        self.clauses.len()
    }
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
    pub fn iter(&self) -> btree_map::Iter<'_, String, Predicate> {
        self.clauses.iter()
    }

    /// Resolves every clause against the schema.
    pub fn compile<'s>(&self, schema: &'s Schema) -> Result<CompiledFilter<'s>> {
        let mut clauses = Vec::with_capacity(self.clauses.len());
        for (name, predicate) in &self.clauses {
            let field = schema.resolve(name)?;
            predicate.check(name, field)?;
            let matcher = match predicate {
                Predicate::Exact(value) => Matcher::Exact(value.clone()),
                Predicate::Contains(needle) => Matcher::Contains(needle.to_lowercase()),
                Predicate::Range { lower, upper } => Matcher::Range(lower.clone(), upper.clone()),
            };
            clauses.push((field, matcher));
        }
        Ok(CompiledFilter { clauses })
    }
}

impl<K: Into<String>> FromIterator<(K, Predicate)> for FilterCriteria {
    fn from_iter<I: IntoIterator<Item = (K, Predicate)>>(iter: I) -> Self {
        Self {
            clauses: iter.into_iter().map(|(k, p)| (k.into(), p)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FilterCriteria {
    type Item = (&'a String, &'a Predicate);
    type IntoIter = btree_map::Iter<'a, String, Predicate>;
    fn into_iter(self) -> Self::IntoIter {
        self.clauses.iter()
    }
}

// ------------- CompiledFilter -------------
#[derive(Debug)]
enum Matcher {
    Exact(Value),
    Contains(String),
    Range(Bound<Value>, Bound<Value>),
}

impl Matcher {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Matcher::Exact(expected) => !expected.is_null() && value == expected,
            Matcher::Contains(needle) => match value {
                Value::Text(text) => text.to_lowercase().contains(needle.as_str()),
                // only identifiers get here with integers
                Value::Integer(id) => id.to_string().contains(needle.as_str()),
                _ => false,
            },
            Matcher::Range(lower, upper) => {
                let above = match lower {
                    Bound::Included(bound) => !bound.is_null() && value >= bound,
                    Bound::Excluded(bound) => !bound.is_null() && value > bound,
                    Bound::Unbounded => true,
                };
                let below = match upper {
                    Bound::Included(bound) => !bound.is_null() && value <= bound,
                    Bound::Excluded(bound) => !bound.is_null() && value < bound,
                    Bound::Unbounded => true,
                };
                above && below
            }
        }
    }
}

/// Criteria resolved against a schema, ready to test records.
#[derive(Debug)]
pub struct CompiledFilter<'s> {
    clauses: Vec<(Field<'s>, Matcher)>,
}

impl CompiledFilter<'_> {
    /// A record matches when every clause holds. Null or absent values never match.
    pub fn matches(&self, record: &Record) -> bool {
        self.clauses.iter().all(|(field, matcher)| {
            record
                .field(*field)
                .is_some_and(|value| matcher.matches(&value))
        })
    }
}
