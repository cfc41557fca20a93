//! Named, append-ordered collections of field maps

use std::collections::{BTreeMap, HashMap};

/// One row of a collection: field name to field value.
pub type Row = BTreeMap<String, String>;

/// Store for the collections of a single template instance.
///
/// Collections are iterated by the `collection` builtin; rows keep their
/// append order, fields within a row do not carry order.
#[derive(Debug, Clone, Default)]
pub struct CollectionStore {
    collections: HashMap<String, Vec<Row>>,
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a collection wholesale.
    pub fn insert(&mut self, name: impl Into<String>, rows: Vec<Row>) {
        self.collections.insert(name.into(), rows);
    }

    /// Append a whole row, creating the collection if absent. Returns the
    /// index of the new row.
    pub fn push_row(&mut self, name: impl Into<String>, row: Row) -> usize {
        let rows = self.collections.entry(name.into()).or_default();
        rows.push(row);
        rows.len() - 1
    }

    /// Upsert a single field. An index of −1 or past the end appends a fresh
    /// row; an existing index merges the pair into that row. The collection
    /// is created if absent. Returns the index of the touched row.
    pub fn upsert(
        &mut self,
        name: impl Into<String>,
        index: i64,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> usize {
        let rows = self.collections.entry(name.into()).or_default();
        if index < 0 || index as usize >= rows.len() {
            let mut row = Row::new();
            row.insert(key.into(), value.into());
            rows.push(row);
            rows.len() - 1
        } else {
            let idx = index as usize;
            rows[idx].insert(key.into(), value.into());
            idx
        }
    }

    pub fn get(&self, name: &str) -> Option<&[Row]> {
        self.collections.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }
}
