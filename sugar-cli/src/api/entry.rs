//! Materialized SugarCRM records

use indexmap::IndexMap;
use serde::Serialize;

use super::models::NameValue;

/// Reserved field holding a record's primary identifier
pub const ID_FIELD: &str = "id";

/// One record: ordered field name -> value pairs tagged with their module.
///
/// Serializes as a flat JSON object of its fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SugarEntry {
    #[serde(skip)]
    module: String,
    #[serde(flatten)]
    fields: IndexMap<String, String>,
}

impl SugarEntry {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            fields: IndexMap::new(),
        }
    }

    /// Build an entry from name/value pairs in server order.
    ///
    /// A repeated name overwrites the earlier value but keeps the position
    /// where the name first appeared.
    pub fn from_name_values<I>(module: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = NameValue>,
    {
        let mut entry = Self::new(module);
        for pair in pairs {
            entry.fields.insert(pair.name, pair.value);
        }
        entry
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// The record id, or `None` when the entry has no `id` field
    pub fn id(&self) -> Option<&str> {
        self.get(ID_FIELD)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Set a field, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Name/value pairs in entry order, as sent by `set_entry`
    pub fn to_name_values(&self) -> Vec<NameValue> {
        self.iter().map(|(name, value)| NameValue::new(name, value)).collect()
    }
}
