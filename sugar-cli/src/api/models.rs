//! SugarCRM SOAP data models
//!
//! Mirrors the complex types published by the `soap.php` WSDL. Field names
//! follow the wire names so the decoder in `soap::response` stays mechanical.

use serde::{Deserialize, Serialize};

use super::error::SugarFault;

/// Error number the server uses to signal success
pub const SUCCESS_NUMBER: &str = "0";

/// The `error_value` triple embedded in most responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorValue {
    pub number: String,
    pub name: String,
    pub description: String,
}

impl ErrorValue {
    /// A success signal, as returned by a healthy server
    pub fn no_error() -> Self {
        Self {
            number: SUCCESS_NUMBER.to_string(),
            name: "No Error".to_string(),
            description: "No Error".to_string(),
        }
    }

    pub fn new(
        number: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.number == SUCCESS_NUMBER
    }

    /// Pass on success, otherwise return the signal as a [`SugarFault`]
    pub fn check(&self) -> Result<(), SugarFault> {
        if self.is_success() {
            return Ok(());
        }
        Err(SugarFault {
            number: self.number.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        })
    }
}

impl Default for ErrorValue {
    fn default() -> Self {
        Self::no_error()
    }
}

/// Login credentials as sent to the `login` operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuth {
    pub user_name: String,
    /// MD5 hex digest of the password
    pub password: String,
    pub version: String,
}

/// A single field name/value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
    pub name: String,
    pub value: String,
}

impl NameValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One record as returned by the entry operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryValue {
    pub id: String,
    pub module_name: String,
    pub name_value_list: Vec<NameValue>,
}

/// Schema description of one module field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleField {
    pub name: String,
    /// Field type (e.g., "varchar", "enum", "id")
    pub field_type: String,
    pub label: String,
    pub required: bool,
    /// Option values for enum fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<NameValue>,
}

/// Result of `get_entry`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetEntryResult {
    pub field_list: Vec<ModuleField>,
    pub entry_list: Vec<EntryValue>,
    pub error: ErrorValue,
}

/// Result of `get_entry_list` and `search_by_module`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetEntryListResult {
    pub result_count: i32,
    pub next_offset: i32,
    pub field_list: Vec<ModuleField>,
    pub entry_list: Vec<EntryValue>,
    pub error: ErrorValue,
}

/// Result of `set_entry` and `login`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetEntryResult {
    pub id: String,
    pub error: ErrorValue,
}

/// Result of `get_module_fields`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFields {
    pub module_name: String,
    pub module_fields: Vec<ModuleField>,
    pub error: ErrorValue,
}

impl ModuleFields {
    /// Field names in server order
    pub fn names(&self) -> Vec<String> {
        self.module_fields.iter().map(|f| f.name.clone()).collect()
    }
}

/// Result of `get_available_modules`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleList {
    pub modules: Vec<String>,
    pub error: ErrorValue,
}

/// Argument of `set_relationship`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRelationshipValue {
    pub module1: String,
    pub module1_id: String,
    pub module2: String,
    pub module2_id: String,
}

/// A related record reference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMod {
    pub id: String,
    pub date_modified: String,
    pub deleted: bool,
}

/// Result of `get_relationships`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetRelationshipsResult {
    pub ids: Vec<IdMod>,
    pub error: ErrorValue,
}

/// A note's attached file, base64 encoded as the server sends it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoteAttachment {
    pub id: String,
    pub filename: String,
    pub file: String,
}

/// Result of `get_note_attachment`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnNoteAttachment {
    pub note_attachment: NoteAttachment,
    pub error: ErrorValue,
}
