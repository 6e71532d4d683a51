//! SOAP response decoding
//!
//! Responses are read with `roxmltree`. Elements are matched on local name
//! only, since servers differ in the prefixes they emit. Array members are
//! all element children of the array element, whatever they are called.

use roxmltree::{Document, Node};

use crate::api::error::{ClientError, Result};
use crate::api::models::{
    EntryValue, ErrorValue, GetEntryListResult, GetEntryResult, GetRelationshipsResult, IdMod,
    ModuleField, ModuleFields, ModuleList, NameValue, NoteAttachment, ReturnNoteAttachment,
    SetEntryResult,
};

/// Types that can be decoded from a `return` element
pub trait FromSoap: Sized {
    fn from_node(node: Node<'_, '_>) -> Result<Self>;
}

/// Decode the `return` value of an RPC response document.
///
/// A SOAP `Fault` anywhere in the body takes precedence over the payload.
pub fn decode<T: FromSoap>(xml: &str) -> Result<T> {
    let doc = Document::parse(xml)?;
    let envelope = doc.root_element();
    let body = child(envelope, "Body")
        .ok_or_else(|| ClientError::Malformed("response has no SOAP Body".to_string()))?;

    if let Some(fault) = child(body, "Fault") {
        return Err(ClientError::SoapFault {
            code: child_text(fault, "faultcode"),
            message: child_text(fault, "faultstring"),
        });
    }

    let response = elements(body)
        .next()
        .ok_or_else(|| ClientError::Malformed("SOAP Body is empty".to_string()))?;
    let value = child(response, "return").ok_or_else(|| {
        ClientError::Malformed(format!(
            "{} has no return element",
            response.tag_name().name()
        ))
    })?;

    T::from_node(value)
}

/// The SOAP fault in `xml`, if the document carries one
pub fn fault(xml: &str) -> Option<ClientError> {
    match decode::<Ignored>(xml) {
        Err(err @ ClientError::SoapFault { .. }) => Some(err),
        _ => None,
    }
}

/// Accepts any payload; used when only the fault matters
struct Ignored;

impl FromSoap for Ignored {
    fn from_node(_node: Node<'_, '_>) -> Result<Self> {
        Ok(Ignored)
    }
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    elements(node).find(|n| n.tag_name().name() == name)
}

fn required<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Result<Node<'a, 'input>> {
    child(node, name).ok_or_else(|| {
        ClientError::Malformed(format!(
            "{} is missing <{}>",
            node.tag_name().name(),
            name
        ))
    })
}

/// Text of a child element; absent and nil elements read as empty
fn child_text(node: Node<'_, '_>, name: &str) -> String {
    child(node, name).map(text).unwrap_or_default()
}

fn text(node: Node<'_, '_>) -> String {
    node.text().unwrap_or_default().to_string()
}

fn child_int(node: Node<'_, '_>, name: &str) -> Result<i32> {
    let raw = child_text(node, name);
    parse_int(&raw, name)
}

fn parse_int(raw: &str, what: &str) -> Result<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse()
        .map_err(|_| ClientError::Malformed(format!("{what} is not an integer: {raw:?}")))
}

/// Loose boolean: "1"/"true" are true, everything else false
fn child_flag(node: Node<'_, '_>, name: &str) -> bool {
    matches!(child_text(node, name).trim(), "1" | "true")
}

fn list<T, F>(node: Node<'_, '_>, name: &str, item: F) -> Result<Vec<T>>
where
    F: Fn(Node<'_, '_>) -> Result<T>,
{
    match child(node, name) {
        Some(array) => elements(array).map(item).collect(),
        None => Ok(Vec::new()),
    }
}

fn error_of(node: Node<'_, '_>) -> Result<ErrorValue> {
    required(node, "error").and_then(ErrorValue::from_node)
}

impl FromSoap for String {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(text(node))
    }
}

impl FromSoap for i32 {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        parse_int(&text(node), "return")
    }
}

impl FromSoap for ErrorValue {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(ErrorValue {
            number: child_text(node, "number"),
            name: child_text(node, "name"),
            description: child_text(node, "description"),
        })
    }
}

impl FromSoap for NameValue {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(NameValue {
            name: child_text(node, "name"),
            value: child_text(node, "value"),
        })
    }
}

impl FromSoap for EntryValue {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(EntryValue {
            id: child_text(node, "id"),
            module_name: child_text(node, "module_name"),
            name_value_list: list(node, "name_value_list", NameValue::from_node)?,
        })
    }
}

impl FromSoap for ModuleField {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(ModuleField {
            name: child_text(node, "name"),
            field_type: child_text(node, "type"),
            label: child_text(node, "label"),
            required: child_flag(node, "required"),
            options: list(node, "options", NameValue::from_node)?,
        })
    }
}

impl FromSoap for SetEntryResult {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(SetEntryResult {
            id: child_text(node, "id"),
            error: error_of(node)?,
        })
    }
}

impl FromSoap for GetEntryResult {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(GetEntryResult {
            field_list: list(node, "field_list", ModuleField::from_node)?,
            entry_list: list(node, "entry_list", EntryValue::from_node)?,
            error: error_of(node)?,
        })
    }
}

impl FromSoap for GetEntryListResult {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(GetEntryListResult {
            result_count: child_int(node, "result_count")?,
            next_offset: child_int(node, "next_offset")?,
            field_list: list(node, "field_list", ModuleField::from_node)?,
            entry_list: list(node, "entry_list", EntryValue::from_node)?,
            error: error_of(node)?,
        })
    }
}

impl FromSoap for ModuleFields {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(ModuleFields {
            module_name: child_text(node, "module_name"),
            module_fields: list(node, "module_fields", ModuleField::from_node)?,
            error: error_of(node)?,
        })
    }
}

impl FromSoap for ModuleList {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(ModuleList {
            modules: list(node, "modules", String::from_node)?,
            error: error_of(node)?,
        })
    }
}

impl FromSoap for IdMod {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(IdMod {
            id: child_text(node, "id"),
            date_modified: child_text(node, "date_modified"),
            deleted: child_flag(node, "deleted"),
        })
    }
}

impl FromSoap for GetRelationshipsResult {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(GetRelationshipsResult {
            ids: list(node, "ids", IdMod::from_node)?,
            error: error_of(node)?,
        })
    }
}

impl FromSoap for NoteAttachment {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(NoteAttachment {
            id: child_text(node, "id"),
            filename: child_text(node, "filename"),
            file: child_text(node, "file"),
        })
    }
}

impl FromSoap for ReturnNoteAttachment {
    fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(ReturnNoteAttachment {
            note_attachment: required(node, "note_attachment").and_then(NoteAttachment::from_node)?,
            error: error_of(node)?,
        })
    }
}
