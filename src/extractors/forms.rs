//! AcroForm field extraction.
//!
//! Walks `/AcroForm /Fields` including `/Kids` hierarchies. Field type and
//! value inherit from ancestors; partial names join with dots to form the
//! fully qualified name.

use crate::document::Document;
use crate::error::Result;
use crate::object::{Dict, Object};
use std::collections::HashSet;

/// Field-kind discriminator, matching the `/FT` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// `/Tx` text field
    Text,
    /// `/Btn` pushbutton / checkbox / radio
    Button,
    /// `/Ch` list or combo box
    Choice,
    /// `/Sig` signature field
    Signature,
    /// Anything else
    Unknown,
}

impl FieldType {
    fn from_name(name: &str) -> Self {
        match name {
            "Tx" => Self::Text,
            "Btn" => Self::Button,
            "Ch" => Self::Choice,
            "Sig" => Self::Signature,
            _ => Self::Unknown,
        }
    }

    /// Stable numeric code for the C boundary.
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Text => 1,
            Self::Button => 2,
            Self::Choice => 3,
            Self::Signature => 4,
        }
    }
}

/// One terminal form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    /// Fully qualified name (partial names joined with `.`)
    pub name: String,
    /// Current value, text-decoded when present
    pub value: Option<String>,
    /// Field kind
    pub field_type: FieldType,
    /// Widget rectangle, when the field carries one
    pub rect: Option<[f64; 4]>,
}

/// Extract all terminal form fields of the document.
pub fn form_fields(doc: &mut Document) -> Result<Vec<FormField>> {
    let catalog = doc.catalog()?;
    let Some(acroform_entry) = catalog.as_dict().and_then(|d| d.get("AcroForm")).cloned() else {
        return Ok(Vec::new());
    };
    let acroform = doc.resolve(&acroform_entry)?;
    let Some(fields_entry) = acroform.as_dict().and_then(|d| d.get("Fields")).cloned() else {
        return Ok(Vec::new());
    };
    let fields_array = doc.resolve(&fields_entry)?;
    let Some(items) = fields_array.as_array().map(<[Object]>::to_vec) else {
        return Ok(Vec::new());
    };

    let mut fields = Vec::new();
    let mut visited = HashSet::new();
    for item in items {
        walk_field(doc, &item, "", FieldType::Unknown, &mut fields, &mut visited, 0)?;
    }
    Ok(fields)
}

fn walk_field(
    doc: &mut Document,
    node: &Object,
    parent_name: &str,
    inherited_type: FieldType,
    fields: &mut Vec<FormField>,
    visited: &mut HashSet<crate::object::ObjectRef>,
    depth: u32,
) -> Result<()> {
    if depth > 32 {
        log::warn!("form field hierarchy deeper than 32, truncating");
        return Ok(());
    }
    if let Some(r) = node.as_reference() {
        if !visited.insert(r) {
            log::warn!("form field cycle at {}", r);
            return Ok(());
        }
    }

    let resolved = doc.resolve(node)?;
    let Some(dict) = resolved.as_dict().cloned() else {
        return Ok(());
    };

    let partial = dict
        .get("T")
        .and_then(|o| o.as_string_bytes())
        .map(crate::strings::decode_text_string);
    let name = match (&partial, parent_name.is_empty()) {
        (Some(p), true) => p.clone(),
        (Some(p), false) => format!("{}.{}", parent_name, p),
        (None, _) => parent_name.to_string(),
    };

    let field_type = dict
        .get("FT")
        .and_then(|o| o.as_name())
        .map(FieldType::from_name)
        .unwrap_or(inherited_type);

    let kids = match dict.get("Kids") {
        Some(k) => doc.resolve(k)?.as_array().map(<[Object]>::to_vec).unwrap_or_default(),
        None => Vec::new(),
    };

    // Kids that carry their own /T are child fields; bare kids are widget
    // annotations of this field.
    let has_child_fields = !kids.is_empty() && {
        let mut found = false;
        for kid in &kids {
            let resolved = doc.resolve(kid)?;
            if resolved.as_dict().is_some_and(|d| d.contains_key("T")) {
                found = true;
                break;
            }
        }
        found
    };

    if has_child_fields {
        for kid in kids {
            walk_field(doc, &kid, &name, field_type, fields, visited, depth + 1)?;
        }
    } else {
        let mut rect = read_rect(&dict);
        if rect.is_none() {
            // merged widget: the rectangle lives on the first kid
            if let Some(kid) = kids.first() {
                rect = doc.resolve(kid)?.as_dict().and_then(read_rect);
            }
        }
        fields.push(FormField {
            name,
            value: field_value(doc, &dict)?,
            field_type,
            rect,
        });
    }

    Ok(())
}

fn field_value(doc: &mut Document, dict: &Dict) -> Result<Option<String>> {
    let Some(v) = dict.get("V") else {
        return Ok(None);
    };
    let v = doc.resolve(v)?;
    Ok(match &v {
        Object::String(bytes) | Object::HexString(bytes) => {
            Some(crate::strings::decode_text_string(bytes))
        },
        Object::Name(name) => Some(name.clone()),
        _ => None,
    })
}

fn read_rect(dict: &Dict) -> Option<[f64; 4]> {
    let items = dict.get("Rect")?.as_array()?;
    if items.len() != 4 {
        return None;
    }
    let mut rect = [0.0; 4];
    for (i, item) in items.iter().enumerate() {
        rect[i] = item.as_number()?;
    }
    Some(rect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_mapping() {
        assert_eq!(FieldType::from_name("Tx"), FieldType::Text);
        assert_eq!(FieldType::from_name("Btn"), FieldType::Button);
        assert_eq!(FieldType::from_name("Ch"), FieldType::Choice);
        assert_eq!(FieldType::from_name("Sig"), FieldType::Signature);
        assert_eq!(FieldType::from_name("Nope"), FieldType::Unknown);
    }

    #[test]
    fn test_field_type_codes_stable() {
        assert_eq!(FieldType::Unknown.code(), 0);
        assert_eq!(FieldType::Text.code(), 1);
        assert_eq!(FieldType::Button.code(), 2);
        assert_eq!(FieldType::Choice.code(), 3);
        assert_eq!(FieldType::Signature.code(), 4);
    }
}
