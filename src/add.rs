//! `AddRequest` (spec.md §4.5).

use lber::{TagClass, Tagged, Value};

use crate::error::{LdapError, Result};
use crate::message::{PartialAttribute, TAG_ADD_REQUEST};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddRequest {
    pub entry: String,
    pub attributes: Vec<PartialAttribute>,
}

impl AddRequest {
    pub fn new(entry: impl Into<String>, attributes: Vec<PartialAttribute>) -> AddRequest {
        AddRequest {
            entry: entry.into(),
            attributes,
        }
    }

    pub(crate) fn to_tagged(&self) -> Value {
        Value::Tagged(Tagged::implicit(
            TagClass::Application,
            TAG_ADD_REQUEST,
            Value::Sequence(vec![
                Value::OctetString(self.entry.clone().into_bytes()),
                Value::Sequence(self.attributes.iter().map(PartialAttribute::to_value).collect()),
            ]),
        ))
    }

    pub(crate) fn from_tagged(t: &Tagged) -> Result<AddRequest> {
        let children = t.implicit_children().map_err(LdapError::Codec)?;
        match &children[..] {
            [Value::OctetString(entry), Value::Sequence(attrs)] => Ok(AddRequest {
                entry: String::from_utf8_lossy(entry).into_owned(),
                attributes: attrs.iter().map(PartialAttribute::from_value).collect::<Result<_>>()?,
            }),
            _ => Err(LdapError::StructuralMismatch {
                expected: "AddRequest ::= SEQUENCE { entry, attributes }",
                found: format!("{:?}", children),
            }),
        }
    }
}
