//! `ModifyRequest` (spec.md §4.5).

use lber::{TagClass, Tagged, Value};

use crate::error::{LdapError, Result};
use crate::message::{PartialAttribute, TAG_MODIFY_REQUEST};

/// `ModifyRequest`'s per-change operation, `ENUMERATED {add=0, delete=1,
/// replace=2}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mod {
    Add = 0,
    Delete = 1,
    Replace = 2,
}

impl Mod {
    fn from_i64(n: i64) -> Result<Mod> {
        match n {
            0 => Ok(Mod::Add),
            1 => Ok(Mod::Delete),
            2 => Ok(Mod::Replace),
            other => Err(LdapError::StructuralMismatch {
                expected: "operation ENUMERATED {add=0,delete=1,replace=2}",
                found: format!("{}", other),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModifyRequest {
    pub object: String,
    pub changes: Vec<(Mod, PartialAttribute)>,
}

impl ModifyRequest {
    pub fn new(object: impl Into<String>, changes: Vec<(Mod, PartialAttribute)>) -> ModifyRequest {
        ModifyRequest {
            object: object.into(),
            changes,
        }
    }

    pub(crate) fn to_tagged(&self) -> Value {
        Value::Tagged(Tagged::implicit(
            TagClass::Application,
            TAG_MODIFY_REQUEST,
            Value::Sequence(vec![
                Value::OctetString(self.object.clone().into_bytes()),
                Value::SequenceOf(
                    self.changes
                        .iter()
                        .map(|(op, attr)| Value::Sequence(vec![Value::Enumerated(*op as i64), attr.to_value()]))
                        .collect(),
                ),
            ]),
        ))
    }

    pub(crate) fn from_tagged(t: &Tagged) -> Result<ModifyRequest> {
        let mismatch = |found: String| LdapError::StructuralMismatch {
            expected: "ModifyRequest ::= SEQUENCE { object, changes SEQUENCE OF SEQUENCE { operation, modification } }",
            found,
        };
        let children = t.implicit_children().map_err(LdapError::Codec)?;
        let (object, changes) = match &children[..] {
            [Value::OctetString(object), Value::Sequence(changes)] => (object, changes),
            _ => return Err(mismatch(format!("{:?}", children))),
        };
        let changes = changes
            .iter()
            .map(|v| match v {
                Value::Sequence(fields) => match &fields[..] {
                    [Value::Enumerated(op), attr] => Ok((Mod::from_i64(*op)?, PartialAttribute::from_value(attr)?)),
                    _ => Err(mismatch(format!("{:?}", fields))),
                },
                other => Err(mismatch(format!("{:?}", other))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ModifyRequest {
            object: String::from_utf8_lossy(object).into_owned(),
            changes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{LdapMessage, ProtocolOp};

    #[test]
    fn modify_request_round_trips() {
        let req = ModifyRequest::new(
            "cn=Bob,dc=example,dc=com",
            vec![
                (Mod::Replace, PartialAttribute::new("mail", vec![b"bob@example.com".to_vec()])),
                (Mod::Delete, PartialAttribute::new("description", vec![])),
            ],
        );
        let msg = LdapMessage::new(ProtocolOp::ModifyRequest(req.clone()));
        let decoded = LdapMessage::decode(&msg.encode()).unwrap();
        match decoded.protocol_op {
            ProtocolOp::ModifyRequest(got) => assert_eq!(got, req),
            other => panic!("expected ModifyRequest, got {:?}", other),
        }
    }
}
