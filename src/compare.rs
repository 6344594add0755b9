//! `CompareRequest` (spec.md §4.5).

use lber::{TagClass, Tagged, Value};

use crate::error::{LdapError, Result};
use crate::filter::AttributeValueAssertion;
use crate::message::TAG_COMPARE_REQUEST;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompareRequest {
    pub entry: String,
    pub ava: AttributeValueAssertion,
}

impl CompareRequest {
    pub fn new(entry: impl Into<String>, desc: impl Into<String>, value: impl Into<Vec<u8>>) -> CompareRequest {
        CompareRequest {
            entry: entry.into(),
            ava: AttributeValueAssertion {
                desc: desc.into(),
                value: value.into(),
            },
        }
    }

    pub(crate) fn to_tagged(&self) -> Value {
        Value::Tagged(Tagged::implicit(
            TagClass::Application,
            TAG_COMPARE_REQUEST,
            Value::Sequence(vec![
                Value::OctetString(self.entry.clone().into_bytes()),
                Value::Sequence(vec![
                    Value::OctetString(self.ava.desc.clone().into_bytes()),
                    Value::OctetString(self.ava.value.clone()),
                ]),
            ]),
        ))
    }

    pub(crate) fn from_tagged(t: &Tagged) -> Result<CompareRequest> {
        let mismatch = |found: String| LdapError::StructuralMismatch {
            expected: "CompareRequest ::= SEQUENCE { entry, ava SEQUENCE { desc, value } }",
            found,
        };
        let children = t.implicit_children().map_err(LdapError::Codec)?;
        match &children[..] {
            [Value::OctetString(entry), Value::Sequence(ava_fields)] => match &ava_fields[..] {
                [Value::OctetString(desc), Value::OctetString(value)] => Ok(CompareRequest {
                    entry: String::from_utf8_lossy(entry).into_owned(),
                    ava: AttributeValueAssertion {
                        desc: String::from_utf8_lossy(desc).into_owned(),
                        value: value.clone(),
                    },
                }),
                _ => Err(mismatch(format!("{:?}", ava_fields))),
            },
            _ => Err(mismatch(format!("{:?}", children))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{LdapMessage, ProtocolOp};

    #[test]
    fn compare_request_round_trips() {
        let req = CompareRequest::new("cn=Bob,dc=example,dc=com", "mail", b"bob@example.com".to_vec());
        let msg = LdapMessage::new(ProtocolOp::CompareRequest(req.clone()));
        let decoded = LdapMessage::decode(&msg.encode()).unwrap();
        match decoded.protocol_op {
            ProtocolOp::CompareRequest(got) => assert_eq!(got, req),
            other => panic!("expected CompareRequest, got {:?}", other),
        }
    }
}
