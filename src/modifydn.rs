//! `ModifyDNRequest` (spec.md §4.5).

use lber::{TagClass, Tagged, Value};

use crate::error::{LdapError, Result};
use crate::message::TAG_MODIFY_DN_REQUEST;

const NEW_SUPERIOR_TAG: u64 = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModifyDnRequest {
    pub entry: String,
    pub newrdn: String,
    pub delete_old_rdn: bool,
    pub new_superior: Option<String>,
}

impl ModifyDnRequest {
    pub fn new(entry: impl Into<String>, newrdn: impl Into<String>, delete_old_rdn: bool) -> ModifyDnRequest {
        ModifyDnRequest {
            entry: entry.into(),
            newrdn: newrdn.into(),
            delete_old_rdn,
            new_superior: None,
        }
    }

    pub fn with_new_superior(mut self, new_superior: impl Into<String>) -> ModifyDnRequest {
        self.new_superior = Some(new_superior.into());
        self
    }

    pub(crate) fn to_tagged(&self) -> Value {
        let mut fields = vec![
            Value::OctetString(self.entry.clone().into_bytes()),
            Value::OctetString(self.newrdn.clone().into_bytes()),
            Value::Boolean(self.delete_old_rdn),
        ];
        if let Some(superior) = &self.new_superior {
            fields.push(Value::Tagged(Tagged::implicit(
                TagClass::Context,
                NEW_SUPERIOR_TAG,
                Value::OctetString(superior.clone().into_bytes()),
            )));
        }
        Value::Tagged(Tagged::implicit(TagClass::Application, TAG_MODIFY_DN_REQUEST, Value::Sequence(fields)))
    }

    pub(crate) fn from_tagged(t: &Tagged) -> Result<ModifyDnRequest> {
        let mismatch = |found: String| LdapError::StructuralMismatch {
            expected: "ModifyDNRequest ::= SEQUENCE { entry, newrdn, deleteoldrdn, newSuperior [0] OPTIONAL }",
            found,
        };
        let children = t.implicit_children().map_err(LdapError::Codec)?;
        let (entry, newrdn, delete_old_rdn, new_superior) = match &children[..] {
            [Value::OctetString(entry), Value::OctetString(newrdn), Value::Boolean(del)] => (entry, newrdn, *del, None),
            [Value::OctetString(entry), Value::OctetString(newrdn), Value::Boolean(del), Value::Tagged(superior)] => {
                if superior.class != TagClass::Context || superior.tag != NEW_SUPERIOR_TAG {
                    return Err(mismatch(format!("{:?}", children)));
                }
                let bytes = superior.primitive_octets().map_err(LdapError::Codec)?;
                (entry, newrdn, *del, Some(String::from_utf8_lossy(bytes).into_owned()))
            }
            _ => return Err(mismatch(format!("{:?}", children))),
        };
        Ok(ModifyDnRequest {
            entry: String::from_utf8_lossy(entry).into_owned(),
            newrdn: String::from_utf8_lossy(newrdn).into_owned(),
            delete_old_rdn,
            new_superior,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{LdapMessage, ProtocolOp};

    #[test]
    fn modify_dn_request_round_trips_without_new_superior() {
        let req = ModifyDnRequest::new("cn=Bob,dc=example,dc=com", "cn=Robert", true);
        let msg = LdapMessage::new(ProtocolOp::ModifyDnRequest(req.clone()));
        let decoded = LdapMessage::decode(&msg.encode()).unwrap();
        match decoded.protocol_op {
            ProtocolOp::ModifyDnRequest(got) => assert_eq!(got, req),
            other => panic!("expected ModifyDnRequest, got {:?}", other),
        }
    }

    #[test]
    fn modify_dn_request_round_trips_with_new_superior() {
        let req = ModifyDnRequest::new("cn=Bob,dc=example,dc=com", "cn=Robert", false).with_new_superior("ou=people,dc=example,dc=com");
        let msg = LdapMessage::new(ProtocolOp::ModifyDnRequest(req.clone()));
        let decoded = LdapMessage::decode(&msg.encode()).unwrap();
        match decoded.protocol_op {
            ProtocolOp::ModifyDnRequest(got) => assert_eq!(got, req),
            other => panic!("expected ModifyDnRequest, got {:?}", other),
        }
    }
}
