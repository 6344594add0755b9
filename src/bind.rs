//! `BindRequest`/`BindResponse` (spec.md §4.5).

use lber::{TagClass, Tagged, Value};

use crate::error::{LdapError, Result};
use crate::message::TAG_BIND_REQUEST;
use crate::result::LdapResult;

const AUTH_SIMPLE: u64 = 0;
const AUTH_SASL: u64 = 3;

/// `AuthenticationChoice`, restricted to the two mechanisms spec.md §4.5
/// names: a plain password, or a named SASL mechanism with optional
/// credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Simple(Vec<u8>),
    Sasl { mechanism: String, credentials: Option<Vec<u8>> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindRequest {
    pub version: i64,
    pub name: String,
    pub authentication: Credentials,
}

impl BindRequest {
    pub fn simple(name: impl Into<String>, password: impl Into<Vec<u8>>) -> BindRequest {
        BindRequest {
            version: 3,
            name: name.into(),
            authentication: Credentials::Simple(password.into()),
        }
    }

    pub(crate) fn to_tagged(&self) -> Value {
        let auth = match &self.authentication {
            Credentials::Simple(pw) => Value::Tagged(Tagged::implicit(TagClass::Context, AUTH_SIMPLE, Value::OctetString(pw.clone()))),
            Credentials::Sasl { mechanism, credentials } => {
                let mut fields = vec![Value::OctetString(mechanism.clone().into_bytes())];
                if let Some(creds) = credentials {
                    fields.push(Value::OctetString(creds.clone()));
                }
                Value::Tagged(Tagged::implicit(TagClass::Context, AUTH_SASL, Value::Sequence(fields)))
            }
        };
        Value::Tagged(Tagged::implicit(
            TagClass::Application,
            TAG_BIND_REQUEST,
            Value::Sequence(vec![Value::Integer(self.version), Value::OctetString(self.name.clone().into_bytes()), auth]),
        ))
    }

    pub(crate) fn from_tagged(t: &Tagged) -> Result<BindRequest> {
        let children = t.implicit_children().map_err(LdapError::Codec)?;
        let mismatch = || LdapError::StructuralMismatch {
            expected: "BindRequest ::= SEQUENCE { version INTEGER, name OCTET STRING, authentication CHOICE }",
            found: format!("{:?}", children),
        };
        let (version, name, auth) = match &children[..] {
            [Value::Integer(v), Value::OctetString(name), Value::Tagged(auth)] => (*v, name, auth),
            _ => return Err(mismatch()),
        };
        let authentication = match auth.tag {
            AUTH_SIMPLE => Credentials::Simple(auth.primitive_octets().map_err(LdapError::Codec)?.to_vec()),
            AUTH_SASL => {
                let fields = auth.implicit_children().map_err(LdapError::Codec)?;
                match &fields[..] {
                    [Value::OctetString(mech)] => Credentials::Sasl {
                        mechanism: String::from_utf8_lossy(mech).into_owned(),
                        credentials: None,
                    },
                    [Value::OctetString(mech), Value::OctetString(creds)] => Credentials::Sasl {
                        mechanism: String::from_utf8_lossy(mech).into_owned(),
                        credentials: Some(creds.clone()),
                    },
                    _ => return Err(mismatch()),
                }
            }
            _ => return Err(mismatch()),
        };
        Ok(BindRequest {
            version,
            name: String::from_utf8_lossy(name).into_owned(),
            authentication,
        })
    }
}

/// `BindResponse` adds an optional `serverSaslCreds [7]` to the common
/// `LDAPResult` fields; omitted here since spec.md's Bind coverage only
/// names the simple/SASL request shape, not server SASL continuation.
#[derive(Clone, Debug, PartialEq)]
pub struct BindResponse {
    pub result: LdapResult,
}

impl BindResponse {
    pub(crate) fn to_tagged(&self) -> Value {
        Value::Tagged(Tagged::implicit(
            TagClass::Application,
            crate::message::TAG_BIND_RESPONSE,
            Value::Sequence(self.result.encode_fields()),
        ))
    }

    pub(crate) fn from_tagged(t: &Tagged) -> Result<BindResponse> {
        let fields = t.implicit_children().map_err(LdapError::Codec)?;
        let (result, rest) = LdapResult::decode_fields(&fields)?;
        if !rest.is_empty() {
            return Err(LdapError::StructuralMismatch {
                expected: "no trailing fields after BindResponse's LDAPResult",
                found: format!("{:?}", rest),
            });
        }
        Ok(BindResponse { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{LdapMessage, ProtocolOp};

    #[test]
    fn simple_bind_round_trips_through_message() {
        let req = BindRequest::simple("cn=admin,dc=example,dc=com", b"secret".to_vec());
        let msg = LdapMessage::new(ProtocolOp::BindRequest(req.clone()));
        let decoded = LdapMessage::decode(&msg.encode()).unwrap();
        match decoded.protocol_op {
            ProtocolOp::BindRequest(got) => assert_eq!(got, req),
            other => panic!("expected BindRequest, got {:?}", other),
        }
    }

    #[test]
    fn sasl_bind_without_credentials_round_trips() {
        let req = BindRequest {
            version: 3,
            name: String::new(),
            authentication: Credentials::Sasl {
                mechanism: "EXTERNAL".to_string(),
                credentials: None,
            },
        };
        let msg = LdapMessage::new(ProtocolOp::BindRequest(req.clone()));
        let decoded = LdapMessage::decode(&msg.encode()).unwrap();
        match decoded.protocol_op {
            ProtocolOp::BindRequest(got) => assert_eq!(got, req),
            other => panic!("expected BindRequest, got {:?}", other),
        }
    }
}
