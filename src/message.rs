//! `LDAPMessage` framing (spec.md §4.4, §3 "LDAP message").
//!
//! The outer envelope around every PDU: a message id, the operation
//! itself as an application-tagged CHOICE, and an optional `[0]`
//! controls list.

use std::sync::atomic::{AtomicI32, Ordering};

use log::{debug, trace};

use lber::{TagClass, Tagged, Value};

use crate::abandon::AbandonRequest;
use crate::add::AddRequest;
use crate::bind::{BindRequest, BindResponse};
use crate::compare::CompareRequest;
use crate::controls::{decode_controls, encode_controls, Control};
use crate::error::{LdapError, Result};
use crate::extended::{ExtendedRequest, ExtendedResponse, IntermediateResponse};
use crate::modify::ModifyRequest;
use crate::modifydn::ModifyDnRequest;
use crate::result::LdapResult;
use crate::search::{SearchRequest, SearchResultEntry};

pub const TAG_BIND_REQUEST: u64 = 0;
pub const TAG_BIND_RESPONSE: u64 = 1;
pub const TAG_UNBIND_REQUEST: u64 = 2;
pub const TAG_SEARCH_REQUEST: u64 = 3;
pub const TAG_SEARCH_RESULT_ENTRY: u64 = 4;
pub const TAG_SEARCH_RESULT_DONE: u64 = 5;
pub const TAG_MODIFY_REQUEST: u64 = 6;
pub const TAG_MODIFY_RESPONSE: u64 = 7;
pub const TAG_ADD_REQUEST: u64 = 8;
pub const TAG_ADD_RESPONSE: u64 = 9;
pub const TAG_DEL_REQUEST: u64 = 10;
pub const TAG_DEL_RESPONSE: u64 = 11;
pub const TAG_MODIFY_DN_REQUEST: u64 = 12;
pub const TAG_MODIFY_DN_RESPONSE: u64 = 13;
pub const TAG_COMPARE_REQUEST: u64 = 14;
pub const TAG_COMPARE_RESPONSE: u64 = 15;
pub const TAG_ABANDON_REQUEST: u64 = 16;
pub const TAG_SEARCH_RESULT_REFERENCE: u64 = 19;
pub const TAG_EXTENDED_REQUEST: u64 = 23;
pub const TAG_EXTENDED_RESPONSE: u64 = 24;
pub const TAG_INTERMEDIATE_RESPONSE: u64 = 25;

/// One attribute and its values, as carried by `AddRequest`,
/// `ModifyRequest` and `SearchResultEntry` (spec.md §4.5).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialAttribute {
    pub atype: String,
    pub vals: Vec<Vec<u8>>,
}

impl PartialAttribute {
    pub fn new(atype: impl Into<String>, vals: Vec<Vec<u8>>) -> PartialAttribute {
        PartialAttribute {
            atype: atype.into(),
            vals,
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        Value::Sequence(vec![
            Value::OctetString(self.atype.clone().into_bytes()),
            Value::SetOf(self.vals.iter().cloned().map(Value::OctetString).collect()),
        ])
    }

    pub(crate) fn from_value(v: &Value) -> Result<PartialAttribute> {
        let mismatch = || LdapError::StructuralMismatch {
            expected: "PartialAttribute ::= SEQUENCE { type OCTET STRING, vals SET OF OCTET STRING }",
            found: format!("{:?}", v),
        };
        let Value::Sequence(fields) = v else {
            return Err(mismatch());
        };
        match &fields[..] {
            [Value::OctetString(atype), Value::Set(vals)] => {
                let vals = vals
                    .iter()
                    .map(|v| match v {
                        Value::OctetString(bytes) => Ok(bytes.clone()),
                        _ => Err(mismatch()),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(PartialAttribute {
                    atype: String::from_utf8_lossy(atype).into_owned(),
                    vals,
                })
            }
            _ => Err(mismatch()),
        }
    }
}

/// One complete PDU, selected by its application tag (spec.md §3).
#[derive(Clone, Debug, PartialEq)]
pub enum ProtocolOp {
    BindRequest(BindRequest),
    BindResponse(BindResponse),
    UnbindRequest,
    SearchRequest(SearchRequest),
    SearchResultEntry(SearchResultEntry),
    SearchResultDone(LdapResult),
    ModifyRequest(ModifyRequest),
    ModifyResponse(LdapResult),
    AddRequest(AddRequest),
    AddResponse(LdapResult),
    DelRequest(String),
    DelResponse(LdapResult),
    ModifyDnRequest(ModifyDnRequest),
    ModifyDnResponse(LdapResult),
    CompareRequest(CompareRequest),
    CompareResponse(LdapResult),
    AbandonRequest(AbandonRequest),
    SearchResultReference(Vec<String>),
    ExtendedRequest(ExtendedRequest),
    ExtendedResponse(ExtendedResponse),
    IntermediateResponse(IntermediateResponse),
}

impl ProtocolOp {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            ProtocolOp::BindRequest(r) => r.to_tagged(),
            ProtocolOp::BindResponse(r) => r.to_tagged(),
            ProtocolOp::UnbindRequest => Value::Tagged(Tagged::implicit(TagClass::Application, TAG_UNBIND_REQUEST, Value::Null)),
            ProtocolOp::SearchRequest(r) => r.to_tagged(),
            ProtocolOp::SearchResultEntry(r) => r.to_tagged(),
            ProtocolOp::SearchResultDone(r) => wrap_result(TAG_SEARCH_RESULT_DONE, r),
            ProtocolOp::ModifyRequest(r) => r.to_tagged(),
            ProtocolOp::ModifyResponse(r) => wrap_result(TAG_MODIFY_RESPONSE, r),
            ProtocolOp::AddRequest(r) => r.to_tagged(),
            ProtocolOp::AddResponse(r) => wrap_result(TAG_ADD_RESPONSE, r),
            ProtocolOp::DelRequest(dn) => Value::Tagged(Tagged::implicit(
                TagClass::Application,
                TAG_DEL_REQUEST,
                Value::OctetString(dn.clone().into_bytes()),
            )),
            ProtocolOp::DelResponse(r) => wrap_result(TAG_DEL_RESPONSE, r),
            ProtocolOp::ModifyDnRequest(r) => r.to_tagged(),
            ProtocolOp::ModifyDnResponse(r) => wrap_result(TAG_MODIFY_DN_RESPONSE, r),
            ProtocolOp::CompareRequest(r) => r.to_tagged(),
            ProtocolOp::CompareResponse(r) => wrap_result(TAG_COMPARE_RESPONSE, r),
            ProtocolOp::AbandonRequest(r) => Value::Tagged(Tagged::implicit(TagClass::Application, TAG_ABANDON_REQUEST, Value::Integer(r.0))),
            ProtocolOp::SearchResultReference(uris) => Value::Tagged(Tagged::implicit(
                TagClass::Application,
                TAG_SEARCH_RESULT_REFERENCE,
                Value::SequenceOf(uris.iter().cloned().map(|u| Value::OctetString(u.into_bytes())).collect()),
            )),
            ProtocolOp::ExtendedRequest(r) => r.to_tagged(),
            ProtocolOp::ExtendedResponse(r) => r.to_tagged(),
            ProtocolOp::IntermediateResponse(r) => r.to_tagged(),
        }
    }

    fn from_value(v: Value) -> Result<ProtocolOp> {
        let Value::Tagged(t) = &v else {
            return Err(LdapError::StructuralMismatch {
                expected: "protocolOp CHOICE (application-tagged)",
                found: format!("{:?}", v),
            });
        };
        if t.class != TagClass::Application {
            return Err(LdapError::StructuralMismatch {
                expected: "protocolOp application class",
                found: format!("{:?}", t.class),
            });
        }
        match t.tag {
            TAG_BIND_REQUEST => Ok(ProtocolOp::BindRequest(BindRequest::from_tagged(t)?)),
            TAG_BIND_RESPONSE => Ok(ProtocolOp::BindResponse(BindResponse::from_tagged(t)?)),
            TAG_UNBIND_REQUEST => Ok(ProtocolOp::UnbindRequest),
            TAG_SEARCH_REQUEST => Ok(ProtocolOp::SearchRequest(SearchRequest::from_tagged(t)?)),
            TAG_SEARCH_RESULT_ENTRY => Ok(ProtocolOp::SearchResultEntry(SearchResultEntry::from_tagged(t)?)),
            TAG_SEARCH_RESULT_DONE => Ok(ProtocolOp::SearchResultDone(unwrap_result(t)?)),
            TAG_MODIFY_REQUEST => Ok(ProtocolOp::ModifyRequest(ModifyRequest::from_tagged(t)?)),
            TAG_MODIFY_RESPONSE => Ok(ProtocolOp::ModifyResponse(unwrap_result(t)?)),
            TAG_ADD_REQUEST => Ok(ProtocolOp::AddRequest(AddRequest::from_tagged(t)?)),
            TAG_ADD_RESPONSE => Ok(ProtocolOp::AddResponse(unwrap_result(t)?)),
            TAG_DEL_REQUEST => {
                let bytes = t.primitive_octets().map_err(LdapError::Codec)?;
                Ok(ProtocolOp::DelRequest(String::from_utf8_lossy(bytes).into_owned()))
            }
            TAG_DEL_RESPONSE => Ok(ProtocolOp::DelResponse(unwrap_result(t)?)),
            TAG_MODIFY_DN_REQUEST => Ok(ProtocolOp::ModifyDnRequest(ModifyDnRequest::from_tagged(t)?)),
            TAG_MODIFY_DN_RESPONSE => Ok(ProtocolOp::ModifyDnResponse(unwrap_result(t)?)),
            TAG_COMPARE_REQUEST => Ok(ProtocolOp::CompareRequest(CompareRequest::from_tagged(t)?)),
            TAG_COMPARE_RESPONSE => Ok(ProtocolOp::CompareResponse(unwrap_result(t)?)),
            TAG_ABANDON_REQUEST => Ok(ProtocolOp::AbandonRequest(AbandonRequest(t.implicit_integer().map_err(LdapError::Codec)?))),
            TAG_SEARCH_RESULT_REFERENCE => {
                let uris = t
                    .implicit_children()
                    .map_err(LdapError::Codec)?
                    .into_iter()
                    .map(|v| match v {
                        Value::OctetString(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
                        other => Err(LdapError::StructuralMismatch {
                            expected: "referral URI OCTET STRING",
                            found: format!("{:?}", other),
                        }),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(ProtocolOp::SearchResultReference(uris))
            }
            TAG_EXTENDED_REQUEST => Ok(ProtocolOp::ExtendedRequest(ExtendedRequest::from_tagged(t)?)),
            TAG_EXTENDED_RESPONSE => Ok(ProtocolOp::ExtendedResponse(ExtendedResponse::from_tagged(t)?)),
            TAG_INTERMEDIATE_RESPONSE => Ok(ProtocolOp::IntermediateResponse(IntermediateResponse::from_tagged(t)?)),
            other => Err(LdapError::StructuralMismatch {
                expected: "a known protocolOp application tag",
                found: format!("tag {}", other),
            }),
        }
    }
}

fn wrap_result(tag: u64, result: &LdapResult) -> Value {
    Value::Tagged(Tagged::implicit(TagClass::Application, tag, Value::Sequence(result.encode_fields())))
}

fn unwrap_result(t: &Tagged) -> Result<LdapResult> {
    let fields = t.implicit_children().map_err(LdapError::Codec)?;
    let (result, rest) = LdapResult::decode_fields(&fields)?;
    if !rest.is_empty() {
        return Err(LdapError::StructuralMismatch {
            expected: "no trailing fields after LDAPResult",
            found: format!("{:?}", rest),
        });
    }
    Ok(result)
}

/// The outer `LDAPMessage` SEQUENCE (spec.md §3).
#[derive(Clone, Debug, PartialEq)]
pub struct LdapMessage {
    pub message_id: i32,
    pub protocol_op: ProtocolOp,
    pub controls: Vec<Control>,
}

impl LdapMessage {
    pub fn new(protocol_op: ProtocolOp) -> LdapMessage {
        LdapMessage {
            message_id: next_message_id(),
            protocol_op,
            controls: Vec::new(),
        }
    }

    pub fn with_controls(mut self, controls: Vec<Control>) -> LdapMessage {
        self.controls = controls;
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        trace!("encoding message {}: {:?}", self.message_id, self.protocol_op);
        self.to_value().encode()
    }

    fn to_value(&self) -> Value {
        let mut fields = vec![Value::Integer(self.message_id as i64), self.protocol_op.to_value()];
        if let Some(controls) = encode_controls(&self.controls) {
            fields.push(controls);
        }
        Value::Sequence(fields)
    }

    pub fn decode(bytes: &[u8]) -> Result<LdapMessage> {
        let mut cursor = std::io::Cursor::new(bytes);
        let value = lber::decode_one(&mut cursor).map_err(LdapError::Codec)?;
        Self::from_value(value)
    }

    pub fn read_from<R: std::io::Read + ?Sized>(r: &mut R) -> Result<LdapMessage> {
        let value = lber::decode_one(r).map_err(LdapError::Codec)?;
        let msg = Self::from_value(value)?;
        trace!("decoded message {}: {:?}", msg.message_id, msg.protocol_op);
        Ok(msg)
    }

    fn from_value(value: Value) -> Result<LdapMessage> {
        let Value::Sequence(fields) = value else {
            return Err(LdapError::StructuralMismatch {
                expected: "LDAPMessage ::= SEQUENCE { messageID, protocolOp, controls OPTIONAL }",
                found: "non-sequence".to_string(),
            });
        };
        let mut iter = fields.into_iter();
        let message_id = match iter.next() {
            Some(Value::Integer(id)) => id as i32,
            other => {
                return Err(LdapError::StructuralMismatch {
                    expected: "messageID INTEGER",
                    found: format!("{:?}", other),
                })
            }
        };
        let protocol_op = match iter.next() {
            Some(v) => ProtocolOp::from_value(v)?,
            None => {
                return Err(LdapError::StructuralMismatch {
                    expected: "protocolOp",
                    found: "absent".to_string(),
                })
            }
        };
        let controls = match iter.next() {
            Some(Value::Tagged(t)) if t.class == TagClass::Context && t.tag == 0 => decode_controls(&t)?,
            Some(other) => {
                return Err(LdapError::StructuralMismatch {
                    expected: "controls [0] OPTIONAL",
                    found: format!("{:?}", other),
                })
            }
            None => Vec::new(),
        };
        Ok(LdapMessage {
            message_id,
            protocol_op,
            controls,
        })
    }
}

static MESSAGE_COUNTER: AtomicI32 = AtomicI32::new(1);

/// Draw the next process-wide message id, wrapping from `i32::MAX` back
/// to 1 without ever emitting 0 (spec.md §3 "LDAP message").
pub fn next_message_id() -> i32 {
    loop {
        let current = MESSAGE_COUNTER.load(Ordering::Relaxed);
        let next = if current == i32::MAX { 1 } else { current + 1 };
        if MESSAGE_COUNTER
            .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            debug!("allocated message id {}", current);
            return current;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_never_emits_zero_and_increments() {
        let _ = env_logger::try_init();
        MESSAGE_COUNTER.store(i32::MAX, Ordering::Relaxed);
        let a = next_message_id();
        let b = next_message_id();
        assert_eq!(a, i32::MAX);
        assert_eq!(b, 1);
        MESSAGE_COUNTER.store(1, Ordering::Relaxed);
    }

    #[test]
    fn unbind_message_round_trips() {
        let msg = LdapMessage {
            message_id: 7,
            protocol_op: ProtocolOp::UnbindRequest,
            controls: Vec::new(),
        };
        let bytes = msg.encode();
        let decoded = LdapMessage::decode(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn del_request_message_round_trips() {
        let msg = LdapMessage {
            message_id: 2,
            protocol_op: ProtocolOp::DelRequest("cn=Bob,dc=example,dc=com".to_string()),
            controls: Vec::new(),
        };
        let bytes = msg.encode();
        let decoded = LdapMessage::decode(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }
}
