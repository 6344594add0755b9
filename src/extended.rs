//! `ExtendedRequest`/`ExtendedResponse`/`IntermediateResponse` (spec.md §4.5).

use lber::{TagClass, Tagged, Value};

use crate::error::{LdapError, Result};
use crate::message::{TAG_EXTENDED_REQUEST, TAG_EXTENDED_RESPONSE, TAG_INTERMEDIATE_RESPONSE};
use crate::result::LdapResult;

const REQUEST_NAME_TAG: u64 = 0;
const REQUEST_VALUE_TAG: u64 = 1;
const RESPONSE_NAME_TAG: u64 = 10;
const RESPONSE_VALUE_TAG: u64 = 11;
const INTERMEDIATE_NAME_TAG: u64 = 0;
const INTERMEDIATE_VALUE_TAG: u64 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendedRequest {
    pub name: String,
    pub value: Option<Vec<u8>>,
}

impl ExtendedRequest {
    pub fn new(name: impl Into<String>, value: Option<Vec<u8>>) -> ExtendedRequest {
        ExtendedRequest { name: name.into(), value }
    }

    pub(crate) fn to_tagged(&self) -> Value {
        let mut fields = vec![Value::Tagged(Tagged::implicit(
            TagClass::Context,
            REQUEST_NAME_TAG,
            Value::OctetString(self.name.clone().into_bytes()),
        ))];
        if let Some(value) = &self.value {
            fields.push(Value::Tagged(Tagged::implicit(TagClass::Context, REQUEST_VALUE_TAG, Value::OctetString(value.clone()))));
        }
        Value::Tagged(Tagged::implicit(TagClass::Application, TAG_EXTENDED_REQUEST, Value::Sequence(fields)))
    }

    pub(crate) fn from_tagged(t: &Tagged) -> Result<ExtendedRequest> {
        let mismatch = |found: String| LdapError::StructuralMismatch {
            expected: "ExtendedRequest ::= SEQUENCE { requestName [0], requestValue [1] OPTIONAL }",
            found,
        };
        let children = t.implicit_children().map_err(LdapError::Codec)?;
        let mut iter = children.into_iter();
        let name = match iter.next() {
            Some(Value::Tagged(name_tag)) if name_tag.class == TagClass::Context && name_tag.tag == REQUEST_NAME_TAG => {
                String::from_utf8_lossy(name_tag.primitive_octets().map_err(LdapError::Codec)?).into_owned()
            }
            other => return Err(mismatch(format!("{:?}", other))),
        };
        let value = match iter.next() {
            Some(Value::Tagged(value_tag)) if value_tag.class == TagClass::Context && value_tag.tag == REQUEST_VALUE_TAG => {
                Some(value_tag.primitive_octets().map_err(LdapError::Codec)?.to_vec())
            }
            Some(other) => return Err(mismatch(format!("{:?}", other))),
            None => None,
        };
        Ok(ExtendedRequest { name, value })
    }
}

/// `ExtendedResponse`: the common `LDAPResult` fields, plus an optional
/// `responseName [10]`/`response [11]` pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtendedResponse {
    pub result: LdapResult,
    pub response_name: Option<String>,
    pub response: Option<Vec<u8>>,
}

impl ExtendedResponse {
    pub(crate) fn to_tagged(&self) -> Value {
        let mut fields = self.result.encode_fields();
        if let Some(name) = &self.response_name {
            fields.push(Value::Tagged(Tagged::implicit(
                TagClass::Context,
                RESPONSE_NAME_TAG,
                Value::OctetString(name.clone().into_bytes()),
            )));
        }
        if let Some(response) = &self.response {
            fields.push(Value::Tagged(Tagged::implicit(TagClass::Context, RESPONSE_VALUE_TAG, Value::OctetString(response.clone()))));
        }
        Value::Tagged(Tagged::implicit(TagClass::Application, TAG_EXTENDED_RESPONSE, Value::Sequence(fields)))
    }

    pub(crate) fn from_tagged(t: &Tagged) -> Result<ExtendedResponse> {
        let fields = t.implicit_children().map_err(LdapError::Codec)?;
        let (result, rest) = LdapResult::decode_fields(&fields)?;
        let mut iter = rest.iter();
        let mut response_name = None;
        let mut response = None;
        for field in &mut iter {
            match field {
                Value::Tagged(tagged) if tagged.class == TagClass::Context && tagged.tag == RESPONSE_NAME_TAG => {
                    response_name = Some(String::from_utf8_lossy(tagged.primitive_octets().map_err(LdapError::Codec)?).into_owned());
                }
                Value::Tagged(tagged) if tagged.class == TagClass::Context && tagged.tag == RESPONSE_VALUE_TAG => {
                    response = Some(tagged.primitive_octets().map_err(LdapError::Codec)?.to_vec());
                }
                other => {
                    return Err(LdapError::StructuralMismatch {
                        expected: "responseName [10] / response [11]",
                        found: format!("{:?}", other),
                    })
                }
            }
        }
        Ok(ExtendedResponse {
            result,
            response_name,
            response,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntermediateResponse {
    pub response_name: Option<String>,
    pub response: Option<Vec<u8>>,
}

impl IntermediateResponse {
    pub(crate) fn to_tagged(&self) -> Value {
        let mut fields = Vec::new();
        if let Some(name) = &self.response_name {
            fields.push(Value::Tagged(Tagged::implicit(
                TagClass::Context,
                INTERMEDIATE_NAME_TAG,
                Value::OctetString(name.clone().into_bytes()),
            )));
        }
        if let Some(response) = &self.response {
            fields.push(Value::Tagged(Tagged::implicit(
                TagClass::Context,
                INTERMEDIATE_VALUE_TAG,
                Value::OctetString(response.clone()),
            )));
        }
        Value::Tagged(Tagged::implicit(TagClass::Application, TAG_INTERMEDIATE_RESPONSE, Value::Sequence(fields)))
    }

    pub(crate) fn from_tagged(t: &Tagged) -> Result<IntermediateResponse> {
        let children = t.implicit_children().map_err(LdapError::Codec)?;
        let mut response_name = None;
        let mut response = None;
        for field in &children {
            match field {
                Value::Tagged(tagged) if tagged.class == TagClass::Context && tagged.tag == INTERMEDIATE_NAME_TAG => {
                    response_name = Some(String::from_utf8_lossy(tagged.primitive_octets().map_err(LdapError::Codec)?).into_owned());
                }
                Value::Tagged(tagged) if tagged.class == TagClass::Context && tagged.tag == INTERMEDIATE_VALUE_TAG => {
                    response = Some(tagged.primitive_octets().map_err(LdapError::Codec)?.to_vec());
                }
                other => {
                    return Err(LdapError::StructuralMismatch {
                        expected: "responseName [0] / responseValue [1]",
                        found: format!("{:?}", other),
                    })
                }
            }
        }
        Ok(IntermediateResponse { response_name, response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{LdapMessage, ProtocolOp};
    use crate::result::ResultCode;

    #[test]
    fn extended_request_without_value_round_trips() {
        let req = ExtendedRequest::new("1.3.6.1.4.1.1466.20037", None);
        let msg = LdapMessage::new(ProtocolOp::ExtendedRequest(req.clone()));
        let decoded = LdapMessage::decode(&msg.encode()).unwrap();
        match decoded.protocol_op {
            ProtocolOp::ExtendedRequest(got) => assert_eq!(got, req),
            other => panic!("expected ExtendedRequest, got {:?}", other),
        }
    }

    #[test]
    fn extended_response_round_trips() {
        let resp = ExtendedResponse {
            result: LdapResult {
                result_code: ResultCode::Success,
                matched_dn: String::new(),
                diagnostic_message: String::new(),
                referral: vec![],
                controls: vec![],
            },
            response_name: Some("1.3.6.1.4.1.4203.1.11.3".to_string()),
            response: Some(b"payload".to_vec()),
        };
        let msg = LdapMessage::new(ProtocolOp::ExtendedResponse(resp.clone()));
        let decoded = LdapMessage::decode(&msg.encode()).unwrap();
        match decoded.protocol_op {
            ProtocolOp::ExtendedResponse(got) => assert_eq!(got, resp),
            other => panic!("expected ExtendedResponse, got {:?}", other),
        }
    }

    #[test]
    fn intermediate_response_round_trips() {
        let resp = IntermediateResponse {
            response_name: None,
            response: Some(b"chunk".to_vec()),
        };
        let msg = LdapMessage::new(ProtocolOp::IntermediateResponse(resp.clone()));
        let decoded = LdapMessage::decode(&msg.encode()).unwrap();
        match decoded.protocol_op {
            ProtocolOp::IntermediateResponse(got) => assert_eq!(got, resp),
            other => panic!("expected IntermediateResponse, got {:?}", other),
        }
    }
}
