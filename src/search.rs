//! `SearchRequest`/`SearchResultEntry` and the search-result-stream state
//! machine (spec.md §4.5).

use std::collections::HashMap;

use lber::{TagClass, Tagged, Value};

use crate::error::{LdapError, Result};
use crate::filter::{parse_filter, Filter};
use crate::message::{LdapMessage, PartialAttribute, ProtocolOp, TAG_SEARCH_REQUEST, TAG_SEARCH_RESULT_ENTRY};
use crate::result::{LdapResult, SearchResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Base = 0,
    OneLevel = 1,
    Subtree = 2,
}

impl Scope {
    fn from_i64(n: i64) -> Result<Scope> {
        match n {
            0 => Ok(Scope::Base),
            1 => Ok(Scope::OneLevel),
            2 => Ok(Scope::Subtree),
            other => Err(LdapError::StructuralMismatch {
                expected: "scope ENUMERATED {base=0,one=1,sub=2}",
                found: format!("{}", other),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DerefAliases {
    Never = 0,
    InSearching = 1,
    FindingBaseObject = 2,
    Always = 3,
}

impl DerefAliases {
    fn from_i64(n: i64) -> Result<DerefAliases> {
        match n {
            0 => Ok(DerefAliases::Never),
            1 => Ok(DerefAliases::InSearching),
            2 => Ok(DerefAliases::FindingBaseObject),
            3 => Ok(DerefAliases::Always),
            other => Err(LdapError::StructuralMismatch {
                expected: "derefAliases ENUMERATED {never=0,inSearching=1,findingBase=2,always=3}",
                found: format!("{}", other),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchRequest {
    pub base_object: String,
    pub scope: Scope,
    pub deref_aliases: DerefAliases,
    pub size_limit: i64,
    pub time_limit: i64,
    pub types_only: bool,
    pub filter: Filter,
    pub attributes: Vec<String>,
}

impl SearchRequest {
    pub fn new(base_object: impl Into<String>, scope: Scope, filter: &str) -> Result<SearchRequest> {
        Ok(SearchRequest {
            base_object: base_object.into(),
            scope,
            deref_aliases: DerefAliases::Never,
            size_limit: 0,
            time_limit: 0,
            types_only: false,
            filter: parse_filter(filter)?,
            attributes: Vec::new(),
        })
    }

    pub(crate) fn to_tagged(&self) -> Value {
        Value::Tagged(Tagged::implicit(
            TagClass::Application,
            TAG_SEARCH_REQUEST,
            Value::Sequence(vec![
                Value::OctetString(self.base_object.clone().into_bytes()),
                Value::Enumerated(self.scope as i64),
                Value::Enumerated(self.deref_aliases as i64),
                Value::Integer(self.size_limit),
                Value::Integer(self.time_limit),
                Value::Boolean(self.types_only),
                self.filter.to_value(),
                Value::SequenceOf(self.attributes.iter().cloned().map(|a| Value::OctetString(a.into_bytes())).collect()),
            ]),
        ))
    }

    pub(crate) fn from_tagged(t: &Tagged) -> Result<SearchRequest> {
        let children = t.implicit_children().map_err(LdapError::Codec)?;
        let mismatch = || LdapError::StructuralMismatch {
            expected: "SearchRequest ::= SEQUENCE { baseObject, scope, derefAliases, sizeLimit, timeLimit, typesOnly, filter, attributes }",
            found: format!("{:?}", children),
        };
        let (base, scope, deref, size, time, types_only, filter_value, attrs) = match &children[..] {
            [
                Value::OctetString(base),
                Value::Enumerated(scope),
                Value::Enumerated(deref),
                Value::Integer(size),
                Value::Integer(time),
                Value::Boolean(types_only),
                filter_value,
                Value::Sequence(attrs),
            ] => (base, *scope, *deref, *size, *time, *types_only, filter_value, attrs),
            _ => return Err(mismatch()),
        };
        let attributes = attrs
            .iter()
            .map(|v| match v {
                Value::OctetString(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
                _ => Err(mismatch()),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(SearchRequest {
            base_object: String::from_utf8_lossy(base).into_owned(),
            scope: Scope::from_i64(scope)?,
            deref_aliases: DerefAliases::from_i64(deref)?,
            size_limit: size,
            time_limit: time,
            types_only,
            filter: Filter::from_value(filter_value)?,
            attributes,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResultEntry {
    pub object_name: String,
    pub attributes: Vec<PartialAttribute>,
}

impl SearchResultEntry {
    pub(crate) fn to_tagged(&self) -> Value {
        Value::Tagged(Tagged::implicit(
            TagClass::Application,
            TAG_SEARCH_RESULT_ENTRY,
            Value::Sequence(vec![
                Value::OctetString(self.object_name.clone().into_bytes()),
                Value::Sequence(self.attributes.iter().map(PartialAttribute::to_value).collect()),
            ]),
        ))
    }

    pub(crate) fn from_tagged(t: &Tagged) -> Result<SearchResultEntry> {
        let children = t.implicit_children().map_err(LdapError::Codec)?;
        match &children[..] {
            [Value::OctetString(name), Value::Sequence(attrs)] => Ok(SearchResultEntry {
                object_name: String::from_utf8_lossy(name).into_owned(),
                attributes: attrs.iter().map(PartialAttribute::from_value).collect::<Result<_>>()?,
            }),
            _ => Err(LdapError::StructuralMismatch {
                expected: "SearchResultEntry ::= SEQUENCE { objectName, attributes }",
                found: format!("{:?}", children),
            }),
        }
    }
}

/// One item of a search result stream, before ergonomic conversion:
/// either a matched entry, or a referral the caller must chase itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchStreamItem {
    Entry(SearchResultEntry),
    Reference(Vec<String>),
}

/// An ergonomic view over one result of a search, folding a decoded
/// entry's `PartialAttribute` list into a `HashMap` of string values for
/// easy lookup. Mirrors the teacher's own `search.rs`, which converts a
/// decoded PDU the same way.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchEntry {
    Object {
        object_name: String,
        attributes: HashMap<String, Vec<String>>,
    },
    Reference(Vec<String>),
}

impl SearchEntry {
    /// Convert an already-decoded stream item into the ergonomic view.
    /// Attribute values are decoded as UTF-8 lossily, since this view is
    /// for display/lookup convenience, not further wire encoding.
    pub fn from_pdu(item: SearchStreamItem) -> SearchEntry {
        match item {
            SearchStreamItem::Entry(entry) => SearchEntry::Object {
                object_name: entry.object_name,
                attributes: entry
                    .attributes
                    .into_iter()
                    .map(|attr| {
                        let vals = attr.vals.iter().map(|v| String::from_utf8_lossy(v).into_owned()).collect();
                        (attr.atype, vals)
                    })
                    .collect(),
            },
            SearchStreamItem::Reference(uris) => SearchEntry::Reference(uris),
        }
    }
}

/// Drives one search request's result stream (spec.md §4.5 "State
/// machine — search result stream"): collects `SearchResultEntry`/
/// `SearchResultReference` PDUs sharing a `messageId` until the matching
/// `SearchResultDone` arrives, in arrival order, then releases its state.
#[derive(Debug, Default)]
pub struct SearchStream {
    message_id: i32,
    entries: Vec<SearchStreamItem>,
    done: Option<LdapResult>,
}

impl SearchStream {
    pub fn new(message_id: i32) -> SearchStream {
        SearchStream {
            message_id,
            entries: Vec::new(),
            done: None,
        }
    }

    /// Feed one PDU belonging to this stream's `messageId`. Returns an
    /// error if the message id doesn't match, or if a PDU type other
    /// than entry/reference/done is fed after the stream is already
    /// considered terminated.
    pub fn push(&mut self, message: LdapMessage) -> Result<()> {
        if message.message_id != self.message_id {
            return Err(LdapError::StructuralMismatch {
                expected: "PDU belonging to this search's messageId",
                found: format!("messageId {}", message.message_id),
            });
        }
        if self.done.is_some() {
            return Err(LdapError::StructuralMismatch {
                expected: "no further PDUs after SearchResultDone",
                found: format!("{:?}", message.protocol_op),
            });
        }
        match message.protocol_op {
            ProtocolOp::SearchResultEntry(entry) => self.entries.push(SearchStreamItem::Entry(entry)),
            ProtocolOp::SearchResultReference(uris) => self.entries.push(SearchStreamItem::Reference(uris)),
            ProtocolOp::SearchResultDone(result) => self.done = Some(result),
            other => {
                return Err(LdapError::StructuralMismatch {
                    expected: "SearchResultEntry, SearchResultReference or SearchResultDone",
                    found: format!("{:?}", other),
                })
            }
        }
        Ok(())
    }

    pub fn is_done(&self) -> bool {
        self.done.is_some()
    }

    /// Consume the stream once `SearchResultDone` has arrived, releasing
    /// its per-`messageId` state. Entries and references are both kept,
    /// in arrival order, converted to the ergonomic `SearchEntry` view.
    pub fn finish(self) -> Option<SearchResult> {
        let result = self.done?;
        Some(SearchResult {
            entries: self.entries.into_iter().map(SearchEntry::from_pdu).collect(),
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::AttributeValueAssertion;
    use crate::result::ResultCode;

    #[test]
    fn search_request_round_trips() {
        let req = SearchRequest::new("dc=example,dc=com", Scope::Subtree, "(objectClass=*)").unwrap();
        let msg = LdapMessage::new(ProtocolOp::SearchRequest(req.clone()));
        let decoded = LdapMessage::decode(&msg.encode()).unwrap();
        match decoded.protocol_op {
            ProtocolOp::SearchRequest(got) => assert_eq!(got, req),
            other => panic!("expected SearchRequest, got {:?}", other),
        }
    }

    #[test]
    fn search_result_entry_round_trips() {
        let entry = SearchResultEntry {
            object_name: "cn=Bob,dc=example,dc=com".to_string(),
            attributes: vec![PartialAttribute::new("cn", vec![b"Bob".to_vec()])],
        };
        let msg = LdapMessage::new(ProtocolOp::SearchResultEntry(entry.clone()));
        let decoded = LdapMessage::decode(&msg.encode()).unwrap();
        match decoded.protocol_op {
            ProtocolOp::SearchResultEntry(got) => assert_eq!(got, entry),
            other => panic!("expected SearchResultEntry, got {:?}", other),
        }
    }

    #[test]
    fn stream_collects_entries_in_order_until_done() {
        let mut stream = SearchStream::new(5);
        let entry_a = SearchResultEntry {
            object_name: "cn=a".to_string(),
            attributes: vec![],
        };
        let entry_b = SearchResultEntry {
            object_name: "cn=b".to_string(),
            attributes: vec![],
        };
        stream
            .push(LdapMessage {
                message_id: 5,
                protocol_op: ProtocolOp::SearchResultEntry(entry_a.clone()),
                controls: vec![],
            })
            .unwrap();
        stream
            .push(LdapMessage {
                message_id: 5,
                protocol_op: ProtocolOp::SearchResultReference(vec!["ldap://other/".to_string()]),
                controls: vec![],
            })
            .unwrap();
        assert!(!stream.is_done());
        stream
            .push(LdapMessage {
                message_id: 5,
                protocol_op: ProtocolOp::SearchResultEntry(entry_b.clone()),
                controls: vec![],
            })
            .unwrap();
        stream
            .push(LdapMessage {
                message_id: 5,
                protocol_op: ProtocolOp::SearchResultDone(LdapResult {
                    result_code: ResultCode::Success,
                    matched_dn: String::new(),
                    diagnostic_message: String::new(),
                    referral: vec![],
                    controls: vec![],
                }),
                controls: vec![],
            })
            .unwrap();
        assert!(stream.is_done());
        let result = stream.finish().unwrap();
        assert_eq!(
            result.entries,
            vec![
                SearchEntry::from_pdu(SearchStreamItem::Entry(entry_a)),
                SearchEntry::from_pdu(SearchStreamItem::Reference(vec!["ldap://other/".to_string()])),
                SearchEntry::from_pdu(SearchStreamItem::Entry(entry_b)),
            ]
        );
        assert_eq!(result.result.result_code, ResultCode::Success);
    }

    #[test]
    fn search_entry_from_pdu_folds_attributes_into_a_map() {
        let entry = SearchResultEntry {
            object_name: "cn=Bob,dc=example,dc=com".to_string(),
            attributes: vec![PartialAttribute::new("cn", vec![b"Bob".to_vec(), b"Robert".to_vec()])],
        };
        match SearchEntry::from_pdu(SearchStreamItem::Entry(entry)) {
            SearchEntry::Object { object_name, attributes } => {
                assert_eq!(object_name, "cn=Bob,dc=example,dc=com");
                assert_eq!(attributes.get("cn"), Some(&vec!["Bob".to_string(), "Robert".to_string()]));
            }
            other => panic!("expected Object, got {:?}", other),
        }
    }

    #[test]
    fn stream_rejects_pdu_for_a_different_message_id() {
        let mut stream = SearchStream::new(1);
        let err = stream
            .push(LdapMessage {
                message_id: 2,
                protocol_op: ProtocolOp::SearchResultDone(LdapResult {
                    result_code: ResultCode::Success,
                    matched_dn: String::new(),
                    diagnostic_message: String::new(),
                    referral: vec![],
                    controls: vec![],
                }),
                controls: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, LdapError::StructuralMismatch { .. }));
    }

    #[test]
    fn filter_survives_full_request_round_trip() {
        let req = SearchRequest::new("dc=example,dc=com", Scope::OneLevel, "(&(cn=Bob)(mail=*))").unwrap();
        let msg = LdapMessage::new(ProtocolOp::SearchRequest(req));
        let decoded = LdapMessage::decode(&msg.encode()).unwrap();
        match decoded.protocol_op {
            ProtocolOp::SearchRequest(got) => match got.filter {
                Filter::And(children) => assert_eq!(children.len(), 2),
                other => panic!("expected And, got {:?}", other),
            },
            other => panic!("expected SearchRequest, got {:?}", other),
        }
        let _ = AttributeValueAssertion {
            desc: String::new(),
            value: vec![],
        };
    }
}
