//! Generic LDAP controls (spec.md §4.7 "Constraints & Controls").
//!
//! A `Control` is the generic `{ oid, criticality, value? }` SEQUENCE
//! attached as the `[0]` element of an `LDAPMessage`. This module stays
//! generic by design: no concrete OID-specific controls are modeled here,
//! matching spec.md's Constraints & Controls section which is a single
//! `Control{oid, criticality, value?}` shape with no built-in extensions.

use lber::{TagClass, Tagged, Value};

use crate::error::{LdapError, Result};

/// One `Control` as carried on the wire: an OID, a criticality flag, and
/// an optional opaque value whose structure is meaningful only to the
/// extension identified by `oid`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Control {
    pub oid: String,
    pub criticality: bool,
    pub value: Option<Vec<u8>>,
}

impl Control {
    pub fn new(oid: impl Into<String>) -> Control {
        Control {
            oid: oid.into(),
            criticality: false,
            value: None,
        }
    }

    pub fn critical(mut self) -> Control {
        self.criticality = true;
        self
    }

    pub fn with_value(mut self, value: Vec<u8>) -> Control {
        self.value = Some(value);
        self
    }

    pub(crate) fn encode(&self) -> Value {
        let mut seq = vec![Value::OctetString(self.oid.clone().into_bytes())];
        if self.criticality {
            seq.push(Value::Boolean(true));
        }
        if let Some(value) = &self.value {
            seq.push(Value::OctetString(value.clone()));
        }
        Value::Sequence(seq)
    }

    fn decode(v: Value) -> Result<Control> {
        let mismatch = |found: String| LdapError::StructuralMismatch {
            expected: "Control ::= SEQUENCE { oid OCTET STRING, criticality BOOLEAN DEFAULT FALSE, value OCTET STRING OPTIONAL }",
            found,
        };
        let fields = match v {
            Value::Sequence(fields) => fields,
            other => return Err(mismatch(format!("{:?}", other))),
        };
        let mut iter = fields.into_iter();
        let oid = match iter.next() {
            Some(Value::OctetString(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            other => return Err(mismatch(format!("{:?}", other))),
        };
        let next = iter.next();
        let (criticality, next) = match next {
            Some(Value::Boolean(b)) => (b, iter.next()),
            other => (false, other),
        };
        let value = match next {
            Some(Value::OctetString(bytes)) => Some(bytes),
            None => None,
            Some(other) => return Err(mismatch(format!("{:?}", other))),
        };
        Ok(Control {
            oid,
            criticality,
            value,
        })
    }
}

/// Encode a non-empty control list as the `[0] Controls` element of an
/// `LDAPMessage`. Returns `None` when the list is empty, since the field
/// is optional and omitted rather than encoded as an empty SEQUENCE.
pub(crate) fn encode_controls(controls: &[Control]) -> Option<Value> {
    if controls.is_empty() {
        return None;
    }
    Some(Value::Tagged(Tagged::implicit(
        TagClass::Context,
        0,
        Value::SequenceOf(controls.iter().map(Control::encode).collect()),
    )))
}

/// Decode the `[0] Controls` element, if an `LDAPMessage` carried one.
pub(crate) fn decode_controls(tagged: &lber::Tagged) -> Result<Vec<Control>> {
    tagged
        .implicit_children()
        .map_err(LdapError::Codec)?
        .into_iter()
        .map(Control::decode)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn control_round_trips_through_sequence() {
        let ctrl = Control::new("1.2.840.113556.1.4.319")
            .critical()
            .with_value(b"paging-cookie".to_vec());
        let decoded = Control::decode(ctrl.encode()).unwrap();
        assert_eq!(decoded, ctrl);
    }

    #[test]
    fn control_without_criticality_or_value_round_trips() {
        let ctrl = Control::new("2.16.840.1.113730.3.4.2");
        let decoded = Control::decode(ctrl.encode()).unwrap();
        assert_eq!(decoded, ctrl);
    }

    #[test]
    fn empty_control_list_encodes_to_none() {
        assert!(encode_controls(&[]).is_none());
    }

    #[test]
    fn nonempty_control_list_round_trips_via_tagged() {
        let controls = vec![Control::new("1.2.3.4").critical()];
        let tagged = encode_controls(&controls).unwrap();
        let bytes = tagged.encode();
        let mut cursor = Cursor::new(&bytes[..]);
        match lber::decode_one(&mut cursor).unwrap() {
            Value::Tagged(t) => {
                let decoded = decode_controls(&t).unwrap();
                assert_eq!(decoded, controls);
            }
            _ => panic!("expected Tagged"),
        }
    }
}
