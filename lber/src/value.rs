//! The ASN.1 value lattice and the LBER encoder/decoder built on top of
//! the tag/length codec (spec.md §4.2 "Primitive ASN.1 Codec" and §4.3
//! "LBER Dispatcher").

use std::io::{Cursor, Read, Write};

use crate::common::{TagClass, TagStructure, Universal};
use crate::error::{Error, Result};
use crate::identifier::{read_identifier, read_length, write_identifier, write_length, Identifier};
use crate::integer;

/// The ASN.1 types used by LDAP (spec.md §3 "Value lattice").
///
/// `Sequence`/`SequenceOf` and `Set`/`SetOf` are wire-identical pairs; the
/// `Of` variants exist purely so a caller constructing a value can record
/// which BER-equivalent ASN.1 type they mean. The decoder never produces
/// a `SequenceOf` or `SetOf` — it has no way to tell them apart from their
/// plain counterparts, so it always yields `Sequence`/`Set`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Enumerated(i64),
    OctetString(Vec<u8>),
    Null,
    Sequence(Vec<Value>),
    SequenceOf(Vec<Value>),
    Set(Vec<Value>),
    SetOf(Vec<Value>),
    Tagged(Tagged),
    Choice(Box<Value>),
}

/// A class-tagged value: either one a caller is building for encoding
/// (`TaggedInner::Value`), or one just decoded off the wire, whose
/// content has not yet been reinterpreted against an expected schema
/// (`TaggedInner::Raw`).
#[derive(Clone, Debug, PartialEq)]
pub struct Tagged {
    pub class: TagClass,
    pub tag: u64,
    /// Only consulted when `inner` is `TaggedInner::Value`: explicit
    /// tagging wraps the inner value's complete encoding; implicit
    /// tagging replaces the inner value's own identifier with this one.
    /// Ignored for `TaggedInner::Raw`, which always re-encodes using the
    /// wire constructed-ness it was decoded with.
    pub explicit: bool,
    pub inner: TaggedInner,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TaggedInner {
    Value(Box<Value>),
    Raw { constructed: bool, content: Vec<u8> },
}

impl Tagged {
    pub fn explicit(class: TagClass, tag: u64, inner: Value) -> Tagged {
        Tagged {
            class,
            tag,
            explicit: true,
            inner: TaggedInner::Value(Box::new(inner)),
        }
    }

    pub fn implicit(class: TagClass, tag: u64, inner: Value) -> Tagged {
        Tagged {
            class,
            tag,
            explicit: false,
            inner: TaggedInner::Value(Box::new(inner)),
        }
    }

    /// Whether this tag's own encoding is constructed, and its content
    /// octets. Shared by `write()` (emitting the full TLV) and by an
    /// enclosing implicit tag that wants to re-tag these same bytes.
    fn content(&self) -> (bool, Vec<u8>) {
        match &self.inner {
            TaggedInner::Value(v) => {
                if self.explicit {
                    let mut full = Vec::new();
                    v.write(&mut full).expect("writing to a Vec never fails");
                    (true, full)
                } else {
                    v.content_bytes()
                }
            }
            TaggedInner::Raw { constructed, content } => (*constructed, content.clone()),
        }
    }

    fn write<W: Write + ?Sized>(&self, out: &mut W) -> std::io::Result<()> {
        let (constructed, content) = self.content();
        let structure = if constructed {
            TagStructure::Constructed
        } else {
            TagStructure::Primitive
        };
        write_identifier(out, self.class, structure, self.tag)?;
        write_length(out, content.len() as u64)?;
        out.write_all(&content)
    }

    /// Reinterpret an explicitly-tagged raw value as its wrapped type.
    /// Valid only when this `Tagged` came from decode (`Raw`): the raw
    /// content is the inner value's complete, independent encoding.
    pub fn explicit_value(&self) -> Result<Value> {
        let content = self.raw_content()?;
        let mut cursor = Cursor::new(content);
        let v = decode_one(&mut cursor)?;
        if cursor.position() as usize != content.len() {
            return Err(Error::InvalidEncoding("trailing bytes under explicit tag"));
        }
        Ok(v)
    }

    /// Reinterpret an implicitly constructed-tagged raw value (e.g. an
    /// implicit `SEQUENCE OF`) as its list of children.
    pub fn implicit_children(&self) -> Result<Vec<Value>> {
        match &self.inner {
            TaggedInner::Raw { constructed: true, content } => decode_all(content),
            TaggedInner::Raw { constructed: false, .. } => {
                Err(Error::InvalidEncoding("tag is primitive, not constructed"))
            }
            TaggedInner::Value(_) => {
                Err(Error::InvalidEncoding("tag was constructed for encoding, not decoded"))
            }
        }
    }

    /// The raw primitive content octets of an implicitly primitive-tagged
    /// value, e.g. `simple [0] OCTET STRING` under `AuthenticationChoice`.
    pub fn primitive_octets(&self) -> Result<&[u8]> {
        match &self.inner {
            TaggedInner::Raw { constructed: false, content } => Ok(content),
            TaggedInner::Raw { constructed: true, .. } => {
                Err(Error::InvalidEncoding("tag is constructed, not primitive"))
            }
            TaggedInner::Value(_) => {
                Err(Error::InvalidEncoding("tag was primitive for encoding, not decoded"))
            }
        }
    }

    pub fn implicit_integer(&self) -> Result<i64> {
        integer::decode(self.primitive_octets()?)
    }

    pub fn implicit_bool(&self) -> Result<bool> {
        let c = self.primitive_octets()?;
        if c.len() != 1 {
            return Err(Error::InvalidEncoding("BOOLEAN length != 1"));
        }
        Ok(c[0] != 0)
    }

    fn raw_content(&self) -> Result<&[u8]> {
        match &self.inner {
            TaggedInner::Raw { content, .. } => Ok(content),
            TaggedInner::Value(_) => {
                Err(Error::InvalidEncoding("tag was built for encoding, not decoded"))
            }
        }
    }
}

impl Value {
    /// Encode this value's complete TLV encoding, including its own
    /// identifier octets, into `out`.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out).expect("writing to a Vec never fails");
        out
    }

    pub fn write<W: Write + ?Sized>(&self, out: &mut W) -> std::io::Result<()> {
        if let Value::Tagged(t) = self {
            return t.write(out);
        }
        if let Value::Choice(inner) = self {
            return inner.write(out);
        }
        let (class, tag) = (TagClass::Universal, self.universal_tag());
        let (constructed, content) = self.content_bytes();
        let structure = if constructed {
            TagStructure::Constructed
        } else {
            TagStructure::Primitive
        };
        write_identifier(out, class, structure, tag)?;
        write_length(out, content.len() as u64)?;
        out.write_all(&content)
    }

    fn universal_tag(&self) -> u64 {
        match self {
            Value::Boolean(_) => Universal::Boolean as u64,
            Value::Integer(_) => Universal::Integer as u64,
            Value::Enumerated(_) => Universal::Enumerated as u64,
            Value::OctetString(_) => Universal::OctetString as u64,
            Value::Null => Universal::Null as u64,
            Value::Sequence(_) | Value::SequenceOf(_) => Universal::Sequence as u64,
            Value::Set(_) | Value::SetOf(_) => Universal::Set as u64,
            Value::Tagged(_) | Value::Choice(_) => unreachable!("handled by write()"),
        }
    }

    /// Whether this value's natural form is constructed, and its content
    /// octets (excluding its own identifier and length). Used both by
    /// `write()` and by implicit tagging, which keeps the content but
    /// substitutes the identifier.
    fn content_bytes(&self) -> (bool, Vec<u8>) {
        match self {
            Value::Boolean(b) => (false, vec![if *b { 0xFF } else { 0x00 }]),
            Value::Integer(i) | Value::Enumerated(i) => (false, integer::encode(*i)),
            Value::OctetString(bytes) => (false, bytes.clone()),
            Value::Null => (false, Vec::new()),
            Value::Sequence(children)
            | Value::SequenceOf(children)
            | Value::Set(children)
            | Value::SetOf(children) => {
                let mut content = Vec::new();
                for child in children {
                    child.write(&mut content).expect("writing to a Vec never fails");
                }
                (true, content)
            }
            Value::Choice(inner) => inner.content_bytes(),
            Value::Tagged(t) => t.content(),
        }
    }
}

fn read_content<R: Read + ?Sized>(r: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf).map_err(|_| Error::Truncated)?;
    Ok(buf)
}

/// Decode exactly one TLV value from `r` (spec.md §4.3).
pub fn decode_one<R: Read + ?Sized>(r: &mut R) -> Result<Value> {
    let id = read_identifier(r)?;
    let len = read_length(r)?;
    if id.class != TagClass::Universal {
        return Ok(Value::Tagged(Tagged {
            class: id.class,
            tag: id.tag,
            explicit: false,
            inner: TaggedInner::Raw {
                constructed: id.constructed(),
                content: read_content(r, len)?,
            },
        }));
    }
    decode_universal(r, id, len)
}

fn decode_universal<R: Read + ?Sized>(r: &mut R, id: Identifier, len: u64) -> Result<Value> {
    let u = Universal::from_tag(id.tag).ok_or(Error::UnknownUniversalTag(id.tag))?;
    let primitive_expected = !matches!(u, Universal::Sequence | Universal::Set);
    if primitive_expected && id.constructed() {
        return Err(Error::InvalidEncoding("expected primitive form"));
    }
    if !primitive_expected && !id.constructed() {
        return Err(Error::InvalidEncoding("expected constructed form"));
    }
    match u {
        Universal::Boolean => {
            let c = read_content(r, len)?;
            if c.len() != 1 {
                return Err(Error::InvalidEncoding("BOOLEAN length != 1"));
            }
            Ok(Value::Boolean(c[0] != 0))
        }
        Universal::Integer => Ok(Value::Integer(integer::decode(&read_content(r, len)?)?)),
        Universal::Enumerated => Ok(Value::Enumerated(integer::decode(&read_content(r, len)?)?)),
        Universal::OctetString => Ok(Value::OctetString(read_content(r, len)?)),
        Universal::Null => {
            if len != 0 {
                return Err(Error::InvalidEncoding("NULL content not empty"));
            }
            Ok(Value::Null)
        }
        Universal::Sequence => Ok(Value::Sequence(decode_children(r, len)?)),
        Universal::Set => Ok(Value::Set(decode_children(r, len)?)),
    }
}

fn decode_children<R: Read + ?Sized>(r: &mut R, len: u64) -> Result<Vec<Value>> {
    decode_all(&read_content(r, len)?)
}

fn decode_all(buf: &[u8]) -> Result<Vec<Value>> {
    let mut cursor = Cursor::new(buf);
    let mut out = Vec::new();
    while (cursor.position() as usize) < buf.len() {
        out.push(decode_one(&mut cursor)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(v: &Value) -> Value {
        let bytes = v.encode();
        let mut cursor = Cursor::new(&bytes[..]);
        let decoded = decode_one(&mut cursor).unwrap();
        assert_eq!(cursor.position() as usize, bytes.len());
        decoded
    }

    #[test]
    fn boolean_round_trip() {
        assert_eq!(round_trip(&Value::Boolean(true)), Value::Boolean(true));
        assert_eq!(round_trip(&Value::Boolean(false)), Value::Boolean(false));
        assert_eq!(Value::Boolean(true).encode().last(), Some(&0xFF));
    }

    #[test]
    fn boolean_accepts_any_nonzero_as_true() {
        let bytes = vec![0x01, 0x01, 0x2A];
        let mut cursor = Cursor::new(&bytes[..]);
        assert_eq!(decode_one(&mut cursor).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn integer_round_trip_and_canonical_length() {
        assert_eq!(round_trip(&Value::Integer(127)), Value::Integer(127));
        assert_eq!(Value::Integer(127).encode(), vec![0x02, 0x01, 0x7F]);
        assert_eq!(Value::Integer(128).encode(), vec![0x02, 0x02, 0x00, 0x80]);
        assert_eq!(Value::Integer(-1).encode(), vec![0x02, 0x01, 0xFF]);
        assert_eq!(Value::Integer(-128).encode(), vec![0x02, 0x01, 0x80]);
        assert_eq!(Value::Integer(-129).encode(), vec![0x02, 0x02, 0xFF, 0x7F]);
    }

    #[test]
    fn octet_string_round_trip() {
        let v = Value::OctetString(b"hello".to_vec());
        assert_eq!(round_trip(&v), v);
    }

    #[test]
    fn null_round_trip() {
        assert_eq!(round_trip(&Value::Null), Value::Null);
        assert_eq!(Value::Null.encode(), vec![0x05, 0x00]);
    }

    #[test]
    fn sequence_of_collapses_to_sequence_on_decode() {
        let v = Value::SequenceOf(vec![Value::Integer(1), Value::Integer(2)]);
        let decoded = round_trip(&v);
        assert_eq!(
            decoded,
            Value::Sequence(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn set_of_collapses_to_set_on_decode() {
        let v = Value::SetOf(vec![Value::OctetString(b"x".to_vec())]);
        let decoded = round_trip(&v);
        assert_eq!(decoded, Value::Set(vec![Value::OctetString(b"x".to_vec())]));
    }

    #[test]
    fn nested_sequence_round_trip() {
        let v = Value::Sequence(vec![
            Value::Integer(1),
            Value::Sequence(vec![Value::OctetString(b"cn".to_vec()), Value::Boolean(false)]),
        ]);
        assert_eq!(round_trip(&v), v);
    }

    #[test]
    fn implicit_tag_round_trips_via_raw() {
        let v = Value::Tagged(Tagged::implicit(
            TagClass::Context,
            0,
            Value::OctetString(b"secret".to_vec()),
        ));
        let bytes = v.encode();
        assert_eq!(bytes[0], 0x80); // context, primitive, tag 0
        let mut cursor = Cursor::new(&bytes[..]);
        let decoded = decode_one(&mut cursor).unwrap();
        match decoded {
            Value::Tagged(t) => assert_eq!(t.primitive_octets().unwrap(), b"secret"),
            _ => panic!("expected Tagged"),
        }
    }

    #[test]
    fn explicit_tag_round_trips_via_raw() {
        let v = Value::Tagged(Tagged::explicit(TagClass::Context, 5, Value::Integer(9)));
        let bytes = v.encode();
        assert_eq!(bytes[0], 0xA5); // context, constructed, tag 5
        let mut cursor = Cursor::new(&bytes[..]);
        let decoded = decode_one(&mut cursor).unwrap();
        match decoded {
            Value::Tagged(t) => assert_eq!(t.explicit_value().unwrap(), Value::Integer(9)),
            _ => panic!("expected Tagged"),
        }
    }

    #[test]
    fn implicit_constructed_tag_children_round_trip() {
        let v = Value::Tagged(Tagged::implicit(
            TagClass::Context,
            0,
            Value::Sequence(vec![Value::OctetString(b"a".to_vec()), Value::OctetString(b"b".to_vec())]),
        ));
        let bytes = v.encode();
        let mut cursor = Cursor::new(&bytes[..]);
        match decode_one(&mut cursor).unwrap() {
            Value::Tagged(t) => {
                let children = t.implicit_children().unwrap();
                assert_eq!(
                    children,
                    vec![Value::OctetString(b"a".to_vec()), Value::OctetString(b"b".to_vec())]
                );
            }
            _ => panic!("expected Tagged"),
        }
    }

    #[test]
    fn choice_is_a_pure_forwarding_wrapper() {
        let direct = Value::Integer(3).encode();
        let choice = Value::Choice(Box::new(Value::Integer(3))).encode();
        assert_eq!(direct, choice);
    }

    #[test]
    fn truncated_constructed_value_errors() {
        // SEQUENCE announcing 5 bytes of content but only 2 follow
        let bytes = vec![0x30, 0x05, 0x02, 0x01];
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(matches!(decode_one(&mut cursor), Err(Error::Truncated)));
    }

    #[test]
    fn unknown_universal_tag_errors() {
        let bytes = vec![0x1E, 0x00]; // universal tag 30, no such type
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(matches!(
            decode_one(&mut cursor),
            Err(Error::UnknownUniversalTag(30))
        ));
    }

    #[test]
    fn octet_string_as_constructed_is_rejected() {
        // Class=Universal, constructed bit set, tag=4 (OCTET STRING), length 0
        let bytes = vec![0x24, 0x00];
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(matches!(decode_one(&mut cursor), Err(Error::InvalidEncoding(_))));
    }
}
