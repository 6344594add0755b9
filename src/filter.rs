//! RFC 4515 search-filter parser and serializer (spec.md §4.6).
//!
//! A single-pass recursive-descent parser walks a cursor over the input
//! string and builds a [`Filter`] tree. `filter_to_string` is the exact
//! inverse for canonical forms. Wire encode/decode live alongside the
//! tree, since a `Filter` is itself the context-tagged CHOICE described
//! in spec.md §3.

use std::fmt;

use lber::{TagClass, Tagged, Value};

use crate::error::{LdapError, Result};

const AND: u64 = 0;
const OR: u64 = 1;
const NOT: u64 = 2;
const EQUALITY_MATCH: u64 = 3;
const SUBSTRINGS: u64 = 4;
const GREATER_OR_EQUAL: u64 = 5;
const LESS_OR_EQUAL: u64 = 6;
const PRESENT: u64 = 7;
const APPROX_MATCH: u64 = 8;
const EXTENSIBLE_MATCH: u64 = 9;

const SUB_INITIAL: u64 = 0;
const SUB_ANY: u64 = 1;
const SUB_FINAL: u64 = 2;

const MR_MATCHING_RULE: u64 = 1;
const MR_TYPE: u64 = 2;
const MR_MATCH_VALUE: u64 = 3;
const MR_DN_ATTRIBUTES: u64 = 4;

/// The RFC 4515 search filter tree (spec.md §3 "Search filter tree").
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    EqualityMatch(AttributeValueAssertion),
    Substrings(Substrings),
    GreaterOrEqual(AttributeValueAssertion),
    LessOrEqual(AttributeValueAssertion),
    Present(String),
    ApproxMatch(AttributeValueAssertion),
    ExtensibleMatch(MatchingRuleAssertion),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeValueAssertion {
    pub desc: String,
    pub value: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substrings {
    pub type_: String,
    pub initial: Option<Vec<u8>>,
    pub any: Vec<Vec<u8>>,
    pub final_: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchingRuleAssertion {
    pub matching_rule: Option<String>,
    pub type_: Option<String>,
    pub match_value: Vec<u8>,
    pub dn_attributes: bool,
}

/// What went wrong while parsing a filter string, and roughly where.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterErrorKind {
    UnexpectedEnd,
    MissingLeftParen,
    MissingRightParen,
    ExpectingRightParen(char),
    ExpectingLeftParen(char),
    BadEscape,
    EmptyAndOr,
}

impl fmt::Display for FilterErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FilterErrorKind::UnexpectedEnd => write!(f, "unexpected end of filter"),
            FilterErrorKind::MissingLeftParen => write!(f, "filter must start with '('"),
            FilterErrorKind::MissingRightParen => write!(f, "missing closing ')'"),
            FilterErrorKind::ExpectingRightParen(c) => write!(f, "expected ')', found '{}'", c),
            FilterErrorKind::ExpectingLeftParen(c) => write!(f, "expected '(', found '{}'", c),
            FilterErrorKind::BadEscape => write!(f, "invalid \\XX escape"),
            FilterErrorKind::EmptyAndOr => write!(f, "'&'/'|' requires at least one child filter"),
        }
    }
}

/// Parse an RFC 4515 filter string, e.g. `(&(cn=Bob)(mail=*))`.
pub fn parse_filter(input: &str) -> Result<Filter> {
    let mut p = Cursor {
        bytes: input.as_bytes(),
        pos: 0,
    };
    let filter = p.parse_one(true)?;
    if p.pos != p.bytes.len() {
        let found = p.bytes[p.pos] as char;
        return Err(p.err(FilterErrorKind::ExpectingRightParen(found)));
    }
    Ok(filter)
}

/// Render a `Filter` back to its canonical RFC 4515 string form. The
/// exact inverse of `parse_filter` for strings that came out of it.
pub fn filter_to_string(filter: &Filter) -> String {
    let mut out = String::new();
    write_filter(filter, &mut out);
    out
}

/// Escape `*`, `(`, `)`, `\` and NUL as RFC 4515 `\xx` sequences, leaving
/// the rest of a valid-UTF-8 literal untouched. Bytes that aren't valid
/// UTF-8 are escaped wholesale, since a filter string is text.
pub fn escape_filter_literal(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => {
            let mut out = String::with_capacity(s.len());
            for c in s.chars() {
                match c {
                    '*' | '(' | ')' | '\\' | '\0' => out.push_str(&format!("\\{:02x}", c as u32)),
                    _ => out.push(c),
                }
            }
            out
        }
        Err(_) => bytes.iter().map(|b| format!("\\{:02x}", b)).collect(),
    }
}

fn write_filter(filter: &Filter, out: &mut String) {
    out.push('(');
    match filter {
        Filter::And(children) => {
            out.push('&');
            children.iter().for_each(|c| write_filter(c, out));
        }
        Filter::Or(children) => {
            out.push('|');
            children.iter().for_each(|c| write_filter(c, out));
        }
        Filter::Not(inner) => {
            out.push('!');
            write_filter(inner, out);
        }
        Filter::EqualityMatch(ava) => write_simple(ava, "=", out),
        Filter::GreaterOrEqual(ava) => write_simple(ava, ">=", out),
        Filter::LessOrEqual(ava) => write_simple(ava, "<=", out),
        Filter::ApproxMatch(ava) => write_simple(ava, "~=", out),
        Filter::Present(desc) => {
            out.push_str(desc);
            out.push_str("=*");
        }
        Filter::Substrings(s) => {
            out.push_str(&s.type_);
            out.push('=');
            if let Some(initial) = &s.initial {
                out.push_str(&escape_filter_literal(initial));
            }
            out.push('*');
            for any in &s.any {
                out.push_str(&escape_filter_literal(any));
                out.push('*');
            }
            if let Some(final_) = &s.final_ {
                out.push_str(&escape_filter_literal(final_));
            }
        }
        Filter::ExtensibleMatch(m) => {
            if let Some(t) = &m.type_ {
                out.push_str(t);
            }
            if m.dn_attributes {
                out.push_str(":dn");
            }
            if let Some(mr) = &m.matching_rule {
                out.push(':');
                out.push_str(mr);
            }
            out.push_str(":=");
            out.push_str(&escape_filter_literal(&m.match_value));
        }
    }
    out.push(')');
}

fn write_simple(ava: &AttributeValueAssertion, op: &str, out: &mut String) {
    out.push_str(&ava.desc);
    out.push_str(op);
    out.push_str(&escape_filter_literal(&ava.value));
}

#[derive(Clone, Copy)]
enum Op {
    Equality,
    Approx,
    Gte,
    Lte,
    Extensible,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn err(&self, kind: FilterErrorKind) -> LdapError {
        LdapError::FilterSyntax {
            kind,
            position: self.pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    /// Parse one `"(" filtercomp ")"`. `top` distinguishes the outermost
    /// call (a bad opening character is `MissingLeftParen`) from a nested
    /// one reached while parsing `&`/`|`/`!` (`ExpectingLeftParen`).
    fn parse_one(&mut self, top: bool) -> Result<Filter> {
        match self.peek() {
            None => return Err(self.err(FilterErrorKind::UnexpectedEnd)),
            Some(b'(') => {
                self.bump();
            }
            Some(c) => {
                let kind = if top {
                    FilterErrorKind::MissingLeftParen
                } else {
                    FilterErrorKind::ExpectingLeftParen(c as char)
                };
                return Err(self.err(kind));
            }
        }
        let filter = self.parse_filtercomp()?;
        match self.bump() {
            Some(b')') => Ok(filter),
            Some(c) => Err(self.err(FilterErrorKind::ExpectingRightParen(c as char))),
            None => Err(self.err(FilterErrorKind::MissingRightParen)),
        }
    }

    fn parse_filtercomp(&mut self) -> Result<Filter> {
        match self.peek() {
            None => Err(self.err(FilterErrorKind::UnexpectedEnd)),
            Some(b'&') => {
                self.bump();
                self.parse_and_or(true)
            }
            Some(b'|') => {
                self.bump();
                self.parse_and_or(false)
            }
            Some(b'!') => {
                self.bump();
                let inner = self.parse_one(false)?;
                Ok(Filter::Not(Box::new(inner)))
            }
            Some(_) => self.parse_item(),
        }
    }

    fn parse_and_or(&mut self, is_and: bool) -> Result<Filter> {
        let mut children = Vec::new();
        while self.peek() == Some(b'(') {
            children.push(self.parse_one(false)?);
        }
        if children.is_empty() {
            return Err(self.err(FilterErrorKind::EmptyAndOr));
        }
        Ok(if is_and {
            Filter::And(children)
        } else {
            Filter::Or(children)
        })
    }

    /// Scan forward to the unescaped `)` that ends the current item,
    /// without consuming it.
    fn find_item_end(&self) -> Result<usize> {
        let mut i = self.pos;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b')' => return Ok(i),
                b'\\' => {
                    i += 1;
                    i += std::cmp::min(2, self.bytes.len() - i);
                }
                _ => i += 1,
            }
        }
        Err(self.err(FilterErrorKind::MissingRightParen))
    }

    fn parse_item(&mut self) -> Result<Filter> {
        let start = self.pos;
        let end = self.find_item_end()?;
        let item = &self.bytes[start..end];
        self.pos = end;
        self.build_item(item, start)
    }

    fn build_item(&self, item: &[u8], start: usize) -> Result<Filter> {
        let mut i = 0;
        while i < item.len() {
            match item[i] {
                b'\\' => {
                    i += 1;
                    i += std::cmp::min(2, item.len() - i);
                }
                b'=' => {
                    let (op_end, op) = match i.checked_sub(1).and_then(|p| item.get(p)) {
                        Some(b'~') => (i - 1, Op::Approx),
                        Some(b'>') => (i - 1, Op::Gte),
                        Some(b'<') => (i - 1, Op::Lte),
                        Some(b':') => (i - 1, Op::Extensible),
                        _ => (i, Op::Equality),
                    };
                    let attr = &item[..op_end];
                    let value = &item[i + 1..];
                    return self.build_item_parts(op, attr, value, start);
                }
                _ => i += 1,
            }
        }
        Err(self.err(FilterErrorKind::UnexpectedEnd))
    }

    fn build_item_parts(&self, op: Op, attr: &[u8], value: &[u8], start: usize) -> Result<Filter> {
        match op {
            Op::Equality => {
                if value == b"*" {
                    return Ok(Filter::Present(self.unescape_str(attr, start)?));
                }
                if value.contains(&b'*') {
                    return Ok(Filter::Substrings(self.parse_substrings(attr, value, start)?));
                }
                Ok(Filter::EqualityMatch(self.ava(attr, value, start)?))
            }
            Op::Approx => Ok(Filter::ApproxMatch(self.ava(attr, value, start)?)),
            Op::Gte => Ok(Filter::GreaterOrEqual(self.ava(attr, value, start)?)),
            Op::Lte => Ok(Filter::LessOrEqual(self.ava(attr, value, start)?)),
            Op::Extensible => {
                let (type_, dn_attributes, matching_rule) = parse_extensible_prefix(attr)
                    .map_err(|kind| LdapError::FilterSyntax { kind, position: start })?;
                Ok(Filter::ExtensibleMatch(MatchingRuleAssertion {
                    matching_rule,
                    type_,
                    match_value: self.unescape(value, start)?,
                    dn_attributes,
                }))
            }
        }
    }

    fn ava(&self, attr: &[u8], value: &[u8], start: usize) -> Result<AttributeValueAssertion> {
        Ok(AttributeValueAssertion {
            desc: self.unescape_str(attr, start)?,
            value: self.unescape(value, start)?,
        })
    }

    fn parse_substrings(&self, attr: &[u8], value: &[u8], start: usize) -> Result<Substrings> {
        let parts = split_unescaped_star(value);
        let last = parts.len() - 1;
        let mut initial = None;
        let mut any = Vec::new();
        let mut final_ = None;
        for (idx, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            if idx == 0 {
                initial = Some(self.unescape(part, start)?);
            } else if idx == last {
                final_ = Some(self.unescape(part, start)?);
            } else {
                any.push(self.unescape(part, start)?);
            }
        }
        Ok(Substrings {
            type_: self.unescape_str(attr, start)?,
            initial,
            any,
            final_,
        })
    }

    fn unescape(&self, bytes: &[u8], start: usize) -> Result<Vec<u8>> {
        unescape(bytes).map_err(|kind| LdapError::FilterSyntax { kind, position: start })
    }

    fn unescape_str(&self, bytes: &[u8], start: usize) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.unescape(bytes, start)?).into_owned())
    }
}

fn split_unescaped_star(value: &[u8]) -> Vec<&[u8]> {
    let mut parts = Vec::new();
    let mut last = 0;
    let mut i = 0;
    while i < value.len() {
        match value[i] {
            b'\\' => {
                i += 1;
                i += std::cmp::min(2, value.len() - i);
            }
            b'*' => {
                parts.push(&value[last..i]);
                i += 1;
                last = i;
            }
            _ => i += 1,
        }
    }
    parts.push(&value[last..]);
    parts
}

fn parse_extensible_prefix(prefix: &[u8]) -> std::result::Result<(Option<String>, bool, Option<String>), FilterErrorKind> {
    let mut segments = prefix.split(|&b| b == b':');
    let attr = segments.next().unwrap_or(b"");
    let attr = if attr.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&unescape(attr)?).into_owned())
    };
    let mut dn_attributes = false;
    let mut matching_rule = None;
    for seg in segments {
        if seg.eq_ignore_ascii_case(b"dn") {
            dn_attributes = true;
        } else {
            matching_rule = Some(String::from_utf8_lossy(&unescape(seg)?).into_owned());
        }
    }
    Ok((attr, dn_attributes, matching_rule))
}

fn unescape(input: &[u8]) -> std::result::Result<Vec<u8>, FilterErrorKind> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'\\' {
            if i + 3 > input.len() {
                return Err(FilterErrorKind::BadEscape);
            }
            let hi = hex_val(input[i + 1]).ok_or(FilterErrorKind::BadEscape)?;
            let lo = hex_val(input[i + 2]).ok_or(FilterErrorKind::BadEscape)?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(input[i]);
            i += 1;
        }
    }
    Ok(out)
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

impl Filter {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Filter::And(children) => wrap_set(AND, children),
            Filter::Or(children) => wrap_set(OR, children),
            Filter::Not(inner) => Value::Tagged(Tagged::explicit(TagClass::Context, NOT, inner.to_value())),
            Filter::EqualityMatch(ava) => ava.to_value(EQUALITY_MATCH),
            Filter::GreaterOrEqual(ava) => ava.to_value(GREATER_OR_EQUAL),
            Filter::LessOrEqual(ava) => ava.to_value(LESS_OR_EQUAL),
            Filter::ApproxMatch(ava) => ava.to_value(APPROX_MATCH),
            Filter::Present(desc) => Value::Tagged(Tagged::implicit(
                TagClass::Context,
                PRESENT,
                Value::OctetString(desc.clone().into_bytes()),
            )),
            Filter::Substrings(s) => s.to_value(),
            Filter::ExtensibleMatch(m) => m.to_value(),
        }
    }

    pub(crate) fn from_value(value: &Value) -> Result<Filter> {
        let mismatch = || LdapError::StructuralMismatch {
            expected: "Filter CHOICE (context tags 0..9)",
            found: format!("{:?}", value),
        };
        let Value::Tagged(t) = value else {
            return Err(mismatch());
        };
        if t.class != TagClass::Context {
            return Err(mismatch());
        }
        match t.tag {
            AND => Ok(Filter::And(decode_filter_set(t)?)),
            OR => Ok(Filter::Or(decode_filter_set(t)?)),
            NOT => Ok(Filter::Not(Box::new(Filter::from_value(&t.explicit_value().map_err(LdapError::Codec)?)?))),
            EQUALITY_MATCH => Ok(Filter::EqualityMatch(AttributeValueAssertion::from_children(t)?)),
            GREATER_OR_EQUAL => Ok(Filter::GreaterOrEqual(AttributeValueAssertion::from_children(t)?)),
            LESS_OR_EQUAL => Ok(Filter::LessOrEqual(AttributeValueAssertion::from_children(t)?)),
            APPROX_MATCH => Ok(Filter::ApproxMatch(AttributeValueAssertion::from_children(t)?)),
            PRESENT => {
                let bytes = t.primitive_octets().map_err(LdapError::Codec)?;
                Ok(Filter::Present(String::from_utf8_lossy(bytes).into_owned()))
            }
            SUBSTRINGS => Ok(Filter::Substrings(Substrings::from_tagged(t)?)),
            EXTENSIBLE_MATCH => Ok(Filter::ExtensibleMatch(MatchingRuleAssertion::from_tagged(t)?)),
            _ => Err(mismatch()),
        }
    }
}

fn wrap_set(tag: u64, children: &[Filter]) -> Value {
    Value::Tagged(Tagged::implicit(
        TagClass::Context,
        tag,
        Value::SetOf(children.iter().map(Filter::to_value).collect()),
    ))
}

fn decode_filter_set(t: &Tagged) -> Result<Vec<Filter>> {
    t.implicit_children()
        .map_err(LdapError::Codec)?
        .iter()
        .map(Filter::from_value)
        .collect()
}

impl AttributeValueAssertion {
    fn to_value(&self, tag: u64) -> Value {
        Value::Tagged(Tagged::implicit(
            TagClass::Context,
            tag,
            Value::Sequence(vec![
                Value::OctetString(self.desc.clone().into_bytes()),
                Value::OctetString(self.value.clone()),
            ]),
        ))
    }

    fn from_children(t: &Tagged) -> Result<AttributeValueAssertion> {
        let children = t.implicit_children().map_err(LdapError::Codec)?;
        match &children[..] {
            [Value::OctetString(desc), Value::OctetString(value)] => Ok(AttributeValueAssertion {
                desc: String::from_utf8_lossy(desc).into_owned(),
                value: value.clone(),
            }),
            _ => Err(LdapError::StructuralMismatch {
                expected: "AttributeValueAssertion ::= SEQUENCE { desc OCTET STRING, value OCTET STRING }",
                found: format!("{:?}", children),
            }),
        }
    }
}

impl Substrings {
    fn to_value(&self) -> Value {
        let mut subs = Vec::new();
        if let Some(initial) = &self.initial {
            subs.push(Value::Tagged(Tagged::implicit(
                TagClass::Context,
                SUB_INITIAL,
                Value::OctetString(initial.clone()),
            )));
        }
        for any in &self.any {
            subs.push(Value::Tagged(Tagged::implicit(
                TagClass::Context,
                SUB_ANY,
                Value::OctetString(any.clone()),
            )));
        }
        if let Some(final_) = &self.final_ {
            subs.push(Value::Tagged(Tagged::implicit(
                TagClass::Context,
                SUB_FINAL,
                Value::OctetString(final_.clone()),
            )));
        }
        Value::Tagged(Tagged::implicit(
            TagClass::Context,
            SUBSTRINGS,
            Value::Sequence(vec![
                Value::OctetString(self.type_.clone().into_bytes()),
                Value::SequenceOf(subs),
            ]),
        ))
    }

    fn from_tagged(t: &Tagged) -> Result<Substrings> {
        let children = t.implicit_children().map_err(LdapError::Codec)?;
        let (type_bytes, subs) = match &children[..] {
            [Value::OctetString(type_bytes), Value::Sequence(subs)] => (type_bytes, subs),
            _ => {
                return Err(LdapError::StructuralMismatch {
                    expected: "SubstringFilter ::= SEQUENCE { type OCTET STRING, substrings SEQUENCE OF CHOICE }",
                    found: format!("{:?}", children),
                })
            }
        };
        let mut out = Substrings {
            type_: String::from_utf8_lossy(type_bytes).into_owned(),
            ..Default::default()
        };
        for sub in subs {
            let Value::Tagged(st) = sub else {
                return Err(LdapError::StructuralMismatch {
                    expected: "substring CHOICE { initial [0], any [1], final [2] }",
                    found: format!("{:?}", sub),
                });
            };
            let bytes = st.primitive_octets().map_err(LdapError::Codec)?.to_vec();
            match st.tag {
                SUB_INITIAL => out.initial = Some(bytes),
                SUB_ANY => out.any.push(bytes),
                SUB_FINAL => out.final_ = Some(bytes),
                other => {
                    return Err(LdapError::StructuralMismatch {
                        expected: "substring tag in 0..=2",
                        found: format!("{}", other),
                    })
                }
            }
        }
        Ok(out)
    }
}

impl MatchingRuleAssertion {
    fn to_value(&self) -> Value {
        let mut fields = Vec::new();
        if let Some(mr) = &self.matching_rule {
            fields.push(Value::Tagged(Tagged::implicit(
                TagClass::Context,
                MR_MATCHING_RULE,
                Value::OctetString(mr.clone().into_bytes()),
            )));
        }
        if let Some(type_) = &self.type_ {
            fields.push(Value::Tagged(Tagged::implicit(
                TagClass::Context,
                MR_TYPE,
                Value::OctetString(type_.clone().into_bytes()),
            )));
        }
        fields.push(Value::Tagged(Tagged::implicit(
            TagClass::Context,
            MR_MATCH_VALUE,
            Value::OctetString(self.match_value.clone()),
        )));
        if self.dn_attributes {
            fields.push(Value::Tagged(Tagged::implicit(TagClass::Context, MR_DN_ATTRIBUTES, Value::Boolean(true))));
        }
        Value::Tagged(Tagged::implicit(TagClass::Context, EXTENSIBLE_MATCH, Value::Sequence(fields)))
    }

    fn from_tagged(t: &Tagged) -> Result<MatchingRuleAssertion> {
        let children = t.implicit_children().map_err(LdapError::Codec)?;
        let mut out = MatchingRuleAssertion::default();
        let mut have_value = false;
        for child in children {
            let Value::Tagged(ft) = &child else {
                return Err(LdapError::StructuralMismatch {
                    expected: "MatchingRuleAssertion field tagged 1..4",
                    found: format!("{:?}", child),
                });
            };
            match ft.tag {
                MR_MATCHING_RULE => {
                    out.matching_rule = Some(String::from_utf8_lossy(ft.primitive_octets().map_err(LdapError::Codec)?).into_owned())
                }
                MR_TYPE => out.type_ = Some(String::from_utf8_lossy(ft.primitive_octets().map_err(LdapError::Codec)?).into_owned()),
                MR_MATCH_VALUE => {
                    out.match_value = ft.primitive_octets().map_err(LdapError::Codec)?.to_vec();
                    have_value = true;
                }
                MR_DN_ATTRIBUTES => out.dn_attributes = ft.implicit_bool().map_err(LdapError::Codec)?,
                other => {
                    return Err(LdapError::StructuralMismatch {
                        expected: "MatchingRuleAssertion field tagged 1..4",
                        found: format!("{}", other),
                    })
                }
            }
        }
        if !have_value {
            return Err(LdapError::StructuralMismatch {
                expected: "MatchingRuleAssertion.matchValue [3] is mandatory",
                found: "absent".to_string(),
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor as IoCursor;

    fn round_trip_wire(f: &Filter) -> Filter {
        let bytes = f.to_value().encode();
        let mut cursor = IoCursor::new(&bytes[..]);
        let decoded = lber::decode_one(&mut cursor).unwrap();
        Filter::from_value(&decoded).unwrap()
    }

    #[test]
    fn equality_filter_parses() {
        let f = parse_filter("(cn=Babs Jensen)").unwrap();
        assert_eq!(
            f,
            Filter::EqualityMatch(AttributeValueAssertion {
                desc: "cn".to_string(),
                value: b"Babs Jensen".to_vec(),
            })
        );
        assert_eq!(filter_to_string(&f), "(cn=Babs Jensen)");
    }

    #[test]
    fn present_filter_parses() {
        assert_eq!(parse_filter("(mail=*)").unwrap(), Filter::Present("mail".to_string()));
        assert_eq!(filter_to_string(&Filter::Present("mail".to_string())), "(mail=*)");
    }

    #[test]
    fn and_or_not_nest() {
        let f = parse_filter("(&(objectClass=person)(|(sn=Jensen)(!(sn=Smith))))").unwrap();
        match &f {
            Filter::And(children) => {
                assert_eq!(children.len(), 2);
                match &children[1] {
                    Filter::Or(or_children) => assert_eq!(or_children.len(), 2),
                    other => panic!("expected Or, got {:?}", other),
                }
            }
            other => panic!("expected And, got {:?}", other),
        }
        assert_eq!(filter_to_string(&f), "(&(objectClass=person)(|(sn=Jensen)(!(sn=Smith))))");
    }

    #[test]
    fn substring_disambiguation() {
        let f = parse_filter("(cn=Bab*s*Jen)").unwrap();
        assert_eq!(
            f,
            Filter::Substrings(Substrings {
                type_: "cn".to_string(),
                initial: Some(b"Bab".to_vec()),
                any: vec![b"s".to_vec()],
                final_: Some(b"Jen".to_vec()),
            })
        );
    }

    #[test]
    fn substring_with_only_leading_wildcard_has_no_initial() {
        let f = parse_filter("(cn=*Jen)").unwrap();
        assert_eq!(
            f,
            Filter::Substrings(Substrings {
                type_: "cn".to_string(),
                initial: None,
                any: vec![],
                final_: Some(b"Jen".to_vec()),
            })
        );
    }

    #[test]
    fn escape_sequences_decode_to_raw_octets() {
        let f = parse_filter(r"(cn=Lu\c4\8di\c4\87)").unwrap();
        match f {
            Filter::EqualityMatch(ava) => assert_eq!(ava.value, vec![0x4c, 0x75, 0xc4, 0x8d, 0x69, 0xc4, 0x87]),
            other => panic!("expected EqualityMatch, got {:?}", other),
        }
    }

    #[test]
    fn extensible_match_with_dn_and_matching_rule() {
        let f = parse_filter("(cn:dn:2.4.6.8.10:=Accounting)").unwrap();
        assert_eq!(
            f,
            Filter::ExtensibleMatch(MatchingRuleAssertion {
                matching_rule: Some("2.4.6.8.10".to_string()),
                type_: Some("cn".to_string()),
                match_value: b"Accounting".to_vec(),
                dn_attributes: true,
            })
        );
        assert_eq!(filter_to_string(&f), "(cn:dn:2.4.6.8.10:=Accounting)");
    }

    #[test]
    fn extensible_match_with_only_matching_rule() {
        let f = parse_filter("(:1.2.3:=value)").unwrap();
        assert_eq!(
            f,
            Filter::ExtensibleMatch(MatchingRuleAssertion {
                matching_rule: Some("1.2.3".to_string()),
                type_: None,
                match_value: b"value".to_vec(),
                dn_attributes: false,
            })
        );
    }

    #[test]
    fn missing_left_paren_is_reported() {
        let err = parse_filter("cn=Bob)").unwrap_err();
        assert!(matches!(
            err,
            LdapError::FilterSyntax {
                kind: FilterErrorKind::MissingLeftParen,
                ..
            }
        ));
    }

    #[test]
    fn missing_right_paren_is_reported() {
        let err = parse_filter("(cn=Bob").unwrap_err();
        assert!(matches!(
            err,
            LdapError::FilterSyntax {
                kind: FilterErrorKind::MissingRightParen,
                ..
            }
        ));
    }

    #[test]
    fn empty_and_is_rejected() {
        let err = parse_filter("(&)").unwrap_err();
        assert!(matches!(
            err,
            LdapError::FilterSyntax {
                kind: FilterErrorKind::EmptyAndOr,
                ..
            }
        ));
    }

    #[test]
    fn bad_escape_is_rejected() {
        let err = parse_filter(r"(cn=Bob\zz)").unwrap_err();
        assert!(matches!(
            err,
            LdapError::FilterSyntax {
                kind: FilterErrorKind::BadEscape,
                ..
            }
        ));
    }

    #[test]
    fn wire_round_trip_for_and_substrings_and_extensible() {
        let filters = vec![
            Filter::And(vec![
                Filter::Present("mail".to_string()),
                Filter::Not(Box::new(Filter::EqualityMatch(AttributeValueAssertion {
                    desc: "sn".to_string(),
                    value: b"Smith".to_vec(),
                }))),
            ]),
            Filter::Substrings(Substrings {
                type_: "cn".to_string(),
                initial: Some(b"a".to_vec()),
                any: vec![b"b".to_vec(), b"c".to_vec()],
                final_: Some(b"d".to_vec()),
            }),
            Filter::ExtensibleMatch(MatchingRuleAssertion {
                matching_rule: Some("caseIgnoreMatch".to_string()),
                type_: Some("cn".to_string()),
                match_value: b"bob".to_vec(),
                dn_attributes: true,
            }),
        ];
        for f in filters {
            assert_eq!(round_trip_wire(&f), f);
        }
    }
}
