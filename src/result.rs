//! Operation result structures (spec.md §3 "LdapResult", §4.7 "Controls").
//!
//! Most LDAP operations return an [`LdapResult`]. This module holds its
//! definition, the [`ResultCode`] enumeration, and the wrapper structs
//! that adapt a couple of operations' unusual result semantics (Search,
//! Compare) to more ergonomic Rust idioms, following the teacher's own
//! `result.rs`.

use std::fmt;

use log::debug;

use lber::{TagClass, Tagged, Value};

use crate::controls::Control;
use crate::error::{LdapError, Result};
use crate::search::SearchEntry;

/// RFC 4511 §4.1.9 result codes, restricted to the partial list in
/// spec.md §6. Unrecognized codes decode to `Unrecognized` rather than
/// failing, since new codes are added by extensions faster than any
/// client can keep a closed enum in sync with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    OperationsError,
    ProtocolError,
    TimeLimitExceeded,
    SizeLimitExceeded,
    CompareFalse,
    CompareTrue,
    AuthMethodNotSupported,
    StrongerAuthRequired,
    Referral,
    AdminLimitExceeded,
    NoSuchAttribute,
    UndefinedAttributeType,
    InappropriateMatching,
    ConstraintViolation,
    AttributeOrValueExists,
    InvalidAttributeSyntax,
    NoSuchObject,
    AliasProblem,
    InvalidDnSyntax,
    AliasDereferencingProblem,
    InappropriateAuthentication,
    InvalidCredentials,
    InsufficientAccessRights,
    Busy,
    Unavailable,
    UnwillingToPerform,
    LoopDetect,
    NamingViolation,
    ObjectClassViolation,
    NotAllowedOnNonLeaf,
    NotAllowedOnRdn,
    EntryAlreadyExists,
    ObjectClassModsProhibited,
    AffectsMultipleDsas,
    Other,
    /// Any wire value not covered above; the original numeric code is kept.
    Unrecognized(i64),
}

impl ResultCode {
    pub fn code(self) -> i64 {
        match self {
            ResultCode::Success => 0,
            ResultCode::OperationsError => 1,
            ResultCode::ProtocolError => 2,
            ResultCode::TimeLimitExceeded => 3,
            ResultCode::SizeLimitExceeded => 4,
            ResultCode::CompareFalse => 5,
            ResultCode::CompareTrue => 6,
            ResultCode::AuthMethodNotSupported => 7,
            ResultCode::StrongerAuthRequired => 8,
            ResultCode::Referral => 10,
            ResultCode::AdminLimitExceeded => 11,
            ResultCode::NoSuchAttribute => 16,
            ResultCode::UndefinedAttributeType => 17,
            ResultCode::InappropriateMatching => 18,
            ResultCode::ConstraintViolation => 19,
            ResultCode::AttributeOrValueExists => 20,
            ResultCode::InvalidAttributeSyntax => 21,
            ResultCode::NoSuchObject => 32,
            ResultCode::AliasProblem => 33,
            ResultCode::InvalidDnSyntax => 34,
            ResultCode::AliasDereferencingProblem => 36,
            ResultCode::InappropriateAuthentication => 48,
            ResultCode::InvalidCredentials => 49,
            ResultCode::InsufficientAccessRights => 50,
            ResultCode::Busy => 51,
            ResultCode::Unavailable => 52,
            ResultCode::UnwillingToPerform => 53,
            ResultCode::LoopDetect => 54,
            ResultCode::NamingViolation => 64,
            ResultCode::ObjectClassViolation => 65,
            ResultCode::NotAllowedOnNonLeaf => 66,
            ResultCode::NotAllowedOnRdn => 67,
            ResultCode::EntryAlreadyExists => 68,
            ResultCode::ObjectClassModsProhibited => 69,
            ResultCode::AffectsMultipleDsas => 71,
            ResultCode::Other => 80,
            ResultCode::Unrecognized(n) => n,
        }
    }

    pub fn from_code(n: i64) -> ResultCode {
        match n {
            0 => ResultCode::Success,
            1 => ResultCode::OperationsError,
            2 => ResultCode::ProtocolError,
            3 => ResultCode::TimeLimitExceeded,
            4 => ResultCode::SizeLimitExceeded,
            5 => ResultCode::CompareFalse,
            6 => ResultCode::CompareTrue,
            7 => ResultCode::AuthMethodNotSupported,
            8 => ResultCode::StrongerAuthRequired,
            10 => ResultCode::Referral,
            11 => ResultCode::AdminLimitExceeded,
            16 => ResultCode::NoSuchAttribute,
            17 => ResultCode::UndefinedAttributeType,
            18 => ResultCode::InappropriateMatching,
            19 => ResultCode::ConstraintViolation,
            20 => ResultCode::AttributeOrValueExists,
            21 => ResultCode::InvalidAttributeSyntax,
            32 => ResultCode::NoSuchObject,
            33 => ResultCode::AliasProblem,
            34 => ResultCode::InvalidDnSyntax,
            36 => ResultCode::AliasDereferencingProblem,
            48 => ResultCode::InappropriateAuthentication,
            49 => ResultCode::InvalidCredentials,
            50 => ResultCode::InsufficientAccessRights,
            51 => ResultCode::Busy,
            52 => ResultCode::Unavailable,
            53 => ResultCode::UnwillingToPerform,
            54 => ResultCode::LoopDetect,
            64 => ResultCode::NamingViolation,
            65 => ResultCode::ObjectClassViolation,
            66 => ResultCode::NotAllowedOnNonLeaf,
            67 => ResultCode::NotAllowedOnRdn,
            68 => ResultCode::EntryAlreadyExists,
            69 => ResultCode::ObjectClassModsProhibited,
            71 => ResultCode::AffectsMultipleDsas,
            80 => ResultCode::Other,
            other => ResultCode::Unrecognized(other),
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ResultCode::Success)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Common components of an LDAP operation result (the `LDAPResult`
/// SEQUENCE, spec.md §3).
#[derive(Clone, Debug, PartialEq)]
pub struct LdapResult {
    pub result_code: ResultCode,
    pub matched_dn: String,
    pub diagnostic_message: String,
    pub referral: Vec<String>,
    pub controls: Vec<Control>,
}

impl LdapResult {
    /// If the result code is success, return the instance wrapped in
    /// `Ok`; otherwise turn it into `LdapError::ProtocolResult`.
    pub fn success(self) -> Result<Self> {
        if self.result_code.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Like [`success`](#method.success), but a referral result code is
    /// also accepted.
    pub fn non_error(self) -> Result<Self> {
        if self.result_code.is_success() || matches!(self.result_code, ResultCode::Referral) {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    fn into_error(self) -> LdapError {
        if matches!(self.result_code, ResultCode::Referral) {
            debug!("referral surfaced: {:?}", self.referral);
        }
        LdapError::ProtocolResult {
            code: self.result_code,
            matched_dn: self.matched_dn,
            diagnostic: self.diagnostic_message,
            referrals: self.referral,
        }
    }

    /// Build the three-to-four-element `LDAPResult` SEQUENCE body, to be
    /// embedded by a response PDU's own application tag.
    pub(crate) fn encode_fields(&self) -> Vec<Value> {
        let mut fields = vec![
            Value::Enumerated(self.result_code.code()),
            Value::OctetString(self.matched_dn.clone().into_bytes()),
            Value::OctetString(self.diagnostic_message.clone().into_bytes()),
        ];
        if !self.referral.is_empty() {
            fields.push(Value::Tagged(Tagged::implicit(
                TagClass::Context,
                3,
                Value::SequenceOf(
                    self.referral
                        .iter()
                        .map(|uri| Value::OctetString(uri.clone().into_bytes()))
                        .collect(),
                ),
            )));
        }
        fields
    }

    /// Parse the leading three-to-four elements of a decoded response
    /// SEQUENCE as an `LDAPResult`, returning the unconsumed remainder.
    pub(crate) fn decode_fields(fields: &[Value]) -> Result<(LdapResult, &[Value])> {
        let (rc, matched, text, rest) = match fields {
            [Value::Enumerated(rc), Value::OctetString(matched), Value::OctetString(text), rest @ ..] => {
                (*rc, matched, text, rest)
            }
            _ => {
                return Err(LdapError::StructuralMismatch {
                    expected: "resultCode ENUMERATED, matchedDN OCTET STRING, errorMessage OCTET STRING",
                    found: format!("{:?}", fields),
                })
            }
        };
        let matched_dn = String::from_utf8_lossy(matched).into_owned();
        let diagnostic_message = String::from_utf8_lossy(text).into_owned();
        let (referral, rest) = match rest {
            [Value::Tagged(t), rest @ ..] if t.class == TagClass::Context && t.tag == 3 => {
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
                (uris, rest)
            }
            rest => (Vec::new(), rest),
        };
        Ok((
            LdapResult {
                result_code: ResultCode::from_code(rc),
                matched_dn,
                diagnostic_message,
                referral,
                controls: Vec::new(),
            },
            rest,
        ))
    }
}

/// Wrapper for the result of a Search operation, which returns entries
/// and references alongside the terminating `LdapResult`.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub entries: Vec<SearchEntry>,
    pub result: LdapResult,
}

impl SearchResult {
    pub fn success(self) -> Result<(Vec<SearchEntry>, LdapResult)> {
        Ok((self.entries, self.result.success()?))
    }

    pub fn non_error(self) -> Result<(Vec<SearchEntry>, LdapResult)> {
        Ok((self.entries, self.result.non_error()?))
    }
}

/// Wrapper for the result of a Compare operation, whose two non-error
/// result codes indicate the boolean outcome of the comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct CompareResult(pub LdapResult);

impl CompareResult {
    /// `compareTrue`/`compareFalse` map to `Ok(true)`/`Ok(false)`; any
    /// other code (including referral) is an error.
    pub fn equal(self) -> Result<bool> {
        match self.0.result_code {
            ResultCode::CompareFalse => Ok(false),
            ResultCode::CompareTrue => Ok(true),
            _ => Err(self.0.into_error()),
        }
    }

    pub fn non_error(self) -> Result<LdapResult> {
        match self.0.result_code {
            ResultCode::CompareFalse | ResultCode::CompareTrue | ResultCode::Referral => Ok(self.0),
            _ => Err(self.0.into_error()),
        }
    }
}
