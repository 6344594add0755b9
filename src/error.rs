//! Message/filter/result-layer error taxonomy (spec.md §7, the upper half).

use thiserror::Error;

use crate::filter::FilterErrorKind;
use crate::result::ResultCode;

/// Everything the message, filter, and result layers can report, on top
/// of the raw codec faults in [`lber::Error`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LdapError {
    /// A low-level tag/length/value codec fault.
    #[error(transparent)]
    Codec(#[from] lber::Error),

    /// The decoded tree doesn't match the structural schema expected for
    /// the operation being decoded, e.g. a `BindRequest` missing its
    /// version field, or a response tag the framer doesn't recognize.
    #[error("structural mismatch: expected {expected}, found {found}")]
    StructuralMismatch {
        expected: &'static str,
        found: String,
    },

    /// A search-filter string failed to parse.
    #[error("invalid filter syntax at byte {position}: {kind}")]
    FilterSyntax {
        kind: FilterErrorKind,
        position: usize,
    },

    /// A complete, structurally valid response carried a non-success
    /// result code. Only raised once decoding has fully succeeded;
    /// partial decodes are never turned into this variant.
    #[error("{code:?}: {diagnostic} (matched {matched_dn:?})")]
    ProtocolResult {
        code: ResultCode,
        matched_dn: String,
        diagnostic: String,
        referrals: Vec<String>,
    },

    /// A referral chain exceeded `Constraints::hop_limit`.
    #[error("referral chain exceeded hop limit of {0}")]
    ReferralLimitExceeded(u32),

    /// The client-side time limit in `Constraints::time_limit_ms` elapsed
    /// before a response arrived. Conventionally surfaced with the
    /// LDAP pseudo result code 85 (OpenLDAP's `LDAP_TIMEOUT`).
    #[error("client-side time limit exceeded")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, LdapError>;

/// The client-side timeout pseudo result code, as used by OpenLDAP. Not
/// part of RFC 4511's result code table; `spec.md` leaves the exact value
/// to the implementer and this is the conventional choice.
pub const LDAP_TIMEOUT: i64 = 85;
