//! Codec-level error taxonomy (spec.md §7, the low-level half).

use thiserror::Error;

/// Everything that can go wrong while reading or writing LBER octets.
///
/// This is deliberately flat: the tag/length codec, the primitive value
/// codec, and the dispatcher all report into the same enum, since a
/// caller decoding a PDU doesn't care which layer noticed the problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The byte source ended before a complete value could be read.
    #[error("truncated BER value")]
    Truncated,

    /// Malformed identifier, length, or primitive content, e.g. a zero-length
    /// BOOLEAN or a constructed value whose children overrun its length.
    #[error("invalid BER encoding: {0}")]
    InvalidEncoding(&'static str),

    /// LBER forbids the indefinite length form (0x80 with no following
    /// content-terminating end-of-contents octets).
    #[error("indefinite length form is not allowed in LBER")]
    IndefiniteLengthNotAllowed,

    /// The first octet of a long-form tag extension was 0, or more than
    /// four continuation octets were seen (tag would not fit a 31-bit range).
    #[error("invalid long-form tag")]
    InvalidLongTag,

    /// A long-form length announced more octets than this implementation
    /// is willing to trust (more than 4, i.e. larger than a 32-bit size).
    #[error("length field too large")]
    LengthTooLarge,

    /// A universal-class tag outside {1,2,4,5,10,16,17}.
    #[error("unsupported universal tag {0}")]
    UnknownUniversalTag(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
