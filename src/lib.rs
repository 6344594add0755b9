//! LDAPv3 ASN.1 BER/LBER protocol codec.
//!
//! This crate implements the wire encoding for LDAP messages: the
//! restricted-BER (LBER) tag/length/value codec lives in the `lber`
//! crate; this crate builds the LDAP message envelope, operation PDUs,
//! the RFC 4515 search filter grammar and the result/error model on top
//! of it.

pub mod abandon;
pub mod add;
pub mod bind;
pub mod compare;
pub mod constraints;
pub mod controls;
mod error;
pub mod extended;
pub mod filter;
pub mod message;
pub mod modify;
pub mod modifydn;
pub mod result;
pub mod search;

pub use constraints::Constraints;
pub use controls::Control;
pub use error::{LdapError, Result, LDAP_TIMEOUT};
pub use filter::{escape_filter_literal, parse_filter, Filter};
pub use message::{LdapMessage, PartialAttribute, ProtocolOp};
pub use modify::Mod;
pub use result::{CompareResult, LdapResult, ResultCode, SearchResult};
pub use search::{DerefAliases, Scope, SearchEntry, SearchRequest, SearchResultEntry, SearchStream, SearchStreamItem};
