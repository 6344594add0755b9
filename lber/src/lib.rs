//! A minimal ASN.1 BER encoder/decoder restricted to the LBER subset
//! used by LDAP (RFC 2251 §5.1): definite lengths only, primitive-only
//! `OCTET STRING`, and the handful of universal types LDAP actually uses.
//!
//! This crate knows nothing about LDAP message shapes; it provides the
//! tag/length codec (`identifier`), the value lattice (`value`), and
//! nothing else. The LDAP-specific layer lives in the `ldap-codec` crate.

pub mod common;
pub mod error;
pub mod identifier;
pub mod integer;
pub mod value;

pub use common::{TagClass, TagStructure, Universal};
pub use error::Error;
pub use value::{decode_one, Tagged, TaggedInner, Value};
