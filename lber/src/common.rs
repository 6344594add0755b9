//! The two small enumerations that make up an ASN.1 identifier octet,
//! besides the tag number itself.

/// The four ASN.1 tag classes (X.680 §8.1.2.2).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum TagClass {
    Universal = 0,
    Application = 1,
    Context = 2,
    Private = 3,
}

impl TagClass {
    pub fn from_u8(n: u8) -> Option<TagClass> {
        match n {
            0 => Some(TagClass::Universal),
            1 => Some(TagClass::Application),
            2 => Some(TagClass::Context),
            3 => Some(TagClass::Private),
            _ => None,
        }
    }
}

/// Primitive vs. constructed encoding form (X.680 §8.1.2.5).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum TagStructure {
    Primitive = 0,
    Constructed = 1,
}

impl TagStructure {
    pub fn from_u8(n: u8) -> Option<TagStructure> {
        match n {
            0 => Some(TagStructure::Primitive),
            1 => Some(TagStructure::Constructed),
            _ => None,
        }
    }

    pub fn is_constructed(self) -> bool {
        matches!(self, TagStructure::Constructed)
    }
}

/// Universal class tag numbers used by the LDAP subset of BER.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum Universal {
    Boolean = 1,
    Integer = 2,
    OctetString = 4,
    Null = 5,
    Enumerated = 10,
    Sequence = 16,
    Set = 17,
}

impl Universal {
    pub fn from_tag(tag: u64) -> Option<Universal> {
        match tag {
            1 => Some(Universal::Boolean),
            2 => Some(Universal::Integer),
            4 => Some(Universal::OctetString),
            5 => Some(Universal::Null),
            10 => Some(Universal::Enumerated),
            16 => Some(Universal::Sequence),
            17 => Some(Universal::Set),
            _ => None,
        }
    }
}
