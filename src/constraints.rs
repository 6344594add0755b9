//! Caller-visible operation knobs (spec.md §4.7 "Constraints & Controls").

use std::collections::HashMap;

use crate::controls::Control;

/// Per-request configuration that isn't part of the wire PDU itself:
/// client-side deadlines, referral-following policy, and a list of
/// controls to attach to the next outgoing message.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraints {
    /// Client-side deadline in milliseconds; `None` means no local
    /// deadline is enforced (the server's own time limit still applies
    /// to Search operations independently).
    pub time_limit_ms: Option<u64>,
    /// Maximum number of chained referrals to follow before giving up
    /// with `LdapError::ReferralLimitExceeded`.
    pub hop_limit: u32,
    /// Whether referral results should be followed at all.
    pub referral_following: bool,
    /// Controls to attach to the next request built with these constraints.
    pub controls: Vec<Control>,
    /// Forward-compatibility bag for settings this type doesn't yet name.
    pub properties: HashMap<String, String>,
}

impl Default for Constraints {
    fn default() -> Constraints {
        Constraints {
            time_limit_ms: None,
            hop_limit: 10,
            referral_following: false,
            controls: Vec::new(),
            properties: HashMap::new(),
        }
    }
}

impl Constraints {
    pub fn new() -> Constraints {
        Constraints::default()
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Constraints {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn with_hop_limit(mut self, limit: u32) -> Constraints {
        self.hop_limit = limit;
        self
    }

    pub fn with_referral_following(mut self, follow: bool) -> Constraints {
        self.referral_following = follow;
        self
    }

    pub fn with_control(mut self, control: Control) -> Constraints {
        self.controls.push(control);
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }
}
