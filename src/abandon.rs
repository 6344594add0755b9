//! `AbandonRequest` (spec.md §4.5).

/// `AbandonRequest ::= [APPLICATION 16] MessageID`. Carries the
/// `messageId` of the operation to abandon directly as its content, with
/// no further structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbandonRequest(pub i64);

impl AbandonRequest {
    pub fn new(message_id: i64) -> AbandonRequest {
        AbandonRequest(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{LdapMessage, ProtocolOp};

    #[test]
    fn abandon_request_round_trips() {
        let msg = LdapMessage::new(ProtocolOp::AbandonRequest(AbandonRequest::new(42)));
        let decoded = LdapMessage::decode(&msg.encode()).unwrap();
        match decoded.protocol_op {
            ProtocolOp::AbandonRequest(got) => assert_eq!(got.0, 42),
            other => panic!("expected AbandonRequest, got {:?}", other),
        }
    }
}
