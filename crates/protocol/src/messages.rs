//! Network message types.
//!
//! Payloads are the movement crate's own types; this module only frames
//! them for the wire.

use serde::{Deserialize, Serialize};
use slipstride_movement::{
    CharacterId, ClientMove, MoveAck, MoveCorrection, ProxyState, ServerReply,
};

/// All messages of the movement channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MovementMessage {
    /// Client moves not yet sent, oldest first.
    Moves(MoveBatch),

    /// Server accepted a move.
    Ack(MoveAck),

    /// Server disagreed with a move.
    Correction(MoveCorrection),

    /// Snapshot of a character for observers.
    Proxy(ProxyState),
}

/// Moves of one character, in capture order.
/// Lets a client flush several ticks in one packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveBatch {
    pub character: CharacterId,
    pub moves: Vec<ClientMove>,
}

impl MovementMessage {
    /// Batch of client moves, or `None` when there is nothing to send.
    pub fn moves(character: CharacterId, moves: Vec<ClientMove>) -> Option<Self> {
        if moves.is_empty() {
            None
        } else {
            Some(Self::Moves(MoveBatch { character, moves }))
        }
    }

    /// The server reply carried by this message, if any.
    pub fn into_reply(self) -> Option<ServerReply> {
        match self {
            Self::Ack(ack) => Some(ServerReply::Ack(ack)),
            Self::Correction(correction) => Some(ServerReply::Correction(correction)),
            Self::Moves(_) | Self::Proxy(_) => None,
        }
    }
}

impl From<ServerReply> for MovementMessage {
    fn from(reply: ServerReply) -> Self {
        match reply {
            ServerReply::Ack(ack) => Self::Ack(ack),
            ServerReply::Correction(correction) => Self::Correction(correction),
        }
    }
}

impl From<ProxyState> for MovementMessage {
    fn from(state: ProxyState) -> Self {
        Self::Proxy(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_is_not_sent() {
        assert_eq!(MovementMessage::moves(1, Vec::new()), None);
    }

    #[test]
    fn test_reply_conversion() {
        let ack = ServerReply::Ack(MoveAck { timestamp: 2.5 });
        let message = MovementMessage::from(ack);
        assert_eq!(message, MovementMessage::Ack(MoveAck { timestamp: 2.5 }));
        assert_eq!(message.into_reply(), Some(ack));
    }
}
