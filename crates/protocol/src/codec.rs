//! Binary codec for network messages.
//!
//! Provides efficient serialization for network transmission.

use crate::MovementMessage;
use thiserror::Error;

/// Errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
}

/// Encode a message to bytes.
pub fn encode(message: &MovementMessage) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serde::encode_to_vec(message, bincode::config::standard())?)
}

/// Decode a message from bytes. The whole buffer must be one message.
pub fn decode(data: &[u8]) -> Result<MovementMessage, CodecError> {
    let (message, read) = bincode::serde::decode_from_slice(data, bincode::config::standard())?;
    if read != data.len() {
        return Err(CodecError::TrailingBytes(data.len() - read));
    }
    Ok(message)
}

/// Upper bound on the encoded size of a message.
/// Useful for buffer allocation.
pub fn estimate_size(message: &MovementMessage) -> usize {
    // Floats are fixed width, integers varint at most 5 bytes
    const VEC3: usize = 12;
    const QUAT: usize = 16;
    const CLIENT_MOVE: usize = 8 + 4 + VEC3 + 4 + 3 + VEC3 + 1;
    match message {
        MovementMessage::Moves(batch) => 1 + 5 + 5 + batch.moves.len() * CLIENT_MOVE,
        MovementMessage::Ack(_) => 1 + 8,
        MovementMessage::Correction(_) => 1 + 8 + 5 + VEC3 + QUAT + VEC3 + 1 + 1,
        MovementMessage::Proxy(_) => 1 + 5 + VEC3 + QUAT + VEC3 + 1 + 1 + 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MoveBatch;
    use glam::{Quat, Vec3};
    use slipstride_movement::{
        ClientMove, CompressedIntent, MoveCorrection, MovementIntent, MovementMode,
    };

    fn client_move(timestamp: f64) -> ClientMove {
        let intent = MovementIntent {
            wants_sprint: true,
            wants_dash: true,
            ..Default::default()
        };
        ClientMove {
            timestamp,
            delta_time: 1.0 / 60.0,
            acceleration: Vec3::new(2048.0, 0.0, 0.0),
            control_yaw: 35.0,
            compressed: CompressedIntent::encode(&intent),
            end_position: Vec3::new(12.5, 90.15, -3.0),
            end_mode: MovementMode::Slide.pack(),
        }
    }

    #[test]
    fn test_roundtrip_moves() {
        let msg = MovementMessage::Moves(MoveBatch {
            character: 7,
            moves: vec![client_move(1.0), client_move(1.0 + 1.0 / 60.0)],
        });

        let encoded = encode(&msg).unwrap();
        assert!(encoded.len() <= estimate_size(&msg));
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, msg);

        if let MovementMessage::Moves(batch) = decoded {
            let intent = batch.moves[0].compressed.decode();
            assert!(intent.wants_sprint);
            assert!(intent.wants_dash);
            assert!(!intent.wants_slide);
        } else {
            panic!("wrong message type");
        }
    }

    #[test]
    fn test_roundtrip_correction() {
        let msg = MovementMessage::Correction(MoveCorrection {
            timestamp: 4.25,
            mode: MovementMode::Falling,
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(0.5),
            velocity: Vec3::new(0.0, -120.0, 40.0),
            wants_crouch: true,
            dash_toggle: false,
        });

        let encoded = encode(&msg).unwrap();
        assert!(encoded.len() <= estimate_size(&msg));
        assert_eq!(decode(&encoded).unwrap(), msg);
    }

    #[test]
    fn test_compact_encoding() {
        let msg = MovementMessage::Ack(slipstride_movement::MoveAck { timestamp: 100.0 });

        let encoded = encode(&msg).unwrap();
        // Tag plus one f64
        assert_eq!(encoded.len(), 9);
    }

    #[test]
    fn test_truncated_and_padded_input_rejected() {
        let encoded = encode(&MovementMessage::Moves(MoveBatch {
            character: 1,
            moves: vec![client_move(0.5)],
        }))
        .unwrap();

        assert!(matches!(
            decode(&encoded[..encoded.len() - 3]),
            Err(CodecError::Decode(_))
        ));

        let mut padded = encoded.clone();
        padded.push(0);
        assert!(matches!(decode(&padded), Err(CodecError::TrailingBytes(1))));
    }
}
