//! Pluggable frame codec (spec.md §6): "Serialization codec is pluggable (structured binary
//! preferred; JSON fallback)."

use crate::error::Result;
use crate::frame::Frame;

pub trait Codec {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<Frame>;
}

/// Preferred wire format: compact binary via `bincode`'s serde bridge.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryCodec;

impl Codec for BinaryCodec {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(frame, bincode::config::standard())?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Frame> {
        let (frame, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(frame)
    }
}

/// Fallback for transports that require text framing (e.g. browser dev tools inspection).
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(frame)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Frame> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Control, Payload};

    fn sample() -> Frame {
        Frame::new(42, 1_700_000_000_000, Payload::Float32(vec![1.0, 2.5, 3.0]))
    }

    #[test]
    fn binary_codec_round_trips() {
        let codec = BinaryCodec;
        let bytes = codec.encode(&sample()).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn json_codec_round_trips() {
        let codec = JsonCodec;
        let frame = Frame::control(1, 0, Control::Credit(10));
        let bytes = codec.encode(&frame).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn json_decode_rejects_garbage() {
        let codec = JsonCodec;
        assert!(codec.decode(b"not json").is_err());
    }
}
