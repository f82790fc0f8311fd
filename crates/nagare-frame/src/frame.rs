//! Wire frame shape (spec.md §3/§6): `{ sequence, timestamp_ms, payload }`, with `payload`
//! one of four tagged variants.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub payload: Payload,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Payload {
    Data(Vec<u8>),
    Float32(Vec<f32>),
    Control(Control),
    Error { code: String, message: String, recoverable: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Control {
    Credit(u64),
    Ack(u64),
    Pause,
    Resume,
    Complete,
    Subscribe(String),
    Unsubscribe(String),
}

impl Frame {
    pub fn new(sequence: u64, timestamp_ms: u64, payload: Payload) -> Self {
        Self {
            sequence,
            timestamp_ms,
            payload,
        }
    }

    pub fn control(sequence: u64, timestamp_ms: u64, control: Control) -> Self {
        Self::new(sequence, timestamp_ms, Payload::Control(control))
    }

    pub fn error(sequence: u64, timestamp_ms: u64, code: impl Into<String>, message: impl Into<String>, recoverable: bool) -> Self {
        Self::new(
            sequence,
            timestamp_ms,
            Payload::Error {
                code: code.into(),
                message: message.into(),
                recoverable,
            },
        )
    }
}

/// Monotonic sequence number generator for a single transport-hosted producer.
#[derive(Debug, Default)]
pub struct SequenceCounter(u64);

impl SequenceCounter {
    pub fn next(&mut self) -> u64 {
        let seq = self.0;
        self.0 += 1;
        seq
    }
}
