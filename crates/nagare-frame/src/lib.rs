//! Frame codec contract (spec.md §3/§6): the wire shape and pluggable (binary/JSON) codecs
//! consumed by transports. No core-stream dependency — this crate only defines the contract
//! referenced from `Source::Bytes` in `nagare-core`.

pub mod codec;
pub mod error;
pub mod frame;

pub use codec::{BinaryCodec, Codec, JsonCodec};
pub use error::{FrameError, Result};
pub use frame::{Control, Frame, Payload, SequenceCounter};
