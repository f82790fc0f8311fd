use thiserror::Error;

pub type Result<T> = std::result::Result<T, FrameError>;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("binary encode failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("binary decode failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("json codec failed: {0}")]
    Json(#[from] serde_json::Error),
}
