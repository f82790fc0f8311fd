use thiserror::Error;

pub type Result<T> = std::result::Result<T, BackpressureError>;

#[derive(Error, Debug, Clone)]
pub enum BackpressureError {
    #[error("invalid backpressure configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown stream id: {0}")]
    UnknownStream(String),
}
