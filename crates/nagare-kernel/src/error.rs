use thiserror::Error;

pub type Result<T> = std::result::Result<T, KernelError>;

#[derive(Error, Debug, Clone)]
pub enum KernelError {
    #[error("kernel '{0}' not loaded")]
    NotLoaded(String),

    #[error("kernel '{name}' received a batch of length {actual}, expected {expected}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("kernel '{name}' missing required parameter '{param}'")]
    MissingParam { name: String, param: String },
}
