use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid axis tag '{0}'")]
    InvalidTag(String),
    #[error("Expected {expected} values per pair, got {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },
}
