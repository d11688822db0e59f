use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} has no kerning")]
    NoKerning(String),
    #[error("All kerning values are zero")]
    AllKerningZero,
}
