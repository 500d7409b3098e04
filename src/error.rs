use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    /// A layer operation ran before the step it depends on (e.g. `backward` before `forward`).
    #[error("{layer} layer not primed: call {needs} first")]
    NotPrimed {
        layer: &'static str,
        needs: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
