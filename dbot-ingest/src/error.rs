use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IngestError {
    #[error("Envelope has no sender id")]
    MissingSender,

    #[error("Invalid ingest config: {0}")]
    InvalidConfig(String),

    #[error("Drainers already spawned")]
    AlreadySpawned,
}

pub type Result<T> = std::result::Result<T, IngestError>;
