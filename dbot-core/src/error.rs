use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbotError {
    /// The transport failed to deliver an outbound message.
    #[error("Bot error: {0}")]
    Bot(String),

    /// A host handler failed while processing a message.
    #[error("Handler error: {0}")]
    Handler(String),
}

pub type Result<T> = std::result::Result<T, DbotError>;
