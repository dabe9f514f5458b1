use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid stream type: {0}")]
    InvalidStream(String),

    #[error("Invalid dedup policy: {0}")]
    InvalidKeyPolicy(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crate::network::FetchError),

    #[error("Linked resolution error: {0}")]
    Linked(#[from] crate::extract::LinkedError),

    #[error("Sink error: {0}")]
    Sink(#[from] crate::sink::SinkError),
}

pub type Result<T> = std::result::Result<T, Error>;
