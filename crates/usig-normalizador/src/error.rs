use thiserror::Error;

#[derive(Error, Debug)]
pub enum UsigError {
    #[error("Transport error: {0}")]
    Transport(#[from] usig_transport::TransportError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),
    #[error("Location lookup failed: {0}")]
    Location(String),
    #[error("Search session is closed")]
    SessionClosed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, UsigError>;
