use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Parse error in '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Write error for '{path}': {message}")]
    Write { path: String, message: String },

    #[error("{0}")]
    Other(String),
}
