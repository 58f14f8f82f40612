use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Archive has no entries: {0}")]
    EmptyArchive(String),

    #[error("Invalid input path: {0}")]
    InvalidInput(String),

    #[error("Task panicked while processing {path}: {message}")]
    TaskPanicked { path: String, message: String },
}
