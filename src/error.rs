use std::path::PathBuf;
use thiserror::Error;

/// Core library errors
#[derive(Error, Debug)]
pub enum SpaceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error at path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The move-to-trash primitive refused the path. `message` is the
    /// system's own description, passed through unchanged.
    #[error("Could not move '{path}' to the trash: {message}")]
    Trash { path: PathBuf, message: String },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpaceError {
    /// Classify an I/O error on a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::PathNotFound(path),
            _ => Self::Io { path, source },
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SpaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = ConfigError::Invalid("max_concurrency must be 1-16".into());
        assert!(err.to_string().contains("max_concurrency"));
    }

    #[test]
    fn error_conversion() {
        let config_err = ConfigError::Invalid("test".into());
        let err: SpaceError = config_err.into();
        assert!(matches!(err, SpaceError::Config(_)));
    }

    #[test]
    fn io_not_found_becomes_path_not_found() {
        let err = SpaceError::io(
            "/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, SpaceError::PathNotFound(_)));
    }

    #[test]
    fn trash_error_keeps_system_message() {
        let err = SpaceError::Trash {
            path: PathBuf::from("/data/a"),
            message: "Operation not permitted".into(),
        };
        assert!(err.to_string().ends_with("Operation not permitted"));
    }
}
