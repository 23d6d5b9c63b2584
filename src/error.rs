//! Error handling for the CSV sink

use std::io;
use thiserror::Error;

/// Custom error type for sink operations
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Permission denied: {file}")]
    PermissionDenied { file: String },

    #[error("No such file or directory: {file}")]
    FileNotFound { file: String },

    #[error("Is a directory: {file}")]
    IsDirectory { file: String },

    #[error("received unknown output type (tag {tag})")]
    UnknownFieldType { tag: u8 },

    #[error("could not read first line of CSV output file: {file}")]
    MissingHeader { file: String },

    #[error("Invalid field separator: {sep}")]
    InvalidFieldSeparator { sep: String },

    #[error("Conflicting sink options: {message}")]
    ConflictingOptions { message: String },

    #[error("Memory allocation failed for {records} records")]
    OutOfMemory { records: usize },

    #[error("Sink is already closed")]
    Closed,

    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SinkError {
    /// Returns the appropriate process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SinkError::PermissionDenied { .. }
            | SinkError::FileNotFound { .. }
            | SinkError::IsDirectory { .. }
            | SinkError::MissingHeader { .. }
            | SinkError::Io(_) => crate::FILE_FAILURE,

            _ => crate::EXIT_FAILURE,
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(file: &str) -> Self {
        SinkError::PermissionDenied {
            file: file.to_string(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(file: &str) -> Self {
        SinkError::FileNotFound {
            file: file.to_string(),
        }
    }

    /// Create an is directory error
    pub fn is_directory(file: &str) -> Self {
        SinkError::IsDirectory {
            file: file.to_string(),
        }
    }

    /// Create a missing header error
    pub fn missing_header(file: &str) -> Self {
        SinkError::MissingHeader {
            file: file.to_string(),
        }
    }

    /// Create an invalid field separator error
    pub fn invalid_field_separator(sep: &str) -> Self {
        SinkError::InvalidFieldSeparator {
            sep: sep.to_string(),
        }
    }

    /// Create a conflicting options error
    pub fn conflicting_options(message: &str) -> Self {
        SinkError::ConflictingOptions {
            message: message.to_string(),
        }
    }

    /// Create a parse error
    pub fn parse_error(message: &str) -> Self {
        SinkError::ParseError {
            message: message.to_string(),
        }
    }

    /// Create an internal error
    pub fn internal(message: &str) -> Self {
        SinkError::Internal {
            message: message.to_string(),
        }
    }
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Context trait for adding context to errors
pub trait SinkContext<T> {
    fn with_context<F>(self, f: F) -> SinkResult<T>
    where
        F: FnOnce() -> String;

    fn with_file_context(self, filename: &str) -> SinkResult<T>;
}

fn io_with_file(io_err: io::Error, filename: &str) -> SinkError {
    match io_err.kind() {
        io::ErrorKind::PermissionDenied => SinkError::permission_denied(filename),
        io::ErrorKind::NotFound => SinkError::file_not_found(filename),
        _ if std::path::Path::new(filename).is_dir() => SinkError::is_directory(filename),
        _ => SinkError::Io(io::Error::new(
            io_err.kind(),
            format!("{}: {}", filename, io_err),
        )),
    }
}

impl<T> SinkContext<T> for SinkResult<T> {
    fn with_context<F>(self, f: F) -> SinkResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| match err {
            SinkError::Io(io_err) => SinkError::Io(io::Error::new(
                io_err.kind(),
                format!("{}: {}", f(), io_err),
            )),
            other => other,
        })
    }

    fn with_file_context(self, filename: &str) -> SinkResult<T> {
        self.map_err(|err| match err {
            SinkError::Io(io_err) => io_with_file(io_err, filename),
            other => other,
        })
    }
}

impl<T> SinkContext<T> for Result<T, io::Error> {
    fn with_context<F>(self, f: F) -> SinkResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|io_err| {
            SinkError::Io(io::Error::new(
                io_err.kind(),
                format!("{}: {}", f(), io_err),
            ))
        })
    }

    fn with_file_context(self, filename: &str) -> SinkResult<T> {
        self.map_err(|io_err| io_with_file(io_err, filename))
    }
}
