use reqwest::Error as ReqwestError;
use std::{error, fmt, io};

/// Coarse classification of a [`SyncError`], enough to tell the user what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Network,
    Malformed,
    Storage,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Network => "network unavailable",
            ErrorKind::Malformed => "unexpected response",
            ErrorKind::Storage => "local storage failure",
            ErrorKind::Other => "unexpected failure",
        };
        f.write_str(text)
    }
}

#[derive(Debug)]
pub enum SyncError {
    Network(ReqwestError),
    JsonParse(serde_json::Error),
    Database(io::Error),
    Api { code: u16, message: String },
    NotFound { id: String },
    Malformed { id: String, what: &'static str },
    MissingParameters(String),
    Task(String),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Network(_) => ErrorKind::Network,
            SyncError::JsonParse(_) | SyncError::Malformed { .. } => ErrorKind::Malformed,
            SyncError::Database(_) => ErrorKind::Storage,
            SyncError::NotFound { .. } => ErrorKind::NotFound,
            SyncError::Api { .. } | SyncError::MissingParameters(_) | SyncError::Task(_) => {
                ErrorKind::Other
            }
        }
    }

    pub fn not_found(id: &str) -> Self {
        SyncError::NotFound { id: id.to_string() }
    }

    pub fn malformed(id: &str, what: &'static str) -> Self {
        SyncError::Malformed {
            id: id.to_string(),
            what,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyncError::Network(e) => write!(f, "Network error: {}", e),
            SyncError::JsonParse(e) => write!(f, "JSON parse error: {}", e),
            SyncError::Database(e) => write!(f, "Database error: {}", e),
            SyncError::Api { code, message } => write!(f, "API error ({}): {}", code, message),
            SyncError::NotFound { id } => write!(f, "Nothing found for '{}'", id),
            SyncError::Malformed { id, what } => {
                write!(f, "Malformed response for '{}': missing {}", id, what)
            }
            SyncError::MissingParameters(uri) => write!(f, "Missing URL parameters: {}", uri),
            SyncError::Task(s) => write!(f, "Background task failed: {}", s),
        }
    }
}

impl error::Error for SyncError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SyncError::Network(e) => Some(e),
            SyncError::JsonParse(e) => Some(e),
            SyncError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SyncError {
    fn from(error: io::Error) -> Self {
        SyncError::Database(error)
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(error: serde_json::Error) -> Self {
        SyncError::JsonParse(error)
    }
}

impl From<ReqwestError> for SyncError {
    fn from(error: ReqwestError) -> Self {
        SyncError::Network(error)
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(error: tokio::task::JoinError) -> Self {
        SyncError::Task(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(SyncError::not_found("UC1").kind(), ErrorKind::NotFound);
        assert_eq!(SyncError::malformed("UC1", "name").kind(), ErrorKind::Malformed);
        let io_error = io::Error::new(io::ErrorKind::Other, "disk");
        assert_eq!(SyncError::from(io_error).kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_display_names_the_id() {
        let message = SyncError::malformed("UC1", "artist name").to_string();
        assert_eq!(message, "Malformed response for 'UC1': missing artist name");
    }
}
