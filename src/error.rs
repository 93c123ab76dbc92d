//! Error types and handling for the `TerraGraph` application

use thiserror::Error;

/// Main error type for the `TerraGraph` application
#[derive(Error, Debug)]
pub enum TerraGraphError {
    /// Configuration-related errors, detected at startup
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather API fetch errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Uploaded dataset parsing and column selection errors
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// Translation and speech synthesis errors
    #[error("Translation error: {message}")]
    Translation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl TerraGraphError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new dataset error
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        Self::Dataset {
            message: message.into(),
        }
    }

    /// Create a new translation error
    pub fn translation<S: Into<String>>(message: S) -> Self {
        Self::Translation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TerraGraphError::Config { message } => {
                format!("Configuration error: {message}. Please check your environment and API keys.")
            }
            TerraGraphError::Fetch(err) => err.user_message(),
            TerraGraphError::Dataset { message } => format!("Could not analyze the file: {message}"),
            TerraGraphError::Translation { .. } => {
                "Voice advisory is unavailable right now. Please check your translation API key."
                    .to_string()
            }
            TerraGraphError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

/// Failure of a single weather API request.
///
/// A failed fetch never carries partial data, the caller gets one of these
/// instead of a series.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Bad request: {body}")]
    BadRequest { body: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Unexpected status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

impl FetchError {
    /// Map a non-success HTTP status to its error category
    #[must_use]
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => Self::BadRequest { body },
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            _ => Self::UnexpectedStatus { status },
        }
    }

    /// Short machine-readable category
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::BadRequest { .. } => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::InvalidResponse { .. } => "invalid_response",
        }
    }

    /// Message naming the likely cause, shown to the user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { .. } => {
                "Failed to fetch data. Please check your internet connection.".to_string()
            }
            Self::BadRequest { .. } => {
                "Bad request. Please check your input parameters and API credentials.".to_string()
            }
            Self::Unauthorized => "Unauthorized. Please check your API credentials.".to_string(),
            Self::Forbidden => {
                "Forbidden. You may not have permission to access this resource.".to_string()
            }
            Self::NotFound => "Not found. The requested resource doesn't exist.".to_string(),
            Self::UnexpectedStatus { status } => format!("An error occurred: {status}"),
            Self::InvalidResponse { .. } => {
                "The weather service returned data that could not be read.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_error_creation() {
        let config_err = TerraGraphError::config("missing API key");
        assert!(matches!(config_err, TerraGraphError::Config { .. }));

        let dataset_err = TerraGraphError::dataset("no header row");
        assert!(matches!(dataset_err, TerraGraphError::Dataset { .. }));

        let fetch_err: TerraGraphError = FetchError::NotFound.into();
        assert!(matches!(fetch_err, TerraGraphError::Fetch(FetchError::NotFound)));
    }

    #[test]
    fn test_user_messages() {
        let config_err = TerraGraphError::config("API_USERNAME is not set");
        assert!(config_err.user_message().contains("API_USERNAME"));

        let dataset_err = TerraGraphError::dataset("bad column");
        assert!(dataset_err.user_message().contains("bad column"));
    }

    #[rstest]
    #[case(400, "bad_request")]
    #[case(401, "unauthorized")]
    #[case(403, "forbidden")]
    #[case(404, "not_found")]
    #[case(500, "unexpected_status")]
    #[case(418, "unexpected_status")]
    fn test_status_mapping(#[case] status: u16, #[case] code: &str) {
        assert_eq!(FetchError::from_status(status, String::new()).code(), code);
    }

    #[test]
    fn test_unauthorized_message_is_distinct_from_not_found() {
        let unauthorized = FetchError::from_status(401, String::new()).user_message();
        let not_found = FetchError::from_status(404, String::new()).user_message();

        assert!(unauthorized.contains("credentials"));
        assert!(!not_found.contains("credentials"));
        assert_ne!(unauthorized, not_found);
    }

    #[test]
    fn test_unexpected_status_names_code() {
        let err = FetchError::from_status(503, "down".to_string());
        assert!(err.user_message().contains("503"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TerraGraphError = io_err.into();
        assert!(matches!(err, TerraGraphError::Io { .. }));
    }
}
