use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriviaError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("Category not found: {id}")]
    CategoryNotFound { id: i64 },

    #[error("Question not found: {id}")]
    QuestionNotFound { id: i64 },

    #[error("Resource not found: {path}")]
    ResourceNotFound { path: String },

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Page {page} is out of range")]
    PageOutOfRange { page: i64 },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Unprocessable request: {message}")]
    Unprocessable { message: String },

    #[error("Unexpected response from server: {status}")]
    UnexpectedResponse { status: u16, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, TriviaError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TriviaError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::Unprocessable {
            message: message.into(),
        }
    }

    /// 客戶端錯誤屬於 Low，重試可能成功的屬於 Medium
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CategoryNotFound { .. }
            | Self::QuestionNotFound { .. }
            | Self::ResourceNotFound { .. }
            | Self::MethodNotAllowed
            | Self::PageOutOfRange { .. }
            | Self::BadRequest { .. }
            | Self::Unprocessable { .. } => ErrorSeverity::Low,
            Self::ApiError(_) | Self::UnexpectedResponse { .. } => ErrorSeverity::Medium,
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorSeverity::High,
            Self::DatabaseError(_) | Self::IoError(_) | Self::TaskError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "Check that the database file is writable and not locked",
            Self::ApiError(_) => "Check that the trivia server is running and reachable",
            Self::UnexpectedResponse { .. } => "Check the server logs for details",
            Self::CsvError(_) => {
                "Check the seed file uses the header category,question,answer,difficulty"
            }
            Self::IoError(_) => "Check file paths and permissions",
            Self::SerializationError(_) => "Check the server logs for details",
            Self::TaskError(_) => "Restart the server",
            Self::CategoryNotFound { .. } => "List /categories to find a valid category id",
            Self::QuestionNotFound { .. } => "List /questions to find a valid question id",
            Self::ResourceNotFound { .. } => "Check the request path",
            Self::MethodNotAllowed => "Check the HTTP method allowed for this path",
            Self::PageOutOfRange { .. } => "Request a page between 1 and the last page",
            Self::BadRequest { .. } => "Fix the request parameters and try again",
            Self::Unprocessable { .. } => "Make sure referenced categories exist",
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => "Check the configuration file and CLI flags",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "The question database could not be accessed".to_string(),
            Self::ApiError(_) => "Could not reach the trivia server".to_string(),
            Self::UnexpectedResponse { status, message } => {
                format!("The trivia server answered {}: {}", status, message)
            }
            Self::TaskError(_) => "An internal task failed".to_string(),
            other => other.to_string(),
        }
    }
}
