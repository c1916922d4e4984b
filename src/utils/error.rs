use thiserror::Error;

/// 與管理 API 溝通時的統一錯誤類型
#[derive(Error, Debug)]
pub enum SosError {
    #[error("{message}")]
    Failure { message: String },

    #[error("{message}")]
    CommandLine { message: String },

    #[error("HTTP code: {status}, Response: {reason} [{message}]")]
    Http {
        status: u16,
        reason: String,
        message: String,
    },

    #[error("{message}")]
    UnsupportedMethod { message: String },

    /// Failure while handling an accepted response, e.g. saving a download.
    #[error("Reason: {message}")]
    Request { message: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Value { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    EntryAlreadyExists { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML rendering error: {message}")]
    Markup { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Numeric error classes reported to the caller and used as the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Failure,
    CommandLine,
    Http,
    Value,
    NotFound,
    EntryAlreadyExists,
}

impl ErrorCode {
    /// Not-found shares the generic failure number.
    pub fn as_i32(self) -> i32 {
        match self {
            ErrorCode::Failure | ErrorCode::NotFound => 1,
            ErrorCode::CommandLine => 2,
            ErrorCode::Http => 3,
            ErrorCode::Value => 4,
            ErrorCode::EntryAlreadyExists => 5,
        }
    }
}

impl SosError {
    pub fn failure(message: impl Into<String>) -> Self {
        SosError::Failure {
            message: message.into(),
        }
    }

    pub fn value(message: impl Into<String>) -> Self {
        SosError::Value {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        SosError::NotFound {
            message: message.into(),
        }
    }

    pub fn command_line(message: impl Into<String>) -> Self {
        SosError::CommandLine {
            message: message.into(),
        }
    }

    pub fn request(message: impl Into<String>) -> Self {
        SosError::Request {
            message: message.into(),
        }
    }

    pub fn markup<E: std::fmt::Display>(err: E) -> Self {
        SosError::Markup {
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorCode {
        match self {
            SosError::Failure { .. } | SosError::Io(_) | SosError::Markup { .. } => {
                ErrorCode::Failure
            }
            SosError::CommandLine { .. }
            | SosError::ConfigValidation { .. }
            | SosError::InvalidConfigValue { .. } => ErrorCode::CommandLine,
            SosError::Http { .. }
            | SosError::UnsupportedMethod { .. }
            | SosError::Request { .. }
            | SosError::Transport(_) => ErrorCode::Http,
            SosError::Value { .. } | SosError::Serialization(_) => ErrorCode::Value,
            SosError::NotFound { .. } => ErrorCode::NotFound,
            SosError::EntryAlreadyExists { .. } => ErrorCode::EntryAlreadyExists,
        }
    }

    pub fn code(&self) -> i32 {
        self.kind().as_i32()
    }

    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SosError::Http { status, .. } => Some(*status),
            SosError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SosError>;
