use thiserror::Error;

#[derive(Error, Debug)]
pub enum YnaError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{service} API returned {status}: {message}")]
    ApiError {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("YNAB setup error: {message}")]
    YnabSetupError { message: String },

    #[error("OpenAI API key not found")]
    MissingOpenAiKey,

    #[error("Invalid OpenAI API key")]
    InvalidOpenAiKey,

    #[error("OpenAI returned an empty response")]
    EmptyAiResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl YnaError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            YnaError::HttpError(_) | YnaError::ApiError { .. } => ErrorCategory::Network,
            YnaError::ConfigError { .. }
            | YnaError::ConfigValidationError { .. }
            | YnaError::MissingConfigError { .. }
            | YnaError::InvalidConfigValueError { .. }
            | YnaError::YnabSetupError { .. }
            | YnaError::MissingOpenAiKey
            | YnaError::InvalidOpenAiKey => ErrorCategory::Configuration,
            YnaError::SerializationError(_) | YnaError::EmptyAiResponse => ErrorCategory::Data,
            YnaError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            YnaError::EmptyAiResponse => ErrorSeverity::Low,
            YnaError::HttpError(_) | YnaError::ApiError { .. } => ErrorSeverity::Medium,
            YnaError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// 每種錯誤對應的處理建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            YnaError::HttpError(_) => "Check your network connection and try again",
            YnaError::ApiError { status: 401, .. } => {
                "Check that your API key is valid and has not been revoked"
            }
            YnaError::ApiError { status: 429, .. } => "Rate limited, wait a few minutes and retry",
            YnaError::ApiError { .. } => "The remote service rejected the request, retry later",
            YnaError::IoError(_) => "Check file permissions and available disk space",
            YnaError::SerializationError(_) => {
                "The service returned unexpected data, try --force-refresh-amazon"
            }
            YnaError::ConfigError { .. }
            | YnaError::ConfigValidationError { .. }
            | YnaError::MissingConfigError { .. }
            | YnaError::InvalidConfigValueError { .. } => {
                "Review your .env file or --config TOML file"
            }
            YnaError::YnabSetupError { .. } => {
                "Create the YNAB payees named by YNAB_PAYEE_NAME_TO_BE_PROCESSED and YNAB_PAYEE_NAME_PROCESSING_COMPLETED"
            }
            YnaError::MissingOpenAiKey => {
                "Set OPENAI_API_KEY or disable USE_AI_SUMMARIZATION"
            }
            YnaError::InvalidOpenAiKey => "Replace OPENAI_API_KEY with a valid key",
            YnaError::EmptyAiResponse => "Retry, or disable USE_AI_SUMMARIZATION",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            YnaError::HttpError(_) => "Could not reach a remote service".to_string(),
            YnaError::ApiError {
                service, status, ..
            } => format!("{} request failed with status {}", service, status),
            YnaError::MissingConfigError { field } => {
                format!("Missing setting {}", field.to_uppercase())
            }
            YnaError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting {} is invalid: {}", field.to_uppercase(), reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, YnaError>;
