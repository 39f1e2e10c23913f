use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    /// 所有取得策略都失敗 (傳輸錯誤、非 2xx、空內容或 HTML 頁面)
    #[error("All {attempts} retrieval strategies failed")]
    RetrievalFailure { attempts: usize },

    /// 取得成功但沒有任何列通過名稱檢查
    #[error("No records found in source")]
    EmptyResultSet,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Retrieval,
    Source,
    Configuration,
    Input,
    System,
}

impl LookupError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LookupError::RetrievalFailure { .. } | LookupError::HttpError(_) => {
                ErrorCategory::Retrieval
            }
            LookupError::EmptyResultSet | LookupError::CsvError(_) => ErrorCategory::Source,
            LookupError::ConfigError { .. }
            | LookupError::InvalidConfigValueError { .. }
            | LookupError::MissingConfigError { .. } => ErrorCategory::Configuration,
            LookupError::ValidationError { .. } => ErrorCategory::Input,
            LookupError::IoError(_) | LookupError::SerializationError(_) => ErrorCategory::System,
        }
    }

    /// Re-running the whole load has no side effects beyond another fetch.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Retrieval | ErrorCategory::Source
        )
    }

    /// 給呈現層顯示的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            LookupError::RetrievalFailure { .. } => {
                "Could not retrieve data. Verify the source is publicly accessible and try again."
                    .to_string()
            }
            LookupError::EmptyResultSet => "No records found in source.".to_string(),
            LookupError::ValidationError { message } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Retrieval => {
                "Check network access and that the spreadsheet is shared publicly, then refresh"
            }
            ErrorCategory::Source => {
                "Check the sheet gid points at the data tab and the column order matches the schema"
            }
            ErrorCategory::Configuration => "Review the configuration file and command-line flags",
            ErrorCategory::Input => "Correct the input and try again",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
