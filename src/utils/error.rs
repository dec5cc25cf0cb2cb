use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Search backend unavailable: {0}")]
    BackendUnavailable(#[from] reqwest::Error),

    #[error("Search backend rejected the query ({status}): {reason}")]
    InvalidQuery { status: u16, reason: String },

    #[error("Scroll context expired or unknown: {message}")]
    LeaseExpired { message: String },

    #[error("Search backend returned {status}: {message}")]
    BackendError { status: u16, message: String },

    #[error("Malformed search response: {message}")]
    MalformedResponse { message: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Backend,
    Query,
    Output,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::BackendUnavailable(_)
            | EtlError::LeaseExpired { .. }
            | EtlError::BackendError { .. }
            | EtlError::MalformedResponse { .. } => ErrorCategory::Backend,
            EtlError::InvalidQuery { .. } => ErrorCategory::Query,
            EtlError::ZipError(_)
            | EtlError::CsvError(_)
            | EtlError::IoError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorCategory::Output,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::BackendUnavailable(_)
            | EtlError::LeaseExpired { .. }
            | EtlError::BackendError { .. } => ErrorSeverity::Medium,
            EtlError::InvalidQuery { .. } | EtlError::MalformedResponse { .. } => {
                ErrorSeverity::High
            }
            EtlError::ZipError(_)
            | EtlError::CsvError(_)
            | EtlError::IoError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorSeverity::Critical,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::BackendUnavailable(_) => {
                "Check that the search endpoint is reachable and the credentials are valid"
            }
            EtlError::InvalidQuery { .. } => {
                "Check the date expressions and that the index mapping has the filtered fields"
            }
            EtlError::LeaseExpired { .. } => {
                "Re-run the extraction; each page must be requested within the scroll lease"
            }
            EtlError::BackendError { .. } => "Inspect the search cluster health and retry later",
            EtlError::MalformedResponse { .. } => {
                "Make sure the endpoint is an Elasticsearch-compatible search API"
            }
            EtlError::ZipError(_) | EtlError::IoError(_) => {
                "Check that the output directory exists and is writable"
            }
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => {
                "Re-run with --verbose to see which records failed to render"
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => "Fix the configuration value and try again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Backend => format!("Fetching applications failed: {}", self),
            ErrorCategory::Query => format!("The search query was rejected: {}", self),
            ErrorCategory::Output => format!("Writing the output failed: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }

    /// Process exit code for the binaries.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
