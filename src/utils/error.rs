use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarinexError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Session expired: {message}")]
    SessionExpired { message: String },

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Geolocation error: {message}")]
    Geolocation { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Configuration,
    Data,
    Device,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl MarinexError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MarinexError::Http(_) | MarinexError::Api { .. } => ErrorCategory::Network,
            MarinexError::Unauthorized { .. }
            | MarinexError::SessionExpired { .. }
            | MarinexError::NotAuthenticated => ErrorCategory::Authentication,
            MarinexError::Config { .. }
            | MarinexError::ConfigValidation { .. }
            | MarinexError::InvalidConfigValue { .. }
            | MarinexError::MissingConfig { .. } => ErrorCategory::Configuration,
            MarinexError::Serialization(_)
            | MarinexError::Csv(_)
            | MarinexError::Validation { .. } => ErrorCategory::Data,
            MarinexError::Geolocation { .. } => ErrorCategory::Device,
            MarinexError::Io(_) | MarinexError::Zip(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MarinexError::Validation { .. }
            | MarinexError::Http(_)
            | MarinexError::Api { .. }
            | MarinexError::Unauthorized { .. }
            | MarinexError::SessionExpired { .. }
            | MarinexError::NotAuthenticated
            | MarinexError::Geolocation { .. } => ErrorSeverity::Medium,
            MarinexError::Serialization(_)
            | MarinexError::Csv(_)
            | MarinexError::Config { .. }
            | MarinexError::ConfigValidation { .. }
            | MarinexError::InvalidConfigValue { .. }
            | MarinexError::MissingConfig { .. } => ErrorSeverity::High,
            MarinexError::Io(_) | MarinexError::Zip(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check that the Marinex backend is reachable and the API URL is correct",
            ErrorCategory::Authentication => "Run `marinex login` again to start a new session",
            ErrorCategory::Configuration => "Review marinex.toml and the command line overrides",
            ErrorCategory::Data => "Verify the input values and the file contents",
            ErrorCategory::Device => "Make sure a position source is available and readable",
            ErrorCategory::System => "Check file permissions and free disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MarinexError::Api { status, message } => {
                format!("The server answered {}: {}", status, message)
            }
            MarinexError::SessionExpired { .. } => {
                "Your session has expired, please log in again".to_string()
            }
            MarinexError::Unauthorized { message } => format!("Authentication failed: {}", message),
            MarinexError::NotAuthenticated => "You are not logged in".to_string(),
            MarinexError::Http(e) if e.is_timeout() => "The server did not answer in time".to_string(),
            MarinexError::Http(e) if e.is_connect() => "Could not connect to the server".to_string(),
            other => other.to_string(),
        }
    }

    /// 後端回應 401 的錯誤
    pub fn is_unauthorized(&self) -> bool {
        match self {
            MarinexError::Unauthorized { .. } => true,
            MarinexError::Api { status, .. } => *status == 401,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, MarinexError>;
