use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Navigation to {url} failed: {reason}")]
    NavigationError { url: String, reason: String },

    #[error("Browser error: {0}")]
    BrowserError(#[from] chromiumoxide::error::CdpError),

    #[error("Browser launch failed: {message}")]
    LaunchError { message: String },

    #[error("Pagination to page {index} failed: {reason}")]
    PaginationError { index: usize, reason: String },

    #[error("Invalid CSS selector '{selector}': {reason}")]
    SelectorError { selector: String, reason: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration field '{field}' is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Navigation,
    Browser,
    Extraction,
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

impl ScrapeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScrapeError::NavigationError { .. } | ScrapeError::PaginationError { .. } => {
                ErrorCategory::Navigation
            }
            ScrapeError::BrowserError(_) | ScrapeError::LaunchError { .. } => {
                ErrorCategory::Browser
            }
            ScrapeError::SelectorError { .. } | ScrapeError::ValidationError { .. } => {
                ErrorCategory::Extraction
            }
            ScrapeError::CsvError(_)
            | ScrapeError::IoError(_)
            | ScrapeError::SerializationError(_) => ErrorCategory::Output,
            ScrapeError::ConfigError { .. }
            | ScrapeError::ConfigValidationError { .. }
            | ScrapeError::InvalidConfigValueError { .. }
            | ScrapeError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // a missing page beyond the first one only shortens the run
            ScrapeError::PaginationError { .. } => ErrorSeverity::Low,
            ScrapeError::BrowserError(_) => ErrorSeverity::Medium,
            ScrapeError::NavigationError { .. } | ScrapeError::LaunchError { .. } => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Navigation => {
                "Check that the listing URL is reachable and still renders product cards"
            }
            ErrorCategory::Browser => {
                "Make sure Chrome/Chromium is installed or set browser.executable in the profile"
            }
            ErrorCategory::Extraction => "Review the selectors in the scrape profile",
            ErrorCategory::Output => "Check that the output directory is writable",
            ErrorCategory::Configuration => "Fix the command line flags or the scrape profile",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScrapeError::NavigationError { url, .. } => {
                format!("Could not load the catalog page at {}", url)
            }
            ScrapeError::LaunchError { .. } => "Could not start the browser".to_string(),
            ScrapeError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            ScrapeError::MissingConfigError { field } => {
                format!("Missing setting '{}'", field)
            }
            other => other.to_string(),
        }
    }

    /// Exit code for the CLI; low severity errors still count as success.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
