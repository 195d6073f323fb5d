//! CLI error types and exit codes

use crate::config::ConfigError;
use roster_client::ApiError;
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: Provisioning finished with failures, or an unexpected error
/// - 2: Configuration error
/// - 3: Authentication failed
/// - 4: Input file unreadable or malformed
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("API error: {0}")]
    Api(ApiError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Provisioning finished with {0} failure(s)")]
    ProvisioningFailed(usize),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::AuthenticationFailed(_) => 3,
            CliError::Input(_) => 4,
            CliError::Api(_)
            | CliError::Io(_)
            | CliError::Server(_)
            | CliError::ProvisioningFailed(_) => 1,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {self}");
        } else {
            eprintln!("Error: {self}");
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {suggestion}");
            } else {
                eprintln!("\nSuggestion: {suggestion}");
            }
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::Config(_) => Some(
                "Set ROSTER_CLIENT_ID and ROSTER_CLIENT_SECRET (or ROSTER_ACCESS_TOKEN) in the environment or a .env file.",
            ),
            CliError::AuthenticationFailed(_) => {
                Some("Check the OAuth client credentials and ROSTER_REGION.")
            }
            CliError::ProvisioningFailed(_) => {
                Some("Re-run with --report <PATH> to keep the full outcome manifest.")
            }
            _ => None,
        }
    }
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Auth(message) => CliError::AuthenticationFailed(message),
            other => CliError::Api(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Io(format!("JSON error: {e}"))
    }
}
