use crate::error::*;
use tracing::{error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::Generation(e) => {
                error!("Generation error details: {:?}", e);
            }
            CoreError::Storage(e) => {
                error!("Storage error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::Generation(e) => e.is_retryable(),
            CoreError::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::Generation(e) => e.user_friendly_message(),
            CoreError::Storage(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Popup(e) => e.user_friendly_message(),
            CoreError::Scan(_) => "Could not scan this page.".to_string(),
            CoreError::Internal { .. } => {
                "An unexpected error occurred. Please try again later.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::Generation(_) => "GENERATION".to_string(),
            CoreError::Scan(_) => "SCAN".to_string(),
            CoreError::Storage(_) => "STORAGE".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Popup(_) => "POPUP".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for GenerationFailure {
    fn log_error(&self) -> &Self {
        error!("GenerationFailure: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("GenerationFailure (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationFailure::RateLimited | GenerationFailure::RequestFailed { .. }
        )
    }

    /// The fixed text shown in the popup's reply area in place of a reply.
    fn user_friendly_message(&self) -> String {
        match self {
            GenerationFailure::MissingCredential => {
                "⚠️ No API key found - Click the extension icon to configure your Hugging Face API key"
            }
            GenerationFailure::InvalidCredential => {
                "⚠️ API key missing or invalid - Check popup settings"
            }
            GenerationFailure::ModelLoading { .. } => {
                "🔄 Model is warming up - Try again in a few seconds"
            }
            GenerationFailure::Timeout => "⏱️ Request timed out - Try again",
            GenerationFailure::RateLimited => "🚫 Rate limited - Wait a moment",
            GenerationFailure::UnexpectedFormat { .. } => {
                "🔧 API format issue - Check console for details"
            }
            GenerationFailure::RequestFailed { .. } => "❌ Generation failed - Try again",
        }
        .to_string()
    }

    fn error_code(&self) -> String {
        match self {
            GenerationFailure::MissingCredential => "GEN_MISSING_CREDENTIAL".to_string(),
            GenerationFailure::InvalidCredential => "GEN_INVALID_CREDENTIAL".to_string(),
            GenerationFailure::Timeout => "GEN_TIMEOUT".to_string(),
            GenerationFailure::RateLimited => "GEN_RATE_LIMITED".to_string(),
            GenerationFailure::ModelLoading { .. } => "GEN_MODEL_LOADING".to_string(),
            GenerationFailure::UnexpectedFormat { .. } => "GEN_UNEXPECTED_FORMAT".to_string(),
            GenerationFailure::RequestFailed { .. } => "GEN_REQUEST_FAILED".to_string(),
        }
    }
}

impl ErrorExt for StorageError {
    fn log_error(&self) -> &Self {
        error!("StorageError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("StorageError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::DatabaseLocked | StorageError::ConnectionFailed { .. }
        )
    }

    fn user_friendly_message(&self) -> String {
        match self {
            StorageError::InvalidCredential { reason } => reason.clone(),
            StorageError::DatabaseLocked => {
                "Settings storage is temporarily busy. Please try again.".to_string()
            }
            StorageError::CorruptValue { .. } => "Failed to load saved settings".to_string(),
            _ => "Failed to access saved settings".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            StorageError::ConnectionFailed { .. } => "STORAGE_CONNECTION_FAILED".to_string(),
            StorageError::MigrationFailed { .. } => "STORAGE_MIGRATION_FAILED".to_string(),
            StorageError::CorruptValue { .. } => "STORAGE_CORRUPT_VALUE".to_string(),
            StorageError::InvalidCredential { .. } => "STORAGE_INVALID_CREDENTIAL".to_string(),
            StorageError::DatabaseLocked => "STORAGE_LOCKED".to_string(),
            StorageError::Sql(_) => "STORAGE_SQL_ERROR".to_string(),
        }
    }
}

impl ErrorExt for PopupError {
    fn log_error(&self) -> &Self {
        error!("PopupError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("PopupError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_friendly_message(&self) -> String {
        match self {
            PopupError::ClipboardUnavailable { .. } => "Error".to_string(),
            PopupError::LaunchFailed { .. } | PopupError::InvalidComposerUrl { .. } => {
                "Could not open the reply composer.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            PopupError::ClipboardUnavailable { .. } => "POPUP_CLIPBOARD".to_string(),
            PopupError::LaunchFailed { .. } => "POPUP_LAUNCH_FAILED".to_string(),
            PopupError::InvalidComposerUrl { .. } => "POPUP_INVALID_URL".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::PermissionDenied { .. } => {
                "Permission denied accessing configuration. Please check file permissions."
                    .to_string()
            }
            _ => "Configuration error occurred. Please check your settings.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED".to_string(),
            ConfigError::PermissionDenied { .. } => "CONFIG_PERMISSION_DENIED".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}
