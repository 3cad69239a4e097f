use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationFailure),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Popup error: {0}")]
    Popup(#[from] PopupError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Classified outcome of a failed reply generation.
///
/// The request client returns these as values; nothing in the generation path
/// panics or propagates a raw transport error to the popup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationFailure {
    #[error("API key not found")]
    MissingCredential,

    #[error("API key rejected by the generation endpoint")]
    InvalidCredential,

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited by the generation endpoint")]
    RateLimited,

    #[error(
        "Model is loading{}",
        .estimated_secs.map(|secs| format!(" (estimated {secs} seconds)")).unwrap_or_default()
    )]
    ModelLoading { estimated_secs: Option<f64> },

    #[error("Unexpected API response format: {preview}")]
    UnexpectedFormat { preview: String },

    #[error("Request failed: {detail}")]
    RequestFailed { detail: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Invalid selector: {selector}")]
    InvalidSelector { selector: String },

    #[error("Post {post_id} has no metrics label")]
    MissingMetrics { post_id: String },

    #[error("Failed to attach affordance to post {post_id}: {reason}")]
    AttachFailed { post_id: String, reason: String },

    /// Reported by host pages whose element handles can go stale mid-pass.
    #[error("Host page unavailable: {reason}")]
    PageUnavailable { reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Migration failed: {migration}")]
    MigrationFailed { migration: String },

    #[error("Stored value for {key} is corrupt: {details}")]
    CorruptValue { key: String, details: String },

    #[error("Invalid API key: {reason}")]
    InvalidCredential { reason: String },

    #[error("Database locked")]
    DatabaseLocked,

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PopupError {
    #[error("Clipboard write failed: {reason}")]
    ClipboardUnavailable { reason: String },

    #[error("Could not open composer: {reason}")]
    LaunchFailed { reason: String },

    #[error("Invalid composer URL: {reason}")]
    InvalidComposerUrl { reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Permission denied accessing config: {path}")]
    PermissionDenied { path: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
