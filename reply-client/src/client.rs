use crate::prompt::{build_payload, GenerationPayload};
use crate::response::{normalize_body, post_process};
use crate::retry::{RetryConfig, RetryExecutor, RetryMetrics};
use reqwest::{Client, StatusCode};
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use xbird_core::{ClientConfig, CoreError, CredentialStore, GenerationFailure, GenerationRequest};

/// Issues reply generations against the hosted model endpoint.
///
/// The API key is read lazily from the credential store and cached; a missing key
/// triggers one reload per call, and [`RequestClient::reload_credential`] forces a
/// fresh read after the key changes.
pub struct RequestClient<S> {
    http_client: Client,
    config: ClientConfig,
    store: S,
    credential: RwLock<Option<String>>,
    retry: RetryExecutor,
}

impl<S: CredentialStore> RequestClient<S> {
    pub fn new(config: ClientConfig, store: S) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CoreError::Internal {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        info!("Request client initialized with endpoint: {}", config.endpoint);

        Ok(Self {
            http_client,
            retry: RetryExecutor::new(RetryConfig::from(&config)),
            config,
            store,
            credential: RwLock::new(None),
        })
    }

    /// Re-reads the API key from the store. Returns whether a key is now available.
    pub async fn reload_credential(&self) -> bool {
        let loaded = match self.store.read_credential().await {
            Ok(Some(key)) => {
                debug!("API key loaded");
                Some(key)
            }
            Ok(None) => {
                warn!("No API key found. Configure your Hugging Face API key in the extension popup.");
                None
            }
            Err(e) => {
                error!("Failed to load API key: {}", e);
                None
            }
        };

        let available = loaded.is_some();
        *self.credential.write().await = loaded;
        available
    }

    async fn credential(&self) -> Option<String> {
        if let Some(key) = self.credential.read().await.clone() {
            return Some(key);
        }
        if self.reload_credential().await {
            self.credential.read().await.clone()
        } else {
            None
        }
    }

    pub async fn has_credential(&self) -> bool {
        self.credential.read().await.is_some()
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationFailure> {
        let Some(credential) = self.credential().await else {
            return Err(GenerationFailure::MissingCredential);
        };

        let payload = build_payload(request, &self.config);
        debug!(
            "Sending generation request to {} (intensity {}, mood {})",
            self.config.endpoint,
            request.intensity.value(),
            request.mood
        );

        let text = self
            .retry
            .execute("generate_reply", |attempt| {
                self.send_attempt(&payload, &credential, attempt)
            })
            .await?;

        Ok(post_process(&text, self.config.max_reply_chars))
    }

    async fn send_attempt(
        &self,
        payload: &GenerationPayload,
        credential: &str,
        attempt: u32,
    ) -> Result<String, GenerationFailure> {
        match timeout(self.config.timeout(), self.send_once(payload, credential, attempt)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Generation request timed out after {:?}", self.config.timeout());
                Err(GenerationFailure::Timeout)
            }
        }
    }

    async fn send_once(
        &self,
        payload: &GenerationPayload,
        credential: &str,
        attempt: u32,
    ) -> Result<String, GenerationFailure> {
        info!("Making generation request (attempt {})", attempt);

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .bearer_auth(credential)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationFailure::Timeout
                } else {
                    error!("Network error for generation request: {}", e);
                    GenerationFailure::RequestFailed {
                        detail: format!("transport error: {e}"),
                    }
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            error!("Generation endpoint rejected the API key");
            return Err(GenerationFailure::InvalidCredential);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Generation endpoint rate limited the request");
            return Err(GenerationFailure::RateLimited);
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GenerationFailure::Timeout
            } else {
                GenerationFailure::RequestFailed {
                    detail: format!("failed to read response body: {e}"),
                }
            }
        })?;

        if !status.is_success() {
            error!("Generation request failed with status: {}", status);
            return Err(GenerationFailure::RequestFailed {
                detail: format!("API request failed: {status}. {body}"),
            });
        }

        debug!("Generation response received ({} bytes)", body.len());
        normalize_body(&body)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get_retry_metrics(&self) -> RetryMetrics {
        self.retry.get_metrics()
    }

    pub fn reset_metrics(&self) {
        self.retry.reset_metrics();
    }
}
