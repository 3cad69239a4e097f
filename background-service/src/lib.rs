//! The extension's settings channel: install-time defaults and the
//! `getSettings` / `saveSettings` messages exchanged with page scripts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};
use xbird_core::{ErrorExt, ExtensionSettings, SettingsStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SettingsRequest {
    GetSettings,
    SaveSettings { settings: ExtensionSettings },
}

/// Replies are told apart by shape, so `Saved` is tried first: every settings field
/// has a default and would otherwise swallow a save acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingsResponse {
    Saved {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Settings(ExtensionSettings),
}

impl SettingsResponse {
    fn saved() -> Self {
        SettingsResponse::Saved {
            success: true,
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        SettingsResponse::Saved {
            success: false,
            error: Some(message),
        }
    }
}

pub struct BackgroundService<S> {
    store: S,
}

impl<S: SettingsStore> BackgroundService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Writes the default settings on first install.
    pub async fn on_installed(&self) -> Result<(), xbird_core::StorageError> {
        info!("X-Bird extension installed successfully.");
        match self.store.save_settings(&ExtensionSettings::default()).await {
            Ok(()) => {
                info!("Default settings initialized.");
                Ok(())
            }
            Err(e) => {
                error!("Error setting default values: {}", e);
                Err(e)
            }
        }
    }

    pub async fn handle(&self, request: SettingsRequest) -> SettingsResponse {
        match request {
            SettingsRequest::GetSettings => match self.store.load_settings().await {
                Ok(settings) => SettingsResponse::Settings(settings),
                Err(e) => {
                    e.log_error();
                    SettingsResponse::Settings(ExtensionSettings::default())
                }
            },
            SettingsRequest::SaveSettings { settings } => {
                match self.store.save_settings(&settings).await {
                    Ok(()) => SettingsResponse::saved(),
                    Err(e) => {
                        e.log_error();
                        SettingsResponse::failed(e.user_friendly_message())
                    }
                }
            }
        }
    }

    /// Handles a raw JSON message. Unknown actions get no response.
    pub async fn handle_message(&self, message: Value) -> Option<Value> {
        let request: SettingsRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                info!("Ignoring unrecognized message: {}", e);
                return None;
            }
        };
        serde_json::to_value(self.handle(request).await).ok()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use xbird_core::{Intensity, Mood, StorageError};

    #[derive(Default)]
    struct MemorySettings {
        saved: Mutex<Option<ExtensionSettings>>,
        fail: bool,
    }

    impl SettingsStore for MemorySettings {
        async fn load_settings(&self) -> Result<ExtensionSettings, StorageError> {
            if self.fail {
                return Err(StorageError::DatabaseLocked);
            }
            Ok(self.saved.lock().unwrap().clone().unwrap_or_default())
        }

        async fn save_settings(&self, settings: &ExtensionSettings) -> Result<(), StorageError> {
            if self.fail {
                return Err(StorageError::DatabaseLocked);
            }
            *self.saved.lock().unwrap() = Some(settings.clone());
            Ok(())
        }
    }

    #[test]
    fn test_install_writes_defaults() {
        let service = BackgroundService::new(MemorySettings::default());
        tokio_test::block_on(service.on_installed()).unwrap();
        assert_eq!(
            *service.store().saved.lock().unwrap(),
            Some(ExtensionSettings::default())
        );
    }

    #[test]
    fn test_get_and_save_messages() {
        let service = BackgroundService::new(MemorySettings::default());

        let response = tokio_test::block_on(service.handle_message(json!({
            "action": "saveSettings",
            "settings": { "brainrotIntensity": 80, "defaultMood": "Cute", "extensionEnabled": false }
        })));
        assert_eq!(response, Some(json!({ "success": true })));

        let response = tokio_test::block_on(service.handle_message(json!({ "action": "getSettings" })));
        assert_eq!(
            response,
            Some(json!({ "brainrotIntensity": 80, "defaultMood": "Cute", "extensionEnabled": false }))
        );
    }

    #[test]
    fn test_save_failure_is_reported() {
        let service = BackgroundService::new(MemorySettings {
            fail: true,
            ..Default::default()
        });
        let response = tokio_test::block_on(service.handle(SettingsRequest::SaveSettings {
            settings: ExtensionSettings {
                brainrot_intensity: Intensity::new(10),
                default_mood: Mood::Agree,
                extension_enabled: true,
            },
        }));
        assert!(matches!(
            response,
            SettingsResponse::Saved { success: false, error: Some(_) }
        ));
    }

    #[test]
    fn test_responses_read_back_as_sent() {
        let saved: SettingsResponse = serde_json::from_value(json!({ "success": true })).unwrap();
        assert_eq!(saved, SettingsResponse::saved());

        let settings: SettingsResponse = serde_json::from_value(json!({
            "brainrotIntensity": 30, "defaultMood": "Roast", "extensionEnabled": true
        }))
        .unwrap();
        assert_eq!(
            settings,
            SettingsResponse::Settings(ExtensionSettings {
                brainrot_intensity: Intensity::new(30),
                default_mood: Mood::Roast,
                extension_enabled: true,
            })
        );
    }

    #[test]
    fn test_unknown_action_is_ignored() {
        let service = BackgroundService::new(MemorySettings::default());
        let response = tokio_test::block_on(service.handle_message(json!({ "action": "explode" })));
        assert_eq!(response, None);
    }
}
