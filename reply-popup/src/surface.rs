use engagement_engine::{EngagementScore, ScoreBand};
use std::sync::{Arc, Mutex};
use url::Url;
use xbird_core::PopupError;

pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied!";
pub const COPY_ERROR_LABEL: &str = "Error";
pub const REGENERATING_PLACEHOLDER: &str = "...";
pub const EMPTY_REPLY: &str = "Could not generate reply";

#[derive(Debug, Clone, PartialEq)]
pub struct ScorePanel {
    pub score: u8,
    pub reason: String,
    pub band: ScoreBand,
}

impl ScorePanel {
    pub fn lines(&self) -> [String; 3] {
        [
            "[BETA FEATURE]".to_string(),
            format!("Success Rate: {}%", self.score),
            self.reason.clone(),
        ]
    }

    pub fn background(&self) -> &'static str {
        self.band.background()
    }
}

impl From<&EngagementScore> for ScorePanel {
    fn from(score: &EngagementScore) -> Self {
        Self {
            score: score.score,
            reason: score.reason.clone(),
            band: score.band(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReplyBody {
    #[default]
    Empty,
    /// Spinner shown while the first generation for a post is in flight.
    Loading,
    /// Placeholder shown while a regeneration is in flight.
    Regenerating,
    Reply(String),
    Failure(String),
}

impl ReplyBody {
    /// The text a reader sees in the body; this is what copy and reply-this use.
    pub fn text(&self) -> &str {
        match self {
            ReplyBody::Empty | ReplyBody::Loading => "",
            ReplyBody::Regenerating => REGENERATING_PLACEHOLDER,
            ReplyBody::Reply(text) | ReplyBody::Failure(text) => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulse {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CopyButton {
    pub label: &'static str,
    pub pulse: Option<Pulse>,
    pub disabled: bool,
}

impl Default for CopyButton {
    fn default() -> Self {
        Self {
            label: COPY_LABEL,
            pulse: None,
            disabled: false,
        }
    }
}

/// Everything the popup shows. The surface renders it whole on every change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopupView {
    pub visible: bool,
    pub score: Option<ScorePanel>,
    pub post_text: String,
    pub body: ReplyBody,
    pub copy: CopyButton,
    pub reply_disabled: bool,
}

pub trait PopupSurface {
    fn render(&mut self, view: &PopupView);

    fn focus_reply_action(&mut self);
}

#[allow(async_fn_in_trait)]
pub trait Clipboard {
    async fn write_text(&self, text: &str) -> Result<(), PopupError>;
}

pub trait Launcher {
    /// Opens `url` in a new tab or window.
    fn open(&mut self, url: &Url) -> Result<(), PopupError>;
}

/// Surface that keeps the last rendered view, for headless runs.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub last: Option<PopupView>,
    pub renders: usize,
    pub focus_requests: usize,
}

impl PopupSurface for RecordingSurface {
    fn render(&mut self, view: &PopupView) {
        self.last = Some(view.clone());
        self.renders += 1;
    }

    fn focus_reply_action(&mut self) {
        self.focus_requests += 1;
    }
}

/// Clipboard held in memory; can be told to refuse writes.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<Option<String>>>,
    refuse: Arc<Mutex<bool>>,
}

impl MemoryClipboard {
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }

    pub fn refuse_writes(&self, refuse: bool) {
        if let Ok(mut flag) = self.refuse.lock() {
            *flag = refuse;
        }
    }
}

impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<(), PopupError> {
        let refused = self.refuse.lock().map(|flag| *flag).unwrap_or(true);
        if refused {
            return Err(PopupError::ClipboardUnavailable {
                reason: "clipboard write refused".to_string(),
            });
        }
        let mut contents = self
            .contents
            .lock()
            .map_err(|_| PopupError::ClipboardUnavailable {
                reason: "clipboard poisoned".to_string(),
            })?;
        *contents = Some(text.to_string());
        Ok(())
    }
}

/// Launcher that records the URLs it was asked to open.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    pub opened: Vec<Url>,
    /// Fail every open, as a blocked popup window would.
    pub refuse: bool,
}

impl Launcher for RecordingLauncher {
    fn open(&mut self, url: &Url) -> Result<(), PopupError> {
        if self.refuse {
            return Err(PopupError::LaunchFailed {
                reason: format!("window blocked for {}", url.host_str().unwrap_or("composer")),
            });
        }
        self.opened.push(url.clone());
        Ok(())
    }
}
