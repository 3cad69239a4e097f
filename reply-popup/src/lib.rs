//! The reply popup: engagement score, generated reply and the copy, regenerate
//! and reply-this actions, rendered through a [`PopupSurface`].

pub mod controller;
pub mod surface;

pub use controller::{
    composer_url, ActionOutcome, ActiveSelection, FormInputs, InteractionController,
    PendingGeneration,
};
pub use surface::{
    Clipboard, CopyButton, Launcher, MemoryClipboard, PopupSurface, PopupView, Pulse,
    RecordingLauncher, RecordingSurface, ReplyBody, ScorePanel,
};
