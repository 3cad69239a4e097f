use crate::surface::{
    Clipboard, CopyButton, Launcher, PopupSurface, PopupView, Pulse, ReplyBody, ScorePanel,
    COPIED_LABEL, COPY_ERROR_LABEL, EMPTY_REPLY,
};
use engagement_engine::score_label;
use feed_scanner::Affordance;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;
use xbird_core::{
    ErrorExt, GenerationFailure, GenerationRequest, Intensity, Mood, PopupConfig, PopupError, Post,
};

/// Current values of the popup's form controls.
#[derive(Debug, Clone, PartialEq)]
pub struct FormInputs {
    pub intent: String,
    pub mood: Mood,
    pub intensity: Intensity,
}

impl FormInputs {
    pub fn from_config(config: &PopupConfig) -> Self {
        Self {
            intent: String::new(),
            mood: Mood::Auto,
            intensity: Intensity::new(config.default_intensity as i64),
        }
    }
}

/// The post targeted by the open popup. Replaced on every activation.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSelection {
    pub post: Post,
    pub token: Uuid,
}

/// A generation the caller should run and hand back through [`InteractionController::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingGeneration {
    pub token: Uuid,
    pub request: GenerationRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Performed,
    /// The action was disabled (cooldown) or had nothing to act on.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cooldown {
    until: Instant,
}

impl Cooldown {
    fn starting(now: Instant, length: Duration) -> Self {
        Self { until: now + length }
    }

    fn expired(&self, now: Instant) -> bool {
        self.until <= now
    }
}

/// Drives the reply popup: activation, completion of generations and the three
/// actions (copy, regenerate, reply-this).
pub struct InteractionController<S, C, L> {
    config: PopupConfig,
    surface: S,
    clipboard: C,
    launcher: L,
    view: PopupView,
    form: FormInputs,
    active: Option<ActiveSelection>,
    copy_cooldown: Option<Cooldown>,
    reply_cooldown: Option<Cooldown>,
}

impl<S: PopupSurface, C: Clipboard, L: Launcher> InteractionController<S, C, L> {
    pub fn new(config: PopupConfig, surface: S, clipboard: C, launcher: L) -> Self {
        Self {
            form: FormInputs::from_config(&config),
            config,
            surface,
            clipboard,
            launcher,
            view: PopupView::default(),
            active: None,
            copy_cooldown: None,
            reply_cooldown: None,
        }
    }

    /// The user clicked an affordance.
    pub fn activate(&mut self, affordance: &Affordance) -> PendingGeneration {
        let post = affordance.post.clone();
        let score = score_label(post.metrics_label.as_deref());
        debug!(
            "Activated post {} (score {}: {})",
            post.id, score.score, score.reason
        );

        self.copy_cooldown = None;
        self.reply_cooldown = None;
        self.view = PopupView {
            visible: true,
            score: Some(ScorePanel::from(&score)),
            post_text: post.text.clone(),
            body: ReplyBody::Loading,
            copy: CopyButton::default(),
            reply_disabled: false,
        };
        self.surface.render(&self.view);
        self.surface.focus_reply_action();

        self.select(post)
    }

    fn select(&mut self, post: Post) -> PendingGeneration {
        let token = Uuid::new_v4();
        let request = GenerationRequest {
            post_text: post.text.clone(),
            intent: self.form.intent.clone(),
            mood: self.form.mood,
            intensity: self.form.intensity,
        };
        self.active = Some(ActiveSelection { post, token });
        PendingGeneration { token, request }
    }

    /// Delivers a finished generation. Returns `false` when the result was stale and dropped.
    pub fn complete(&mut self, token: Uuid, result: Result<String, GenerationFailure>) -> bool {
        let current = self.active.as_ref().map(|selection| selection.token);
        if current != Some(token) {
            debug!("Discarding stale generation result {}", token);
            return false;
        }

        self.view.body = match result {
            Ok(text) if text.is_empty() => ReplyBody::Reply(EMPTY_REPLY.to_string()),
            Ok(text) => ReplyBody::Reply(text),
            Err(failure) => {
                failure.log_warn();
                ReplyBody::Failure(failure.user_friendly_message())
            }
        };
        self.surface.render(&self.view);
        true
    }

    /// "New Reply", or Enter in the intent box.
    pub fn regenerate(&mut self) -> Option<PendingGeneration> {
        let post = self.active.as_ref()?.post.clone();
        self.view.body = ReplyBody::Regenerating;
        self.surface.render(&self.view);
        info!("Regenerating reply for post {}", post.id);
        Some(self.select(post))
    }

    pub async fn copy(&mut self, now: Instant) -> Result<ActionOutcome, PopupError> {
        if self.active.is_none() || self.copy_cooldown.is_some() {
            return Ok(ActionOutcome::Ignored);
        }

        let text = self.view.body.text().to_string();
        match self.clipboard.write_text(&text).await {
            Ok(()) => {
                self.view.copy = CopyButton {
                    label: COPIED_LABEL,
                    pulse: Some(Pulse::Success),
                    disabled: true,
                };
                self.copy_cooldown = Some(Cooldown::starting(
                    now,
                    Duration::from_millis(self.config.copy_success_ms),
                ));
                self.surface.render(&self.view);
                Ok(ActionOutcome::Performed)
            }
            Err(e) => {
                warn!("Copy failed: {}", e);
                self.view.copy = CopyButton {
                    label: COPY_ERROR_LABEL,
                    pulse: Some(Pulse::Error),
                    disabled: false,
                };
                self.copy_cooldown = Some(Cooldown::starting(
                    now,
                    Duration::from_millis(self.config.copy_error_ms),
                ));
                self.surface.render(&self.view);
                Err(e)
            }
        }
    }

    /// Opens the host's compose intent prefilled with the current reply.
    pub fn reply_this(&mut self, now: Instant) -> Result<ActionOutcome, PopupError> {
        if self.reply_cooldown.is_some() {
            return Ok(ActionOutcome::Ignored);
        }
        let Some(selection) = self.active.as_ref() else {
            return Ok(ActionOutcome::Ignored);
        };

        let url = composer_url(
            &self.config.composer_base_url,
            selection.post.id.as_str(),
            self.view.body.text(),
        )?;
        info!("Opening composer for post {}", selection.post.id);
        self.launcher.open(&url)?;

        self.view.reply_disabled = true;
        self.reply_cooldown = Some(Cooldown::starting(
            now,
            Duration::from_millis(self.config.composer_cooldown_ms),
        ));
        self.surface.render(&self.view);
        Ok(ActionOutcome::Performed)
    }

    /// Escape or the close button. The last result stays for the next open.
    pub fn close(&mut self) {
        if !self.view.visible {
            return;
        }
        self.view.visible = false;
        self.surface.render(&self.view);
    }

    /// Resets cooldowns that have run out.
    pub fn tick(&mut self, now: Instant) {
        let mut changed = false;

        if self.copy_cooldown.is_some_and(|c| c.expired(now)) {
            self.copy_cooldown = None;
            self.view.copy = CopyButton::default();
            changed = true;
        }
        if self.reply_cooldown.is_some_and(|c| c.expired(now)) {
            self.reply_cooldown = None;
            self.view.reply_disabled = false;
            changed = true;
        }

        if changed {
            self.surface.render(&self.view);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [self.copy_cooldown, self.reply_cooldown]
            .into_iter()
            .flatten()
            .map(|c| c.until)
            .min()
    }

    pub fn set_intent(&mut self, intent: impl Into<String>) {
        self.form.intent = intent.into();
    }

    pub fn set_mood(&mut self, mood: Mood) {
        self.form.mood = mood;
    }

    pub fn set_intensity(&mut self, intensity: Intensity) {
        self.form.intensity = intensity;
    }

    pub fn form(&self) -> &FormInputs {
        &self.form
    }

    pub fn active(&self) -> Option<&ActiveSelection> {
        self.active.as_ref()
    }

    pub fn view(&self) -> &PopupView {
        &self.view
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }
}

/// `{base}?in_reply_to={id}&text={encoded text}`
pub fn composer_url(base: &str, post_id: &str, text: &str) -> Result<Url, PopupError> {
    let mut url = Url::parse(base).map_err(|e| PopupError::InvalidComposerUrl {
        reason: format!("{base}: {e}"),
    })?;
    url.set_query(Some(&format!(
        "in_reply_to={}&text={}",
        urlencoding::encode(post_id),
        urlencoding::encode(text)
    )));
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{MemoryClipboard, RecordingLauncher, RecordingSurface, COPY_LABEL};
    use engagement_engine::UNABLE_TO_ANALYZE;
    use xbird_core::PostId;

    type TestController = InteractionController<RecordingSurface, MemoryClipboard, RecordingLauncher>;

    fn controller() -> TestController {
        InteractionController::new(
            PopupConfig::default(),
            RecordingSurface::default(),
            MemoryClipboard::default(),
            RecordingLauncher::default(),
        )
    }

    fn affordance(id: &str, label: Option<&str>) -> Affordance {
        Affordance::new(
            Post {
                id: PostId::new(id),
                text: format!("post {id}"),
                metrics_label: label.map(str::to_string),
            },
            75000,
        )
    }

    #[test]
    fn test_activation_renders_loading_state() {
        let mut controller = controller();
        let pending = controller.activate(&affordance(
            "1",
            Some("3 replies, 12 reposts, 450 likes, 20 bookmarks, 75000 views"),
        ));

        let view = controller.surface().last.clone().unwrap();
        assert!(view.visible);
        assert_eq!(view.body, ReplyBody::Loading);
        assert_eq!(view.post_text, "post 1");
        assert_eq!(view.score.as_ref().unwrap().score, 50);
        assert_eq!(controller.surface().focus_requests, 1);

        assert_eq!(pending.request.post_text, "post 1");
        assert_eq!(pending.request.intensity.value(), 69);
        assert_eq!(controller.active().unwrap().token, pending.token);
    }

    #[test]
    fn test_missing_metrics_scores_neutral() {
        let mut controller = controller();
        controller.activate(&affordance("1", None));
        let score = controller.view().score.clone().unwrap();
        assert_eq!(score.score, 50);
        assert_eq!(score.reason, UNABLE_TO_ANALYZE);
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut controller = controller();
        let first = controller.activate(&affordance("1", None));
        let second = controller.activate(&affordance("2", None));

        assert!(!controller.complete(first.token, Ok("for post one".to_string())));
        assert_eq!(controller.view().body, ReplyBody::Loading);

        assert!(controller.complete(second.token, Ok("for post two".to_string())));
        assert_eq!(
            controller.view().body,
            ReplyBody::Reply("for post two".to_string())
        );
    }

    #[test]
    fn test_failures_and_empty_text_render_messages() {
        let mut controller = controller();
        let pending = controller.activate(&affordance("1", None));
        controller.complete(pending.token, Err(GenerationFailure::RateLimited));
        assert_eq!(controller.view().body.text(), "🚫 Rate limited - Wait a moment");

        let pending = controller.regenerate().unwrap();
        controller.complete(pending.token, Ok(String::new()));
        assert_eq!(controller.view().body.text(), EMPTY_REPLY);
    }

    #[test]
    fn test_regenerate_uses_current_form() {
        let mut controller = controller();
        assert!(controller.regenerate().is_none());

        let first = controller.activate(&affordance("1", None));
        controller.set_intent("make it funny");
        controller.set_mood(Mood::Roast);
        controller.set_intensity(Intensity::new(90));

        let again = controller.regenerate().unwrap();
        assert_ne!(again.token, first.token);
        assert_eq!(controller.view().body.text(), "...");
        assert_eq!(again.request.intent, "make it funny");
        assert_eq!(again.request.mood, Mood::Roast);
        assert_eq!(again.request.intensity.value(), 90);
        assert!(!controller.complete(first.token, Ok("old".to_string())));
    }

    #[test]
    fn test_copy_success_cooldown() {
        let mut controller = controller();
        let pending = controller.activate(&affordance("1", None));
        controller.complete(pending.token, Ok("copy me".to_string()));
        let t0 = Instant::now();

        let outcome = tokio_test::block_on(controller.copy(t0)).unwrap();
        assert_eq!(outcome, ActionOutcome::Performed);
        assert_eq!(controller.clipboard().contents().as_deref(), Some("copy me"));
        assert_eq!(controller.view().copy.label, COPIED_LABEL);
        assert!(controller.view().copy.disabled);
        assert_eq!(controller.next_deadline(), Some(t0 + Duration::from_secs(3)));

        let outcome = tokio_test::block_on(controller.copy(t0 + Duration::from_secs(1))).unwrap();
        assert_eq!(outcome, ActionOutcome::Ignored);

        controller.tick(t0 + Duration::from_secs(3));
        assert_eq!(controller.view().copy, CopyButton::default());
        assert_eq!(controller.next_deadline(), None);
    }

    #[test]
    fn test_copy_failure_shows_error() {
        let mut controller = controller();
        controller.activate(&affordance("1", None));
        controller.clipboard().refuse_writes(true);
        let t0 = Instant::now();

        assert!(tokio_test::block_on(controller.copy(t0)).is_err());
        assert_eq!(controller.view().copy.label, COPY_ERROR_LABEL);
        assert_eq!(controller.view().copy.pulse, Some(Pulse::Error));

        controller.tick(t0 + Duration::from_millis(1999));
        assert_eq!(controller.view().copy.label, COPY_ERROR_LABEL);
        controller.tick(t0 + Duration::from_millis(2000));
        assert_eq!(controller.view().copy.label, COPY_LABEL);
    }

    #[test]
    fn test_reply_this_opens_composer() {
        let mut controller = controller();
        let pending = controller.activate(&affordance("1790", None));
        controller.complete(pending.token, Ok("so true & real".to_string()));
        let t0 = Instant::now();

        assert_eq!(
            controller.reply_this(t0).unwrap(),
            ActionOutcome::Performed
        );
        assert_eq!(
            controller.launcher().opened[0].as_str(),
            "https://x.com/intent/post?in_reply_to=1790&text=so%20true%20%26%20real"
        );
        assert!(controller.view().reply_disabled);
        assert_eq!(
            controller.reply_this(t0 + Duration::from_secs(1)).unwrap(),
            ActionOutcome::Ignored
        );

        controller.tick(t0 + Duration::from_secs(3));
        assert!(!controller.view().reply_disabled);
        assert_eq!(controller.launcher().opened.len(), 1);
    }

    #[test]
    fn test_close_keeps_result() {
        let mut controller = controller();
        let pending = controller.activate(&affordance("1", None));
        controller.complete(pending.token, Ok("keep me".to_string()));

        controller.close();
        assert!(!controller.view().visible);
        assert_eq!(controller.view().body.text(), "keep me");
        assert!(controller.active().is_some());
    }

    #[test]
    fn test_blocked_launch_leaves_reply_enabled() {
        let mut controller = InteractionController::new(
            PopupConfig::default(),
            RecordingSurface::default(),
            MemoryClipboard::default(),
            RecordingLauncher {
                refuse: true,
                ..Default::default()
            },
        );
        let pending = controller.activate(&affordance("1", None));
        controller.complete(pending.token, Ok("hello".to_string()));

        assert!(matches!(
            controller.reply_this(Instant::now()),
            Err(PopupError::LaunchFailed { .. })
        ));
        assert!(!controller.view().reply_disabled);
        assert_eq!(controller.next_deadline(), None);
    }

    #[test]
    fn test_invalid_composer_base() {
        assert!(matches!(
            composer_url("not a url", "1", "x"),
            Err(PopupError::InvalidComposerUrl { .. })
        ));
    }
}
