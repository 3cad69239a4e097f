//! Content-script runtime: wires the feed scanner, the reply popup and the request
//! client into one cooperative event loop.

use feed_scanner::{Affordance, HostPage, ScanEngine, ScanReport};
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use reply_client::RequestClient;
use reply_popup::{Clipboard, InteractionController, Launcher, PendingGeneration, PopupSurface};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use xbird_core::{
    AppConfig, CoreError, CredentialStore, ErrorExt, GenerationFailure, Intensity, Mood,
};

/// Everything the host page reports to the content script.
#[derive(Debug, Clone)]
pub enum PageEvent {
    Scroll,
    /// Any DOM mutation, with the location at the time it was observed.
    Mutation { location: String },
    Activate(Affordance),
    Copy,
    Regenerate,
    ReplyThis,
    Close,
    SetIntent(String),
    SetMood(Mood),
    SetIntensity(Intensity),
    /// The API key was saved or cleared from the extension popup.
    CredentialUpdated,
    Unload,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub passes: u64,
    pub attached: usize,
    pub scan_faults: usize,
    pub generations_completed: usize,
    pub generations_discarded: usize,
}

impl RunSummary {
    fn record(&mut self, report: &ScanReport) {
        self.passes += 1;
        self.attached += report.attached.len();
        if report.fault.is_some() || report.failed > 0 {
            self.scan_faults += 1;
        }
    }
}

pub struct ContentScript<P, S, C, L, K> {
    page: P,
    scanner: ScanEngine,
    controller: InteractionController<S, C, L>,
    client: RequestClient<K>,
    enabled: bool,
    started: bool,
    summary: RunSummary,
}

type GenerationOutcome = (Uuid, Result<String, GenerationFailure>);

fn generate<K: CredentialStore>(
    client: &RequestClient<K>,
    pending: PendingGeneration,
) -> LocalBoxFuture<'_, GenerationOutcome> {
    async move {
        let result = client.generate(&pending.request).await;
        (pending.token, result)
    }
    .boxed_local()
}

impl<P, S, C, L, K> ContentScript<P, S, C, L, K>
where
    P: HostPage,
    S: PopupSurface,
    C: Clipboard,
    L: Launcher,
    K: CredentialStore,
{
    pub fn new(
        config: &AppConfig,
        page: P,
        surface: S,
        clipboard: C,
        launcher: L,
        credentials: K,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            page,
            scanner: ScanEngine::new(&config.scan)?,
            controller: InteractionController::new(
                config.popup.clone(),
                surface,
                clipboard,
                launcher,
            ),
            client: RequestClient::new(config.client.clone(), credentials)?,
            enabled: true,
            started: false,
            summary: RunSummary::default(),
        })
    }

    /// Turns feed scanning on or off, from the `extensionEnabled` setting.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Initial scan on page load. Does nothing when disabled or already started.
    pub fn start(&mut self) -> Option<ScanReport> {
        if self.started {
            return None;
        }
        self.started = true;

        if !self.enabled {
            info!("Extension disabled, feed scanning is off");
            return None;
        }
        let report = self.scanner.start(&mut self.page);
        self.summary.record(&report);
        Some(report)
    }

    /// Processes page events until `Unload`, or until the channel closes and no
    /// generation or scan work is pending.
    pub async fn run(&mut self, mut events: mpsc::Receiver<PageEvent>) -> RunSummary {
        self.start();

        let Self {
            page,
            scanner,
            controller,
            client,
            enabled,
            summary,
            ..
        } = self;
        let client: &RequestClient<K> = client;
        let enabled = *enabled;

        let mut in_flight: FuturesUnordered<LocalBoxFuture<'_, GenerationOutcome>> =
            FuturesUnordered::new();
        let mut events_open = true;

        loop {
            if !events_open && in_flight.is_empty() && scanner.next_deadline().is_none() {
                break;
            }

            let deadline = [scanner.next_deadline(), controller.next_deadline()]
                .into_iter()
                .flatten()
                .min();
            let sleep_until = deadline
                .map(tokio::time::Instant::from_std)
                .unwrap_or_else(tokio::time::Instant::now);

            tokio::select! {
                event = events.recv(), if events_open => {
                    let now = Instant::now();
                    match event {
                        None => events_open = false,
                        Some(PageEvent::Unload) => {
                            info!("Page unloading");
                            scanner.shutdown();
                            break;
                        }
                        Some(PageEvent::Scroll) => {
                            if enabled {
                                scanner.on_scroll(now);
                            }
                        }
                        Some(PageEvent::Mutation { location }) => {
                            if enabled {
                                scanner.on_mutation(&location, now);
                            }
                        }
                        Some(PageEvent::Activate(affordance)) => {
                            in_flight.push(generate(client, controller.activate(&affordance)));
                        }
                        Some(PageEvent::Regenerate) => {
                            if let Some(pending) = controller.regenerate() {
                                in_flight.push(generate(client, pending));
                            }
                        }
                        Some(PageEvent::Copy) => {
                            if let Err(e) = controller.copy(now).await {
                                e.log_warn();
                            }
                        }
                        Some(PageEvent::ReplyThis) => {
                            if let Err(e) = controller.reply_this(now) {
                                e.log_error();
                            }
                        }
                        Some(PageEvent::Close) => controller.close(),
                        Some(PageEvent::SetIntent(intent)) => controller.set_intent(intent),
                        Some(PageEvent::SetMood(mood)) => controller.set_mood(mood),
                        Some(PageEvent::SetIntensity(intensity)) => controller.set_intensity(intensity),
                        Some(PageEvent::CredentialUpdated) => {
                            let available = client.reload_credential().await;
                            debug!("API key reloaded (available: {})", available);
                        }
                    }
                }
                Some((token, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    if controller.complete(token, result) {
                        summary.generations_completed += 1;
                    } else {
                        summary.generations_discarded += 1;
                    }
                }
                _ = tokio::time::sleep_until(sleep_until), if deadline.is_some() => {
                    let now = Instant::now();
                    if let Some(report) = scanner.on_deadline(now, page) {
                        if let Some(fault) = &report.fault {
                            warn!("Scan pass reported a fault: {}", fault);
                        }
                        summary.record(&report);
                    }
                    controller.tick(now);
                }
            }
        }

        summary.clone()
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn scanner(&self) -> &ScanEngine {
        &self.scanner
    }

    pub fn controller(&self) -> &InteractionController<S, C, L> {
        &self.controller
    }

    pub fn client(&self) -> &RequestClient<K> {
        &self.client
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }
}
