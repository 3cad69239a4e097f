use crate::affordance::Affordance;
use crate::page::HostPage;
use crate::processed::ProcessedSet;
use crate::selectors::SelectorChain;
use engagement_engine::extract_count;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use xbird_core::{Post, PostId, ScanConfig, ScanError};

/// Outcome of one scan pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub attached: Vec<PostId>,
    /// Candidates passed over: no identifier, already processed, no metrics, too few views.
    pub skipped: usize,
    pub failed: usize,
    /// Pass-level fault; the pass stopped early but later passes run normally.
    pub fault: Option<ScanError>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.fault.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Settling { until: Instant },
}

struct Candidate {
    post: Post,
    view_count: u64,
}

/// Scans the host feed for eligible posts and decides when to scan.
///
/// The trigger logic is sans-IO: callers feed scroll and mutation observations with
/// the instant they happened, sleep until [`ScanEngine::next_deadline`], then call
/// [`ScanEngine::on_deadline`] with the page.
#[derive(Debug)]
pub struct ScanEngine {
    post_selectors: SelectorChain,
    metrics_selectors: SelectorChain,
    permalink_selectors: SelectorChain,
    metrics_attribute: String,
    view_marker: String,
    min_view_count: u64,
    debounce: Duration,
    settle: Duration,

    processed: ProcessedSet,
    location: Option<String>,
    phase: Phase,
    scroll_armed: bool,
    debounce_until: Option<Instant>,
    arm_count: u64,
    pass_count: u64,
}

impl ScanEngine {
    pub fn new(config: &ScanConfig) -> Result<Self, ScanError> {
        Ok(Self {
            post_selectors: SelectorChain::new(config.post_selectors.clone())?,
            metrics_selectors: SelectorChain::new(config.metrics_selectors.clone())?,
            permalink_selectors: SelectorChain::new(config.permalink_selectors.clone())?,
            metrics_attribute: config.metrics_attribute.clone(),
            view_marker: config.view_marker.clone(),
            min_view_count: config.min_view_count,
            debounce: config.debounce(),
            settle: config.settle_delay(),
            processed: ProcessedSet::new(config.processed_capacity),
            location: None,
            phase: Phase::Idle,
            scroll_armed: false,
            debounce_until: None,
            arm_count: 0,
            pass_count: 0,
        })
    }

    /// Initial pass on page load, then arms scroll-triggered scanning.
    pub fn start<P: HostPage>(&mut self, page: &mut P) -> ScanReport {
        self.location = Some(page.location().to_string());
        let report = self.scan(page);
        self.arm_scroll();
        report
    }

    pub fn on_scroll(&mut self, now: Instant) {
        if !self.scroll_armed {
            return;
        }
        self.debounce_until = Some(now + self.debounce);
    }

    /// Reacts to a DOM mutation; only a location change matters.
    pub fn on_mutation(&mut self, location: &str, now: Instant) {
        if self.location.as_deref() == Some(location) {
            return;
        }

        info!("Navigation detected: {}", location);
        self.location = Some(location.to_string());
        self.processed.clear();
        self.scroll_armed = false;
        self.debounce_until = None;
        self.phase = Phase::Settling {
            until: now + self.settle,
        };
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let settle = match self.phase {
            Phase::Settling { until } => Some(until),
            Phase::Idle => None,
        };
        match (settle, self.debounce_until) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Runs whatever work is due at `now`. Returns the report if a pass ran.
    pub fn on_deadline<P: HostPage>(&mut self, now: Instant, page: &mut P) -> Option<ScanReport> {
        if let Phase::Settling { until } = self.phase {
            if until <= now {
                self.phase = Phase::Idle;
                let report = self.scan(page);
                self.arm_scroll();
                return Some(report);
            }
        }

        match self.debounce_until {
            Some(due) if due <= now => {
                self.debounce_until = None;
                Some(self.scan(page))
            }
            _ => None,
        }
    }

    /// Page unload: stop reacting to scroll and forget processed posts.
    pub fn shutdown(&mut self) {
        self.scroll_armed = false;
        self.debounce_until = None;
        self.phase = Phase::Idle;
        self.processed.clear();
        debug!("Scan engine shut down");
    }

    fn arm_scroll(&mut self) {
        self.scroll_armed = true;
        self.arm_count += 1;
    }

    /// One scan pass over the page.
    pub fn scan<P: HostPage>(&mut self, page: &mut P) -> ScanReport {
        self.pass_count += 1;
        let mut report = ScanReport::default();

        let candidates = match self.collect_candidates(&*page, &mut report) {
            Ok(candidates) => candidates,
            Err(fault) => {
                warn!("Scan pass failed: {}", fault);
                report.fault = Some(fault);
                return report;
            }
        };

        for candidate in candidates {
            let id = candidate.post.id.clone();
            match page.append_affordance(Affordance::new(candidate.post, candidate.view_count)) {
                Ok(()) => {
                    self.processed.insert(id.clone());
                    report.attached.push(id);
                }
                Err(e) => {
                    warn!("Skipping post {}: {}", id, e);
                    report.failed += 1;
                }
            }
        }

        if !report.attached.is_empty() {
            info!(
                "Scan pass attached {} affordances ({} skipped)",
                report.attached.len(),
                report.skipped
            );
        }
        report
    }

    fn collect_candidates<P: HostPage>(
        &self,
        page: &P,
        report: &mut ScanReport,
    ) -> Result<Vec<Candidate>, ScanError> {
        let mut candidates = Vec::new();
        let mut seen = HashSet::new();

        for element in self.post_selectors.select_all(page)? {
            match self.candidate_for(page, element, &mut seen) {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    warn!("Skipping post after lookup fault: {}", e);
                    report.failed += 1;
                }
            }
        }

        Ok(candidates)
    }

    /// Inspects one post element. `Ok(None)` means the post is not eligible.
    fn candidate_for<'p, P: HostPage>(
        &self,
        page: &'p P,
        element: P::Element<'p>,
        seen: &mut HashSet<PostId>,
    ) -> Result<Option<Candidate>, ScanError> {
        let id = self
            .permalink_selectors
            .first_within(page, element)?
            .and_then(|link| page.attribute(link, "href"))
            .and_then(|href| PostId::from_permalink(&href));
        let Some(id) = id else {
            return Ok(None);
        };
        if self.processed.contains(&id) || !seen.insert(id.clone()) {
            return Ok(None);
        }

        let Some(metrics) = self.metrics_selectors.first_within(page, element)? else {
            debug!("{}", ScanError::MissingMetrics { post_id: id.to_string() });
            return Ok(None);
        };
        let label = page
            .attribute(metrics, &self.metrics_attribute)
            .unwrap_or_default();

        match extract_count(&label, &self.view_marker) {
            Some(views) if views >= self.min_view_count => Ok(Some(Candidate {
                post: Post {
                    id,
                    text: page.inner_text(element),
                    metrics_label: Some(label),
                },
                view_count: views,
            })),
            views => {
                debug!("Post {} below view threshold ({:?})", id, views);
                Ok(None)
            }
        }
    }

    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn is_scroll_armed(&self) -> bool {
        self.scroll_armed
    }

    pub fn is_settling(&self) -> bool {
        matches!(self.phase, Phase::Settling { .. })
    }

    /// How many times scroll scanning has been armed.
    pub fn arm_count(&self) -> u64 {
        self.arm_count
    }

    pub fn pass_count(&self) -> u64 {
        self.pass_count
    }
}
