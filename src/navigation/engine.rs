//! Navigation state machine.
//!
//! # States
//! - Idle: nothing requested yet, or the engine was cancelled
//! - Loading: a load is in flight under the current token
//! - Loaded: the last load delivered content
//! - Retrying: a retry of the same URL is scheduled
//! - Failed: retries are exhausted or the error is not retryable
//!
//! # State Transitions
//! ```text
//! any → Loading: explicit navigation (resets the attempt count)
//! Loading → Loaded: content delivered
//! Loading → Retrying: transport failure within budget (attempt count + 1)
//! Loading → Retrying: rate-limit body with a cooldown (attempt count unchanged)
//! Loading → Failed: budget spent, or a non-retryable gateway error
//! Retrying → Loading: the scheduled retry fires
//! ```
//!
//! # Design Decisions
//! - Every issued load gets a fresh token; signals for any other token are
//!   discarded, so the most recent navigation always wins
//! - At most one retry is pending; issuing a load cancels it
//! - Dropping the engine cancels the pending retry

use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::NavigationConfig;
use crate::navigation::history::History;
use crate::navigation::omnibox::{resolve_input, suggestions};
use crate::navigation::scheduler::RetryScheduler;
use crate::navigation::state::{FailureReport, FetchPhase, FetchState, LoadError, LoadToken};
use crate::navigation::surface::{LoadSurface, LoadedPage};
use crate::resilience::{RetryDecision, RetryPolicy};

pub struct NavigationEngine<L: LoadSurface, S: RetryScheduler> {
    surface: L,
    scheduler: S,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    home_url: String,
    search_url: String,
    history: History,
    state: FetchState,
    token: LoadToken,
    pending: Option<S::Handle>,
    failure: Option<FailureReport>,
    last_page: Option<LoadedPage>,
}

impl<L: LoadSurface, S: RetryScheduler> NavigationEngine<L, S> {
    pub fn new(config: &NavigationConfig, surface: L, scheduler: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            surface,
            scheduler,
            clock,
            policy: RetryPolicy::from_config(config),
            home_url: config.home_url.clone(),
            search_url: config.search_url.clone(),
            history: History::new(),
            state: FetchState::default(),
            token: LoadToken::default(),
            pending: None,
            failure: None,
            last_page: None,
        }
    }

    /// Address bar submission. Blank input is ignored.
    pub fn submit(&mut self, input: &str) -> Option<LoadToken> {
        let url = resolve_input(input, &self.search_url)?;
        Some(self.open(url))
    }

    /// Navigate to `url`, appending it to history.
    pub fn open(&mut self, url: impl Into<String>) -> LoadToken {
        let url = url.into();
        self.history.push(url.clone());
        self.navigate(url)
    }

    pub fn home(&mut self) -> LoadToken {
        let home = self.home_url.clone();
        self.open(home)
    }

    /// Reload the previous history entry, if there is one.
    pub fn back(&mut self) -> Option<LoadToken> {
        let url = self.history.back()?.to_string();
        Some(self.navigate(url))
    }

    pub fn forward(&mut self) -> Option<LoadToken> {
        let url = self.history.forward()?.to_string();
        Some(self.navigate(url))
    }

    /// Reload the current entry with a fresh retry budget.
    pub fn refresh(&mut self) -> Option<LoadToken> {
        let url = self.history.current()?.to_string();
        Some(self.navigate(url))
    }

    /// Content arrived for `token`. Returns whether the signal was applied.
    pub fn on_loaded(&mut self, token: LoadToken, page: LoadedPage) -> bool {
        if !self.is_current(token, FetchPhase::Loading) {
            return false;
        }

        if let Some(body) = page.gateway_error() {
            let decision = self.policy.on_gateway_error(&body, self.state.attempt_count);
            self.apply(decision, LoadError::Gateway(body));
            return true;
        }

        self.state.phase = FetchPhase::Loaded;
        self.state.attempt_count = 0;
        self.state.last_error = None;
        self.failure = None;
        tracing::debug!(token = %token, status = page.status, "Page loaded");
        self.last_page = Some(page);
        true
    }

    /// The load for `token` failed before content arrived.
    pub fn on_load_failed(&mut self, token: LoadToken, error: impl Into<String>) -> bool {
        if !self.is_current(token, FetchPhase::Loading) {
            return false;
        }

        let decision = self.policy.on_transport_failure(self.state.attempt_count);
        self.apply(decision, LoadError::Transport(error.into()));
        true
    }

    /// The retry scheduled for `token` is due.
    pub fn on_retry_due(&mut self, token: LoadToken) -> bool {
        if !self.is_current(token, FetchPhase::Retrying) {
            return false;
        }

        self.pending = None;
        match self.state.url.clone() {
            Some(url) => {
                tracing::debug!(token = %token, attempt = self.state.attempt_count, "Retrying load");
                self.issue(url);
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Report for the terminal failure of the current navigation.
    pub fn failure(&self) -> Option<&FailureReport> {
        self.failure.as_ref()
    }

    /// Content delivered by the most recent successful load.
    pub fn last_page(&self) -> Option<&LoadedPage> {
        self.last_page.as_ref()
    }

    /// Time left before the pending retry fires.
    pub fn retry_remaining(&self) -> Option<Duration> {
        if self.state.phase != FetchPhase::Retrying {
            return None;
        }
        let deadline = self.state.retry_deadline_ms?;
        Some(Duration::from_millis(
            deadline.saturating_sub(self.clock.now_ms()),
        ))
    }

    /// Token of the most recently issued load.
    pub fn current_token(&self) -> LoadToken {
        self.token
    }

    /// Stop everything: cancel the pending retry, abandon the in-flight load
    /// and ignore any signal already on its way.
    pub fn cancel(&mut self) {
        self.cancel_pending();
        self.surface.abort();
        self.token = LoadToken(self.token.0 + 1);
        self.state.phase = FetchPhase::Idle;
        self.state.retry_deadline_ms = None;
    }

    /// Explicit navigation: fresh attempt budget, supersedes everything.
    fn navigate(&mut self, url: String) -> LoadToken {
        self.state.attempt_count = 0;
        self.state.last_error = None;
        self.failure = None;
        self.last_page = None;
        self.issue(url)
    }

    fn issue(&mut self, url: String) -> LoadToken {
        self.cancel_pending();
        self.token = LoadToken(self.token.0 + 1);
        let token = self.token;

        self.state.phase = FetchPhase::Loading;
        self.state.retry_deadline_ms = None;
        self.state.url = Some(url.clone());

        tracing::debug!(token = %token, url = %url, "Loading");
        self.surface.load(&url, token);
        token
    }

    fn apply(&mut self, decision: RetryDecision, error: LoadError) {
        match decision {
            RetryDecision::Backoff(delay) => {
                self.state.attempt_count += 1;
                self.schedule_retry(delay, error);
            }
            RetryDecision::Cooldown(delay) => self.schedule_retry(delay, error),
            RetryDecision::GiveUp => self.fail(error),
        }
    }

    fn schedule_retry(&mut self, delay: Duration, error: LoadError) {
        tracing::info!(
            token = %self.token,
            attempt = self.state.attempt_count,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Scheduling retry"
        );
        self.state.phase = FetchPhase::Retrying;
        self.state.last_error = Some(error);
        self.state.retry_deadline_ms = Some(
            self.clock
                .now_ms()
                .saturating_add(delay.as_millis() as u64),
        );
        self.pending = Some(self.scheduler.schedule(delay, self.token));
    }

    fn fail(&mut self, error: LoadError) {
        let (message, details) = match &error {
            LoadError::Transport(cause) => (
                format!(
                    "Failed to load the page after {} attempts",
                    self.state.attempt_count + 1
                ),
                cause.clone(),
            ),
            LoadError::Gateway(body) => (body.error.clone(), body.details.clone()),
        };
        tracing::warn!(token = %self.token, error = %error, "Navigation failed");

        self.state.phase = FetchPhase::Failed;
        self.state.retry_deadline_ms = None;
        self.state.last_error = Some(error);
        self.failure = Some(FailureReport {
            message,
            details,
            suggestions: suggestions(),
        });
    }

    fn is_current(&self, token: LoadToken, phase: FetchPhase) -> bool {
        let current = token == self.token && self.state.phase == phase;
        if !current {
            tracing::debug!(
                token = %token,
                current = %self.token,
                phase = ?self.state.phase,
                "Discarding stale signal"
            );
        }
        current
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }
}

impl<L: LoadSurface, S: RetryScheduler> Drop for NavigationEngine<L, S> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

impl<L: LoadSurface, S: RetryScheduler> std::fmt::Debug for NavigationEngine<L, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationEngine")
            .field("state", &self.state)
            .field("history", &self.history)
            .field("token", &self.token)
            .finish()
    }
}
