//! Async driver wiring the engine to real loads and timers.
//!
//! The surface and scheduler push [`BrowserEvent`]s into one channel; the
//! driver feeds them to the engine one at a time, so the engine itself never
//! needs to be shared across tasks.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::clock::SystemClock;
use crate::config::NavigationConfig;
use crate::error::NavigationError;
use crate::navigation::engine::NavigationEngine;
use crate::navigation::scheduler::TokioScheduler;
use crate::navigation::state::{FetchPhase, FetchState, LoadToken};
use crate::navigation::surface::{HttpSurface, LoadedPage};

/// Signals delivered to the engine.
#[derive(Debug, Clone)]
pub enum BrowserEvent {
    Loaded { token: LoadToken, page: LoadedPage },
    LoadFailed { token: LoadToken, error: String },
    RetryDue { token: LoadToken },
}

pub type HttpEngine = NavigationEngine<HttpSurface, TokioScheduler>;

/// A navigation engine talking to a live gateway.
pub struct Browser {
    engine: HttpEngine,
    events: mpsc::UnboundedReceiver<BrowserEvent>,
}

impl Browser {
    pub fn new(config: &NavigationConfig) -> Result<Self, NavigationError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let surface = HttpSurface::new(config, tx.clone())?;
        let scheduler = TokioScheduler::new(tx);
        let engine = NavigationEngine::new(config, surface, scheduler, Arc::new(SystemClock));

        Ok(Self { engine, events: rx })
    }

    pub fn engine(&self) -> &HttpEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut HttpEngine {
        &mut self.engine
    }

    /// Wait for the next event and apply it. Returns `false` once no more
    /// events can arrive.
    pub async fn step(&mut self) -> bool {
        let Some(event) = self.events.recv().await else {
            return false;
        };

        match event {
            BrowserEvent::Loaded { token, page } => self.engine.on_loaded(token, page),
            BrowserEvent::LoadFailed { token, error } => self.engine.on_load_failed(token, error),
            BrowserEvent::RetryDue { token } => self.engine.on_retry_due(token),
        };
        true
    }

    /// Process events until the navigation is `Loaded`, `Failed` or `Idle`.
    pub async fn settle(&mut self) -> &FetchState {
        while matches!(
            self.engine.state().phase,
            FetchPhase::Loading | FetchPhase::Retrying
        ) {
            if !self.step().await {
                break;
            }
        }
        self.engine.state()
    }
}

impl std::fmt::Debug for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser").field("engine", &self.engine).finish()
    }
}
