//! Per-navigation fetch state.

use std::fmt;

use serde::Serialize;

use crate::error::ErrorBody;
use crate::navigation::omnibox::Suggestion;

/// Phase of the current navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum FetchPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Retrying,
    Failed,
}

/// Identifies one issued load. Signals carrying any other token are stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadToken(pub u64);

impl fmt::Display for LoadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why the last load did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The gateway could not be reached or the transfer broke off.
    Transport(String),
    /// The gateway answered with an error body.
    Gateway(ErrorBody),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Transport(message) => write!(f, "{message}"),
            LoadError::Gateway(body) => write!(f, "{} ({})", body.error, body.kind),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchState {
    pub url: Option<String>,
    pub phase: FetchPhase,
    pub attempt_count: u32,
    pub last_error: Option<LoadError>,
    /// Wall-clock time, in milliseconds, at which the pending retry fires.
    pub retry_deadline_ms: Option<u64>,
}

/// What the user sees once a navigation has failed for good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub message: String,
    pub details: String,
    pub suggestions: Vec<Suggestion>,
}
