//! Client-side navigation subsystem.
//!
//! # Data Flow
//! ```text
//! address bar / back / forward / home
//!     → omnibox.rs (free text → URL)
//!     → engine.rs (history.rs push, new token, FetchState → Loading)
//!     → surface.rs (load through the gateway)
//!     → driver.rs (events: loaded, failed, retry due)
//!     → engine.rs (Loaded | Retrying via scheduler.rs | Failed)
//! ```
//!
//! # Design Decisions
//! - The engine is synchronous and owns its state; time and I/O come in
//!   through the surface, scheduler and clock it is given
//! - One navigation at a time; the latest one wins

pub mod driver;
pub mod engine;
pub mod history;
pub mod omnibox;
pub mod scheduler;
pub mod state;
pub mod surface;

pub use driver::{Browser, BrowserEvent};
pub use engine::NavigationEngine;
pub use history::History;
pub use omnibox::{resolve_input, suggestions, Suggestion};
pub use scheduler::{RetryScheduler, TokioScheduler};
pub use state::{FailureReport, FetchPhase, FetchState, LoadError, LoadToken};
pub use surface::{HttpSurface, LoadSurface, LoadedPage};
