//! Observers for economy inspection.
//!
//! Observers get a shared borrow of the [`Economy`] and the [`TickReport`]
//! after each tick. They cannot change the session, so registering one never
//! changes the outcome of a seeded run.
//!
//! ```text
//! EconomyObserver trait
//!        │
//!        ├── ConsoleObserver (periodic ledger summary)
//!        └── EventLogObserver (JSONL of scheduler happenings)
//! ```

pub mod console;
pub mod event_log;

use crate::step::{Economy, TickReport};
use thiserror::Error;

/// Errors that can occur during observation.
#[derive(Error, Debug)]
pub enum ObserverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Rendering/formatting error
    #[error("Render error: {0}")]
    Render(String),
}

/// How often an observer is notified.
#[derive(Clone, Debug)]
pub struct ObserverConfig {
    /// Notify every N ticks (1 = every tick)
    pub frequency: u32,
    /// Always notify on ticks where an event was activated or expired
    pub notify_on_events: bool,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            frequency: 1,
            notify_on_events: false,
        }
    }
}

/// Receives each tick's outcome.
///
/// Errors returned from `on_tick` are logged and do not stop the session.
pub trait EconomyObserver: Send {
    fn on_tick(&self, economy: &Economy, report: &TickReport) -> Result<(), ObserverError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;

    fn config(&self) -> ObserverConfig {
        ObserverConfig::default()
    }

    /// Called when the session ends or the registry is dropped.
    fn on_shutdown(&self) {}
}

/// Owns the registered observers.
pub struct ObserverRegistry {
    observers: Vec<Box<dyn EconomyObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self { observers: vec![] }
    }

    pub fn register(&mut self, observer: Box<dyn EconomyObserver>) {
        log::info!("Registered observer: {}", observer.name());
        self.observers.push(observer);
    }

    /// Notify every observer whose frequency matches this tick.
    pub fn notify(&self, economy: &Economy, report: &TickReport) {
        for observer in &self.observers {
            let config = observer.config();
            let frequency = config.frequency.max(1) as u64;
            let should_notify = report.tick % frequency == 0
                || (config.notify_on_events && !report.events.is_empty());

            if should_notify {
                if let Err(e) = observer.on_tick(economy, report) {
                    log::warn!("Observer '{}' error: {}", observer.name(), e);
                }
            }
        }
    }

    pub fn shutdown(&self) {
        for observer in &self.observers {
            observer.on_shutdown();
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ObserverRegistry {
    fn drop(&mut self) {
        // Flush buffered writers.
        self.shutdown();
    }
}
