//! # Terrasim Core
//!
//! Per-tick resource production and event modifiers for one territory.
//!
//! Each tick the scheduler retires expired events, raises every event
//! group's trigger chance and rolls for new events; then every building and
//! the territory base income produce, scaled by the modifiers the active
//! events contributed.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌────────────────┐     ┌───────────────┐
//! │  Scenario   │────▶│    Economy     │────▶│ EventScheduler│
//! │  (JSON)     │     │  (advance)     │     │ (roll/expire) │
//! └─────────────┘     └───────┬────────┘     └───────┬───────┘
//!                             │                      │ effects
//!                     ┌───────▼────────┐     ┌───────▼───────┐
//!                     │ BuildingCatalog│◀───▶│ ModifierTable │
//!                     │ ResourceLedger │     └───────────────┘
//!                     └───────┬────────┘
//!                     ┌───────▼────────┐
//!                     │   Observers    │
//!                     └────────────────┘
//! ```
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Economy`] | Session aggregate; one [`Economy::advance`] per tick |
//! | [`EventScheduler`] | Group percentages, active-event slots, modifiers |
//! | [`EffectKind`] | Closed set of event effects with exact inverses |
//! | [`RandomSource`] | The single injectable generator |
//! | [`Scenario`] | Designer data, validated at load |
//!
//! Runs are deterministic for a given scenario and [`SeededRandom`] seed.

pub mod buildings;
pub mod config;
pub mod effects;
pub mod events;
pub mod modifiers;
pub mod observer;
pub mod profiling;
pub mod resources;
pub mod rng;
pub mod scenario;
pub mod scheduler;
pub mod state;
pub mod step;
pub mod testing;

pub use buildings::{
    BuildingCatalog, BuildingCategory, BuildingDef, BuildingEntry, BuildingError,
    BuildingRegistry, BuildingState,
};
pub use config::{BalanceConfig, ConfigError};
pub use effects::{Effect, EffectError, EffectKind, EffectTarget};
pub use events::{ActiveEvent, Condition, EventDef, EventGroupDef, EventGroupState};
pub use modifiers::{Modifier, ModifierScope, ModifierTable};
pub use observer::console::ConsoleObserver;
pub use observer::event_log::EventLogObserver;
pub use observer::{EconomyObserver, ObserverConfig, ObserverError, ObserverRegistry};
pub use resources::{ResourceAmount, ResourceKind, ResourceLedger};
pub use rng::{RandomSource, SeededRandom};
pub use scenario::Scenario;
pub use scheduler::{EventScheduler, SchedulerError, SchedulerEvent, TickContext};
pub use state::{Date, EconomySnapshot};
pub use step::{Economy, SessionBuilder, TickReport};
