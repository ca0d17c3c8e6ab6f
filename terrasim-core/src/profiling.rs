//! Tracy profiling support.
//!
//! With the `tracy` feature enabled, the `tracing` spans on the tick
//! functions are reported to Tracy. Call [`init_tracy()`] early in main,
//! then connect the Tracy GUI or capture tool.
//!
//! Every [`crate::step::Economy::advance`] ends with a frame marker so ticks
//! show as frames in the timeline.

/// Trace level for Tracy profiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraceLevel {
    /// Only INFO spans (lowest overhead)
    #[default]
    Info,
    Debug,
    /// Every span, including per-event activation
    Trace,
}

impl std::str::FromStr for TraceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(TraceLevel::Info),
            "debug" => Ok(TraceLevel::Debug),
            "trace" => Ok(TraceLevel::Trace),
            _ => Err(format!(
                "Invalid trace level: {}. Use info, debug, or trace.",
                s
            )),
        }
    }
}

/// Install the Tracy subscriber. No-op without the `tracy` feature.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
#[cfg(feature = "tracy")]
pub fn init_tracy(level: TraceLevel) {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;

    let filter = match level {
        TraceLevel::Info => LevelFilter::INFO,
        TraceLevel::Debug => LevelFilter::DEBUG,
        TraceLevel::Trace => LevelFilter::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_tracy::TracyLayer::default())
        .with(filter)
        .init();
}

#[cfg(not(feature = "tracy"))]
pub fn init_tracy(_level: TraceLevel) {}

/// Mark the end of one economy tick.
#[cfg(feature = "tracy")]
#[inline]
pub fn frame_mark_tick() {
    tracy_client::secondary_frame_mark!("tick");
}

#[cfg(not(feature = "tracy"))]
#[inline]
pub fn frame_mark_tick() {}
