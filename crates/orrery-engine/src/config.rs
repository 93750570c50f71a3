//! Engine configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Immutable engine configuration, passed in at construction
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Tick rate in ticks per second
    pub clock_rate: f64,
    /// Sink endpoint; `None` configures a no-op sink
    pub sink: Option<SocketAddr>,
    /// Auto-pause once the logical position exceeds this many seconds
    pub end_time: Option<f64>,
    /// Start ticking as soon as the engine is built
    pub autostart: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            // 24 frames per beat at 120 beats per minute
            clock_rate: 48.0,
            sink: None,
            end_time: None,
            autostart: false,
        }
    }
}

impl EngineConfig {
    /// One tick of logical time
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.clock_rate)
    }
}
