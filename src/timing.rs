//! Stage timing.

use std::time::Instant;

use tracing::info;

/// Measures one pipeline stage and logs its duration when finished.
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    /// Log the elapsed time and return it in seconds.
    pub fn finish(self) -> f64 {
        let secs = self.start.elapsed().as_secs_f64();
        if secs >= 60.0 {
            info!(elapsed = %format!("{:.1}m", secs / 60.0), "{}", self.name);
        } else {
            info!(elapsed = %format!("{:.1}s", secs), "{}", self.name);
        }
        secs
    }
}
