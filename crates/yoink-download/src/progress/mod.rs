//! Progress throttling.
//!
//! Rate-limits per-job progress notifications so observers are not
//! flooded by fetchers that report every few kilobytes.

mod throttle;

pub use throttle::ProgressThrottle;
