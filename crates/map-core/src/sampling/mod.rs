//! Live measurement sampling
//!
//! A run records exactly [`SAMPLE_COUNT`](crate::config::SAMPLE_COUNT)
//! intensity values spread evenly over the configured duration. The
//! [`SampleBuffer`] decides when a sample is due, [`PlotSurface`] maps samples
//! to pixels, and [`TrendGeometry`] turns an externally supplied slope into a
//! two-segment indicator line.

mod buffer;
mod plot;
mod trend;

pub use buffer::SampleBuffer;
pub use plot::PlotSurface;
pub use trend::{TrendEndpoints, TrendGeometry};
