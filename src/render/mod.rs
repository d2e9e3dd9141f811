//! Frame-grid rendering of a [`CompositionTimeline`](crate::compose::timeline::CompositionTimeline).

/// Sequential and parallel render loops feeding a [`FrameSink`](crate::encode::sink::FrameSink).
pub mod driver;
