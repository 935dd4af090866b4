//! Encoding sinks.
//!
//! Sinks consume rendered frames in animation order and are driven by
//! [`build_animation`](crate::animate::build_animation).

/// Animated GIF output.
pub mod gif;
/// Frame sink trait and the in-memory sink.
pub mod sink;
