//! Sequence validation, duration arithmetic and the plan lifecycle.

/// `Plan` and its lifecycle.
pub mod state;
/// Duration fold over a clip/transition sequence.
pub mod timeline;
/// Structural and transition-fit checks.
pub mod validate;
