//! Frozen plan → render plan.

/// Render plan nodes and the deriver.
pub mod graph;
/// Text outline of a render plan.
pub mod preview;
