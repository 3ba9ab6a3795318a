//! Sequence data model, fluent builder and text/JSON inputs.

/// Fluent sequence builder.
pub mod builder;
/// Clip and transition types.
pub mod model;
/// Crossfade lists and JSON timeline documents.
pub mod parse;
