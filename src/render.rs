//! Renderer collaborator: trait, in-memory recorder and the `ffmpeg` implementation.

/// `ffmpeg` filter-graph renderer.
pub mod ffmpeg;
/// Hardware encoder selection.
pub mod hwaccel;
/// Renderer trait and the recording renderer.
pub mod renderer;
