//! Clip duration resolution.

/// `ffprobe`-backed resolver.
pub mod ffprobe;
/// Resolver trait and in-process resolvers.
pub mod resolver;
