//! Montage plans video timelines built from clips joined by cuts and crossfades.
//!
//! Crossfades account for their duration in one of two ways: `compress` shortens the outgoing clip
//! so the output loses the crossfade length, `extend` keeps both clips whole so the output gains
//! it. The crate turns a sequence into a validated plan, computes exact durations, and derives
//! the segment/transition graph a renderer executes:
//!
//! - Accumulate clips and transitions with a [`SequenceBuilder`] (or a [`Plan`] directly)
//! - Freeze the plan, resolving every clip duration once through a [`DurationResolver`]
//! - [`describe`](SequenceBuilder::describe) the result, or [`commit`](SequenceBuilder::commit)
//!   it to a [`Renderer`] such as [`FfmpegRenderer`]
#![forbid(unsafe_code)]

mod foundation;

/// Frozen plan → render plan.
pub mod compile;
/// Sequence model, builder and inputs.
pub mod composition;
/// Validation, duration arithmetic and the plan lifecycle.
pub mod plan;
/// Renderer collaborator.
pub mod render;
/// Duration resolvers.
pub mod resolve;

pub use crate::foundation::error::{MontageError, MontageResult};
pub use crate::foundation::time::{EPSILON, approx_eq, fmt_secs, positive_seconds};

pub use crate::compile::graph::{
    RenderNode, RenderPlan, SegmentNode, TransitionNode, derive_render_plan,
};
pub use crate::compile::preview::graph_preview;
pub use crate::composition::builder::{
    BuilderOptions, CommitOutcome, Description, SequenceBuilder,
};
pub use crate::composition::model::{
    ClipRef, Crossfade, CrossfadeEffect, CrossfadePolicy, ExtendStyle, SequenceItem,
    TransitionSpec,
};
pub use crate::composition::parse::{TimelineDoc, parse_crossfade_list, sequence_from_clips};
pub use crate::plan::state::{Plan, PlanState};
pub use crate::plan::timeline::{Timeline, TimelineEntry, total_duration, walk_timeline};
pub use crate::plan::validate::{validate_structure, validate_transition_fit};
pub use crate::render::ffmpeg::{EncodeConfig, EncoderSelection, FallbackPolicy, FfmpegRenderer};
pub use crate::render::hwaccel::{EncoderChoice, HostOs, detect_encoder, select_encoder};
pub use crate::render::renderer::{RecordingRenderer, RenderOutcome, Renderer};
pub use crate::resolve::ffprobe::FfprobeResolver;
pub use crate::resolve::resolver::{CachingResolver, DurationResolver, StaticResolver};
