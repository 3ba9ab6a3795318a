/// Convenience result type used across montage.
pub type MontageResult<T> = Result<T, MontageError>;

/// Top-level error taxonomy used by planning, resolution and rendering APIs.
///
/// Positions are 0-based indices into the clip/transition sequence.
#[derive(thiserror::Error, Debug)]
pub enum MontageError {
    /// A crossfade or clip duration was zero, negative or not finite.
    #[error("invalid duration: expected a positive number of seconds, got {duration}")]
    InvalidDuration {
        /// Offending value in seconds.
        duration: f64,
    },

    /// Eager existence checking rejected a clip reference.
    #[error("clip not found: '{identifier}'")]
    ClipNotFound {
        /// Clip identifier as given by the caller.
        identifier: String,
    },

    /// The sequence holds no items.
    #[error("empty plan: at least one clip is required")]
    EmptyPlan,

    /// The sequence does not begin with a clip.
    #[error("invalid start: sequence must begin with a clip, found a transition at position {position}")]
    InvalidStart {
        /// Position of the leading transition.
        position: usize,
    },

    /// Two clips or two transitions are adjacent.
    #[error("alternation violated at position {position}: {found} follows another {found}")]
    Alternation {
        /// Position of the second of the two adjacent items.
        position: usize,
        /// Either `"clip"` or `"transition"`.
        found: &'static str,
    },

    /// Freezing was attempted before an output target was set.
    #[error("missing output target: set an output before freezing the plan")]
    MissingOutputTarget,

    /// A compress crossfade would consume a whole neighbouring clip.
    #[error(
        "transition at position {position} lasts {duration}s but clip '{identifier}' is only {clip_duration}s long"
    )]
    TransitionDurationExceedsClip {
        /// Position of the offending transition.
        position: usize,
        /// Clip whose length the transition does not fit in.
        identifier: String,
        /// Crossfade duration (or combined crossfade durations) in seconds.
        duration: f64,
        /// Resolved clip duration in seconds.
        clip_duration: f64,
    },

    /// A transition is not followed by a clip.
    #[error("dangling transition at position {position}: no clip follows it")]
    DanglingTransition {
        /// Position of the trailing transition.
        position: usize,
    },

    /// The duration resolver could not produce a duration.
    #[error("duration unavailable for '{identifier}': {cause}")]
    DurationUnavailable {
        /// Clip identifier passed to the resolver.
        identifier: String,
        /// Resolver diagnostic.
        cause: String,
    },

    /// Mutation was attempted on a frozen plan.
    #[error("plan is frozen: no further modifications allowed")]
    PlanFrozen,

    /// A render plan was requested from a plan that was never frozen.
    #[error("plan is not frozen: freeze it before deriving a render plan")]
    PlanNotFrozen,

    /// `commit` was called on a plan that already rendered.
    #[error("plan already executed: refusing to render twice")]
    AlreadyExecuted,

    /// The renderer collaborator failed.
    #[error("render failure: {0}")]
    RenderFailure(String),

    /// Invalid configuration or textual input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MontageError {
    /// Build a [`MontageError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MontageError::RenderFailure`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::RenderFailure(msg.into())
    }

    /// Build a [`MontageError::DurationUnavailable`] value.
    pub fn duration_unavailable(identifier: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::DurationUnavailable {
            identifier: identifier.into(),
            cause: cause.into(),
        }
    }

    /// Sequence position the error refers to, when it has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::InvalidStart { position }
            | Self::Alternation { position, .. }
            | Self::TransitionDurationExceedsClip { position, .. }
            | Self::DanglingTransition { position } => Some(*position),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
