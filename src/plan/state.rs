use crate::{
    composition::model::{ClipRef, ExtendStyle, SequenceItem, TransitionSpec},
    foundation::error::{MontageError, MontageResult},
    plan::timeline::{Timeline, clip_duration, walk_timeline},
    plan::validate::{check_append, validate_structure, validate_transition_fit},
    resolve::resolver::DurationResolver,
};

/// Lifecycle of a [`Plan`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanState {
    /// Items may be appended.
    #[default]
    Building,
    /// Validated and duration-resolved; immutable.
    Frozen,
    /// A render plan was handed to a renderer and completed.
    Executed,
}

/// Ordered clip/transition sequence plus its output target.
///
/// A plan starts in [`PlanState::Building`]. [`Plan::freeze`] validates it and resolves every clip
/// duration; afterwards every mutation fails with [`MontageError::PlanFrozen`].
#[derive(Clone, Debug, Default)]
pub struct Plan {
    items: Vec<SequenceItem>,
    output_target: Option<String>,
    extend_style: ExtendStyle,
    state: PlanState,
}

impl Plan {
    /// Empty plan in the building state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a plan by appending `items` one at a time.
    pub fn from_items(items: impl IntoIterator<Item = SequenceItem>) -> MontageResult<Self> {
        let mut plan = Self::new();
        for item in items {
            plan.push(item)?;
        }
        Ok(plan)
    }

    /// Items in sequence order.
    pub fn items(&self) -> &[SequenceItem] {
        &self.items
    }

    /// Output target, if set.
    pub fn output_target(&self) -> Option<&str> {
        self.output_target.as_deref()
    }

    /// Look of extend crossfades.
    pub fn extend_style(&self) -> ExtendStyle {
        self.extend_style
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PlanState {
        self.state
    }

    /// `true` once the plan left the building state.
    pub fn is_frozen(&self) -> bool {
        self.state != PlanState::Building
    }

    /// Append a clip.
    pub fn append_clip(&mut self, clip: ClipRef) -> MontageResult<()> {
        self.push(SequenceItem::Clip(clip))
    }

    /// Append a transition; the sequence must end with a clip.
    pub fn append_transition(&mut self, spec: TransitionSpec) -> MontageResult<()> {
        self.push(SequenceItem::Transition(spec))
    }

    /// Set the output identifier handed to the renderer.
    pub fn set_output_target(&mut self, target: impl Into<String>) -> MontageResult<()> {
        self.ensure_building()?;
        let target = target.into();
        if target.trim().is_empty() {
            return Err(MontageError::MissingOutputTarget);
        }
        self.output_target = Some(target);
        Ok(())
    }

    /// Choose how extend crossfades look. Durations do not change.
    pub fn set_extend_style(&mut self, style: ExtendStyle) -> MontageResult<()> {
        self.ensure_building()?;
        self.extend_style = style;
        Ok(())
    }

    /// Validate the sequence and resolve every unresolved clip duration.
    ///
    /// Clips are resolved once each, strictly in sequence order. Nothing is written back unless
    /// every clip resolved and every check passed. Calling `freeze` on a frozen plan is a no-op.
    #[tracing::instrument(skip(self, resolver), fields(items = self.items.len()))]
    pub fn freeze(&mut self, resolver: &mut dyn DurationResolver) -> MontageResult<()> {
        if self.is_frozen() {
            return Ok(());
        }

        validate_structure(&self.items)?;
        if self.output_target.is_none() {
            return Err(MontageError::MissingOutputTarget);
        }

        let mut staged = self.items.clone();
        for (position, item) in staged.iter_mut().enumerate() {
            let SequenceItem::Clip(clip) = item else {
                continue;
            };
            if clip.is_resolved() {
                continue;
            }
            let duration = clip_duration(clip, Some(&mut *resolver))?;
            tracing::debug!(position, identifier = clip.identifier(), duration, "resolved clip");
            clip.resolve_once(duration);
        }
        validate_transition_fit(&staged)?;

        self.items = staged;
        self.state = PlanState::Frozen;
        Ok(())
    }

    /// Output duration of the sequence; every clip must already be resolved.
    pub fn total_duration(&self) -> MontageResult<f64> {
        Ok(self.timeline()?.total_duration)
    }

    /// Per-item duration breakdown; every clip must already be resolved.
    pub fn timeline(&self) -> MontageResult<Timeline> {
        walk_timeline(&self.items, None)
    }

    /// Take over durations resolved in `frozen`, a frozen copy of this plan (or of a prefix of
    /// it). Only unresolved clips with the same identifier at the same position are filled.
    pub(crate) fn adopt_durations(&mut self, frozen: &Plan) {
        for (mine, theirs) in self.items.iter_mut().zip(frozen.items()) {
            if let (SequenceItem::Clip(mine), SequenceItem::Clip(theirs)) = (mine, theirs)
                && !mine.is_resolved()
                && mine.identifier() == theirs.identifier()
                && let Some(duration) = theirs.resolved_duration()
            {
                mine.resolve_once(duration);
            }
        }
    }

    pub(crate) fn ensure_building(&self) -> MontageResult<()> {
        if self.is_frozen() {
            return Err(MontageError::PlanFrozen);
        }
        Ok(())
    }

    pub(crate) fn mark_executed(&mut self) -> MontageResult<()> {
        match self.state {
            PlanState::Building => Err(MontageError::PlanNotFrozen),
            PlanState::Frozen => {
                self.state = PlanState::Executed;
                Ok(())
            }
            PlanState::Executed => Err(MontageError::AlreadyExecuted),
        }
    }

    fn push(&mut self, item: SequenceItem) -> MontageResult<()> {
        self.ensure_building()?;
        check_append(&self.items, &item)?;
        self.items.push(item);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/state.rs"]
mod tests;
