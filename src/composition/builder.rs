use std::path::Path;

use crate::{
    compile::graph::{RenderPlan, derive_render_plan},
    compile::preview::graph_preview,
    composition::model::{
        ClipRef, Crossfade, CrossfadePolicy, ExtendStyle, SequenceItem, TransitionSpec,
    },
    foundation::error::{MontageError, MontageResult},
    plan::state::{Plan, PlanState},
    plan::timeline::{TimelineEntry, walk_timeline},
    render::renderer::Renderer,
    resolve::resolver::DurationResolver,
};

/// Builder behaviour switches.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuilderOptions {
    /// Reject clips whose identifier is not an existing file at append time.
    pub check_existence: bool,
}

/// Read-only preview returned by [`SequenceBuilder::describe`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Description {
    /// Output identifier.
    pub output: String,
    /// Planned output duration in seconds.
    pub total_duration: f64,
    /// Per-item timeline, with probed clip durations.
    pub items: Vec<TimelineEntry>,
    /// Derived render plan.
    pub render_plan: RenderPlan,
    /// Text outline of the render plan.
    pub graph_preview: String,
}

/// Result of a successful [`SequenceBuilder::commit`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CommitOutcome {
    /// Output identifier reported by the renderer.
    pub output: String,
    /// Duration the plan predicted.
    pub planned_duration: f64,
    /// Duration the renderer measured.
    pub actual_duration: f64,
    /// Output size in bytes.
    pub actual_size_bytes: u64,
}

/// Chaining front end over [`Plan`].
///
/// ```
/// use montage::{CrossfadePolicy, RecordingRenderer, SequenceBuilder, StaticResolver};
///
/// let resolver = StaticResolver::new().with("a.mp4", 10.0).with("b.mp4", 15.0);
/// let mut builder = SequenceBuilder::new(resolver);
/// builder
///     .append_clip("a.mp4")?
///     .append_crossfade(2.0, CrossfadePolicy::Compress)?
///     .append_clip("b.mp4")?
///     .set_output_target("out.mp4")?;
///
/// assert_eq!(builder.describe()?.total_duration, 23.0);
/// let outcome = builder.commit(&mut RecordingRenderer::new())?;
/// assert_eq!(outcome.output, "out.mp4");
/// # Ok::<(), montage::MontageError>(())
/// ```
#[derive(Debug)]
pub struct SequenceBuilder<R> {
    plan: Plan,
    resolver: R,
    options: BuilderOptions,
}

impl<R: DurationResolver> SequenceBuilder<R> {
    /// Empty builder resolving clip durations through `resolver`.
    pub fn new(resolver: R) -> Self {
        Self::with_options(resolver, BuilderOptions::default())
    }

    /// Empty builder with explicit options.
    pub fn with_options(resolver: R, options: BuilderOptions) -> Self {
        Self {
            plan: Plan::new(),
            resolver,
            options,
        }
    }

    /// Underlying plan.
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Resolver in use.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Append an unresolved clip.
    pub fn append_clip(&mut self, identifier: impl Into<String>) -> MontageResult<&mut Self> {
        self.append_item(ClipRef::new(identifier)?.into())
    }

    /// Append a hard cut.
    pub fn append_cut(&mut self) -> MontageResult<&mut Self> {
        self.append_item(TransitionSpec::Cut.into())
    }

    /// Append a `fade` crossfade of `duration` seconds.
    pub fn append_crossfade(
        &mut self,
        duration: f64,
        policy: CrossfadePolicy,
    ) -> MontageResult<&mut Self> {
        self.append_crossfade_with(Crossfade::new(duration)?, policy)
    }

    /// Append a crossfade with explicit parameters.
    pub fn append_crossfade_with(
        &mut self,
        crossfade: Crossfade,
        policy: CrossfadePolicy,
    ) -> MontageResult<&mut Self> {
        self.append_item(TransitionSpec::crossfade(crossfade, policy).into())
    }

    /// Append any item through the same checks as the typed methods.
    pub fn append_item(&mut self, item: SequenceItem) -> MontageResult<&mut Self> {
        self.plan.ensure_building()?;
        if let SequenceItem::Clip(clip) = &item
            && self.options.check_existence
            && !Path::new(clip.identifier()).exists()
        {
            return Err(MontageError::ClipNotFound {
                identifier: clip.identifier().to_string(),
            });
        }
        match item {
            SequenceItem::Clip(clip) => self.plan.append_clip(clip)?,
            SequenceItem::Transition(spec) => self.plan.append_transition(spec)?,
        }
        Ok(self)
    }

    /// Set the output identifier.
    pub fn set_output_target(&mut self, identifier: impl Into<String>) -> MontageResult<&mut Self> {
        self.plan.set_output_target(identifier)?;
        Ok(self)
    }

    /// Choose how extend crossfades look.
    pub fn set_extend_style(&mut self, style: ExtendStyle) -> MontageResult<&mut Self> {
        self.plan.set_extend_style(style)?;
        Ok(self)
    }

    /// Freeze the underlying plan (no-op when already frozen).
    pub fn freeze(&mut self) -> MontageResult<&mut Self> {
        self.plan.freeze(&mut self.resolver)?;
        Ok(self)
    }

    /// Preview the plan without rendering.
    ///
    /// The builder keeps its state: a frozen copy is described, and a building plan stays open
    /// for appends. Durations resolved for the preview are kept, so no clip is resolved twice
    /// across `describe` and `commit`.
    pub fn describe(&mut self) -> MontageResult<Description> {
        let mut preview = self.plan.clone();
        preview.freeze(&mut self.resolver)?;
        self.plan.adopt_durations(&preview);

        let timeline = walk_timeline(preview.items(), None)?;
        let render_plan = derive_render_plan(&preview)?;
        Ok(Description {
            output: render_plan.output_target.clone(),
            total_duration: timeline.total_duration,
            items: timeline.entries,
            graph_preview: graph_preview(&render_plan),
            render_plan,
        })
    }

    /// Freeze, derive and hand the render plan to `renderer`.
    ///
    /// A plan renders at most once: later calls fail with [`MontageError::AlreadyExecuted`]. A
    /// renderer failure is returned unchanged and leaves the plan frozen.
    pub fn commit(&mut self, renderer: &mut dyn Renderer) -> MontageResult<CommitOutcome> {
        if self.plan.state() == PlanState::Executed {
            return Err(MontageError::AlreadyExecuted);
        }
        self.freeze()?;
        let render_plan = derive_render_plan(&self.plan)?;
        let outcome = renderer.render(&render_plan)?;
        self.plan.mark_executed()?;

        let planned_duration = render_plan.total_duration;
        tracing::info!(
            output = %outcome.output,
            planned_duration,
            actual_duration = outcome.actual_duration,
            drift = outcome.actual_duration - planned_duration,
            size_bytes = outcome.actual_size_bytes,
            "render committed"
        );
        Ok(CommitOutcome {
            output: outcome.output,
            planned_duration,
            actual_duration: outcome.actual_duration,
            actual_size_bytes: outcome.actual_size_bytes,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/builder.rs"]
mod tests;
