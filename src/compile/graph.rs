use crate::{
    composition::model::{
        ClipRef, Crossfade, CrossfadeEffect, CrossfadePolicy, ExtendStyle, SequenceItem,
        TransitionSpec,
    },
    foundation::error::{MontageError, MontageResult},
    plan::state::Plan,
};

/// One input clip placed on the output timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SegmentNode {
    /// Index of the clip among the plan's clips (renderer input index).
    pub input_index: usize,
    /// Clip identifier.
    pub identifier: String,
    /// Resolved source duration in seconds.
    pub source_duration: f64,
    /// Trim window start in seconds (always `0.0`).
    pub trim_start: f64,
    /// Trim window length; `None` plays the clip to its end.
    pub trim_duration: Option<f64>,
}

impl SegmentNode {
    /// Seconds of this clip that play outside any compress crossfade.
    pub fn played_duration(&self) -> f64 {
        self.trim_duration.unwrap_or(self.source_duration)
    }
}

/// A crossfade merge between the segments on either side.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TransitionNode {
    /// Visual effect.
    pub effect: CrossfadeEffect,
    /// Duration accounting policy.
    pub policy: CrossfadePolicy,
    /// Crossfade duration in seconds.
    pub duration: f64,
    /// Seconds from the start of the output at which the crossfade begins.
    pub offset: f64,
    /// Linked audio crossfade length (equal to `duration`).
    pub audio_crossfade: f64,
}

/// Ordered graph operation.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum RenderNode {
    /// Play a clip.
    Segment(SegmentNode),
    /// Crossfade the previous segment into the next.
    Transition(TransitionNode),
    /// Hard boundary between two segments; no temporal effect.
    Cut,
}

/// Renderer-facing description of a frozen plan.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RenderPlan {
    /// Output identifier.
    pub output_target: String,
    /// Output duration in seconds.
    pub total_duration: f64,
    /// Look of extend crossfades.
    pub extend_style: ExtendStyle,
    /// Nodes in source order.
    pub nodes: Vec<RenderNode>,
}

impl RenderPlan {
    /// Segment nodes in order.
    pub fn segments(&self) -> impl Iterator<Item = &SegmentNode> {
        self.nodes.iter().filter_map(|n| match n {
            RenderNode::Segment(s) => Some(s),
            _ => None,
        })
    }

    /// Transition nodes in order (cuts excluded).
    pub fn transitions(&self) -> impl Iterator<Item = &TransitionNode> {
        self.nodes.iter().filter_map(|n| match n {
            RenderNode::Transition(t) => Some(t),
            _ => None,
        })
    }
}

/// Derive the render plan of a frozen plan.
///
/// The running offset starts at the first clip's duration. A cut advances it by the next clip; a
/// compress crossfade of `d` starts at `offset - d` and advances it by `next - d`; an extend
/// crossfade starts at `offset` and advances it by `d + next`. The final running offset is the
/// plan's total duration. Deriving never mutates the plan.
#[tracing::instrument(skip(plan), fields(items = plan.items().len()))]
pub fn derive_render_plan(plan: &Plan) -> MontageResult<RenderPlan> {
    if !plan.is_frozen() {
        return Err(MontageError::PlanNotFrozen);
    }
    let output_target = plan
        .output_target()
        .ok_or(MontageError::MissingOutputTarget)?
        .to_string();

    let items = plan.items();
    let mut nodes = Vec::with_capacity(items.len());
    let mut running_offset = 0.0_f64;
    let mut input_index = 0usize;

    for (position, item) in items.iter().enumerate() {
        match item {
            SequenceItem::Clip(clip) => {
                let source_duration = resolved(clip)?;
                let trim_duration = match items.get(position + 1) {
                    Some(SequenceItem::Transition(TransitionSpec::CrossfadeCompress(xf))) => {
                        Some(source_duration - xf.duration())
                    }
                    _ => None,
                };
                if input_index == 0 {
                    running_offset = source_duration;
                }
                nodes.push(RenderNode::Segment(SegmentNode {
                    input_index,
                    identifier: clip.identifier().to_string(),
                    source_duration,
                    trim_start: 0.0,
                    trim_duration,
                }));
                input_index += 1;
            }
            SequenceItem::Transition(spec) => {
                let next = items
                    .get(position + 1)
                    .and_then(SequenceItem::as_clip)
                    .ok_or(MontageError::DanglingTransition { position })?;
                let next_duration = resolved(next)?;

                match spec {
                    TransitionSpec::Cut => {
                        nodes.push(RenderNode::Cut);
                        running_offset += next_duration;
                    }
                    TransitionSpec::CrossfadeCompress(xf) => {
                        let d = xf.duration();
                        nodes.push(transition(xf, CrossfadePolicy::Compress, running_offset - d));
                        running_offset += next_duration - d;
                    }
                    TransitionSpec::CrossfadeExtend(xf) => {
                        let d = xf.duration();
                        nodes.push(transition(xf, CrossfadePolicy::Extend, running_offset));
                        running_offset += d + next_duration;
                    }
                }
            }
        }
    }

    tracing::debug!(total_duration = running_offset, nodes = nodes.len(), "derived render plan");
    Ok(RenderPlan {
        output_target,
        total_duration: running_offset,
        extend_style: plan.extend_style(),
        nodes,
    })
}

fn transition(xf: &Crossfade, policy: CrossfadePolicy, offset: f64) -> RenderNode {
    RenderNode::Transition(TransitionNode {
        effect: xf.effect(),
        policy,
        duration: xf.duration(),
        offset,
        audio_crossfade: xf.duration(),
    })
}

fn resolved(clip: &ClipRef) -> MontageResult<f64> {
    clip.resolved_duration().ok_or_else(|| {
        MontageError::duration_unavailable(clip.identifier(), "clip has not been resolved")
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compile/graph.rs"]
mod tests;
