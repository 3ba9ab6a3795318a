use crate::{
    composition::model::{ClipRef, SequenceItem, TransitionSpec},
    foundation::error::{MontageError, MontageResult},
    foundation::time::positive_seconds,
    resolve::resolver::DurationResolver,
};

/// One step of the duration fold.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TimelineEntry {
    /// Position in the sequence.
    pub position: usize,
    /// `clip`, `cut`, `compress` or `extend`.
    pub kind: &'static str,
    /// Clip identifier for clip entries.
    pub identifier: Option<String>,
    /// Probed clip duration, or the transition duration.
    pub duration: f64,
    /// Signed contribution of this item to the total.
    pub delta: f64,
    /// Total after applying this item.
    pub running_total: f64,
}

/// Result of walking a sequence.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Timeline {
    /// Output duration in seconds.
    pub total_duration: f64,
    /// Per-item breakdown in sequence order.
    pub entries: Vec<TimelineEntry>,
}

/// Total output duration of `items`.
///
/// Clips without a resolved duration are resolved through `resolver` (without being mutated).
pub fn total_duration(
    items: &[SequenceItem],
    resolver: Option<&mut dyn DurationResolver>,
) -> MontageResult<f64> {
    Ok(walk_timeline(items, resolver)?.total_duration)
}

/// Single left-to-right fold over `items`, seeded at zero.
///
/// Clips add their duration, cuts add nothing, compress crossfades subtract their duration and
/// extend crossfades add it. Compression is applied at the transition's position: the stored clip
/// duration is reported unchanged, only the running total reflects it. Structural problems and
/// crossfades longer than their neighbours are not detected here.
pub fn walk_timeline(
    items: &[SequenceItem],
    mut resolver: Option<&mut dyn DurationResolver>,
) -> MontageResult<Timeline> {
    let mut total = 0.0_f64;
    let mut entries = Vec::with_capacity(items.len());

    for (position, item) in items.iter().enumerate() {
        let (kind, identifier, duration, delta) = match item {
            SequenceItem::Clip(clip) => {
                let d = clip_duration(clip, resolver.as_deref_mut())?;
                ("clip", Some(clip.identifier().to_string()), d, d)
            }
            SequenceItem::Transition(TransitionSpec::Cut) => ("cut", None, 0.0, 0.0),
            SequenceItem::Transition(TransitionSpec::CrossfadeCompress(xf)) => {
                ("compress", None, xf.duration(), -xf.duration())
            }
            SequenceItem::Transition(TransitionSpec::CrossfadeExtend(xf)) => {
                ("extend", None, xf.duration(), xf.duration())
            }
        };
        total += delta;
        entries.push(TimelineEntry {
            position,
            kind,
            identifier,
            duration,
            delta,
            running_total: total,
        });
    }

    Ok(Timeline {
        total_duration: total,
        entries,
    })
}

pub(crate) fn clip_duration<'r>(
    clip: &ClipRef,
    resolver: Option<&mut (dyn DurationResolver + 'r)>,
) -> MontageResult<f64> {
    if let Some(d) = clip.resolved_duration() {
        return Ok(d);
    }
    let Some(resolver) = resolver else {
        return Err(MontageError::duration_unavailable(
            clip.identifier(),
            "clip is unresolved and no resolver was supplied",
        ));
    };
    let d = resolver.resolve(clip.identifier())?;
    positive_seconds(d).map_err(|_| {
        MontageError::duration_unavailable(
            clip.identifier(),
            format!("resolver returned a non-positive duration ({d})"),
        )
    })
}

#[cfg(test)]
#[path = "../../tests/unit/plan/timeline.rs"]
mod tests;
