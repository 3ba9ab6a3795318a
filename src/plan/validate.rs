use crate::{
    composition::model::{ClipRef, SequenceItem, TransitionSpec},
    foundation::error::{MontageError, MontageResult},
};

/// Check that appending `next` after `items` keeps clips and transitions alternating.
pub fn check_append(items: &[SequenceItem], next: &SequenceItem) -> MontageResult<()> {
    let position = items.len();
    match (items.last(), next) {
        (None, SequenceItem::Transition(_)) => Err(MontageError::InvalidStart { position }),
        (Some(SequenceItem::Clip(_)), SequenceItem::Clip(_)) => Err(MontageError::Alternation {
            position,
            found: "clip",
        }),
        (Some(SequenceItem::Transition(_)), SequenceItem::Transition(_)) => {
            Err(MontageError::Alternation {
                position,
                found: "transition",
            })
        }
        _ => Ok(()),
    }
}

/// Structural well-formedness: non-empty, starts with a clip, alternates, ends with a clip.
pub fn validate_structure(items: &[SequenceItem]) -> MontageResult<()> {
    let Some(first) = items.first() else {
        return Err(MontageError::EmptyPlan);
    };
    if !matches!(first, SequenceItem::Clip(_)) {
        return Err(MontageError::InvalidStart { position: 0 });
    }
    for (i, pair) in items.windows(2).enumerate() {
        check_append(&items[..=i], &pair[1])?;
    }
    if let Some(SequenceItem::Transition(_)) = items.last() {
        return Err(MontageError::DanglingTransition {
            position: items.len() - 1,
        });
    }
    Ok(())
}

/// Compress crossfades must fit inside both neighbours.
///
/// A compress crossfade of `d` is rejected when `d >= min(preceding, following)`, and a clip
/// whose incoming and outgoing compress crossfades together reach its duration is rejected too.
/// Requires a structurally valid sequence whose clips are all resolved.
pub fn validate_transition_fit(items: &[SequenceItem]) -> MontageResult<()> {
    let mut incoming_compress = 0.0_f64;

    for (position, item) in items.iter().enumerate() {
        let SequenceItem::Transition(spec) = item else {
            continue;
        };
        let TransitionSpec::CrossfadeCompress(xf) = spec else {
            incoming_compress = 0.0;
            continue;
        };
        let d = xf.duration();

        let (prev, prev_d) = resolved_clip_at(items, position.checked_sub(1), position)?;
        let (next, next_d) = resolved_clip_at(items, Some(position + 1), position)?;

        for (clip, clip_d, needed) in [
            (prev, prev_d, d + incoming_compress),
            (next, next_d, d),
        ] {
            if needed >= clip_d {
                return Err(MontageError::TransitionDurationExceedsClip {
                    position,
                    identifier: clip.identifier().to_string(),
                    duration: needed,
                    clip_duration: clip_d,
                });
            }
        }
        incoming_compress = d;
    }
    Ok(())
}

fn resolved_clip_at(
    items: &[SequenceItem],
    at: Option<usize>,
    transition_position: usize,
) -> MontageResult<(&ClipRef, f64)> {
    let Some(clip) = at.and_then(|i| items.get(i)).and_then(SequenceItem::as_clip) else {
        return Err(MontageError::DanglingTransition {
            position: transition_position,
        });
    };
    let d = clip.resolved_duration().ok_or_else(|| {
        MontageError::duration_unavailable(clip.identifier(), "clip has not been resolved")
    })?;
    Ok((clip, d))
}

#[cfg(test)]
#[path = "../../tests/unit/plan/validate.rs"]
mod tests;
