use std::str::FromStr;

use crate::{
    composition::model::{
        ClipRef, Crossfade, CrossfadeEffect, CrossfadePolicy, ExtendStyle, SequenceItem,
        TransitionSpec,
    },
    foundation::error::{MontageError, MontageResult},
    plan::state::Plan,
};

/// Parse a comma-separated crossfade list such as `1.0:compress,1.5:extend:wipeleft,cut`.
///
/// Each entry is `DURATION[:POLICY[:EFFECT]]`. A bare duration means `extend`; `none` or `cut`
/// (alone or as the policy) is a hard cut. Policies accept `no_increase`/`increase` as aliases.
pub fn parse_crossfade_list(s: &str) -> MontageResult<Vec<TransitionSpec>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(',').map(parse_entry).collect()
}

fn parse_entry(entry: &str) -> MontageResult<TransitionSpec> {
    let entry = entry.trim();
    let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
    if is_cut(parts[0]) && parts.len() == 1 {
        return Ok(TransitionSpec::Cut);
    }
    if parts.len() > 3 {
        return Err(MontageError::validation(format!(
            "crossfade entry '{entry}' has too many ':' separated fields"
        )));
    }

    let duration: f64 = parts[0].parse().map_err(|_| {
        MontageError::validation(format!("crossfade entry '{entry}' has an invalid duration"))
    })?;
    let policy = match parts.get(1) {
        Some(p) if is_cut(p) => return Ok(TransitionSpec::Cut),
        Some(p) => CrossfadePolicy::from_str(p)?,
        None => CrossfadePolicy::Extend,
    };
    let mut crossfade = Crossfade::new(duration)?;
    if let Some(effect) = parts.get(2) {
        crossfade = crossfade.with_effect(CrossfadeEffect::from_str(effect)?);
    }
    Ok(TransitionSpec::crossfade(crossfade, policy))
}

fn is_cut(s: &str) -> bool {
    s.eq_ignore_ascii_case("cut") || s.eq_ignore_ascii_case("none")
}

/// Interleave `clips` with `transitions`, filling missing joins with cuts.
pub fn sequence_from_clips<S: AsRef<str>>(
    clips: &[S],
    transitions: Vec<TransitionSpec>,
) -> MontageResult<Vec<SequenceItem>> {
    let joins = clips.len().saturating_sub(1);
    if clips.is_empty() {
        return Err(MontageError::EmptyPlan);
    }
    if transitions.len() > joins {
        return Err(MontageError::validation(format!(
            "{} transitions given for {} clips (at most {joins})",
            transitions.len(),
            clips.len()
        )));
    }

    let mut transitions = transitions.into_iter();
    let mut items = Vec::with_capacity(clips.len() * 2 - 1);
    for (i, clip) in clips.iter().enumerate() {
        if i > 0 {
            items.push(SequenceItem::Transition(
                transitions.next().unwrap_or(TransitionSpec::Cut),
            ));
        }
        items.push(SequenceItem::Clip(ClipRef::new(clip.as_ref())?));
    }
    Ok(items)
}

/// JSON timeline document.
///
/// ```json
/// {
///   "output": "out.mp4",
///   "extend_style": "dynamic",
///   "items": [
///     { "clip": { "identifier": "a.mp4", "duration": 10.0 } },
///     { "transition": { "mode": "compress", "duration": 2.0, "effect": "wipeleft" } },
///     { "clip": { "identifier": "b.mp4" } }
///   ]
/// }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimelineDoc {
    /// Output identifier; may also be supplied separately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Look of extend crossfades; `static` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extend_style: Option<ExtendStyle>,
    /// Clips and transitions in order.
    pub items: Vec<SequenceItem>,
}

impl TimelineDoc {
    /// Parse a document from JSON text.
    pub fn from_json_str(s: &str) -> MontageResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| MontageError::validation(format!("timeline json is invalid: {e}")))
    }

    /// Serialize as pretty JSON.
    pub fn to_json_pretty(&self) -> MontageResult<String> {
        use anyhow::Context as _;
        Ok(serde_json::to_string_pretty(self).context("serialize timeline json")?)
    }

    /// Load into a building plan through the normal append checks.
    pub fn into_plan(self) -> MontageResult<Plan> {
        let mut plan = Plan::from_items(self.items)?;
        if let Some(output) = self.output {
            plan.set_output_target(output)?;
        }
        if let Some(style) = self.extend_style {
            plan.set_extend_style(style)?;
        }
        Ok(plan)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/parse.rs"]
mod tests;
