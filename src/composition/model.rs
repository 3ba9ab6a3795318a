use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{MontageError, MontageResult};
use crate::foundation::time::positive_seconds;

/// Addressable clip with a lazily-resolved duration.
///
/// The duration starts out unresolved and is written exactly once when the owning plan freezes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ClipRefDef", into = "ClipRefDef")]
pub struct ClipRef {
    identifier: String,
    resolved_duration: Option<f64>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct ClipRefDef {
    identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
}

impl ClipRef {
    /// Create an unresolved clip reference.
    pub fn new(identifier: impl Into<String>) -> MontageResult<Self> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(MontageError::ClipNotFound { identifier });
        }
        Ok(Self {
            identifier,
            resolved_duration: None,
        })
    }

    /// Create a clip whose duration is already known.
    pub fn with_duration(identifier: impl Into<String>, duration: f64) -> MontageResult<Self> {
        let mut clip = Self::new(identifier)?;
        clip.resolved_duration = Some(positive_seconds(duration)?);
        Ok(clip)
    }

    /// Opaque identifier (usually a path or URI).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Resolved duration in seconds, `None` until the plan freezes.
    pub fn resolved_duration(&self) -> Option<f64> {
        self.resolved_duration
    }

    /// `true` once a duration is attached.
    pub fn is_resolved(&self) -> bool {
        self.resolved_duration.is_some()
    }

    // Resolution happens once; an already-resolved clip keeps its value.
    pub(crate) fn resolve_once(&mut self, duration: f64) {
        if self.resolved_duration.is_none() {
            self.resolved_duration = Some(duration);
        }
    }
}

impl TryFrom<ClipRefDef> for ClipRef {
    type Error = MontageError;

    fn try_from(def: ClipRefDef) -> MontageResult<Self> {
        match def.duration {
            Some(d) => Self::with_duration(def.identifier, d),
            None => Self::new(def.identifier),
        }
    }
}

impl From<ClipRef> for ClipRefDef {
    fn from(clip: ClipRef) -> Self {
        Self {
            identifier: clip.identifier,
            duration: clip.resolved_duration,
        }
    }
}

/// How a crossfade accounts for its duration on the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossfadePolicy {
    /// The outgoing clip is shortened; the timeline loses `duration`.
    Compress,
    /// Neither clip is shortened; the timeline gains `duration`.
    Extend,
}

impl CrossfadePolicy {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compress => "compress",
            Self::Extend => "extend",
        }
    }
}

impl FromStr for CrossfadePolicy {
    type Err = MontageError;

    fn from_str(s: &str) -> MontageResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compress" | "no_increase" | "no-increase" => Ok(Self::Compress),
            "extend" | "increase" => Ok(Self::Extend),
            other => Err(MontageError::validation(format!(
                "unknown crossfade policy '{other}'"
            ))),
        }
    }
}

impl fmt::Display for CrossfadePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look of extend crossfades. Durations are the same for both styles.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ExtendStyle {
    /// Dissolve between the frozen last frame of the outgoing clip and the frozen first frame of
    /// the incoming one.
    #[default]
    Static,
    /// Dissolve from the frozen last frame into the incoming clip's live motion; the incoming
    /// clip's final frame is held for the crossfade length instead.
    Dynamic,
}

impl ExtendStyle {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

impl FromStr for ExtendStyle {
    type Err = MontageError;

    fn from_str(s: &str) -> MontageResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" | "legacy" => Ok(Self::Static),
            "dynamic" => Ok(Self::Dynamic),
            other => Err(MontageError::validation(format!(
                "unknown extend style '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ExtendStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! crossfade_effects {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Visual effect used by a crossfade (the ffmpeg `xfade` transition family).
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum CrossfadeEffect {
            #[default]
            $($variant,)+
        }

        impl CrossfadeEffect {
            /// Every supported effect, in declaration order.
            pub const ALL: &'static [CrossfadeEffect] = &[$(CrossfadeEffect::$variant),+];

            /// Effect identifier as understood by the renderer.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl FromStr for CrossfadeEffect {
            type Err = MontageError;

            fn from_str(s: &str) -> MontageResult<Self> {
                let name = s.trim().to_ascii_lowercase();
                match name.as_str() {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(MontageError::validation(format!(
                        "unknown crossfade effect '{name}'"
                    ))),
                }
            }
        }
    };
}

crossfade_effects! {
    Fade => "fade",
    Dissolve => "dissolve",
    WipeLeft => "wipeleft",
    WipeRight => "wiperight",
    WipeUp => "wipeup",
    WipeDown => "wipedown",
    SlideLeft => "slideleft",
    SlideRight => "slideright",
    SlideUp => "slideup",
    SlideDown => "slidedown",
    CircleCrop => "circlecrop",
    RectCrop => "rectcrop",
    Distance => "distance",
    FadeBlack => "fadeblack",
    FadeWhite => "fadewhite",
    Radial => "radial",
    SmoothLeft => "smoothleft",
    SmoothRight => "smoothright",
    SmoothUp => "smoothup",
    SmoothDown => "smoothdown",
    CircleOpen => "circleopen",
    CircleClose => "circleclose",
    VertOpen => "vertopen",
    VertClose => "vertclose",
    HorzOpen => "horzopen",
    HorzClose => "horzclose",
    DiagBl => "diagbl",
    DiagBr => "diagbr",
    DiagTl => "diagtl",
    DiagTr => "diagtr",
}

impl fmt::Display for CrossfadeEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crossfade parameters shared by both duration policies.
///
/// Construction validates `duration > 0`, so an existing value is always well-formed.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "CrossfadeDef", into = "CrossfadeDef")]
pub struct Crossfade {
    duration: f64,
    effect: CrossfadeEffect,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
struct CrossfadeDef {
    duration: f64,
    #[serde(default)]
    effect: CrossfadeEffect,
}

impl Crossfade {
    /// Crossfade of `duration` seconds using the default `fade` effect.
    pub fn new(duration: f64) -> MontageResult<Self> {
        Ok(Self {
            duration: positive_seconds(duration)?,
            effect: CrossfadeEffect::default(),
        })
    }

    /// Replace the visual effect.
    pub fn with_effect(mut self, effect: CrossfadeEffect) -> Self {
        self.effect = effect;
        self
    }

    /// Duration in seconds (always > 0).
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Visual effect.
    pub fn effect(&self) -> CrossfadeEffect {
        self.effect
    }
}

impl TryFrom<CrossfadeDef> for Crossfade {
    type Error = MontageError;

    fn try_from(def: CrossfadeDef) -> MontageResult<Self> {
        Ok(Self::new(def.duration)?.with_effect(def.effect))
    }
}

impl From<Crossfade> for CrossfadeDef {
    fn from(xf: Crossfade) -> Self {
        Self {
            duration: xf.duration,
            effect: xf.effect,
        }
    }
}

/// How two adjacent clips join.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode")]
pub enum TransitionSpec {
    /// Hard cut: no overlap, no duration change.
    #[serde(rename = "cut", alias = "none")]
    Cut,
    /// Crossfade that shortens the outgoing clip; total duration loses the crossfade length.
    #[serde(rename = "compress")]
    CrossfadeCompress(Crossfade),
    /// Crossfade inserted between full clips; total duration gains the crossfade length.
    #[serde(rename = "extend")]
    CrossfadeExtend(Crossfade),
}

impl TransitionSpec {
    /// Hard cut.
    pub fn cut() -> Self {
        Self::Cut
    }

    /// Compress crossfade of `duration` seconds (fails fast on `duration <= 0`).
    pub fn compress(duration: f64) -> MontageResult<Self> {
        Ok(Self::CrossfadeCompress(Crossfade::new(duration)?))
    }

    /// Extend crossfade of `duration` seconds (fails fast on `duration <= 0`).
    pub fn extend(duration: f64) -> MontageResult<Self> {
        Ok(Self::CrossfadeExtend(Crossfade::new(duration)?))
    }

    /// Crossfade under the given policy.
    pub fn crossfade(xf: Crossfade, policy: CrossfadePolicy) -> Self {
        match policy {
            CrossfadePolicy::Compress => Self::CrossfadeCompress(xf),
            CrossfadePolicy::Extend => Self::CrossfadeExtend(xf),
        }
    }

    /// Crossfade parameters, `None` for a cut.
    pub fn as_crossfade(&self) -> Option<(&Crossfade, CrossfadePolicy)> {
        match self {
            Self::Cut => None,
            Self::CrossfadeCompress(xf) => Some((xf, CrossfadePolicy::Compress)),
            Self::CrossfadeExtend(xf) => Some((xf, CrossfadePolicy::Extend)),
        }
    }

    /// Crossfade duration in seconds, `0.0` for a cut.
    pub fn duration(&self) -> f64 {
        self.as_crossfade().map_or(0.0, |(xf, _)| xf.duration())
    }

    /// Short mode name: `cut`, `compress` or `extend`.
    pub fn mode_name(&self) -> &'static str {
        match self.as_crossfade() {
            None => "cut",
            Some((_, policy)) => policy.as_str(),
        }
    }
}

/// One element of a clip/transition sequence.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceItem {
    /// A clip reference.
    Clip(ClipRef),
    /// A join between the previous and next clip.
    Transition(TransitionSpec),
}

impl SequenceItem {
    /// `"clip"` or `"transition"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Clip(_) => "clip",
            Self::Transition(_) => "transition",
        }
    }

    /// The clip, when this item is one.
    pub fn as_clip(&self) -> Option<&ClipRef> {
        match self {
            Self::Clip(c) => Some(c),
            Self::Transition(_) => None,
        }
    }
}

impl From<ClipRef> for SequenceItem {
    fn from(clip: ClipRef) -> Self {
        Self::Clip(clip)
    }
}

impl From<TransitionSpec> for SequenceItem {
    fn from(spec: TransitionSpec) -> Self {
        Self::Transition(spec)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/model.rs"]
mod tests;
