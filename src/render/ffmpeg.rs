use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::compile::graph::{RenderNode, RenderPlan, SegmentNode, TransitionNode};
use crate::composition::model::{CrossfadePolicy, ExtendStyle};
use crate::foundation::error::{MontageError, MontageResult};
use crate::render::hwaccel::{EncoderChoice, detect_encoder};
use crate::render::renderer::{RenderOutcome, Renderer};
use crate::resolve::ffprobe::{FfprobeResolver, has_audio_stream, is_tool_on_path};
use crate::resolve::resolver::DurationResolver;

/// How the video encoder is chosen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EncoderSelection {
    /// Always `libx264`.
    #[default]
    Software,
    /// Probe `ffmpeg` for a hardware encoder suited to the host.
    Auto,
    /// Use exactly this encoder.
    Fixed(EncoderChoice),
}

/// What to do when encoding with a hardware encoder fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Report the failure.
    None,
    /// Retry once with `libx264`.
    #[default]
    SoftwareReencode,
}

/// Output settings for [`FfmpegRenderer`].
#[derive(Clone, Debug)]
pub struct EncodeConfig {
    /// Output width in pixels (even).
    pub width: u32,
    /// Output height in pixels (even).
    pub height: u32,
    /// Output frame rate.
    pub fps: u32,
    /// Output pixel format.
    pub pix_fmt: String,
    /// Encoder selection.
    pub encoder: EncoderSelection,
    /// Hardware failure handling.
    pub fallback: FallbackPolicy,
    /// Carry clip audio into the output.
    pub audio: bool,
    /// Audio encoder used when any audio is carried.
    pub audio_codec: String,
    /// Overwrite an existing output file.
    pub overwrite: bool,
    /// `ffmpeg` binary.
    pub ffmpeg_bin: PathBuf,
    /// `ffprobe` binary used to measure the output.
    pub ffprobe_bin: PathBuf,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            pix_fmt: "yuv420p".to_string(),
            encoder: EncoderSelection::default(),
            fallback: FallbackPolicy::default(),
            audio: true,
            audio_codec: "aac".to_string(),
            overwrite: true,
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
        }
    }
}

impl EncodeConfig {
    /// Set the output size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the output frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the encoder selection.
    pub fn with_encoder(mut self, encoder: EncoderSelection) -> Self {
        self.encoder = encoder;
        self
    }

    /// Set the fallback policy.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Carry or drop clip audio.
    pub fn with_audio(mut self, audio: bool) -> Self {
        self.audio = audio;
        self
    }

    /// Reject configurations `ffmpeg` cannot encode to `yuv420p` MP4.
    pub fn validate(&self) -> MontageResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MontageError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(MontageError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.fps == 0 {
            return Err(MontageError::validation("fps must be non-zero"));
        }
        if self.pix_fmt.trim().is_empty() {
            return Err(MontageError::validation("pixel format must not be empty"));
        }
        if let EncoderSelection::Fixed(choice) = &self.encoder
            && choice.codec.trim().is_empty()
        {
            return Err(MontageError::validation("encoder name must not be empty"));
        }
        if self.audio && self.audio_codec.trim().is_empty() {
            return Err(MontageError::validation("audio encoder name must not be empty"));
        }
        Ok(())
    }
}

/// `filter_complex` realization of a render plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterGraph {
    /// Input identifiers, in `-i` order.
    pub inputs: Vec<String>,
    /// The `-filter_complex` value.
    pub filter_complex: String,
    /// Label of the final video stream, e.g. `[j2]`.
    pub output_label: String,
    /// Label of the final audio stream, when any audio is carried.
    pub audio_label: Option<String>,
}

/// Build the filter graph for `plan`.
///
/// Every segment is normalized to the configured size, frame rate and pixel format. Cuts become
/// `concat`; compress crossfades become `xfade` at the node offset over live frames; extend
/// crossfades clone-pad by `duration` and then `xfade`, so the output grows by exactly `duration`.
/// With [`ExtendStyle::Static`] both sides are frozen during the dissolve; with
/// [`ExtendStyle::Dynamic`] the incoming clip moves and holds its last frame instead.
///
/// `audio[i]` says whether segment `i` has an audio stream. Audio follows the first segment:
/// when it is silent the output is silent. Later segments join with `concat` at cuts and
/// `acrossfade` at crossfades; a silent segment keeps the running audio unchanged.
pub fn build_filter_graph(
    plan: &RenderPlan,
    config: &EncodeConfig,
    audio: &[bool],
) -> MontageResult<FilterGraph> {
    let mut inputs = Vec::new();
    let mut graph = String::new();
    let mut acc: Option<String> = None;
    let mut acc_audio: Option<String> = None;
    let mut join: Option<Option<&TransitionNode>> = None;
    let mut joins = 0usize;

    for node in &plan.nodes {
        match node {
            RenderNode::Segment(segment) => {
                let index = inputs.len();
                let label = normalize_segment(&mut graph, segment, config, index);
                let carries_audio = audio.get(index).copied().unwrap_or(false)
                    && (acc.is_none() || acc_audio.is_some());
                let audio_label =
                    carries_audio.then(|| normalize_audio(&mut graph, segment, index));
                inputs.push(segment.identifier.clone());

                acc = Some(match (acc.take(), join.take()) {
                    (None, None) => {
                        acc_audio = audio_label;
                        label
                    }
                    (Some(prev), Some(transition)) => {
                        joins += 1;
                        acc_audio = match (acc_audio.take(), audio_label) {
                            (Some(prev_audio), Some(next_audio)) => Some(join_audio(
                                &mut graph,
                                &prev_audio,
                                &next_audio,
                                transition,
                                joins,
                            )),
                            (kept, _) => kept,
                        };
                        join_streams(&mut graph, &prev, &label, transition, plan.extend_style, joins)
                    }
                    (None, Some(_)) => {
                        return Err(MontageError::validation(
                            "render plan starts with a join instead of a segment",
                        ));
                    }
                    (Some(_), None) => {
                        return Err(MontageError::validation(
                            "render plan has two segments without a join between them",
                        ));
                    }
                });
            }
            RenderNode::Transition(t) => {
                if acc.is_none() || join.replace(Some(t)).is_some() {
                    return Err(MontageError::validation(
                        "render plan has a transition without a preceding segment",
                    ));
                }
            }
            RenderNode::Cut => {
                if acc.is_none() || join.replace(None).is_some() {
                    return Err(MontageError::validation(
                        "render plan has a cut without a preceding segment",
                    ));
                }
            }
        }
    }

    if join.is_some() {
        return Err(MontageError::validation(
            "render plan ends with a join instead of a segment",
        ));
    }
    let output_label = acc.ok_or(MontageError::EmptyPlan)?;
    // The last filter chain ends with ';'.
    graph.pop();

    Ok(FilterGraph {
        inputs,
        filter_complex: graph,
        output_label,
        audio_label: acc_audio,
    })
}

fn normalize_segment(
    graph: &mut String,
    segment: &SegmentNode,
    config: &EncodeConfig,
    input: usize,
) -> String {
    let (w, h) = (config.width, config.height);
    let label = format!("[s{input}]");
    let _ = write!(
        graph,
        "[{input}:v]fps={fps},scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,format={pix},\
         trim=duration={dur:.6},setpts=PTS-STARTPTS{label};",
        fps = config.fps,
        pix = config.pix_fmt,
        dur = segment.source_duration,
    );
    label
}

fn normalize_audio(graph: &mut String, segment: &SegmentNode, input: usize) -> String {
    let label = format!("[a{input}]");
    let _ = write!(
        graph,
        "[{input}:a]atrim=duration={dur:.6},asetpts=PTS-STARTPTS,aresample=48000,\
         aformat=sample_fmts=fltp:channel_layouts=stereo{label};",
        dur = segment.source_duration,
    );
    label
}

fn join_streams(
    graph: &mut String,
    prev: &str,
    next: &str,
    transition: Option<&TransitionNode>,
    style: ExtendStyle,
    n: usize,
) -> String {
    let out = format!("[j{n}]");
    let _ = match transition {
        None => write!(graph, "{prev}{next}concat=n=2:v=1:a=0{out};"),
        Some(t) if t.policy == CrossfadePolicy::Compress => write!(
            graph,
            "{prev}{next}xfade=transition={}:duration={:.6}:offset={:.6}{out};",
            t.effect, t.duration, t.offset
        ),
        Some(t) => {
            let incoming = match style {
                ExtendStyle::Static => "start",
                ExtendStyle::Dynamic => "stop",
            };
            write!(
                graph,
                "{prev}tpad=stop_mode=clone:stop_duration={d:.6}[ea{n}];\
                 {next}tpad={incoming}_mode=clone:{incoming}_duration={d:.6}[eb{n}];\
                 [ea{n}][eb{n}]xfade=transition={}:duration={d:.6}:offset={:.6}{out};",
                t.effect,
                t.offset,
                d = t.duration,
            )
        }
    };
    out
}

// Extend joins pad the outgoing audio with silence and delay the incoming audio by the same
// length, so the audio grows by `audio_crossfade` like the video does.
fn join_audio(
    graph: &mut String,
    prev: &str,
    next: &str,
    transition: Option<&TransitionNode>,
    n: usize,
) -> String {
    let out = format!("[aj{n}]");
    let _ = match transition {
        None => write!(graph, "{prev}{next}concat=n=2:v=0:a=1{out};"),
        Some(t) if t.policy == CrossfadePolicy::Compress => write!(
            graph,
            "{prev}{next}acrossfade=d={:.6}{out};",
            t.audio_crossfade
        ),
        Some(t) => write!(
            graph,
            "{prev}apad=pad_dur={d:.6}[pa{n}];\
             {next}adelay=delays={ms}:all=1[pb{n}];\
             [pa{n}][pb{n}]acrossfade=d={d:.6}{out};",
            d = t.audio_crossfade,
            ms = (t.audio_crossfade * 1000.0).round() as u64,
        ),
    };
    out
}

/// Full `ffmpeg` argument list for `plan` encoded with `choice`.
///
/// `audio` is forwarded to [`build_filter_graph`]; without an audio label the output is written
/// with `-an`.
pub fn ffmpeg_args(
    plan: &RenderPlan,
    config: &EncodeConfig,
    choice: &EncoderChoice,
    audio: &[bool],
) -> MontageResult<Vec<String>> {
    let graph = build_filter_graph(plan, config, audio)?;

    let mut args: Vec<String> = vec![
        if config.overwrite { "-y" } else { "-n" }.to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];
    for input in &graph.inputs {
        if let Some(accel) = &choice.hwaccel {
            args.extend(["-hwaccel".to_string(), accel.clone()]);
        }
        args.extend(["-i".to_string(), input.clone()]);
    }
    args.extend(
        [
            "-filter_complex",
            graph.filter_complex.as_str(),
            "-map",
            graph.output_label.as_str(),
        ]
        .map(String::from),
    );
    match &graph.audio_label {
        Some(label) => args.extend([
            "-map".to_string(),
            label.clone(),
            "-c:a".to_string(),
            config.audio_codec.clone(),
        ]),
        None => args.push("-an".to_string()),
    }
    args.extend(
        [
            "-c:v",
            choice.codec.as_str(),
            "-pix_fmt",
            config.pix_fmt.as_str(),
            "-r",
        ]
        .map(String::from),
    );
    args.push(config.fps.to_string());
    args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    args.push(plan.output_target.clone());
    Ok(args)
}

/// Renderer that runs the system `ffmpeg` and measures the result with `ffprobe`.
#[derive(Clone, Debug)]
pub struct FfmpegRenderer {
    config: EncodeConfig,
}

impl FfmpegRenderer {
    /// Renderer with a validated configuration.
    pub fn new(config: EncodeConfig) -> MontageResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &EncodeConfig {
        &self.config
    }

    fn encoder(&self) -> EncoderChoice {
        match &self.config.encoder {
            EncoderSelection::Software => EncoderChoice::software(),
            EncoderSelection::Auto => detect_encoder(&self.config.ffmpeg_bin),
            EncoderSelection::Fixed(choice) => choice.clone(),
        }
    }

    fn audio_inputs(&self, plan: &RenderPlan) -> Vec<bool> {
        if !self.config.audio {
            return Vec::new();
        }
        plan.segments()
            .map(|s| has_audio_stream(&self.config.ffprobe_bin, &s.identifier))
            .collect()
    }

    fn run(&self, plan: &RenderPlan, choice: &EncoderChoice, audio: &[bool]) -> MontageResult<()> {
        let args = ffmpeg_args(plan, &self.config, choice, audio)?;
        tracing::debug!(codec = %choice.codec, args = ?args, "spawning ffmpeg");

        let out = Command::new(&self.config.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                MontageError::render(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;
        if !out.status.success() {
            return Err(MontageError::render(format!(
                "ffmpeg exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Renderer for FfmpegRenderer {
    #[tracing::instrument(skip(self, plan), fields(output = %plan.output_target))]
    fn render(&mut self, plan: &RenderPlan) -> MontageResult<RenderOutcome> {
        if !is_tool_on_path(&self.config.ffmpeg_bin) {
            return Err(MontageError::render(
                "ffmpeg is required for rendering, but was not found on PATH",
            ));
        }
        let output = Path::new(&plan.output_target);
        ensure_parent_dir(output)?;
        if !self.config.overwrite && output.exists() {
            return Err(MontageError::validation(format!(
                "output file '{}' already exists",
                output.display()
            )));
        }

        let audio = self.audio_inputs(plan);
        let choice = self.encoder();
        match self.run(plan, &choice, &audio) {
            Ok(()) => {}
            Err(err)
                if self.config.fallback == FallbackPolicy::SoftwareReencode
                    && choice != EncoderChoice::software() =>
            {
                tracing::warn!(codec = %choice.codec, error = %err, "encoder failed; retrying with libx264");
                discard_partial_output(output)?;
                self.run(plan, &EncoderChoice::software(), &audio)?;
            }
            Err(err) => return Err(err),
        }

        let actual_size_bytes = {
            use anyhow::Context as _;
            std::fs::metadata(output)
                .with_context(|| format!("failed to stat rendered output '{}'", output.display()))?
                .len()
        };
        let actual_duration = FfprobeResolver::with_binary(&self.config.ffprobe_bin)
            .resolve(&plan.output_target)
            .map_err(|e| MontageError::render(format!("could not measure rendered output: {e}")))?;

        Ok(RenderOutcome {
            output: plan.output_target.clone(),
            actual_duration,
            actual_size_bytes,
        })
    }
}

/// Remove whatever a failed encode left at `path`. A missing file is fine.
pub(crate) fn discard_partial_output(path: &Path) -> MontageResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed partial output");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MontageError::render(format!(
            "could not remove partial output '{}': {e}",
            path.display()
        ))),
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> MontageResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/ffmpeg.rs"]
mod tests;
