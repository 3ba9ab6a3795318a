use std::{collections::HashMap, path::PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use montage::{
    BuilderOptions, CachingResolver, DurationResolver, EncodeConfig, EncoderChoice,
    EncoderSelection, ExtendStyle, FallbackPolicy, FfmpegRenderer, FfprobeResolver,
    MontageResult, SequenceBuilder, SequenceItem, TimelineDoc, parse_crossfade_list,
    sequence_from_clips,
};

#[derive(Parser, Debug)]
#[command(name = "montage", version, about = "Plan and render clip timelines with cuts and crossfades")]
struct Cli {
    /// Log at DEBUG level (resolution order, ffmpeg arguments).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the planned timeline and filter graph without rendering.
    Plan(PlanArgs),
    /// Render the timeline with ffmpeg (requires `ffmpeg` and `ffprobe` on PATH).
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Clips in playback order.
    #[arg(conflicts_with = "in_path")]
    clips: Vec<String>,

    /// Joins between clips, e.g. `1.0:compress,1.5:extend:wipeleft,cut`. Missing joins are cuts.
    #[arg(long, conflicts_with = "in_path")]
    crossfade: Option<String>,

    /// Timeline JSON document instead of positional clips.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Output file (overrides the document's output).
    #[arg(long)]
    out: Option<String>,

    /// Known clip duration, skipping the probe: `ID=SECONDS`. Repeatable.
    #[arg(long = "duration", value_parser = parse_duration_override)]
    durations: Vec<(String, f64)>,

    /// Look of extend crossfades: `static` (frozen frames) or `dynamic` (incoming clip moves).
    /// Overrides the document's style.
    #[arg(long)]
    extend_style: Option<ExtendStyle>,

    /// Fail immediately when a clip file does not exist.
    #[arg(long)]
    check_exists: bool,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    input: InputArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Hardware encoder selection.
    #[arg(long, value_enum, default_value_t = HwAccel::Auto)]
    hwaccel: HwAccel,

    /// Do not retry with libx264 when a hardware encoder fails.
    #[arg(long)]
    no_fallback: bool,

    /// Output width in pixels.
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Output frame rate.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Force a specific `-c:v` encoder (disables hardware selection).
    #[arg(long)]
    codec: Option<String>,

    /// Write video only, even when clips carry audio.
    #[arg(long)]
    no_audio: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HwAccel {
    Auto,
    Off,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let mut builder = make_builder(&args.input)?;
    let description = builder.describe()?;

    if args.input.json {
        println!("{}", serde_json::to_string_pretty(&description)?);
        return Ok(());
    }
    for entry in &description.items {
        match &entry.identifier {
            Some(id) => println!(
                "{:>3}  clip        {id}  {}  (running {})",
                entry.position,
                montage::fmt_secs(entry.duration),
                montage::fmt_secs(entry.running_total)
            ),
            None => println!(
                "{:>3}  {:<10}  {:+.2}s  (running {})",
                entry.position,
                entry.kind,
                entry.delta,
                montage::fmt_secs(entry.running_total)
            ),
        }
    }
    println!();
    println!("{}", description.graph_preview);
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let encoder = match (&args.codec, args.hwaccel) {
        (Some(codec), _) => EncoderSelection::Fixed(EncoderChoice {
            codec: codec.clone(),
            hwaccel: None,
        }),
        (None, HwAccel::Auto) => EncoderSelection::Auto,
        (None, HwAccel::Off) => EncoderSelection::Software,
    };
    let config = EncodeConfig::default()
        .with_size(args.width, args.height)
        .with_fps(args.fps)
        .with_encoder(encoder)
        .with_audio(!args.no_audio)
        .with_fallback(if args.no_fallback {
            FallbackPolicy::None
        } else {
            FallbackPolicy::SoftwareReencode
        });
    let mut renderer = FfmpegRenderer::new(config)?;

    let mut builder = make_builder(&args.input)?;
    let outcome = builder.commit(&mut renderer)?;

    if args.input.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "wrote {} ({} bytes): planned {}, actual {}",
            outcome.output,
            outcome.actual_size_bytes,
            montage::fmt_secs(outcome.planned_duration),
            montage::fmt_secs(outcome.actual_duration)
        );
    }
    Ok(())
}

fn make_builder(
    input: &InputArgs,
) -> anyhow::Result<SequenceBuilder<CachingResolver<impl DurationResolver>>> {
    let Loaded {
        items,
        output: doc_output,
        extend_style: doc_style,
    } = load_items(input)?;

    let overrides: HashMap<String, f64> = input.durations.iter().cloned().collect();
    let mut probe = FfprobeResolver::new();
    let resolver = move |id: &str| -> MontageResult<f64> {
        match overrides.get(id) {
            Some(d) => Ok(*d),
            None => probe.resolve(id),
        }
    };

    let mut builder = SequenceBuilder::with_options(
        CachingResolver::new(resolver),
        BuilderOptions {
            check_existence: input.check_exists,
        },
    );
    for item in items {
        builder.append_item(item)?;
    }
    if let Some(out) = input.out.clone().or(doc_output) {
        builder.set_output_target(out)?;
    }
    if let Some(style) = input.extend_style.or(doc_style) {
        builder.set_extend_style(style)?;
    }
    Ok(builder)
}

struct Loaded {
    items: Vec<SequenceItem>,
    output: Option<String>,
    extend_style: Option<ExtendStyle>,
}

fn load_items(input: &InputArgs) -> anyhow::Result<Loaded> {
    if let Some(path) = &input.in_path {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("open timeline '{}'", path.display()))?;
        let doc = TimelineDoc::from_json_str(&text)?;
        return Ok(Loaded {
            items: doc.items,
            output: doc.output,
            extend_style: doc.extend_style,
        });
    }
    if input.clips.is_empty() {
        anyhow::bail!("no clips given: pass clip paths or --in timeline.json");
    }
    let transitions = parse_crossfade_list(input.crossfade.as_deref().unwrap_or(""))?;
    Ok(Loaded {
        items: sequence_from_clips(input.clips.as_slice(), transitions)?,
        output: None,
        extend_style: None,
    })
}

fn parse_duration_override(s: &str) -> Result<(String, f64), String> {
    let (id, secs) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected ID=SECONDS, got '{s}'"))?;
    let secs: f64 = secs
        .trim()
        .parse()
        .map_err(|_| format!("invalid seconds in '{s}'"))?;
    montage::positive_seconds(secs).map_err(|e| e.to_string())?;
    Ok((id.to_string(), secs))
}
