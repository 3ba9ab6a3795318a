use super::*;
use crate::composition::model::{CrossfadeEffect, ExtendStyle};

fn segment(i: usize, id: &str, d: f64, trim: Option<f64>) -> RenderNode {
    RenderNode::Segment(SegmentNode {
        input_index: i,
        identifier: id.to_string(),
        source_duration: d,
        trim_start: 0.0,
        trim_duration: trim,
    })
}

fn xfade(policy: CrossfadePolicy, d: f64, offset: f64) -> RenderNode {
    RenderNode::Transition(TransitionNode {
        effect: CrossfadeEffect::Fade,
        policy,
        duration: d,
        offset,
        audio_crossfade: d,
    })
}

fn plan(nodes: Vec<RenderNode>) -> RenderPlan {
    RenderPlan {
        output_target: "out/final.mp4".to_string(),
        total_duration: 0.0,
        extend_style: ExtendStyle::Static,
        nodes,
    }
}

#[test]
fn encode_config_validation_rules() {
    assert!(EncodeConfig::default().validate().is_ok());
    assert!(EncodeConfig::default().with_size(0, 2).validate().is_err());
    let err = EncodeConfig::default()
        .with_size(641, 480)
        .validate()
        .unwrap_err();
    assert!(err.to_string().contains("even"));
    assert!(EncodeConfig::default().with_fps(0).validate().is_err());
    assert!(FfmpegRenderer::new(EncodeConfig::default().with_fps(0)).is_err());
}

#[test]
fn single_segment_maps_its_own_label() {
    let g = build_filter_graph(&plan(vec![segment(0, "a.mp4", 3.0, None)]), &EncodeConfig::default(), &[])
        .unwrap();
    assert_eq!(g.inputs, ["a.mp4"]);
    assert_eq!(g.output_label, "[s0]");
    assert!(g.filter_complex.starts_with("[0:v]fps=30,scale=1920:1080"));
    assert!(g.filter_complex.ends_with("[s0]"));
}

#[test]
fn joins_chain_in_order() {
    let rp = plan(vec![
        segment(0, "a.mp4", 10.0, Some(8.0)),
        xfade(CrossfadePolicy::Compress, 2.0, 8.0),
        segment(1, "b.mp4", 15.0, None),
        RenderNode::Cut,
        segment(2, "c.mp4", 5.0, None),
        xfade(CrossfadePolicy::Extend, 1.0, 28.0),
        segment(3, "d.mp4", 5.0, None),
    ]);
    let g = build_filter_graph(&rp, &EncodeConfig::default(), &[]).unwrap();

    assert_eq!(g.inputs.len(), 4);
    assert_eq!(g.output_label, "[j3]");
    assert!(g.filter_complex.contains(
        "[s0][s1]xfade=transition=fade:duration=2.000000:offset=8.000000[j1];"
    ));
    assert!(g.filter_complex.contains("[j1][s2]concat=n=2:v=1:a=0[j2];"));
    assert!(g.filter_complex.contains("[j2]tpad=stop_mode=clone:stop_duration=1.000000[ea3];"));
    assert!(g.filter_complex.contains("[s3]tpad=start_mode=clone:start_duration=1.000000[eb3];"));
    assert!(g.filter_complex.ends_with(
        "[ea3][eb3]xfade=transition=fade:duration=1.000000:offset=28.000000[j3]"
    ));
}

#[test]
fn malformed_node_lists_are_rejected() {
    let cfg = EncodeConfig::default();
    assert!(matches!(
        build_filter_graph(&plan(vec![]), &cfg, &[]),
        Err(MontageError::EmptyPlan)
    ));
    assert!(build_filter_graph(&plan(vec![RenderNode::Cut, segment(0, "a", 1.0, None)]), &cfg, &[]).is_err());
    assert!(build_filter_graph(
        &plan(vec![segment(0, "a", 1.0, None), segment(1, "b", 1.0, None)]),
        &cfg,
        &[]
    )
    .is_err());
    assert!(build_filter_graph(&plan(vec![segment(0, "a", 1.0, None), RenderNode::Cut]), &cfg, &[]).is_err());
}

#[test]
fn args_carry_encoder_and_hwaccel_per_input() {
    let rp = plan(vec![
        segment(0, "a.mp4", 2.0, None),
        RenderNode::Cut,
        segment(1, "b.mp4", 2.0, None),
    ]);
    let hw = EncoderChoice {
        codec: "h264_nvenc".to_string(),
        hwaccel: Some("cuda".to_string()),
    };
    let args = ffmpeg_args(&rp, &EncodeConfig::default(), &hw, &[false, false]).unwrap();

    assert_eq!(args.first().map(String::as_str), Some("-y"));
    assert_eq!(args.iter().filter(|a| *a == "-hwaccel").count(), 2);
    let codec_at = args.iter().position(|a| a == "-c:v").unwrap();
    assert_eq!(args[codec_at + 1], "h264_nvenc");
    assert!(args.iter().any(|a| a == "-an"));
    assert_eq!(args.last().map(String::as_str), Some("out/final.mp4"));

    let sw = ffmpeg_args(&rp, &EncodeConfig::default(), &EncoderChoice::software(), &[]).unwrap();
    assert!(!sw.iter().any(|a| a == "-hwaccel"));
}

#[test]
fn missing_ffmpeg_is_a_render_failure() {
    let config = EncodeConfig {
        ffmpeg_bin: PathBuf::from("definitely-not-a-real-ffmpeg-binary"),
        ..EncodeConfig::default()
    };
    let mut renderer = FfmpegRenderer::new(config).unwrap();
    let rp = plan(vec![segment(0, "a.mp4", 1.0, None)]);
    assert!(matches!(
        renderer.render(&rp),
        Err(MontageError::RenderFailure(_))
    ));
}

#[test]
fn crossfades_carry_audio_when_clips_have_it() {
    let rp = plan(vec![
        segment(0, "a.mp4", 10.0, Some(8.0)),
        xfade(CrossfadePolicy::Compress, 2.0, 8.0),
        segment(1, "b.mp4", 15.0, None),
        RenderNode::Cut,
        segment(2, "c.mp4", 5.0, None),
        xfade(CrossfadePolicy::Extend, 1.0, 28.0),
        segment(3, "d.mp4", 5.0, None),
    ]);
    let g = build_filter_graph(&rp, &EncodeConfig::default(), &[true; 4]).unwrap();

    assert_eq!(g.audio_label.as_deref(), Some("[aj3]"));
    assert!(g.filter_complex.contains("[0:a]atrim=duration=10.000000,asetpts=PTS-STARTPTS"));
    assert!(g.filter_complex.contains("[a0][a1]acrossfade=d=2.000000[aj1];"));
    assert!(g.filter_complex.contains("[aj1][a2]concat=n=2:v=0:a=1[aj2];"));
    assert!(g.filter_complex.contains("[aj2]apad=pad_dur=1.000000[pa3];"));
    assert!(g.filter_complex.contains("[a3]adelay=delays=1000:all=1[pb3];"));
    assert!(g.filter_complex.contains("[pa3][pb3]acrossfade=d=1.000000[aj3]"));

    let args = ffmpeg_args(&rp, &EncodeConfig::default(), &EncoderChoice::software(), &[true; 4])
        .unwrap();
    assert!(!args.iter().any(|a| a == "-an"));
    let maps: Vec<&str> = args
        .iter()
        .enumerate()
        .filter(|(_, a)| *a == "-map")
        .map(|(i, _)| args[i + 1].as_str())
        .collect();
    assert_eq!(maps, ["[j3]", "[aj3]"]);
    let audio_codec_at = args.iter().position(|a| a == "-c:a").unwrap();
    assert_eq!(args[audio_codec_at + 1], "aac");
}

#[test]
fn audio_follows_the_first_clip() {
    let rp = plan(vec![
        segment(0, "a.mp4", 4.0, None),
        RenderNode::Cut,
        segment(1, "b.mp4", 4.0, None),
        xfade(CrossfadePolicy::Extend, 1.0, 8.0),
        segment(2, "c.mp4", 4.0, None),
    ]);
    let cfg = EncodeConfig::default();

    let silent_start = build_filter_graph(&rp, &cfg, &[false, true, true]).unwrap();
    assert_eq!(silent_start.audio_label, None);
    assert!(!silent_start.filter_complex.contains(":a]"));

    let silent_middle = build_filter_graph(&rp, &cfg, &[true, false, true]).unwrap();
    assert!(!silent_middle.filter_complex.contains("[1:a]"));
    assert!(silent_middle.filter_complex.contains("[a0]apad=pad_dur=1.000000[pa2];"));
    assert_eq!(silent_middle.audio_label.as_deref(), Some("[aj2]"));
}

#[test]
fn dynamic_extend_holds_the_incoming_last_frame() {
    let mut rp = plan(vec![
        segment(0, "a.mp4", 4.0, None),
        xfade(CrossfadePolicy::Extend, 1.5, 4.0),
        segment(1, "b.mp4", 6.0, None),
    ]);
    rp.extend_style = ExtendStyle::Dynamic;
    let g = build_filter_graph(&rp, &EncodeConfig::default(), &[]).unwrap();

    assert!(g.filter_complex.contains("[s0]tpad=stop_mode=clone:stop_duration=1.500000[ea1];"));
    assert!(g.filter_complex.contains("[s1]tpad=stop_mode=clone:stop_duration=1.500000[eb1];"));
    assert!(!g.filter_complex.contains("start_mode"));
    assert!(g.filter_complex.ends_with("xfade=transition=fade:duration=1.500000:offset=4.000000[j1]"));
}

#[test]
fn discarding_a_missing_partial_output_is_fine() {
    let dir = std::env::temp_dir().join(format!("montage-discard-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("partial.mp4");
    std::fs::write(&path, b"").unwrap();

    discard_partial_output(&path).unwrap();
    assert!(!path.exists());
    discard_partial_output(&path).unwrap();
    let _ = std::fs::remove_dir_all(&dir);
}

#[cfg(unix)]
#[test]
fn software_retry_replaces_a_partial_hardware_output() {
    use std::os::unix::fs::PermissionsExt;

    let dir = std::env::temp_dir().join(format!("montage-fallback-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();

    // Stand-in ffmpeg: honours -n, and leaves an empty file behind for any encoder but libx264.
    let ffmpeg = dir.join("ffmpeg");
    std::fs::write(
        &ffmpeg,
        r#"#!/bin/sh
[ "$1" = "-version" ] && exit 0
out=""; codec=""; prev=""
for a in "$@"; do
  [ "$prev" = "-c:v" ] && codec="$a"
  prev="$a"; out="$a"
done
if [ "$1" = "-n" ] && [ -e "$out" ]; then echo "file exists" >&2; exit 1; fi
if [ "$codec" != "libx264" ]; then : > "$out"; echo "hardware encoder failed" >&2; exit 1; fi
printf 'video' > "$out"
"#,
    )
    .unwrap();
    let ffprobe = dir.join("ffprobe");
    std::fs::write(
        &ffprobe,
        "#!/bin/sh\necho '{\"streams\": [], \"format\": {\"duration\": \"12.5\"}}'\n",
    )
    .unwrap();
    for bin in [&ffmpeg, &ffprobe] {
        std::fs::set_permissions(bin, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    let config = EncodeConfig {
        ffmpeg_bin: ffmpeg,
        ffprobe_bin: ffprobe,
        overwrite: false,
        ..EncodeConfig::default()
    }
    .with_encoder(EncoderSelection::Fixed(EncoderChoice {
        codec: "h264_fakehw".to_string(),
        hwaccel: None,
    }));
    let mut renderer = FfmpegRenderer::new(config).unwrap();

    let output = dir.join("out.mp4");
    let rp = RenderPlan {
        output_target: output.to_string_lossy().to_string(),
        ..plan(vec![segment(0, "a.mp4", 12.5, None)])
    };
    let outcome = renderer.render(&rp).unwrap();

    assert_eq!(outcome.actual_size_bytes, 5);
    assert_eq!(outcome.actual_duration, 12.5);
    let _ = std::fs::remove_dir_all(&dir);
}
