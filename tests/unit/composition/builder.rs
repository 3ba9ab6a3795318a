use super::*;
use crate::{
    foundation::time::{EPSILON, approx_eq},
    render::renderer::RecordingRenderer,
    resolve::resolver::StaticResolver,
};

fn resolver() -> StaticResolver {
    StaticResolver::new()
        .with("A", 10.0)
        .with("B", 15.0)
        .with("C", 5.0)
}

#[test]
fn chained_appends_build_an_alternating_plan() {
    let mut b = SequenceBuilder::new(resolver());
    b.append_clip("A")
        .unwrap()
        .append_cut()
        .unwrap()
        .append_clip("B")
        .unwrap()
        .append_crossfade(1.0, CrossfadePolicy::Extend)
        .unwrap()
        .append_clip("C")
        .unwrap();
    let kinds: Vec<&str> = b.plan().items().iter().map(SequenceItem::kind).collect();
    assert_eq!(kinds, ["clip", "transition", "clip", "transition", "clip"]);
}

#[test]
fn invalid_crossfade_duration_fails_at_the_call() {
    let mut b = SequenceBuilder::new(resolver());
    b.append_clip("A").unwrap();
    assert!(matches!(
        b.append_crossfade(0.0, CrossfadePolicy::Compress),
        Err(MontageError::InvalidDuration { .. })
    ));
    assert!(matches!(
        b.append_crossfade(-2.0, CrossfadePolicy::Extend),
        Err(MontageError::InvalidDuration { .. })
    ));
    assert_eq!(b.plan().items().len(), 1);
}

#[test]
fn eager_existence_check_rejects_missing_files() {
    let mut b = SequenceBuilder::with_options(
        resolver(),
        BuilderOptions {
            check_existence: true,
        },
    );
    assert!(matches!(
        b.append_clip("/definitely/not/here.mp4"),
        Err(MontageError::ClipNotFound { .. })
    ));
    assert!(b.append_clip(env!("CARGO_MANIFEST_DIR")).is_ok());
}

#[test]
fn describe_reports_total_items_and_preview() {
    let mut b = SequenceBuilder::new(resolver());
    b.append_clip("A")
        .unwrap()
        .append_crossfade(2.0, CrossfadePolicy::Compress)
        .unwrap()
        .append_clip("B")
        .unwrap()
        .set_output_target("out.mp4")
        .unwrap();

    let d = b.describe().unwrap();
    assert!(approx_eq(d.total_duration, 23.0, EPSILON));
    assert_eq!(d.output, "out.mp4");
    assert_eq!(d.items.len(), 3);
    assert_eq!(d.items[0].duration, 10.0);
    assert!(d.graph_preview.contains("trim=0.00s..8.00s"));
    assert!(d.graph_preview.contains("dur=2.00s"));
    assert!(d.graph_preview.contains("input B as [v1] duration=15.00s full"));

    let again = b.describe().unwrap();
    assert_eq!(d, again);
    assert_eq!(b.resolver().lookups(), ["A", "B"]);
}

#[test]
fn describe_surfaces_validation_errors() {
    let mut b = SequenceBuilder::new(resolver());
    b.append_clip("A").unwrap();
    assert!(matches!(
        b.describe(),
        Err(MontageError::MissingOutputTarget)
    ));
    assert!(!b.plan().is_frozen());
}

#[test]
fn commit_renders_once() {
    let mut b = SequenceBuilder::new(resolver());
    b.append_clip("A")
        .unwrap()
        .append_cut()
        .unwrap()
        .append_clip("C")
        .unwrap()
        .set_output_target("out.mp4")
        .unwrap();

    let mut renderer = RecordingRenderer::new();
    let outcome = b.commit(&mut renderer).unwrap();
    assert_eq!(outcome.output, "out.mp4");
    assert!(approx_eq(outcome.planned_duration, 15.0, EPSILON));
    assert!(approx_eq(outcome.actual_duration, 15.0, EPSILON));
    assert_eq!(renderer.plans().len(), 1);
    assert_eq!(b.plan().state(), PlanState::Executed);

    assert!(matches!(
        b.commit(&mut renderer),
        Err(MontageError::AlreadyExecuted)
    ));
    assert_eq!(renderer.plans().len(), 1);
    assert!(matches!(b.append_cut(), Err(MontageError::PlanFrozen)));
}

#[test]
fn failed_render_keeps_the_plan_committable() {
    let mut b = SequenceBuilder::new(resolver());
    b.append_clip("A").unwrap().set_output_target("out.mp4").unwrap();

    let mut failing = RecordingRenderer::failing("encoder exploded");
    let err = b.commit(&mut failing).unwrap_err();
    assert!(matches!(err, MontageError::RenderFailure(ref msg) if msg == "encoder exploded"));
    assert_eq!(b.plan().state(), PlanState::Frozen);

    let outcome = b.commit(&mut RecordingRenderer::new()).unwrap();
    assert_eq!(outcome.actual_duration, 10.0);
    assert_eq!(b.resolver().lookups(), ["A"]);
}

#[test]
fn describe_leaves_the_builder_open() {
    let mut b = SequenceBuilder::new(resolver());
    b.append_clip("A")
        .unwrap()
        .append_crossfade(2.0, CrossfadePolicy::Compress)
        .unwrap()
        .append_clip("B")
        .unwrap()
        .set_output_target("out.mp4")
        .unwrap();

    let first = b.describe().unwrap();
    assert!(approx_eq(first.total_duration, 23.0, EPSILON));
    assert_eq!(b.plan().state(), PlanState::Building);

    b.append_cut().unwrap().append_clip("C").unwrap();
    let second = b.describe().unwrap();
    assert!(approx_eq(second.total_duration, 28.0, EPSILON));
    assert_eq!(second.items.len(), 5);

    let outcome = b.commit(&mut RecordingRenderer::new()).unwrap();
    assert!(approx_eq(outcome.planned_duration, 28.0, EPSILON));
    assert_eq!(b.resolver().lookups(), ["A", "B", "C"]);
}

#[test]
fn extend_style_shows_in_the_preview() {
    let mut b = SequenceBuilder::new(resolver());
    b.append_clip("A")
        .unwrap()
        .append_crossfade(1.0, CrossfadePolicy::Extend)
        .unwrap()
        .append_clip("C")
        .unwrap()
        .set_extend_style(ExtendStyle::Dynamic)
        .unwrap()
        .set_output_target("out.mp4")
        .unwrap();

    let d = b.describe().unwrap();
    assert_eq!(d.render_plan.extend_style, ExtendStyle::Dynamic);
    assert!(d.graph_preview.contains("xfade(extend-dynamic, fade)"));
    assert!(approx_eq(d.total_duration, 16.0, EPSILON));
}
