use super::*;
use crate::{
    foundation::time::{EPSILON, approx_eq},
    resolve::resolver::StaticResolver,
};

fn frozen(items: Vec<SequenceItem>, durations: &[(&str, f64)]) -> Plan {
    let mut plan = Plan::from_items(items).unwrap();
    plan.set_output_target("out.mp4").unwrap();
    let mut resolver = StaticResolver::new();
    for (id, d) in durations {
        resolver.insert(*id, *d);
    }
    plan.freeze(&mut resolver).unwrap();
    plan
}

fn clip(id: &str) -> SequenceItem {
    SequenceItem::Clip(ClipRef::new(id).unwrap())
}

#[test]
fn building_plan_is_rejected() {
    let plan = Plan::from_items([clip("A")]).unwrap();
    assert!(matches!(
        derive_render_plan(&plan),
        Err(MontageError::PlanNotFrozen)
    ));
}

#[test]
fn compress_trims_the_outgoing_segment() {
    let plan = frozen(
        vec![
            clip("A"),
            TransitionSpec::compress(2.0).unwrap().into(),
            clip("B"),
        ],
        &[("A", 10.0), ("B", 15.0)],
    );
    let rp = derive_render_plan(&plan).unwrap();

    assert_eq!(rp.output_target, "out.mp4");
    assert!(approx_eq(rp.total_duration, 23.0, EPSILON));

    let segments: Vec<_> = rp.segments().collect();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].trim_duration, Some(8.0));
    assert_eq!(segments[0].trim_start, 0.0);
    assert_eq!(segments[1].trim_duration, None);
    assert_eq!(segments[1].input_index, 1);

    let transitions: Vec<_> = rp.transitions().collect();
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].duration, 2.0);
    assert_eq!(transitions[0].offset, 8.0);
    assert_eq!(transitions[0].audio_crossfade, 2.0);
    assert_eq!(transitions[0].policy, CrossfadePolicy::Compress);
}

#[test]
fn mixed_sequence_offsets_and_node_order() {
    let plan = frozen(
        vec![
            clip("A"),
            TransitionSpec::compress(1.0).unwrap().into(),
            clip("B"),
            TransitionSpec::extend(1.0).unwrap().into(),
            clip("C"),
            TransitionSpec::Cut.into(),
            clip("D"),
        ],
        &[("A", 15.0), ("B", 15.0), ("C", 15.0), ("D", 5.0)],
    );
    let rp = derive_render_plan(&plan).unwrap();

    let kinds: Vec<&str> = rp
        .nodes
        .iter()
        .map(|n| match n {
            RenderNode::Segment(_) => "segment",
            RenderNode::Transition(_) => "transition",
            RenderNode::Cut => "cut",
        })
        .collect();
    assert_eq!(
        kinds,
        ["segment", "transition", "segment", "transition", "segment", "cut", "segment"]
    );

    let offsets: Vec<f64> = rp.transitions().map(|t| t.offset).collect();
    assert_eq!(offsets, vec![14.0, 29.0]);
    assert!(approx_eq(rp.total_duration, 50.0, EPSILON));
    assert!(approx_eq(
        rp.total_duration,
        plan.total_duration().unwrap(),
        EPSILON
    ));
}

#[test]
fn extend_keeps_both_segments_whole() {
    let plan = frozen(
        vec![
            clip("A"),
            TransitionSpec::extend(2.0).unwrap().into(),
            clip("B"),
        ],
        &[("A", 4.0), ("B", 6.0)],
    );
    let rp = derive_render_plan(&plan).unwrap();
    assert!(rp.segments().all(|s| s.trim_duration.is_none()));
    assert_eq!(rp.transitions().next().unwrap().offset, 4.0);
    assert!(approx_eq(rp.total_duration, 12.0, EPSILON));
}

#[test]
fn deriving_twice_is_identical() {
    let plan = frozen(
        vec![clip("A"), TransitionSpec::Cut.into(), clip("B")],
        &[("A", 1.5), ("B", 2.5)],
    );
    let first = derive_render_plan(&plan).unwrap();
    let second = derive_render_plan(&plan).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.nodes[1], RenderNode::Cut);
}

#[test]
fn nodes_serialize_with_a_tag() {
    let plan = frozen(
        vec![clip("A"), TransitionSpec::Cut.into(), clip("B")],
        &[("A", 1.0), ("B", 1.0)],
    );
    let v = serde_json::to_value(derive_render_plan(&plan).unwrap()).unwrap();
    assert_eq!(v["nodes"][0]["node"], "segment");
    assert_eq!(v["nodes"][1]["node"], "cut");
    assert_eq!(v["total_duration"], 2.0);
}

#[test]
fn extend_style_is_carried_without_changing_timing() {
    let items = vec![
        clip("A"),
        TransitionSpec::extend(1.0).unwrap().into(),
        clip("B"),
    ];
    let durations = [("A", 4.0), ("B", 6.0)];
    let still = derive_render_plan(&frozen(items.clone(), &durations)).unwrap();
    assert_eq!(still.extend_style, ExtendStyle::Static);

    let mut plan = Plan::from_items(items).unwrap();
    plan.set_extend_style(ExtendStyle::Dynamic).unwrap();
    plan.set_output_target("out.mp4").unwrap();
    plan.freeze(&mut StaticResolver::new().with("A", 4.0).with("B", 6.0))
        .unwrap();
    let moving = derive_render_plan(&plan).unwrap();

    assert_eq!(moving.extend_style, ExtendStyle::Dynamic);
    assert_eq!(moving.nodes, still.nodes);
    assert!(approx_eq(moving.total_duration, 11.0, EPSILON));
    assert!(matches!(
        plan.set_extend_style(ExtendStyle::Static),
        Err(MontageError::PlanFrozen)
    ));
}
