use std::fmt::Write as _;

use crate::compile::graph::{RenderNode, RenderPlan};
use crate::composition::model::CrossfadePolicy;
use crate::foundation::time::fmt_secs;

/// Human-readable outline of a render plan. Nothing is executed.
///
/// ```text
/// # planned filter graph (preview only)
/// input A.mp4 as [v0] duration=10.00s trim=0.00s..8.00s
/// xfade(compress, fade) dur=2.00s offset=8.00s -> [xf1]
/// input B.mp4 as [v1] duration=15.00s full
/// final output -> out.mp4
/// total ≈ 23.00s
/// ```
pub fn graph_preview(plan: &RenderPlan) -> String {
    let mut out = String::from("# planned filter graph (preview only)\n");
    let mut xf_count = 0usize;

    for node in &plan.nodes {
        // Writing into a String cannot fail.
        let _ = match node {
            RenderNode::Segment(s) => {
                let window = match s.trim_duration {
                    Some(len) => format!(
                        "trim={}..{}",
                        fmt_secs(s.trim_start),
                        fmt_secs(s.trim_start + len)
                    ),
                    None => "full".to_string(),
                };
                writeln!(
                    out,
                    "input {} as [v{}] duration={} {window}",
                    s.identifier,
                    s.input_index,
                    fmt_secs(s.source_duration)
                )
            }
            RenderNode::Transition(t) => {
                xf_count += 1;
                let (mode, suffix) = match t.policy {
                    CrossfadePolicy::Compress => (t.policy.to_string(), ""),
                    CrossfadePolicy::Extend => {
                        (format!("{}-{}", t.policy, plan.extend_style), " (+duration)")
                    }
                };
                writeln!(
                    out,
                    "xfade({mode}, {}) dur={} offset={} -> [xf{xf_count}]{suffix}",
                    t.effect,
                    fmt_secs(t.duration),
                    fmt_secs(t.offset)
                )
            }
            RenderNode::Cut => writeln!(out, "-- concat boundary --"),
        };
    }

    let _ = writeln!(out, "final output -> {}", plan.output_target);
    let _ = write!(out, "total ≈ {}", fmt_secs(plan.total_duration));
    out
}

#[cfg(test)]
#[path = "../../tests/unit/compile/preview.rs"]
mod tests;
