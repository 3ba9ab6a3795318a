use crate::compile::graph::RenderPlan;
use crate::foundation::error::{MontageError, MontageResult};

/// What a renderer reports after producing the output.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RenderOutcome {
    /// Output identifier that was written.
    pub output: String,
    /// Measured output duration in seconds.
    pub actual_duration: f64,
    /// Output size in bytes.
    pub actual_size_bytes: u64,
}

/// Executes a [`RenderPlan`].
///
/// Failures are reported as [`MontageError::RenderFailure`]. Retry and fallback policies belong to
/// implementations; callers never retry.
pub trait Renderer {
    /// Render `plan` and report the measured result.
    fn render(&mut self, plan: &RenderPlan) -> MontageResult<RenderOutcome>;
}

/// In-memory renderer that records every plan it receives.
///
/// Reports the planned duration as the actual one and a size of zero. Useful for dry runs and
/// tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingRenderer {
    plans: Vec<RenderPlan>,
    failure: Option<String>,
}

impl RecordingRenderer {
    /// Renderer that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer that records the plan, then fails with `diagnostic`.
    pub fn failing(diagnostic: impl Into<String>) -> Self {
        Self {
            plans: Vec::new(),
            failure: Some(diagnostic.into()),
        }
    }

    /// Plans received so far.
    pub fn plans(&self) -> &[RenderPlan] {
        &self.plans
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, plan: &RenderPlan) -> MontageResult<RenderOutcome> {
        self.plans.push(plan.clone());
        if let Some(diagnostic) = &self.failure {
            return Err(MontageError::render(diagnostic.clone()));
        }
        Ok(RenderOutcome {
            output: plan.output_target.clone(),
            actual_duration: plan.total_duration,
            actual_size_bytes: 0,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
