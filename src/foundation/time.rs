use crate::foundation::error::{MontageError, MontageResult};

/// Tolerance for comparing synthetic durations.
pub const EPSILON: f64 = 1e-6;

/// `true` when `a` and `b` differ by at most `eps` seconds.
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

/// Accept `secs` only when it is finite and strictly positive.
pub fn positive_seconds(secs: f64) -> MontageResult<f64> {
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err(MontageError::InvalidDuration { duration: secs })
    }
}

/// Format seconds with two decimals, e.g. `8.00s`.
pub fn fmt_secs(secs: f64) -> String {
    format!("{secs:.2}s")
}
