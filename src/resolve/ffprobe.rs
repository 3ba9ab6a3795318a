use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::error::{MontageError, MontageResult};
use crate::resolve::resolver::DurationResolver;

/// Resolver that asks the system `ffprobe` for container durations.
#[derive(Clone, Debug)]
pub struct FfprobeResolver {
    ffprobe_bin: PathBuf,
}

impl Default for FfprobeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FfprobeResolver {
    /// Use `ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self {
            ffprobe_bin: PathBuf::from("ffprobe"),
        }
    }

    /// Use a specific `ffprobe` binary.
    pub fn with_binary(bin: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_bin: bin.into(),
        }
    }

    /// Binary this resolver runs.
    pub fn binary(&self) -> &Path {
        &self.ffprobe_bin
    }
}

impl DurationResolver for FfprobeResolver {
    #[tracing::instrument(skip(self))]
    fn resolve(&mut self, identifier: &str) -> MontageResult<f64> {
        let out = Command::new(&self.ffprobe_bin)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(identifier)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                MontageError::duration_unavailable(identifier, format!("failed to run ffprobe: {e}"))
            })?;
        if !out.status.success() {
            return Err(MontageError::duration_unavailable(
                identifier,
                format!(
                    "ffprobe exited with status {}: {}",
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            ));
        }

        let duration = parse_probe_duration(&out.stdout)
            .map_err(|cause| MontageError::duration_unavailable(identifier, cause))?;
        tracing::debug!(identifier, duration, "probed clip duration");
        Ok(duration)
    }
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Extract a duration from `ffprobe -print_format json` output.
///
/// Prefers `format.duration`; falls back to the first video stream's duration.
pub(crate) fn parse_probe_duration(stdout: &[u8]) -> Result<f64, String> {
    let parsed: ProbeOut =
        serde_json::from_slice(stdout).map_err(|e| format!("ffprobe json parse failed: {e}"))?;

    let from_format = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|s| s.trim().parse::<f64>().ok());
    let from_stream = || {
        parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .and_then(|s| s.duration.as_deref())
            .and_then(|s| s.trim().parse::<f64>().ok())
    };

    match from_format.or_else(from_stream) {
        Some(d) if d.is_finite() && d > 0.0 => Ok(d),
        Some(d) => Err(format!("ffprobe reported a non-positive duration ({d})")),
        None => Err("ffprobe output has no duration".to_string()),
    }
}

/// `true` when `ffprobe -show_streams` output lists an audio stream.
pub(crate) fn parse_has_audio(stdout: &[u8]) -> bool {
    serde_json::from_slice::<ProbeOut>(stdout)
        .map(|parsed| {
            parsed
                .streams
                .iter()
                .any(|s| s.codec_type.as_deref() == Some("audio"))
        })
        .unwrap_or(false)
}

/// Ask `ffprobe` whether `identifier` carries an audio stream.
///
/// A probe that cannot run or fails counts as "no audio"; the clip then renders silent.
pub fn has_audio_stream(ffprobe_bin: &Path, identifier: &str) -> bool {
    let out = Command::new(ffprobe_bin)
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(identifier)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();
    match out {
        Ok(out) if out.status.success() => parse_has_audio(&out.stdout),
        Ok(out) => {
            tracing::debug!(identifier, status = %out.status, "audio probe failed; treating clip as silent");
            false
        }
        Err(e) => {
            tracing::debug!(identifier, error = %e, "audio probe could not run; treating clip as silent");
            false
        }
    }
}

/// `true` when `bin -version` runs successfully.
pub fn is_tool_on_path(bin: &Path) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/ffprobe.rs"]
mod tests;
