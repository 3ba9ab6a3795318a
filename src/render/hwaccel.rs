use std::path::Path;
use std::process::{Command, Stdio};

/// Operating system family used for encoder selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostOs {
    /// macOS (VideoToolbox).
    MacOs,
    /// Windows (NVENC, QSV).
    Windows,
    /// Linux (NVENC, QSV, VAAPI).
    Linux,
    /// Anything else; always software.
    Other,
}

impl HostOs {
    /// Family of the running host.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Self::MacOs,
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            _ => Self::Other,
        }
    }
}

/// Video encoder plus the matching `-hwaccel` method.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct EncoderChoice {
    /// `-c:v` value.
    pub codec: String,
    /// `-hwaccel` value, `None` for software decoding.
    pub hwaccel: Option<String>,
}

impl EncoderChoice {
    /// `libx264` without hardware acceleration.
    pub fn software() -> Self {
        Self {
            codec: SOFTWARE_CODEC.to_string(),
            hwaccel: None,
        }
    }

    fn hardware(codec: &str, hwaccel: &str) -> Self {
        Self {
            codec: codec.to_string(),
            hwaccel: Some(hwaccel.to_string()),
        }
    }

    /// `true` when a hardware method is selected.
    pub fn is_hardware(&self) -> bool {
        self.hwaccel.is_some()
    }
}

/// Software H.264 encoder used as the fallback everywhere.
pub const SOFTWARE_CODEC: &str = "libx264";

/// Pick an H.264 encoder from `ffmpeg -encoders` and `ffmpeg -hwaccels` output.
///
/// macOS prefers VideoToolbox. Windows and Linux prefer NVENC, then QSV; Linux additionally accepts
/// VAAPI when the `vaapi` hwaccel is listed. Everything else gets `libx264`.
pub fn select_encoder(os: HostOs, encoders_listing: &str, hwaccels_listing: &str) -> EncoderChoice {
    let encoders = encoder_names(encoders_listing);
    let hwaccels = hwaccel_names(hwaccels_listing);
    let has = |name: &str| encoders.contains(&name);

    let candidates: &[(&str, &str)] = match os {
        HostOs::MacOs => &[("h264_videotoolbox", "videotoolbox")],
        HostOs::Windows => &[("h264_nvenc", "cuda"), ("h264_qsv", "qsv")],
        HostOs::Linux => &[("h264_nvenc", "cuda"), ("h264_qsv", "qsv"), ("h264_vaapi", "vaapi")],
        HostOs::Other => &[],
    };

    candidates
        .iter()
        .find(|(codec, accel)| has(*codec) && (*accel != "vaapi" || hwaccels.contains(accel)))
        .map(|(codec, accel)| EncoderChoice::hardware(codec, accel))
        .unwrap_or_else(EncoderChoice::software)
}

/// Query `ffmpeg_bin` and select an encoder for the running host.
///
/// Any failure to run `ffmpeg` selects the software encoder.
pub fn detect_encoder(ffmpeg_bin: &Path) -> EncoderChoice {
    let (Some(encoders), Some(hwaccels)) = (
        ffmpeg_listing(ffmpeg_bin, "-encoders"),
        ffmpeg_listing(ffmpeg_bin, "-hwaccels"),
    ) else {
        tracing::debug!("ffmpeg capability listing unavailable; using software encoder");
        return EncoderChoice::software();
    };
    let choice = select_encoder(HostOs::current(), &encoders, &hwaccels);
    tracing::debug!(codec = %choice.codec, hwaccel = ?choice.hwaccel, "selected encoder");
    choice
}

fn ffmpeg_listing(ffmpeg_bin: &Path, flag: &str) -> Option<String> {
    let out = Command::new(ffmpeg_bin)
        .args(["-hide_banner", flag])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).into_owned())
}

// ` V....D h264_nvenc   NVIDIA NVENC H.264 encoder` -> `h264_nvenc`
fn encoder_names(listing: &str) -> Vec<&str> {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .collect()
}

fn hwaccel_names(listing: &str) -> Vec<&str> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.ends_with(':'))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/hwaccel.rs"]
mod tests;
