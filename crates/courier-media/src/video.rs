//! Video metadata from the external inspection tool.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::process::output_with_timeout;

/// Stream properties of a video file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProperties {
    pub width: u32,
    pub height: u32,
    /// Average bitrate in bits per second.
    pub bitrate: u64,
    /// Duration in seconds.
    pub duration: f64,
}

/// Why an inspection run yielded nothing. Only ever logged.
#[derive(Debug, Error)]
pub(crate) enum InspectError {
    #[error("failed to run: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("exited with {0}")]
    Status(std::process::ExitStatus),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no result object in output")]
    Empty,

    #[error("field {0} missing or not numeric")]
    MissingField(&'static str),
}

/// Run `<tool> -j -n <input>` and read the four stream fields. Every failure
/// is logged at warn level and reported as `None`.
pub(crate) fn inspect(tool: &str, input: &Path, timeout: Duration) -> Option<VideoProperties> {
    let result = output_with_timeout(Command::new(tool).args(["-j", "-n"]).arg(input), timeout)
        .map_err(InspectError::from)
        .and_then(|output| {
            if output.status.success() {
                parse_inspection(&output.stdout)
            } else {
                Err(InspectError::Status(output.status))
            }
        });

    match result {
        Ok(properties) => Some(properties),
        Err(e) => {
            warn!(tool, video = %input.display(), "reading video properties failed: {e}");
            None
        }
    }
}

/// Parse the tool's JSON array and pick `ImageWidth`, `ImageHeight`,
/// `AvgBitrate` and `Duration` from its first object.
pub(crate) fn parse_inspection(raw: &[u8]) -> Result<VideoProperties, InspectError> {
    let results: Vec<Value> = serde_json::from_slice(raw)?;
    let first = results.first().ok_or(InspectError::Empty)?;

    let number = |field: &'static str| -> Result<f64, InspectError> {
        first
            .get(field)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or(InspectError::MissingField(field))
    };

    Ok(VideoProperties {
        width: number("ImageWidth")?.round() as u32,
        height: number("ImageHeight")?.round() as u32,
        bitrate: number("AvgBitrate")?.round() as u64,
        duration: number("Duration")?,
    })
}
