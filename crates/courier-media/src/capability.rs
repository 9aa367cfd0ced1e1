//! Optional backend detection.
//!
//! Each backend is probed into a tagged [`Probe`] outcome. The public
//! `is_available` answer collapses that to a bool, but probe errors (a tool
//! that exists yet misbehaves) are kept apart from plain absence and logged
//! at warn level.

use std::fmt;
use std::io;
use std::process::Command;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::MediaConfig;
use crate::process::output_with_timeout;

/// An optional media processing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// In-process image decoding, scaling and encoding.
    Image,
    /// In-process video demuxing and frame decoding.
    VideoFrame,
    /// External command line tool reporting video metadata as JSON.
    VideoInspection,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Image, Backend::VideoFrame, Backend::VideoInspection];

    pub fn name(self) -> &'static str {
        match self {
            Backend::Image => "image",
            Backend::VideoFrame => "video-frame",
            Backend::VideoInspection => "video-inspection",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Outcome of probing one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Available,
    /// Not installed or not compiled in.
    Unavailable(String),
    /// Present but not usable: non-zero exit, timeout, unexpected OS error.
    ProbeError(String),
}

impl Probe {
    pub fn is_available(&self) -> bool {
        matches!(self, Probe::Available)
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::Available => f.write_str("available"),
            Probe::Unavailable(reason) => write!(f, "unavailable ({reason})"),
            Probe::ProbeError(cause) => write!(f, "probe error ({cause})"),
        }
    }
}

/// Which backends were found usable at detection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
    pub image: Probe,
    pub video_frame: Probe,
    pub video_inspection: Probe,
}

impl CapabilitySet {
    /// Probe every backend. Never fails; the external tool probe is bounded
    /// by `timeout`.
    pub fn detect(inspection_tool: &str, timeout: Duration) -> Self {
        let set = Self {
            image: probe_image(),
            video_frame: probe_video_frame(),
            video_inspection: probe_executable(inspection_tool, timeout),
        };
        for backend in Backend::ALL {
            match set.get(backend) {
                Probe::Available => debug!(backend = %backend, "backend available"),
                Probe::Unavailable(reason) => debug!(backend = %backend, %reason, "backend unavailable"),
                Probe::ProbeError(cause) => warn!(backend = %backend, %cause, "backend probe failed"),
            }
        }
        set
    }

    /// A set with every backend unavailable.
    pub fn none() -> Self {
        let absent = || Probe::Unavailable("disabled".into());
        Self {
            image: absent(),
            video_frame: absent(),
            video_inspection: absent(),
        }
    }

    pub fn get(&self, backend: Backend) -> &Probe {
        match backend {
            Backend::Image => &self.image,
            Backend::VideoFrame => &self.video_frame,
            Backend::VideoInspection => &self.video_inspection,
        }
    }

    pub fn is_available(&self, backend: Backend) -> bool {
        self.get(backend).is_available()
    }
}

fn probe_image() -> Probe {
    if cfg!(feature = "image-backend") {
        Probe::Available
    } else {
        Probe::Unavailable("built without the image-backend feature".into())
    }
}

#[cfg(feature = "ffmpeg")]
fn probe_video_frame() -> Probe {
    match crate::frame::init() {
        Ok(()) => Probe::Available,
        Err(e) => Probe::ProbeError(format!("FFmpeg failed to initialise: {e}")),
    }
}

#[cfg(not(feature = "ffmpeg"))]
fn probe_video_frame() -> Probe {
    Probe::Unavailable("built without the ffmpeg feature".into())
}

/// Run `<tool> -ver`. Only "not found" counts as absence.
fn probe_executable(tool: &str, timeout: Duration) -> Probe {
    match output_with_timeout(Command::new(tool).arg("-ver"), timeout) {
        Ok(output) if output.status.success() => Probe::Available,
        Ok(output) => Probe::ProbeError(format!("`{tool} -ver` exited with {}", output.status)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Probe::Unavailable(format!("{tool} not found"))
        }
        Err(e) => Probe::ProbeError(format!("`{tool} -ver` failed: {e}")),
    }
}

/// Process-wide capability cache.
///
/// The set is detected on first query and reused until [`invalidate`] is
/// called. Pinned registries never re-probe.
///
/// [`invalidate`]: CapabilityRegistry::invalidate
pub struct CapabilityRegistry {
    inspection_tool: String,
    probe_timeout: Duration,
    cached: RwLock<Option<CapabilitySet>>,
    pinned: bool,
}

impl CapabilityRegistry {
    pub fn new(inspection_tool: impl Into<String>, probe_timeout: Duration) -> Self {
        Self {
            inspection_tool: inspection_tool.into(),
            probe_timeout,
            cached: RwLock::new(None),
            pinned: false,
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(config.inspection_tool.clone(), config.probe_timeout())
    }

    /// A registry that always reports `set`.
    pub fn fixed(set: CapabilitySet) -> Self {
        Self {
            inspection_tool: String::new(),
            probe_timeout: Duration::ZERO,
            cached: RwLock::new(Some(set)),
            pinned: true,
        }
    }

    pub fn inspection_tool(&self) -> &str {
        &self.inspection_tool
    }

    pub fn capabilities(&self) -> CapabilitySet {
        if let Some(set) = self.cached.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return set.clone();
        }

        let mut cached = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        cached
            .get_or_insert_with(|| CapabilitySet::detect(&self.inspection_tool, self.probe_timeout))
            .clone()
    }

    pub fn is_available(&self, backend: Backend) -> bool {
        self.capabilities().is_available(backend)
    }

    /// Drop the cached set so the next query probes again.
    pub fn invalidate(&self) {
        if self.pinned {
            return;
        }
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("inspection_tool", &self.inspection_tool)
            .field("pinned", &self.pinned)
            .finish()
    }
}
