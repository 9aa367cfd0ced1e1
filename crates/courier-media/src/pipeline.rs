//! Preview generation over whichever backends are present.
//!
//! Every operation has three outcomes: data, nothing (backend absent or the
//! inspection was inconclusive), or a hard error. Only I/O failures on the
//! caller's paths and undecodable input images are errors.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::capability::{Backend, CapabilityRegistry};
use crate::config::MediaConfig;
use crate::error::MediaError;
use crate::imaging::ImageFormat;
use crate::mime::MimeResolver;
use crate::video::{self, VideoProperties};

pub struct MediaPipeline {
    config: MediaConfig,
    capabilities: Arc<CapabilityRegistry>,
    mime: MimeResolver,
}

impl MediaPipeline {
    pub fn new(config: MediaConfig, capabilities: Arc<CapabilityRegistry>, mime: MimeResolver) -> Self {
        Self {
            config,
            capabilities,
            mime,
        }
    }

    /// Build the registry and load the MIME tables from `config`.
    pub fn from_config(config: MediaConfig) -> Self {
        let capabilities = Arc::new(CapabilityRegistry::from_config(&config));
        let mime = MimeResolver::load(&config.mime);
        Self::new(config, capabilities, mime)
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    pub fn mime(&self) -> &MimeResolver {
        &self.mime
    }

    pub fn resolve_mime(&self, path: &Path) -> Result<String, MediaError> {
        self.mime.resolve(path)
    }

    /// Scale `input` into a `max_width` × `max_height` box and write it to
    /// `output` as `format`. `Ok(false)` when the image backend is absent.
    pub fn scale_image(
        &self,
        input: &Path,
        output: &Path,
        format: ImageFormat,
        max_width: u32,
        max_height: u32,
    ) -> Result<bool, MediaError> {
        if !self.capabilities.is_available(Backend::Image) {
            debug!(image = %input.display(), "image backend not available, not scaling");
            return Ok(false);
        }
        self.scale_with_backend(input, output, format, max_width, max_height)
    }

    #[cfg(feature = "image-backend")]
    fn scale_with_backend(
        &self,
        input: &Path,
        output: &Path,
        format: ImageFormat,
        max_width: u32,
        max_height: u32,
    ) -> Result<bool, MediaError> {
        let (width, height) = crate::imaging::scale(input, output, format, max_width, max_height)?;
        debug!(image = %input.display(), width, height, %format, "image scaled");
        Ok(true)
    }

    #[cfg(not(feature = "image-backend"))]
    fn scale_with_backend(
        &self,
        _input: &Path,
        _output: &Path,
        _format: ImageFormat,
        _max_width: u32,
        _max_height: u32,
    ) -> Result<bool, MediaError> {
        Ok(false)
    }

    /// `Ok(None)` when the image backend is absent.
    pub fn image_dimensions(&self, input: &Path) -> Result<Option<(u32, u32)>, MediaError> {
        if !self.capabilities.is_available(Backend::Image) {
            debug!(image = %input.display(), "image backend not available, dimensions unknown");
            return Ok(None);
        }

        #[cfg(feature = "image-backend")]
        return crate::imaging::dimensions(input).map(Some);

        #[cfg(not(feature = "image-backend"))]
        Ok(None)
    }

    /// JPEG preview fitting the configured preview box.
    pub fn preview_from_image(&self, input: &Path) -> Result<Option<Vec<u8>>, MediaError> {
        if !self.capabilities.is_available(Backend::Image) {
            debug!(image = %input.display(), "image backend not available, no preview");
            return Ok(None);
        }

        // Removed when dropped, on every return path.
        let scratch = self.scratch_file(".jpg")?;
        let scaled = self.scale_image(
            input,
            scratch.path(),
            ImageFormat::Jpeg,
            self.config.preview_width,
            self.config.preview_height,
        )?;
        if !scaled {
            return Ok(None);
        }
        Ok(Some(fs::read(scratch.path())?))
    }

    /// Width, height, bitrate and duration of a video.
    ///
    /// Prefers the video-frame backend, then the inspection tool. Tool
    /// failures are logged and reported as `Ok(None)`.
    pub fn video_properties(&self, input: &Path) -> Result<Option<VideoProperties>, MediaError> {
        ensure_readable_file(input)?;
        let capabilities = self.capabilities.capabilities();

        if capabilities.is_available(Backend::VideoFrame) {
            return Ok(self.frame_properties(input));
        }
        if capabilities.is_available(Backend::VideoInspection) {
            return Ok(video::inspect(
                &self.config.inspection_tool,
                input,
                self.config.inspect_timeout(),
            ));
        }

        warn!(
            video = %input.display(),
            tool = %self.config.inspection_tool,
            "none of [video-frame backend, inspection tool] available"
        );
        Ok(None)
    }

    #[cfg(feature = "ffmpeg")]
    fn frame_properties(&self, input: &Path) -> Option<VideoProperties> {
        match crate::frame::stream_properties(input) {
            Ok(properties) => Some(properties),
            Err(e) => {
                warn!(video = %input.display(), "reading stream properties failed: {e}");
                None
            }
        }
    }

    #[cfg(not(feature = "ffmpeg"))]
    fn frame_properties(&self, _input: &Path) -> Option<VideoProperties> {
        None
    }

    /// JPEG preview of the first frame. Needs the video-frame backend; the
    /// inspection tool cannot produce pixels.
    pub fn preview_from_video(&self, input: &Path) -> Result<Option<Vec<u8>>, MediaError> {
        ensure_readable_file(input)?;
        if !self.capabilities.is_available(Backend::VideoFrame) {
            debug!(video = %input.display(), "video-frame backend not available, no preview");
            return Ok(None);
        }
        self.frame_preview(input)
    }

    #[cfg(feature = "ffmpeg")]
    fn frame_preview(&self, input: &Path) -> Result<Option<Vec<u8>>, MediaError> {
        let frame = match crate::frame::first_frame(input) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                warn!(video = %input.display(), "no decodable video frame");
                return Ok(None);
            }
            Err(e) => {
                warn!(video = %input.display(), "frame extraction failed: {e}");
                return Ok(None);
            }
        };

        let scratch = self.scratch_file(".jpg")?;
        frame
            .save_with_format(scratch.path(), image::ImageFormat::Jpeg)
            .map_err(crate::imaging::backend::map_image_error)?;
        self.preview_from_image(scratch.path())
    }

    #[cfg(not(feature = "ffmpeg"))]
    fn frame_preview(&self, _input: &Path) -> Result<Option<Vec<u8>>, MediaError> {
        Ok(None)
    }

    /// Preview for any supported file, chosen by its MIME type.
    pub fn preview(&self, input: &Path) -> Result<Option<Vec<u8>>, MediaError> {
        let mime = self.mime.resolve(input)?;
        match mime.split('/').next() {
            Some("image") => self.preview_from_image(input),
            Some("video") => self.preview_from_video(input),
            _ => {
                debug!(path = %input.display(), %mime, "no preview for this type");
                Ok(None)
            }
        }
    }

    fn scratch_file(&self, suffix: &str) -> Result<NamedTempFile, MediaError> {
        let file = match &self.config.scratch_dir {
            Some(dir) => tempfile::Builder::new()
                .prefix("courier-")
                .suffix(suffix)
                .tempfile_in(dir)?,
            None => tempfile::Builder::new()
                .prefix("courier-")
                .suffix(suffix)
                .tempfile()?,
        };
        Ok(file)
    }
}

/// Unreadable or non-regular inputs are I/O errors, before any backend runs.
fn ensure_readable_file(input: &Path) -> Result<(), MediaError> {
    let file = File::open(input)?;
    if !file.metadata()?.is_file() {
        return Err(MediaError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", input.display()),
        )));
    }
    Ok(())
}
