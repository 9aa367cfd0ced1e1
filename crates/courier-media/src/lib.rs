//! Media helpers for the courier client: MIME resolution, image scaling,
//! video inspection and preview generation.
//!
//! Every backend is optional. The image backend is a compile-time feature,
//! FFmpeg frame extraction needs the `ffmpeg` feature and a working runtime,
//! and the inspection tool is probed on the `PATH`. Missing backends degrade
//! operations to "no result" rather than failing them.

pub mod capability;
pub mod config;
pub mod error;
pub mod hash;
pub mod imaging;
pub mod mime;
pub mod pipeline;
pub mod video;

#[cfg(feature = "ffmpeg")]
mod frame;
mod process;

#[cfg(test)]
mod test_support;

pub use capability::{Backend, CapabilityRegistry, CapabilitySet, Probe};
pub use config::{MediaConfig, MimeConfig};
pub use error::MediaError;
pub use hash::upload_hash;
pub use imaging::{fit_within, ImageFormat};
pub use mime::{MimeResolver, MimeTable};
pub use pipeline::MediaPipeline;
pub use video::VideoProperties;
