//! FFmpeg-backed video access: stream properties and first-frame extraction.

use std::path::Path;
use std::sync::OnceLock;

use ffmpeg_next as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{self, Flags};
use ffmpeg::util::frame::video::Video;
use image::RgbImage;

use crate::video::VideoProperties;

/// `AV_TIME_BASE`: container durations are expressed in microseconds.
const TIME_BASE: f64 = 1_000_000.0;

static FFMPEG_INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Initialise FFmpeg once per process; the outcome is remembered.
pub(crate) fn init() -> Result<(), String> {
    FFMPEG_INIT
        .get_or_init(|| ffmpeg::init().map_err(|e| e.to_string()))
        .clone()
}

/// Width and height of the best video stream, container bitrate and duration.
pub(crate) fn stream_properties(path: &Path) -> Result<VideoProperties, ffmpeg::Error> {
    let ictx = ffmpeg::format::input(&path)?;
    let stream = ictx
        .streams()
        .best(Type::Video)
        .ok_or(ffmpeg::Error::StreamNotFound)?;
    let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())?
        .decoder()
        .video()?;

    let duration = if ictx.duration() > 0 {
        ictx.duration() as f64 / TIME_BASE
    } else {
        0.0
    };

    Ok(VideoProperties {
        width: decoder.width(),
        height: decoder.height(),
        bitrate: ictx.bit_rate().max(0) as u64,
        duration,
    })
}

/// Decode the frame at timestamp zero (the first decodable frame of the best
/// video stream) as RGB. `None` when the stream yields no frame at all.
pub(crate) fn first_frame(path: &Path) -> Result<Option<RgbImage>, ffmpeg::Error> {
    let mut ictx = ffmpeg::format::input(&path)?;
    let input = ictx
        .streams()
        .best(Type::Video)
        .ok_or(ffmpeg::Error::StreamNotFound)?;
    let stream_index = input.index();
    let mut decoder = ffmpeg::codec::context::Context::from_parameters(input.parameters())?
        .decoder()
        .video()?;

    let mut decoded = Video::empty();
    for (stream, packet) in ictx.packets() {
        if stream.index() != stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        if decoder.receive_frame(&mut decoded).is_ok() {
            return to_rgb(&decoded).map(Some);
        }
    }

    // Codecs with reordering only release the first frame once drained.
    decoder.send_eof()?;
    if decoder.receive_frame(&mut decoded).is_ok() {
        return to_rgb(&decoded).map(Some);
    }
    Ok(None)
}

/// Convert a decoded frame of any pixel format to a tightly packed RGB image.
fn to_rgb(frame: &Video) -> Result<RgbImage, ffmpeg::Error> {
    let width = frame.width();
    let height = frame.height();

    let mut scaler = scaling::Context::get(
        frame.format(),
        width,
        height,
        Pixel::RGB24,
        width,
        height,
        Flags::BILINEAR,
    )?;
    let mut rgb = Video::empty();
    scaler.run(frame, &mut rgb)?;

    // Strip the stride padding row by row.
    let row_len = width as usize * 3;
    let stride = rgb.stride(0);
    let plane = rgb.data(0);
    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&plane[start..start + row_len]);
    }

    RgbImage::from_raw(width, height, pixels).ok_or(ffmpeg::Error::InvalidData)
}
