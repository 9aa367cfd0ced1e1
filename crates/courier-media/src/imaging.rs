//! Image scaling on top of the `image` crate.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::MediaError;

/// Output encodings supported for scaled images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Bmp,
}

impl FromStr for ImageFormat {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "png" => Ok(ImageFormat::Png),
            "bmp" => Ok(ImageFormat::Bmp),
            _ => Err(MediaError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Bmp => "bmp",
        })
    }
}

/// Largest size fitting `max_width` × `max_height` with the aspect ratio of
/// `width` × `height`. Never upscales; each side is at least one pixel.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let max_width = max_width.max(1);
    let max_height = max_height.max(1);
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let ratio = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let scaled_width = ((width as f64) * ratio).round() as u32;
    let scaled_height = ((height as f64) * ratio).round() as u32;
    (scaled_width.clamp(1, max_width), scaled_height.clamp(1, max_height))
}

#[cfg(feature = "image-backend")]
pub(crate) use backend::{dimensions, scale};

#[cfg(feature = "image-backend")]
pub(crate) mod backend {
    use std::path::Path;

    use image::{ColorType, DynamicImage, ImageError, ImageReader};

    use super::{fit_within, ImageFormat};
    use crate::error::MediaError;

    impl From<ImageFormat> for image::ImageFormat {
        fn from(format: ImageFormat) -> Self {
            match format {
                ImageFormat::Jpeg => image::ImageFormat::Jpeg,
                ImageFormat::Png => image::ImageFormat::Png,
                ImageFormat::Bmp => image::ImageFormat::Bmp,
            }
        }
    }

    /// I/O failures stay I/O failures; everything else is an image error.
    pub(crate) fn map_image_error(err: ImageError) -> MediaError {
        match err {
            ImageError::IoError(e) => MediaError::Io(e),
            other => MediaError::Image(other.to_string()),
        }
    }

    fn open(input: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, MediaError> {
        // Sniff the content rather than trusting the file extension.
        Ok(ImageReader::open(input)?.with_guessed_format()?)
    }

    pub(crate) fn dimensions(input: &Path) -> Result<(u32, u32), MediaError> {
        open(input)?.into_dimensions().map_err(map_image_error)
    }

    /// Decode `input`, force RGB8, shrink into the box and encode to `output`.
    pub(crate) fn scale(
        input: &Path,
        output: &Path,
        format: ImageFormat,
        max_width: u32,
        max_height: u32,
    ) -> Result<(u32, u32), MediaError> {
        let decoded = open(input)?.decode().map_err(map_image_error)?;

        // Palette, grey and alpha images are flattened to RGB first.
        let rgb = if decoded.color() == ColorType::Rgb8 {
            decoded
        } else {
            DynamicImage::ImageRgb8(decoded.to_rgb8())
        };

        let (width, height) = fit_within(rgb.width(), rgb.height(), max_width, max_height);
        let scaled = if (width, height) == (rgb.width(), rgb.height()) {
            rgb
        } else {
            rgb.thumbnail_exact(width, height)
        };

        scaled
            .save_with_format(output, format.into())
            .map_err(map_image_error)?;
        Ok((width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_landscape() {
        assert_eq!(fit_within(800, 600, 100, 100), (100, 75));
    }

    #[test]
    fn fit_portrait() {
        assert_eq!(fit_within(600, 800, 100, 100), (75, 100));
    }

    #[test]
    fn fit_never_upscales() {
        assert_eq!(fit_within(40, 30, 100, 100), (40, 30));
    }

    #[test]
    fn fit_extreme_aspect_keeps_one_pixel() {
        assert_eq!(fit_within(10_000, 10, 64, 64), (64, 1));
    }

    #[test]
    fn fit_degenerate_box() {
        assert_eq!(fit_within(800, 600, 0, 0), (1, 1));
    }

    #[test]
    fn format_parsing() {
        assert_eq!("JPG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("png".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert!(matches!(
            "tga".parse::<ImageFormat>(),
            Err(MediaError::UnknownFormat(_))
        ));
        assert_eq!(ImageFormat::Bmp.to_string(), "bmp");
    }
}
