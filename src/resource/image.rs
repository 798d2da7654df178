//! Raster image resource, the height source for heightfield collision shapes.
//!
//! Only plain 8-bit channel layouts are kept after decoding; anything else is
//! rejected at load time. Whether a particular layout is a valid *height
//! source* (3 or 4 channels) is decided later by the heightfield builder, not
//! here.

use image::DynamicImage;
use std::{
    fmt::{Display, Formatter},
    path::Path,
    sync::Arc,
};

/// Pixel layout of a decoded image.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImagePixelFormat {
    /// 1 byte per pixel, grayscale.
    R8,
    /// 2 bytes per pixel, grayscale with alpha.
    RG8,
    /// 3 bytes per pixel, red-green-blue.
    RGB8,
    /// 4 bytes per pixel, red-green-blue-alpha.
    RGBA8,
}

impl ImagePixelFormat {
    /// Amount of channels (which is also bytes per pixel for 8-bit layouts).
    #[inline]
    pub fn channel_count(self) -> u32 {
        match self {
            ImagePixelFormat::R8 => 1,
            ImagePixelFormat::RG8 => 2,
            ImagePixelFormat::RGB8 => 3,
            ImagePixelFormat::RGBA8 => 4,
        }
    }
}

/// An error that may occur during image loading.
#[derive(Debug)]
pub enum ImageError {
    /// Format (pixel layout) is not supported.
    UnsupportedFormat,
    /// An io error.
    Io(std::io::Error),
    /// Internal image decoding error.
    Image(image::ImageError),
}

impl Display for ImageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageError::UnsupportedFormat => write!(f, "Unsupported image pixel format!"),
            ImageError::Io(v) => write!(f, "An i/o error has occurred: {v}"),
            ImageError::Image(v) => write!(f, "Image decoding error: {v}"),
        }
    }
}

impl From<std::io::Error> for ImageError {
    fn from(v: std::io::Error) -> Self {
        Self::Io(v)
    }
}

impl From<image::ImageError> for ImageError {
    fn from(v: image::ImageError) -> Self {
        Self::Image(v)
    }
}

/// Reference-counted image handle. Height sources are shared between loaders
/// and rigid-body factories without copying pixel data.
pub type SharedImage = Arc<Image>;

/// Decoded raster image: dimensions, pixel layout and a flat byte buffer in
/// row-major order (`(x + y * width) * channel_count` addressing).
#[derive(Debug, Clone)]
pub struct Image {
    width: u32,
    height: u32,
    pixel_format: ImagePixelFormat,
    bytes: Vec<u8>,
}

impl Image {
    /// Tries to load an image from a file. Every format the `image` crate can
    /// decode into an 8-bit layout is accepted; 16-bit and floating point
    /// layouts are rejected with [`ImageError::UnsupportedFormat`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let dyn_img = image::open(path.as_ref())?;

        let width = dyn_img.width();
        let height = dyn_img.height();

        let pixel_format = match dyn_img {
            DynamicImage::ImageLuma8(_) => ImagePixelFormat::R8,
            DynamicImage::ImageLumaA8(_) => ImagePixelFormat::RG8,
            DynamicImage::ImageRgb8(_) => ImagePixelFormat::RGB8,
            DynamicImage::ImageRgba8(_) => ImagePixelFormat::RGBA8,
            _ => return Err(ImageError::UnsupportedFormat),
        };

        Ok(Self {
            width,
            height,
            pixel_format,
            bytes: dyn_img.into_bytes(),
        })
    }

    /// Creates an image from raw pixel data. Returns [`None`] if the buffer
    /// length does not match `width * height * channel_count`.
    pub fn from_bytes(
        width: u32,
        height: u32,
        pixel_format: ImagePixelFormat,
        bytes: Vec<u8>,
    ) -> Option<Self> {
        let required_bytes = (width * height * pixel_format.channel_count()) as usize;
        if required_bytes != bytes.len() {
            None
        } else {
            Some(Self {
                width,
                height,
                pixel_format,
                bytes,
            })
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixel_format(&self) -> ImagePixelFormat {
        self.pixel_format
    }

    /// Raw bytes in row-major order.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.bytes
    }
}
