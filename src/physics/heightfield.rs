//! Elevation grids for heightfield collision shapes.
//!
//! A [`HeightMap`] is built once from a raster height source and a world-space
//! footprint: the image is converted to per-pixel elevations and resampled
//! down (or up) to exactly one sample per integer world unit. Queries against
//! the grid go through [`sample_bilinear`], the same interpolation primitive
//! the builder itself uses, so construction-time and query-time sampling can
//! never drift apart.

use crate::{
    math::aabb::AxisAlignedBoundingBox, physics::error::RigidBodyError, resource::image::Image,
};

/// Bilinearly samples a row-major `width`×`height` float grid at the
/// fractional position `(x, y)`.
///
/// Cells in the last row or column fall back to lower-order interpolation:
/// with both neighbors out of range the sample is the exact stored value,
/// with one neighbor out of range the blend runs along the remaining axis
/// only. Whole-number coordinates therefore return stored values exactly.
///
/// The integer cell index is clamped to the last row/column, which keeps the
/// inclusive upper query bound of [`crate::physics::rigid_body::RigidBody::height_at`]
/// inside the buffer.
pub fn sample_bilinear(data: &[f32], width: u32, height: u32, x: f32, y: f32) -> f32 {
    let w = width as usize;
    let h = height as usize;
    let x1 = (x as usize).min(w - 1);
    let y1 = (y as usize).min(h - 1);
    let x2 = x1 + 1;
    let y2 = y1 + 1;
    let x_factor = x.fract();
    let y_factor = y.fract();
    let x_factor_i = 1.0 - x_factor;
    let y_factor_i = 1.0 - y_factor;

    if x2 >= w && y2 >= h {
        data[x1 + y1 * w]
    } else if x2 >= w {
        data[x1 + y1 * w] * y_factor_i + data[x1 + y2 * w] * y_factor
    } else if y2 >= h {
        data[x1 + y1 * w] * x_factor_i + data[x2 + y1 * w] * x_factor
    } else {
        data[x1 + y1 * w] * x_factor_i * y_factor_i
            + data[x1 + y2 * w] * x_factor_i * y_factor
            + data[x2 + y2 * w] * x_factor * y_factor
            + data[x2 + y1 * w] * x_factor * y_factor_i
    }
}

/// Dense elevation grid with one sample per world unit across its footprint.
/// Owned exclusively by the rigid body that built it.
#[derive(Debug, Clone)]
pub struct HeightMap {
    data: Vec<f32>,
    width: u32,
    height: u32,
    min_height: f32,
    max_height: f32,
}

impl HeightMap {
    /// Builds an elevation grid from a raster height source and the
    /// world-space bounding box of the target footprint.
    ///
    /// Each source pixel becomes the average of its first three channels,
    /// normalized by 768 and mapped linearly into the footprint's vertical
    /// extent. That per-pixel buffer is then resampled to
    /// `floor(extent) + 1` samples per horizontal axis. Grid row 0 samples
    /// the far edge of the source image (the resampling loop walks the image
    /// bottom-up), which is the orientation established heightfield content
    /// relies on.
    pub fn from_image(
        image: &Image,
        footprint: &AxisAlignedBoundingBox,
    ) -> Result<Self, RigidBodyError> {
        let channel_count = image.pixel_format().channel_count();
        if channel_count != 3 && channel_count != 4 {
            return Err(RigidBodyError::UnsupportedFormat(image.pixel_format()));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(RigidBodyError::InvalidSource(
                "height source image is empty".to_owned(),
            ));
        }

        let world_width = footprint.max.x - footprint.min.x;
        let world_depth = footprint.max.z - footprint.min.z;
        let min_height = footprint.min.y;
        let max_height = footprint.max.y;

        let image_width = image.width() as usize;
        let image_height = image.height() as usize;
        let pixel_size = channel_count as usize;
        let bytes = image.data();

        // Per-pixel elevations at the source's native resolution.
        let mut elevations = vec![0.0; image_width * image_height];
        for y in 0..image_height {
            for x in 0..image_width {
                let pixel = (x + y * image_width) * pixel_size;
                let sum = bytes[pixel] as f32 + bytes[pixel + 1] as f32 + bytes[pixel + 2] as f32;
                elevations[x + y * image_width] =
                    sum / 768.0 * (max_height - min_height) + min_height;
            }
        }

        // One sample per world unit.
        let size_width = world_width as u32;
        let size_height = world_depth as u32;
        let grid_width = size_width + 1;
        let grid_height = size_height + 1;

        let width_image_factor = if size_width > 0 {
            (image.width() - 1) as f32 / size_width as f32
        } else {
            0.0
        };
        let height_image_factor = if size_height > 0 {
            (image.height() - 1) as f32 / size_height as f32
        } else {
            0.0
        };

        let mut data = vec![0.0; (grid_width * grid_height) as usize];
        for row in 0..grid_height {
            let z = row as f32;
            for col in 0..grid_width {
                let x = col as f32;
                let height_index = (row * grid_width + col) as usize;
                data[height_index] = sample_bilinear(
                    &elevations,
                    image.width(),
                    image.height(),
                    x * width_image_factor,
                    (size_height as f32 - z) * height_image_factor,
                );
            }
        }

        Ok(Self {
            data,
            width: grid_width,
            height: grid_height,
            min_height,
            max_height,
        })
    }

    /// Amount of samples along the world x axis.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Amount of samples along the world z axis.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Lower edge of the vertical extent the source was mapped into.
    #[inline]
    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    /// Upper edge of the vertical extent the source was mapped into.
    #[inline]
    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    /// Raw row-major samples; row 0 corresponds to the footprint's far edge.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Samples the grid at a fractional position in grid index space.
    #[inline]
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        sample_bilinear(&self.data, self.width, self.height, x, y)
    }
}
