//! Thumbnail geometry.
//!
//! Both modes end on a canvas of exactly the requested box, with the scaled
//! (and for outbound, cropped) image centered on any axis where it falls
//! short.

use super::crop;
use crate::profile::{Point, Size, ThumbnailMode};
use crate::{Error, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

pub fn thumbnail(
    image: DynamicImage,
    size: Size,
    mode: ThumbnailMode,
    background: Rgba<u8>,
    filter: FilterType,
) -> Result<DynamicImage> {
    if size.is_zero() {
        return Ok(image);
    }
    if size.width == 0 || size.height == 0 {
        return Err(Error::InvalidParameter(format!(
            "thumbnail box must be positive on both axes, got {}x{}",
            size.width, size.height
        )));
    }

    let image_size = dimensions(&image);
    let ratios = (
        f64::from(size.width) / f64::from(image_size.width),
        f64::from(size.height) / f64::from(image_size.height),
    );

    let mut current = image;
    if !size.contains(image_size) {
        current = match mode {
            ThumbnailMode::Inset => {
                let target = scale(image_size, ratios.0.min(ratios.1));
                current.resize_exact(target.width, target.height, filter)
            }
            ThumbnailMode::Outbound => {
                // Images smaller than the box on one axis are cropped but not scaled.
                let (scaled, crop_size) = if image_size.contains(size) {
                    let target = scale(image_size, ratios.0.max(ratios.1));
                    (current.resize_exact(target.width, target.height, filter), size)
                } else {
                    let crop_size = Size::new(
                        image_size.width.min(size.width),
                        image_size.height.min(size.height),
                    );
                    (current, crop_size)
                };

                let scaled_size = dimensions(&scaled);
                let origin = if ratios.0 > ratios.1 {
                    Point::new(0, 0)
                } else {
                    Point::new(
                        center_offset(scaled_size.width, crop_size.width),
                        center_offset(scaled_size.height, crop_size.height),
                    )
                };
                crop(&scaled, origin, crop_size)?
            }
        };
    }

    Ok(pad_to_box(&current, size, background))
}

/// Paste `image` onto a `size` canvas filled with `background`, centered on
/// each axis where it is smaller than the canvas.
pub fn pad_to_box(image: &DynamicImage, size: Size, background: Rgba<u8>) -> DynamicImage {
    let current = dimensions(image);
    let mut canvas = RgbaImage::from_pixel(size.width, size.height, background);

    let x = size.width.saturating_sub(current.width).div_ceil(2);
    let y = size.height.saturating_sub(current.height).div_ceil(2);
    imageops::overlay(&mut canvas, &image.to_rgba8(), i64::from(x), i64::from(y));

    DynamicImage::ImageRgba8(canvas)
}

/// Scale both sides by `ratio`, rounding to the nearest pixel (minimum 1).
pub fn scale(size: Size, ratio: f64) -> Size {
    let side = |v: u32| ((f64::from(v) * ratio).round() as u32).max(1);
    Size::new(side(size.width), side(size.height))
}

/// `round((outer - inner) / 2)`, floored at zero.
fn center_offset(outer: u32, inner: u32) -> u32 {
    (f64::from(outer.saturating_sub(inner)) / 2.0).round() as u32
}

pub(crate) fn dimensions(image: &DynamicImage) -> Size {
    let (width, height) = image.dimensions();
    Size::new(width, height)
}
