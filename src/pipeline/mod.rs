//! Image transformation pipeline
//!
//! Runs a profile's operations over a decoded image strictly in order, each
//! step consuming the previous step's output. Decoding into a
//! [`DynamicImage`] keeps pixels only, so EXIF and colour profiles of the
//! source never reach a derivative.

pub mod thumbnail;

pub use thumbnail::thumbnail;

use crate::paths::PathResolver;
use crate::profile::{Anchor, Operation, Point, Size};
use crate::{Error, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, Rgba};
use std::path::Path;
use thumbnail::dimensions;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TransformPipeline {
    resolver: PathResolver,
    background: Rgba<u8>,
    filter: FilterType,
}

impl TransformPipeline {
    pub fn new(resolver: PathResolver, background: Rgba<u8>) -> Self {
        Self {
            resolver,
            background,
            filter: FilterType::Lanczos3,
        }
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn apply(&self, image: DynamicImage, operations: &[Operation]) -> Result<DynamicImage> {
        operations
            .iter()
            .try_fold(image, |image, operation| self.apply_operation(image, operation))
    }

    fn apply_operation(&self, image: DynamicImage, operation: &Operation) -> Result<DynamicImage> {
        debug!(
            operation = operation.name(),
            width = image.width(),
            height = image.height(),
            "Applying image operation"
        );

        match operation {
            Operation::Thumbnail { size, mode } => {
                thumbnail(image, *size, *mode, self.background, self.filter)
            }
            Operation::Resize { size } => Ok(resize_within(image, *size, self.filter)),
            Operation::Crop { point, size } => crop(&image, *point, *size),
            Operation::Watermark { overlay, anchor } => {
                let overlay_path = self.resolver.resolve(overlay)?;
                let overlay = decode(&overlay_path)?;
                Ok(watermark(image, &overlay, anchor))
            }
        }
    }
}

/// Open and decode the image at `path`, detecting the format from content.
pub fn decode(path: &Path) -> Result<DynamicImage> {
    let to_decode_error = |source| Error::Decode {
        path: path.to_path_buf(),
        source,
    };

    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(to_decode_error)
}

/// Crop `size` pixels starting at `point`. The region must lie inside the image.
pub fn crop(image: &DynamicImage, point: Point, size: Size) -> Result<DynamicImage> {
    let bounds = dimensions(image);
    let fits = |offset: u32, extent: u32, limit: u32| {
        u64::from(offset) + u64::from(extent) <= u64::from(limit)
    };

    if size.width == 0 || size.height == 0 {
        return Err(Error::InvalidParameter(format!(
            "crop box must be positive, got {}x{}",
            size.width, size.height
        )));
    }
    if !fits(point.x, size.width, bounds.width) || !fits(point.y, size.height, bounds.height) {
        return Err(Error::InvalidParameter(format!(
            "crop {}x{} at ({}, {}) exceeds image bounds {}x{}",
            size.width, size.height, point.x, point.y, bounds.width, bounds.height
        )));
    }

    Ok(image.crop_imm(point.x, point.y, size.width, size.height))
}

/// Scale down to fit within `size`, preserving aspect ratio. Never upscales.
pub fn resize_within(image: DynamicImage, size: Size, filter: FilterType) -> DynamicImage {
    let current = dimensions(&image);
    if size.contains(current) {
        return image;
    }

    let ratio = (f64::from(size.width) / f64::from(current.width))
        .min(f64::from(size.height) / f64::from(current.height));
    let target = thumbnail::scale(current, ratio);
    image.resize_exact(target.width, target.height, filter)
}

/// Paste `overlay` onto `image`, by default flush with the bottom-right corner.
pub fn watermark(image: DynamicImage, overlay: &DynamicImage, anchor: &Anchor) -> DynamicImage {
    let base = dimensions(&image);
    let mark = dimensions(overlay);
    let (x, y) = match anchor {
        Anchor::BottomRight => (
            i64::from(base.width) - i64::from(mark.width),
            i64::from(base.height) - i64::from(mark.height),
        ),
        Anchor::At(point) => (i64::from(point.x), i64::from(point.y)),
    };

    let mut canvas = image.to_rgba8();
    imageops::overlay(&mut canvas, &overlay.to_rgba8(), x, y);
    DynamicImage::ImageRgba8(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ThumbnailMode;
    use image::RgbaImage;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn solid(width: u32, height: u32, color: Rgba<u8>) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, color))
    }

    fn setup() -> (TempDir, TransformPipeline) {
        let dir = TempDir::new().unwrap();
        let resolver = PathResolver::new(dir.path(), "no-image.png");
        let pipeline =
            TransformPipeline::new(resolver, Rgba([0, 0, 0, 0])).with_filter(FilterType::Triangle);
        (dir, pipeline)
    }

    #[test]
    fn test_empty_operations_return_source() {
        let (_dir, pipeline) = setup();
        let source = solid(12, 34, RED);
        let out = pipeline.apply(source.clone(), &[]).unwrap();
        assert_eq!(out.to_rgba8(), source.to_rgba8());
    }

    #[test]
    fn test_crop_in_bounds() {
        let out = crop(&solid(100, 80, RED), Point::new(10, 20), Size::new(90, 60)).unwrap();
        assert_eq!(dimensions(&out), Size::new(90, 60));
    }

    #[test]
    fn test_crop_out_of_bounds_is_rejected() {
        let source = solid(100, 80, RED);
        for (point, size) in [
            (Point::new(11, 0), Size::new(90, 10)),
            (Point::new(0, 0), Size::new(10, 81)),
            (Point::new(u32::MAX, 0), Size::new(10, 10)),
        ] {
            let err = crop(&source, point, size).unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(_)), "{:?} {:?}", point, size);
        }
    }

    #[test]
    fn test_resize_within_never_upscales() {
        let out = resize_within(solid(20, 10, RED), Size::new(100, 100), FilterType::Triangle);
        assert_eq!(dimensions(&out), Size::new(20, 10));

        let out = resize_within(solid(400, 100, RED), Size::new(100, 100), FilterType::Triangle);
        assert_eq!(dimensions(&out), Size::new(100, 25));
    }

    #[test]
    fn test_watermark_bottom_right() {
        let out = watermark(solid(50, 40, RED), &solid(10, 5, WHITE), &Anchor::BottomRight)
            .to_rgba8();
        assert_eq!(*out.get_pixel(45, 37), WHITE);
        assert_eq!(*out.get_pixel(39, 37), RED);
        assert_eq!(*out.get_pixel(45, 34), RED);
    }

    #[test]
    fn test_watermark_explicit_point() {
        let out = watermark(
            solid(50, 40, RED),
            &solid(10, 5, WHITE),
            &Anchor::At(Point::new(2, 3)),
        )
        .to_rgba8();
        assert_eq!(*out.get_pixel(2, 3), WHITE);
        assert_eq!(*out.get_pixel(11, 7), WHITE);
        assert_eq!(*out.get_pixel(12, 8), RED);
    }

    #[test]
    fn test_operations_run_in_order() {
        let (_dir, pipeline) = setup();
        let crop_then_thumb = [
            Operation::Crop {
                point: Point::new(0, 0),
                size: Size::new(200, 100),
            },
            Operation::Thumbnail {
                size: Size::new(50, 50),
                mode: ThumbnailMode::Outbound,
            },
        ];
        let out = pipeline.apply(solid(400, 400, RED), &crop_then_thumb).unwrap();
        assert_eq!(dimensions(&out), Size::new(50, 50));

        // Reversed, the crop runs against a 50x50 image and must fail.
        let reversed = [crop_then_thumb[1].clone(), crop_then_thumb[0].clone()];
        assert!(pipeline.apply(solid(400, 400, RED), &reversed).is_err());
    }

    #[test]
    fn test_watermark_operation_loads_overlay_from_source_root() {
        let (dir, pipeline) = setup();
        solid(4, 4, WHITE)
            .save(dir.path().join("logo.png"))
            .unwrap();

        let out = pipeline
            .apply(
                solid(20, 20, RED),
                &[Operation::Watermark {
                    overlay: "logo.png".to_string(),
                    anchor: Anchor::BottomRight,
                }],
            )
            .unwrap()
            .to_rgba8();
        assert_eq!(*out.get_pixel(19, 19), WHITE);
        assert_eq!(*out.get_pixel(0, 0), RED);
    }

    #[test]
    fn test_watermark_missing_overlay_fails() {
        let (_dir, pipeline) = setup();
        let err = pipeline
            .apply(
                solid(20, 20, RED),
                &[Operation::Watermark {
                    overlay: "missing.png".to_string(),
                    anchor: Anchor::BottomRight,
                }],
            )
            .unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
    }

    #[test]
    fn test_decode_garbage_is_decode_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        assert!(matches!(decode(&path).unwrap_err(), Error::Decode { .. }));
    }
}
