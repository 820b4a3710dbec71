//! Parsing of profile definitions from JSON configuration.

use super::{Anchor, Operation, Point, Profile, Size, ThumbnailMode};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

const VISIBLE_KEY: &str = "visible";
const TRANSPARENT_KEY: &str = "transparent";

#[derive(Debug, Deserialize)]
struct ThumbnailOptions {
    #[serde(rename = "box")]
    size: [u32; 2],
    mode: ThumbnailMode,
}

#[derive(Debug, Deserialize)]
struct ResizeOptions {
    #[serde(rename = "box")]
    size: Option<[u32; 2]>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CropOptions {
    point: Option<[u32; 2]>,
    #[serde(rename = "box")]
    size: Option<[u32; 2]>,
    width: Option<u32>,
    height: Option<u32>,
    offset_x: Option<u32>,
    offset_y: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WatermarkOptions {
    watermark_filename: String,
    point: Option<[u32; 2]>,
}

/// Parse one profile object into a typed [`Profile`].
///
/// Object key order is operation order. Unknown keys are skipped with a
/// warning; malformed known operations are rejected.
pub fn parse_profile(name: &str, value: &Value, default_offset: Point) -> Result<Profile> {
    let entries = value.as_object().ok_or_else(|| {
        Error::InvalidParameter(format!("profile '{}' must be an object", name))
    })?;

    let mut profile = Profile {
        name: name.to_string(),
        operations: Vec::with_capacity(entries.len()),
        visible: None,
        transparent: false,
    };

    for (key, options) in entries {
        match key.as_str() {
            VISIBLE_KEY => {
                profile.visible = match options {
                    Value::String(role) if !role.is_empty() => Some(role.clone()),
                    Value::Null => None,
                    _ => {
                        return Err(Error::InvalidParameter(format!(
                            "profile '{}': '{}' must be a role name",
                            name, VISIBLE_KEY
                        )))
                    }
                };
            }
            TRANSPARENT_KEY => {
                profile.transparent = options.as_bool().ok_or_else(|| {
                    Error::InvalidParameter(format!(
                        "profile '{}': '{}' must be a boolean",
                        name, TRANSPARENT_KEY
                    ))
                })?;
            }
            "thumbnail" => {
                let opts: ThumbnailOptions = options_for(name, key, options)?;
                let size = Size::new(opts.size[0], opts.size[1]);
                if !size.is_zero() {
                    require_positive(name, key, size)?;
                }
                profile.operations.push(Operation::Thumbnail {
                    size,
                    mode: opts.mode,
                });
            }
            "resize" => {
                let opts: ResizeOptions = options_for(name, key, options)?;
                let size = match (opts.size, opts.width, opts.height) {
                    (Some([w, h]), _, _) | (None, Some(w), Some(h)) => Size::new(w, h),
                    _ => return Err(missing_dimensions(name, key)),
                };
                require_positive(name, key, size)?;
                profile.operations.push(Operation::Resize { size });
            }
            "crop" => {
                let opts: CropOptions = options_for(name, key, options)?;
                let size = match (opts.size, opts.width, opts.height) {
                    (Some([w, h]), _, _) | (None, Some(w), Some(h)) => Size::new(w, h),
                    _ => return Err(missing_dimensions(name, key)),
                };
                require_positive(name, key, size)?;
                let point = match opts.point {
                    Some([x, y]) => Point::new(x, y),
                    None => Point::new(
                        opts.offset_x.unwrap_or(default_offset.x),
                        opts.offset_y.unwrap_or(default_offset.y),
                    ),
                };
                profile.operations.push(Operation::Crop { point, size });
            }
            "watermark" => {
                let opts: WatermarkOptions = options_for(name, key, options)?;
                if opts.watermark_filename.is_empty() {
                    return Err(Error::InvalidParameter(format!(
                        "profile '{}': watermark requires 'watermarkFilename'",
                        name
                    )));
                }
                let anchor = match opts.point {
                    Some([x, y]) => Anchor::At(Point::new(x, y)),
                    None => Anchor::BottomRight,
                };
                profile.operations.push(Operation::Watermark {
                    overlay: opts.watermark_filename,
                    anchor,
                });
            }
            unknown => {
                warn!(profile = %name, operation = %unknown, "Skipping unknown image operation");
            }
        }
    }

    Ok(profile)
}

fn options_for<T: DeserializeOwned>(profile: &str, operation: &str, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|e| {
        Error::InvalidParameter(format!("profile '{}' operation '{}': {}", profile, operation, e))
    })
}

fn require_positive(profile: &str, operation: &str, size: Size) -> Result<()> {
    if size.width == 0 || size.height == 0 {
        return Err(Error::InvalidParameter(format!(
            "profile '{}' operation '{}': width and height must be positive, got {}x{}",
            profile, operation, size.width, size.height
        )));
    }
    Ok(())
}

fn missing_dimensions(profile: &str, operation: &str) -> Error {
    Error::InvalidParameter(format!(
        "profile '{}' operation '{}': params \"width\" and \"height\" are required",
        profile, operation
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_thumbnail_profile() {
        let profile = parse_profile(
            "small",
            &json!({"thumbnail": {"box": [60, 60], "mode": "outbound"}}),
            Point::default(),
        )
        .unwrap();

        assert_eq!(
            profile.operations,
            vec![Operation::Thumbnail {
                size: Size::new(60, 60),
                mode: ThumbnailMode::Outbound,
            }]
        );
        assert_eq!(profile.gate(), None);
        assert!(!profile.is_transparent());
    }

    #[test]
    fn test_parse_preserves_operation_order() {
        let profile = parse_profile(
            "framed",
            &json!({
                "crop": {"point": [10, 20], "box": [100, 80]},
                "thumbnail": {"box": [50, 50], "mode": "inset"},
                "watermark": {"watermarkFilename": "marks/logo.png"}
            }),
            Point::default(),
        )
        .unwrap();

        let names: Vec<&str> = profile.operations.iter().map(Operation::name).collect();
        assert_eq!(names, vec!["crop", "thumbnail", "watermark"]);
        assert_eq!(
            profile.operations[2],
            Operation::Watermark {
                overlay: "marks/logo.png".to_string(),
                anchor: Anchor::BottomRight,
            }
        );
    }

    #[test]
    fn test_parse_attributes_are_not_operations() {
        let profile = parse_profile(
            "medium",
            &json!({
                "visible": "editor",
                "transparent": true,
                "thumbnail": {"box": [240, 240], "mode": "outbound"}
            }),
            Point::default(),
        )
        .unwrap();

        assert_eq!(profile.gate(), Some("editor"));
        assert!(profile.is_transparent());
        assert_eq!(profile.operations.len(), 1);
    }

    #[test]
    fn test_parse_skips_unknown_operation() {
        let profile = parse_profile(
            "future",
            &json!({"sepia": {"strength": 3}, "resize": {"width": 10, "height": 20}}),
            Point::default(),
        )
        .unwrap();

        assert_eq!(
            profile.operations,
            vec![Operation::Resize {
                size: Size::new(10, 20)
            }]
        );
    }

    #[test]
    fn test_parse_crop_legacy_shape_with_default_offset() {
        let profile = parse_profile(
            "legacy",
            &json!({"crop": {"width": 30, "height": 40, "offsetY": 7}}),
            Point::new(3, 4),
        )
        .unwrap();

        assert_eq!(
            profile.operations,
            vec![Operation::Crop {
                point: Point::new(3, 7),
                size: Size::new(30, 40),
            }]
        );
    }

    #[test]
    fn test_parse_crop_without_dimensions_fails() {
        let err = parse_profile("bad", &json!({"crop": {"point": [0, 0]}}), Point::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        assert!(err.to_string().contains("width"));
    }

    #[test]
    fn test_parse_invalid_thumbnail_mode_fails() {
        let err = parse_profile(
            "bad",
            &json!({"thumbnail": {"box": [10, 10], "mode": "stretch"}}),
            Point::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_parse_thumbnail_zero_box_is_allowed_only_on_both_axes() {
        assert!(parse_profile(
            "noop",
            &json!({"thumbnail": {"box": [0, 0], "mode": "inset"}}),
            Point::default()
        )
        .is_ok());
        assert!(parse_profile(
            "half",
            &json!({"thumbnail": {"box": [0, 10], "mode": "inset"}}),
            Point::default()
        )
        .is_err());
    }

    #[test]
    fn test_parse_explicit_watermark_point() {
        let profile = parse_profile(
            "marked",
            &json!({"watermark": {"watermarkFilename": "logo.png", "point": [5, 6]}}),
            Point::default(),
        )
        .unwrap();
        assert_eq!(
            profile.operations[0],
            Operation::Watermark {
                overlay: "logo.png".to_string(),
                anchor: Anchor::At(Point::new(5, 6)),
            }
        );
    }

    #[test]
    fn test_parse_non_object_profile_fails() {
        assert!(parse_profile("bad", &json!([1, 2]), Point::default()).is_err());
        assert!(parse_profile("bad", &json!({"visible": 3}), Point::default()).is_err());
    }
}
