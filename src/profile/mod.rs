//! Transformation profiles
//!
//! A profile is a named, ordered list of geometric operations plus two
//! attributes consulted before any pipeline work: an optional `visible`
//! role gate and a `transparent` flag that forces PNG output.

pub mod config;
pub mod registry;

pub use config::parse_profile;
pub use registry::ProfileRegistry;

use serde::Deserialize;

/// Name of the no-op profile every unknown profile name falls back to.
pub const ORIGINAL: &str = "original";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailMode {
    /// Fit within the box, never cropping.
    Inset,
    /// Fill the box exactly, cropping the overflowing dimension.
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when `other` fits inside `self` on both axes.
    pub fn contains(&self, other: Size) -> bool {
        other.width <= self.width && other.height <= self.height
    }

    pub fn is_zero(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    BottomRight,
    At(Point),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Thumbnail { size: Size, mode: ThumbnailMode },
    /// Aspect-preserving downscale without a padding canvas.
    Resize { size: Size },
    Crop { point: Point, size: Size },
    Watermark { overlay: String, anchor: Anchor },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Thumbnail { .. } => "thumbnail",
            Operation::Resize { .. } => "resize",
            Operation::Crop { .. } => "crop",
            Operation::Watermark { .. } => "watermark",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub operations: Vec<Operation>,
    pub visible: Option<String>,
    pub transparent: bool,
}

impl Profile {
    /// The built-in no-op profile: no operations, no gate.
    pub fn original() -> Self {
        Self {
            name: ORIGINAL.to_string(),
            operations: Vec::new(),
            visible: None,
            transparent: false,
        }
    }

    /// Role a caller must hold to see this profile, if any.
    pub fn gate(&self) -> Option<&str> {
        self.visible.as_deref()
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }
}
