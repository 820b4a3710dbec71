//! Data models and structures
//!
//! Defines configuration, cache locations and render results shared by the
//! resolver, cache store and render service.

use crate::cache::TRANSPARENT_EXTENSION;
use crate::render::encode::EMPTY_PNG;
use crate::{Error, Result};
use image::Rgba;
use std::path::PathBuf;

/// Default cache lifetime: 30 days.
pub const DEFAULT_CACHE_TIME: u64 = 2_592_000;

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub cache_path: PathBuf,
    pub cache_public_path: String,
    pub source_path: PathBuf,
    pub cache_time: u64,
    pub default_offset_x: u32,
    pub default_offset_y: u32,
    pub no_image: String,
    pub image_action: String,
    pub profiles_file: Option<PathBuf>,
    pub background: Rgba<u8>,
    pub max_concurrent_renders: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("web/assets/image"),
            cache_public_path: "/assets/image".to_string(),
            source_path: PathBuf::from("uploads/image"),
            cache_time: DEFAULT_CACHE_TIME,
            default_offset_x: 0,
            default_offset_y: 0,
            no_image: "assets/no-image.png".to_string(),
            image_action: "/site/image".to_string(),
            profiles_file: None,
            background: Rgba([0, 0, 0, 0]),
            max_concurrent_renders: 4,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults
    /// for every key the lookup does not know.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            cache_path: lookup("IMAGE_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_path),
            cache_public_path: lookup("IMAGE_CACHE_PUBLIC_PATH")
                .unwrap_or(defaults.cache_public_path),
            source_path: lookup("IMAGE_SOURCE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.source_path),
            cache_time: parse_var(&lookup, "IMAGE_CACHE_TIME", defaults.cache_time)?,
            default_offset_x: parse_var(
                &lookup,
                "IMAGE_DEFAULT_OFFSET_X",
                defaults.default_offset_x,
            )?,
            default_offset_y: parse_var(
                &lookup,
                "IMAGE_DEFAULT_OFFSET_Y",
                defaults.default_offset_y,
            )?,
            no_image: lookup("IMAGE_NO_IMAGE").unwrap_or(defaults.no_image),
            image_action: lookup("IMAGE_ACTION_ROUTE").unwrap_or(defaults.image_action),
            profiles_file: lookup("IMAGE_PROFILES_FILE").map(PathBuf::from),
            background: match lookup("IMAGE_BACKGROUND") {
                Some(hex) => parse_rgba(&hex)?,
                None => defaults.background,
            },
            max_concurrent_renders: parse_var(
                &lookup,
                "IMAGE_MAX_CONCURRENT_RENDERS",
                defaults.max_concurrent_renders,
            )?
            .max(1),
        })
    }

    /// Profile overrides from `profiles_file`, or an empty map when unset.
    pub fn load_profile_overrides(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        match &self.profiles_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&raw)?)
            }
            None => Ok(serde_json::Map::new()),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has invalid value '{}'", key, value))),
        None => Ok(default),
    }
}

/// Parse `RRGGBB` or `RRGGBBAA`, with or without a leading `#`.
fn parse_rgba(input: &str) -> Result<Rgba<u8>> {
    let hex = input.trim().trim_start_matches('#');
    let invalid = || Error::Config(format!("IMAGE_BACKGROUND has invalid color '{}'", input));

    if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
        return Err(invalid());
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };

    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}

/// Where a derivative lives on disk and on the web.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    pub hash: String,
    pub shard_dir: PathBuf,
    pub system_path: PathBuf,
    pub public_url: String,
    pub extension: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOrigin {
    /// Served unchanged from a fresh cache file.
    CacheHit,
    /// Produced by running the profile pipeline.
    Generated,
    /// The embedded 1x1 transparent PNG.
    Empty,
}

/// Why the placeholder was served instead of the requested source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    PermissionDenied,
    SourceNotFound,
    RenderFailed,
}

impl FallbackReason {
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::PermissionDenied(_) => Self::PermissionDenied,
            Error::SourceNotFound(_) | Error::PathTraversal(_) => Self::SourceNotFound,
            _ => Self::RenderFailed,
        }
    }
}

/// Encoded image bytes ready to be streamed.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub extension: String,
    pub origin: RenderOrigin,
    pub fallback: Option<FallbackReason>,
}

impl Rendered {
    /// The embedded 1x1 transparent PNG.
    pub fn empty(reason: FallbackReason) -> Self {
        Self {
            bytes: EMPTY_PNG.to_vec(),
            content_type: "image/png".to_string(),
            extension: TRANSPARENT_EXTENSION.to_string(),
            origin: RenderOrigin::Empty,
            fallback: Some(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}
