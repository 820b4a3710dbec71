//! On-demand image derivative generator
//!
//! Maps a source image and a named transformation profile ("small",
//! "medium", ...) onto a content-addressed cache file, runs the profile's
//! resize/crop/watermark chain on a cache miss and serves the result,
//! substituting a placeholder image whenever anything goes wrong.

pub mod access;
pub mod cache;
pub mod error;
pub mod models;
pub mod paths;
pub mod pipeline;
pub mod profile;
pub mod render;

pub use error::{Error, Result};
