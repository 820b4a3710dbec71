//! Immutable registry of named profiles.

use super::{parse_profile, Point, Profile, ORIGINAL};
use crate::models::Config;
use crate::Result;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::info;

/// Profiles merged from built-in defaults and configuration overrides.
///
/// Built once at startup and only read afterwards, so it is shared across
/// concurrent requests without locking.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: HashMap<String, Profile>,
    fallback: Profile,
}

impl ProfileRegistry {
    /// Built-in profiles: `original` (no-op), `small` and `medium` outbound
    /// thumbnails.
    pub fn default_profiles() -> Map<String, Value> {
        json!({
            "original": {},
            "small": {
                "thumbnail": {"box": [60, 60], "mode": "outbound"}
            },
            "medium": {
                "thumbnail": {"box": [240, 240], "mode": "outbound"}
            }
        })
        .as_object()
        .cloned()
        .unwrap_or_default()
    }

    /// Merge `overrides` onto `defaults` and parse every profile.
    ///
    /// Merging happens per profile key: an override key replaces the default's
    /// value for that key whole, untouched default keys stay in place and new
    /// keys are appended. Operation options are never merged.
    pub fn init(
        defaults: &Map<String, Value>,
        overrides: &Map<String, Value>,
        default_offset: Point,
    ) -> Result<Self> {
        let mut merged = defaults.clone();
        for (name, profile) in overrides {
            let value = match (merged.get(name), profile) {
                (Some(Value::Object(base)), Value::Object(keys)) => {
                    let mut base = base.clone();
                    for (key, value) in keys {
                        base.insert(key.clone(), value.clone());
                    }
                    Value::Object(base)
                }
                _ => profile.clone(),
            };
            merged.insert(name.clone(), value);
        }

        let profiles = merged
            .iter()
            .map(|(name, value)| -> Result<(String, Profile)> {
                Ok((name.clone(), parse_profile(name, value, default_offset)?))
            })
            .collect::<Result<HashMap<_, _>>>()?;

        info!("Loaded {} image profiles", profiles.len());

        Ok(Self {
            profiles,
            fallback: Profile::original(),
        })
    }

    /// Build from the built-in defaults plus the configured overrides file.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::init(
            &Self::default_profiles(),
            &config.load_profile_overrides()?,
            Point::new(config.default_offset_x, config.default_offset_y),
        )
    }

    /// Look up `name`, falling back to the built-in `original` profile.
    pub fn resolve(&self, name: &str) -> &Profile {
        self.profiles.get(name).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(ORIGINAL.to_string(), Profile::original());
        Self {
            profiles,
            fallback: Profile::original(),
        }
    }
}
