//! Render orchestration
//!
//! Drives a request through permission check, path resolution, cache lookup
//! and, on a miss, decode/transform/persist. Any failure is answered with the
//! placeholder rendered through the same profile; if that fails too, with a
//! 1x1 transparent PNG. Callers never see an error from [`RenderService::show`].

pub mod encode;
pub mod url;

pub use self::url::{RouteUrlBuilder, UrlBuilder};

use crate::access::PermissionChecker;
use crate::cache::CacheStore;
use crate::models::{Config, FallbackReason, RenderOrigin, Rendered};
use crate::paths::PathResolver;
use crate::pipeline::{self, TransformPipeline};
use crate::profile::{Profile, ProfileRegistry};
use crate::{Error, Result};
use encode::{content_type_for_extension, format_for_extension};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Anything that carries a source image reference, e.g. a database record.
pub trait ImageOwner {
    fn image_reference(&self) -> &str;
}

/// Injectable collaborators used to construct [`RenderService`].
pub struct RenderServices {
    pub permissions: Box<dyn PermissionChecker>,
    pub urls: Box<dyn UrlBuilder>,
}

pub struct RenderService {
    registry: Arc<ProfileRegistry>,
    resolver: PathResolver,
    cache: CacheStore,
    pipeline: TransformPipeline,
    permissions: Box<dyn PermissionChecker>,
    urls: Box<dyn UrlBuilder>,
    limiter: Arc<Semaphore>,
}

impl RenderService {
    /// Build a service from an already loaded registry and explicit collaborators.
    pub fn with_services(
        config: &Config,
        registry: Arc<ProfileRegistry>,
        services: RenderServices,
    ) -> Self {
        let resolver = PathResolver::new(&config.source_path, &config.no_image);

        Self {
            registry,
            pipeline: TransformPipeline::new(resolver.clone(), config.background),
            resolver,
            cache: CacheStore::new(
                &config.cache_path,
                &config.cache_public_path,
                config.cache_time,
            ),
            permissions: services.permissions,
            urls: services.urls,
            limiter: Arc::new(Semaphore::new(config.max_concurrent_renders.max(1))),
        }
    }

    /// Load profiles from `config` and route deferred renders to
    /// `config.image_action`.
    pub fn from_config(config: &Config, permissions: Box<dyn PermissionChecker>) -> Result<Self> {
        let registry = Arc::new(ProfileRegistry::from_config(config)?);

        Ok(Self::with_services(
            config,
            registry,
            RenderServices {
                permissions,
                urls: Box::new(RouteUrlBuilder::new(&config.image_action)),
            },
        ))
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// URL for (`reference`, `profile`): the public cache URL when a fresh
    /// derivative exists, otherwise a deferred render URL. Never decodes.
    pub async fn get_url(&self, reference: &str, profile: &str) -> String {
        let profile = self.registry.resolve(profile);
        let reference = if self.is_permitted(reference, profile).await {
            reference
        } else {
            self.resolver.placeholder()
        };

        let paths = self
            .cache
            .locate(reference, &profile.name, profile.is_transparent());
        if self.cache.is_fresh(&paths.system_path) {
            return paths.public_url;
        }

        self.urls.render_url(reference, &profile.name)
    }

    pub async fn url_for<O>(&self, owner: &O, profile: &str) -> String
    where
        O: ImageOwner + ?Sized,
    {
        self.get_url(owner.image_reference(), profile).await
    }

    /// Render (`reference`, `profile`), serving the placeholder on any failure.
    pub async fn show(&self, reference: &str, profile: &str) -> Rendered {
        let profile = self.registry.resolve(profile);

        let error = match self.render(reference, profile).await {
            Ok(rendered) => return rendered,
            Err(e) => e,
        };
        let reason = FallbackReason::from_error(&error);

        if self.resolver.is_placeholder(reference) {
            error!(
                profile = %profile.name,
                error = %error,
                "Placeholder image could not be rendered"
            );
            return Rendered::empty(reason);
        }

        warn!(
            reference = %reference,
            profile = %profile.name,
            error = %error,
            "Serving placeholder image"
        );

        // Single bounded retry: the placeholder is rendered directly, never
        // through `show` again.
        match self.render(self.resolver.placeholder(), profile).await {
            Ok(mut rendered) => {
                rendered.fallback = Some(reason);
                rendered
            }
            Err(e) => {
                error!(
                    profile = %profile.name,
                    error = %e,
                    "Placeholder image could not be rendered"
                );
                Rendered::empty(reason)
            }
        }
    }

    async fn is_permitted(&self, reference: &str, profile: &Profile) -> bool {
        if self.resolver.is_placeholder(reference) {
            return true;
        }
        match profile.gate() {
            Some(role) => self.permissions.can_access(role).await,
            None => true,
        }
    }

    async fn render(&self, reference: &str, profile: &Profile) -> Result<Rendered> {
        if !self.is_permitted(reference, profile).await {
            let role = profile.gate().unwrap_or_default().to_string();
            return Err(Error::PermissionDenied(role));
        }

        let source = self.resolver.resolve(reference)?;
        let paths = self
            .cache
            .locate(reference, &profile.name, profile.is_transparent());
        let content_type = content_type_for_extension(&paths.extension).to_string();

        if self.cache.is_fresh(&paths.system_path) {
            match tokio::fs::read(&paths.system_path).await {
                Ok(bytes) => {
                    debug!(
                        reference = %reference,
                        profile = %profile.name,
                        path = %paths.system_path.display(),
                        "Serving cached derivative"
                    );
                    return Ok(Rendered {
                        bytes,
                        content_type,
                        extension: paths.extension,
                        origin: RenderOrigin::CacheHit,
                        fallback: None,
                    });
                }
                Err(e) => warn!(
                    path = %paths.system_path.display(),
                    error = %e,
                    "Cached derivative unreadable, regenerating"
                ),
            }
        }

        let format = format_for_extension(&paths.extension)?;
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| Error::Invariant("Render limiter closed".to_string()))?;

        let bytes = tokio::task::spawn_blocking({
            let pipeline = self.pipeline.clone();
            let operations = profile.operations.clone();
            let cache = self.cache.clone();
            let paths = paths.clone();
            move || -> Result<Vec<u8>> {
                let image = pipeline::decode(&source)?;
                let image = pipeline.apply(image, &operations)?;
                let bytes = encode::encode(&image, format)?;

                if let Err(e) = cache.persist(&paths, &bytes) {
                    warn!(
                        path = %paths.system_path.display(),
                        error = %e,
                        "Failed to persist derivative, streaming in-memory result"
                    );
                }
                Ok(bytes)
            }
        })
        .await
        .map_err(|e| Error::Invariant(format!("Render task join error: {}", e)))??;

        info!(
            reference = %reference,
            profile = %profile.name,
            path = %paths.system_path.display(),
            bytes = bytes.len(),
            "Generated derivative"
        );

        Ok(Rendered {
            bytes,
            content_type,
            extension: paths.extension,
            origin: RenderOrigin::Generated,
            fallback: None,
        })
    }
}
