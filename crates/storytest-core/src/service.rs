//! File ingress with a content-addressed result cache
//!
//! Holds the process-wide [`ProjectLayout`] and base transform settings,
//! reads story files with `tokio::fs` and caches each result by the hash of
//! its path and source.

use crate::config::StorytestConfig;
use crate::error::{ConfigError, ServiceError};
use crate::hash::SourceHash;
use crate::transform::{transform, TransformOptions, TransformResult};
use moka::future::Cache;
use std::path::Path;
use std::sync::Arc;
use storytest_codegen::TestTemplate;
use storytest_csf::{ProjectLayout, TagFilterConfig};

/// Default maximum story file size (10MB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Settings shared by every transform of one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Runtime bindings for generated code
    pub template: TestTemplate,
    /// Tag filter
    pub tags: TagFilterConfig,
    /// Emit a placeholder test for modules without stories
    pub insert_test_if_empty: bool,
    /// Drop original story declarations from the output
    pub clear_original_body: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            template: TestTemplate::default(),
            tags: TagFilterConfig::default(),
            insert_test_if_empty: true,
            clear_original_body: true,
        }
    }
}

/// Transforms story files, caching results
#[derive(Debug, Clone)]
pub struct TransformService {
    layout: Arc<ProjectLayout>,
    settings: ServiceSettings,
    cache: Cache<SourceHash, Arc<TransformResult>>,
    max_file_size: usize,
}

impl TransformService {
    /// Create service for a layout
    #[inline]
    #[must_use]
    pub fn new(layout: ProjectLayout) -> Self {
        Self::with_capacity(layout, 1_000)
    }

    /// Create service with a cache capacity
    #[must_use]
    pub fn with_capacity(layout: ProjectLayout, cache_capacity: u64) -> Self {
        Self {
            layout: Arc::new(layout),
            settings: ServiceSettings::default(),
            cache: Cache::new(cache_capacity),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Create service from configuration
    ///
    /// # Errors
    /// Returns error if a story location rule does not compile
    pub fn from_config(config: &StorytestConfig, default_working_dir: &Path) -> Result<Self, ConfigError> {
        let settings = ServiceSettings {
            template: config.template.clone(),
            tags: config.tags.clone(),
            insert_test_if_empty: config.transform.insert_test_if_empty,
            clear_original_body: config.transform.clear_original_body,
        };
        Ok(Self::new(config.layout(default_working_dir)?).with_settings(settings))
    }

    /// With base settings
    #[inline]
    #[must_use]
    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    /// With a file size limit
    #[inline]
    #[must_use]
    pub fn with_max_file_size(mut self, max: usize) -> Self {
        self.max_file_size = max;
        self
    }

    /// Shared layout
    #[inline]
    #[must_use]
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Base settings
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Check whether a configured rule claims `file`
    #[must_use]
    pub fn is_story_file(&self, file: &Path) -> bool {
        self.layout.is_story_file(file)
    }

    /// Transform options for `file`
    #[must_use]
    pub fn options_for(&self, file: &Path) -> TransformOptions {
        TransformOptions::for_file(Arc::clone(&self.layout), file)
            .with_template(self.settings.template.clone())
            .with_tags(self.settings.tags.clone())
            .with_insert_test_if_empty(self.settings.insert_test_if_empty)
            .with_clear_original_body(self.settings.clear_original_body)
    }

    /// Transform source text for `file`, using the cache
    ///
    /// # Errors
    /// Returns `ServiceError::Transform` if the module cannot be transformed
    pub async fn transform_source(
        &self,
        file: &Path,
        source: &str,
    ) -> Result<Arc<TransformResult>, ServiceError> {
        let key = SourceHash::compute(file, source);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(file = %file.display(), hash = %key.short(), "transform cache hit");
            return Ok(cached);
        }

        let result = transform(source, file, &self.options_for(file)).map_err(|source| {
            ServiceError::Transform {
                path: file.to_path_buf(),
                source,
            }
        })?;
        let result = Arc::new(result);
        self.cache.insert(key, Arc::clone(&result)).await;
        Ok(result)
    }

    /// Read and transform a story file (Ingress)
    ///
    /// # Errors
    /// - `ServiceError::Io` if the file cannot be read
    /// - `ServiceError::FileTooLarge` if it exceeds the size limit
    /// - `ServiceError::Transform` if the module cannot be transformed
    pub async fn transform_file(&self, file: &Path) -> Result<Arc<TransformResult>, ServiceError> {
        let source = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| ServiceError::io_error(file, e))?;

        if source.len() > self.max_file_size {
            return Err(ServiceError::FileTooLarge {
                path: file.to_path_buf(),
                size: source.len(),
                max: self.max_file_size,
            });
        }

        self.transform_source(file, &source).await
    }

    /// Approximate number of cached results
    #[inline]
    #[must_use]
    pub fn cached_entries(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Drop every cached result
    #[inline]
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
