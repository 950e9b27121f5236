use std::fmt;
use std::sync::Arc;

use crate::bear::{Bear, BearSpec};
use crate::cache::ResultCache;
use crate::error::ConfigurationError;
use crate::params::BoundParams;
use crate::result::FileSet;
use crate::section::Section;

/// A bear bound to its settings, file set and optional shared cache.
///
/// Parameters are resolved once here, so every work unit of the instance
/// sees the same values.
pub struct BearInstance {
    bear: Arc<dyn Bear>,
    section: Arc<Section>,
    files: Arc<FileSet>,
    params: BoundParams,
    cache: Option<Arc<dyn ResultCache>>,
}

impl BearInstance {
    pub fn new(
        bear: Arc<dyn Bear>,
        section: Arc<Section>,
        files: Arc<FileSet>,
    ) -> Result<Self, ConfigurationError> {
        let spec = bear.spec();
        spec.validate()?;
        let params = BoundParams::resolve(spec.name(), spec.params(), &section)?;
        Ok(Self {
            bear,
            section,
            files,
            params,
            cache: None,
        })
    }

    /// Attach a cache shared across runs.
    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Instantiate `bear` over the same settings, files and cache as `self`.
    /// Used for dependencies pulled in by a dependent bear.
    pub fn derive(&self, bear: Arc<dyn Bear>) -> Result<Self, ConfigurationError> {
        let mut instance = Self::new(bear, Arc::clone(&self.section), Arc::clone(&self.files))?;
        instance.cache = self.cache.clone();
        Ok(instance)
    }

    /// Whether `other` was bound to the very same settings, files and cache.
    pub fn shares_inputs_with(&self, other: &BearInstance) -> bool {
        let same_cache = match (&self.cache, &other.cache) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        };
        Arc::ptr_eq(&self.section, &other.section) && Arc::ptr_eq(&self.files, &other.files) && same_cache
    }

    pub fn name(&self) -> &str {
        self.bear.name()
    }

    pub fn spec(&self) -> &BearSpec {
        self.bear.spec()
    }

    pub fn bear(&self) -> &dyn Bear {
        self.bear.as_ref()
    }

    pub fn section(&self) -> &Section {
        &self.section
    }

    pub fn files(&self) -> &FileSet {
        &self.files
    }

    pub fn params(&self) -> &BoundParams {
        &self.params
    }

    pub fn cache(&self) -> Option<&dyn ResultCache> {
        self.cache.as_deref()
    }
}

impl fmt::Debug for BearInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearInstance")
            .field("bear", &self.name())
            .field("granularity", &self.spec().granularity().tag())
            .field("section", &self.section.name())
            .field("files", &self.files.len())
            .field("params", &self.params)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}
