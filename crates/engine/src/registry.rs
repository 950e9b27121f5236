use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use ursa_core::Bear;

/// Bear types known to the engine, by name.
///
/// Dependent bears name their dependencies; the resolver looks them up here
/// to instantiate the ones the caller did not request explicitly.
#[derive(Default, Clone)]
pub struct BearRegistry {
    bears: HashMap<String, Arc<dyn Bear>>,
}

impl BearRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bear type. A later registration under the same name wins.
    pub fn register(&mut self, bear: Arc<dyn Bear>) {
        let name = bear.name().to_string();
        info!(
            bear = %name,
            granularity = bear.spec().granularity().tag(),
            "registered bear"
        );
        if self.bears.insert(name.clone(), bear).is_some() {
            warn!(bear = %name, "bear registered twice; keeping the latest");
        }
    }

    /// Builder-style [`BearRegistry::register`].
    pub fn with(mut self, bear: Arc<dyn Bear>) -> Self {
        self.register(bear);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Bear>> {
        self.bears.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bears.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bears.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.bears.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bears.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticBear;
    use ursa_core::BearSpec;

    #[test]
    fn register_and_lookup() {
        let registry = BearRegistry::new()
            .with(StaticBear::arc(BearSpec::file("B"), &[]))
            .with(StaticBear::arc(BearSpec::project("A"), &[]));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("A"));
        assert!(registry.get("C").is_none());
        assert_eq!(registry.names(), vec!["A", "B"]);
    }

    #[test]
    fn reregistering_replaces() {
        let mut registry = BearRegistry::new();
        registry.register(StaticBear::arc(BearSpec::file("A"), &[]));
        registry.register(StaticBear::arc(BearSpec::project("A"), &[]));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("A").unwrap().spec().granularity().tag(), "project");
    }
}
