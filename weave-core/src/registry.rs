use std::collections::HashMap;

use tracing::{debug, warn};

use crate::compose::ComposeError;

/// Component fragments keyed by component name.
///
/// Built once per build from the fragment sources and never mutated
/// afterwards. When the same name is loaded twice the later fragment wins and
/// the name is remembered in [`ComponentRegistry::duplicates`].
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, String>,
    duplicates: Vec<String>,
}

impl ComponentRegistry {
    pub fn load<I, N, T>(sources: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        let mut registry = Self::default();

        for (name, fragment) in sources {
            let name = name.into();
            debug!(component = %name, "loaded component");

            if registry.components.insert(name.clone(), fragment.into()).is_some() {
                warn!(component = %name, "duplicate component, keeping the last one loaded");
                if !registry.duplicates.contains(&name) {
                    registry.duplicates.push(name);
                }
            }
        }

        registry
    }

    /// Like [`ComponentRegistry::load`], but a duplicate name is an error.
    pub fn load_strict<I, N, T>(sources: I) -> Result<Self, ComposeError>
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        let registry = Self::load(sources);
        match registry.duplicates.first() {
            Some(name) => Err(ComposeError::DuplicateComponent { name: name.clone() }),
            None => Ok(registry),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.components.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.components
            .iter()
            .map(|(name, fragment)| (name.as_str(), fragment.as_str()))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Names that were loaded more than once, in the order first seen.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }
}
