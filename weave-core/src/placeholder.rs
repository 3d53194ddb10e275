use std::collections::HashMap;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::compose::ComposeError;
use crate::registry::ComponentRegistry;

/// Label overrides for components whose token is not plain uppercase.
///
/// A component named `hidden-sidebar` would otherwise be addressed as
/// `<!-- HIDDEN-SIDEBAR COMPONENT -->`; the default table maps it to
/// `HIDDEN SIDEBAR` instead. Names that are not listed are uppercased with
/// hyphens kept.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct LabelTable(HashMap<String, String>);

impl Default for LabelTable {
    fn default() -> Self {
        Self(HashMap::from([(
            "hidden-sidebar".to_string(),
            "HIDDEN SIDEBAR".to_string(),
        )]))
    }
}

impl LabelTable {
    /// A table without any overrides.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    pub fn with(mut self, name: impl Into<String>, label: impl Into<String>) -> Self {
        self.0.insert(name.into(), label.into());
        self
    }

    pub fn label_for(&self, name: &str) -> String {
        match self.0.get(name) {
            Some(label) => label.clone(),
            None => name.to_uppercase(),
        }
    }

    pub fn token_for(&self, name: &str) -> String {
        placeholder_token(&self.label_for(name))
    }
}

/// `<!-- LABEL COMPONENT -->`
pub fn placeholder_token(label: &str) -> String {
    format!("<!-- {label} COMPONENT -->")
}

/// Replaces component tokens with their fragments.
///
/// Prepared once per build. The document is scanned a single time from left
/// to right and inserted fragments are never rescanned, so a token inside a
/// fragment stays literal whatever order the registry yields its entries in.
#[derive(Debug)]
pub struct PlaceholderResolver<'a> {
    fragments: HashMap<String, &'a str>,
    pattern: Option<Regex>,
}

impl<'a> PlaceholderResolver<'a> {
    pub fn new(registry: &'a ComponentRegistry, labels: &LabelTable) -> Result<Self, ComposeError> {
        let mut fragments: HashMap<String, &'a str> = HashMap::with_capacity(registry.len());
        let mut owners: HashMap<String, &'a str> = HashMap::with_capacity(registry.len());

        // Sorted so a conflict always names the same pair.
        let mut entries: Vec<(&'a str, &'a str)> = registry.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

        for (name, fragment) in entries {
            let token = labels.token_for(name);
            if let Some(first) = owners.insert(token.clone(), name) {
                return Err(ComposeError::TokenConflict {
                    token,
                    first: first.to_string(),
                    second: name.to_string(),
                });
            }
            fragments.insert(token, fragment);
        }

        let pattern = if fragments.is_empty() {
            None
        } else {
            // Longest first so a token can never shadow one that extends it.
            let mut tokens: Vec<&String> = fragments.keys().collect();
            tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            let alternation = tokens
                .iter()
                .map(|token| regex::escape(token))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&alternation)?)
        };

        Ok(Self { fragments, pattern })
    }

    pub fn resolve(&self, document: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return document.to_string();
        };

        pattern
            .replace_all(document, |caps: &Captures| {
                let token = &caps[0];
                self.fragments.get(token).copied().unwrap_or(token).to_string()
            })
            .into_owned()
    }

    /// Tokens this resolver recognises, sorted.
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.fragments.keys().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens
    }
}

/// One-shot form of [`PlaceholderResolver`].
pub fn resolve_placeholders(
    document: &str,
    registry: &ComponentRegistry,
    labels: &LabelTable,
) -> Result<String, ComposeError> {
    Ok(PlaceholderResolver::new(registry, labels)?.resolve(document))
}
