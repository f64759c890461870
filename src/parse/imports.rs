//! @acp:module "Imports"
//! @acp:summary "Namespace context used to resolve short annotation names"
//! @acp:domain metadata
//! @acp:layer model

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Namespace and `use` aliases in effect at a declaration site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Imports {
    /// Enclosing namespace, empty for the global namespace
    #[serde(default)]
    pub namespace: String,
    /// Lowercased alias -> fully-qualified name
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl Imports {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            aliases: HashMap::new(),
        }
    }

    /// Register `use {name} as {alias}`; the alias defaults to the last segment
    pub fn add(&mut self, name: &str, alias: Option<&str>) {
        let name = name.trim_start_matches('\\');
        let alias = alias
            .map(str::to_string)
            .unwrap_or_else(|| short_name(name).to_string());
        self.aliases.insert(alias.to_ascii_lowercase(), name.to_string());
    }

    pub fn with(mut self, name: &str, alias: Option<&str>) -> Self {
        self.add(name, alias);
        self
    }

    /// Resolve a name through the alias table only.
    ///
    /// `\Fully\Qualified` names resolve to themselves; `Alias\Rest` expands
    /// the first segment; anything else returns `None`.
    pub fn resolve_imported(&self, name: &str) -> Option<String> {
        if let Some(absolute) = name.strip_prefix('\\') {
            return Some(absolute.to_string());
        }
        let (head, tail) = match name.split_once('\\') {
            Some((head, tail)) => (head, Some(tail)),
            None => (name, None),
        };
        let target = self.aliases.get(&head.to_ascii_lowercase())?;
        Some(match tail {
            Some(tail) => format!("{}\\{}", target, tail),
            None => target.clone(),
        })
    }

    /// Resolve a class reference the way the language does: aliases first,
    /// then relative to the current namespace
    pub fn resolve_class(&self, name: &str) -> String {
        if let Some(resolved) = self.resolve_imported(name) {
            return resolved;
        }
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}\\{}", self.namespace, name)
        }
    }
}

/// Last segment of a namespaced name
pub fn short_name(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}
