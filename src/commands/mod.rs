//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Every command indexes the configured source root, then runs one lookup.

pub mod class;
pub mod classes;
pub mod constants;
pub mod find;
pub mod map;

pub use class::{execute_class, ClassOptions};
pub use classes::{execute_classes, ClassesOptions};
pub use constants::{execute_constants, ConstantsOptions};
pub use find::{execute_find, FindOptions};
pub use map::{execute_map, MapOptions, MetaField};

use anyhow::{Context, Result};
use console::style;
use serde_json::Value;

use crate::config::Config;
use crate::index::ClassIndex;
use crate::manager::ClassMetaManager;
use crate::meta::{Groups, Meta};

/// `-g` values, or the default group when none were given
pub(crate) fn groups_from(groups: &[String]) -> Groups {
    if groups.is_empty() {
        Groups::default()
    } else {
        Groups::new(groups.iter().cloned())
    }
}

pub(crate) fn open_index(config: &Config) -> Result<ClassIndex> {
    ClassIndex::scan(&config.root, config)
        .with_context(|| format!("failed to index {}", config.root.display()))
}

/// Manager over a fresh index, with the configured cache and parser
pub(crate) fn open_manager(config: &Config) -> Result<ClassMetaManager<ClassIndex>> {
    let index = open_index(config)?;
    Ok(ClassMetaManager::new(index)
        .with_shared_cache(config.cache_store(), config.cache.ttl)
        .with_parser(config.parser()))
}

/// Render a JSON value the way it reads in source: strings unquoted
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn print_meta(meta: &Meta) {
    println!(
        "{}",
        style(meta.property.as_deref().unwrap_or("(unnamed)")).bold()
    );
    if !meta.value.is_null() {
        println!("  value:  {}", display_value(&meta.value));
    }
    println!("  groups: {}", meta.groups.join(", "));
    for (key, value) in &meta.data {
        println!("  {}: {}", style(key).dim(), display_value(value));
    }
}
