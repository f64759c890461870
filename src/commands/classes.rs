//! @acp:module "Classes Command"
//! @acp:summary "List the classes found under the source root"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::Result;
use console::style;
use serde_json::json;

use super::open_index;
use crate::config::Config;

/// Options for the classes command
#[derive(Debug, Clone, Default)]
pub struct ClassesOptions {
    /// Output as JSON
    pub json: bool,
}

/// Execute the classes command
pub fn execute_classes(options: ClassesOptions, config: &Config) -> Result<()> {
    let index = open_index(config)?;
    let classes = index.classes();

    if options.json {
        let rows: Vec<_> = classes
            .iter()
            .map(|c| {
                json!({
                    "name": c.name(),
                    "kind": c.kind(),
                    "parent": c.parent(),
                    "path": c.path().display().to_string(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if classes.is_empty() {
        println!("{} No classes found under {}", style("ℹ").cyan(), config.root.display());
        return Ok(());
    }

    for class in &classes {
        let parent = class
            .parent()
            .map(|p| format!(" extends {}", p))
            .unwrap_or_default();
        println!("{}{}", style(class.name()).bold(), style(parent).dim());
        println!("  {}", class.path().display());
    }
    println!("{} {} classes", style("✓").green(), classes.len());
    Ok(())
}
