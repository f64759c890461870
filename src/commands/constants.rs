//! @acp:module "Constants Command"
//! @acp:summary "Show constant metadata of a class, including inherited constants"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::Result;
use console::style;

use super::{groups_from, open_manager, print_meta};
use crate::config::Config;

/// Options for the constants command
#[derive(Debug, Clone)]
pub struct ConstantsOptions {
    pub class: String,
    pub groups: Vec<String>,
    pub json: bool,
}

/// Execute the constants command
pub fn execute_constants(options: ConstantsOptions, config: &Config) -> Result<()> {
    let manager = open_manager(config)?;
    let metas = manager.class_constants_meta(&options.class, &groups_from(&options.groups))?;

    if options.json {
        // Declaration order; each entry names its constant in `property`
        let entries: Vec<_> = metas.values().collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if metas.is_empty() {
        println!(
            "{} No constant metadata on {} for the requested groups",
            style("ℹ").cyan(),
            options.class
        );
        return Ok(());
    }

    for meta in metas.values() {
        print_meta(meta);
    }
    println!("{} {} constants", style("✓").green(), metas.len());
    Ok(())
}
