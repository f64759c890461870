//! @acp:module "Class Command"
//! @acp:summary "Show the metadata annotated on a class"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::Result;
use console::style;

use super::{groups_from, open_manager, print_meta};
use crate::config::Config;

/// Options for the class command
#[derive(Debug, Clone)]
pub struct ClassOptions {
    pub class: String,
    /// Requested groups; empty means the default group
    pub groups: Vec<String>,
    pub json: bool,
}

/// Execute the class command
pub fn execute_class(options: ClassOptions, config: &Config) -> Result<()> {
    let manager = open_manager(config)?;
    let meta = manager.class_meta(&options.class, &groups_from(&options.groups))?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
        return Ok(());
    }

    match meta {
        Some(meta) => print_meta(&meta),
        None => println!(
            "{} No metadata on {} for the requested groups",
            style("ℹ").cyan(),
            options.class
        ),
    }
    Ok(())
}
