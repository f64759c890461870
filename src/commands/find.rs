//! @acp:module "Find Command"
//! @acp:summary "Find constant metadata by constant value"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::Result;
use console::style;
use serde_json::Value;

use super::{groups_from, open_manager, print_meta};
use crate::config::Config;

/// Options for the find command
#[derive(Debug, Clone)]
pub struct FindOptions {
    pub class: String,
    /// Value to look for; parsed as JSON when possible, else taken as a string
    pub value: String,
    pub groups: Vec<String>,
    pub json: bool,
}

/// Parse a command-line value: `1`, `true` or `"x"` as JSON, anything else as text
pub(crate) fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Execute the find command
pub fn execute_find(options: FindOptions, config: &Config) -> Result<()> {
    let manager = open_manager(config)?;
    let meta = manager.constant_meta_by_value(
        &options.class,
        parse_value(&options.value),
        &groups_from(&options.groups),
    )?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
        return Ok(());
    }

    match meta {
        Some(meta) => print_meta(&meta),
        None => {
            eprintln!(
                "{} No constant on {} with value {}",
                style("✗").red(),
                options.class,
                options.value
            );
            std::process::exit(1);
        }
    }
    Ok(())
}
