//! @acp:module "Map Command"
//! @acp:summary "Build a key/value object from constant metadata"
//! @acp:domain cli
//! @acp:layer handler
//!
//! `classmeta map App\Invoice --key value --value data.name` prints
//! `{"draft": "Draft", "sent": "Sent"}`.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde_json::{Map, Value};

use super::{display_value, groups_from, open_manager};
use crate::config::Config;
use crate::meta::Meta;

/// @acp:summary "A field of a metadata entry addressable from the command line"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaField {
    Property,
    Value,
    Groups,
    /// `data.<key>`
    Data(String),
}

impl MetaField {
    pub fn extract(&self, meta: &Meta) -> Value {
        match self {
            MetaField::Property => meta.property.clone().map(Value::String).unwrap_or(Value::Null),
            MetaField::Value => meta.value.clone(),
            MetaField::Groups => Value::from(meta.groups.clone()),
            MetaField::Data(key) => meta.data(key).cloned().unwrap_or(Value::Null),
        }
    }
}

impl FromStr for MetaField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "property" => Ok(MetaField::Property),
            "value" => Ok(MetaField::Value),
            "groups" => Ok(MetaField::Groups),
            _ => match s.strip_prefix("data.") {
                Some(key) if !key.is_empty() => Ok(MetaField::Data(key.to_string())),
                _ => bail!("unknown field `{}` (expected property, value, groups or data.<key>)", s),
            },
        }
    }
}

impl fmt::Display for MetaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaField::Property => write!(f, "property"),
            MetaField::Value => write!(f, "value"),
            MetaField::Groups => write!(f, "groups"),
            MetaField::Data(key) => write!(f, "data.{}", key),
        }
    }
}

/// Options for the map command
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub class: String,
    /// Field used as the object key
    pub key: MetaField,
    /// Field used as the object value
    pub value: MetaField,
    pub groups: Vec<String>,
}

/// Execute the map command
pub fn execute_map(options: MapOptions, config: &Config) -> Result<()> {
    let manager = open_manager(config)?;
    let object: Map<String, Value> = manager.map_constants_meta(
        &options.class,
        |meta, _| {
            (
                display_value(&options.key.extract(meta)),
                options.value.extract(meta),
            )
        },
        &groups_from(&options.groups),
    )?;

    println!("{}", serde_json::to_string_pretty(&object)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_fields() {
        assert_eq!("property".parse::<MetaField>().unwrap(), MetaField::Property);
        assert_eq!(
            "data.name".parse::<MetaField>().unwrap(),
            MetaField::Data("name".to_string())
        );
        assert!("data.".parse::<MetaField>().is_err());
        assert!("label".parse::<MetaField>().is_err());
    }

    #[test]
    fn test_extract() {
        let mut meta = Meta::default();
        meta.property = Some("DRAFT".to_string());
        meta.value = json!("draft");
        meta.data.insert("name".to_string(), json!("Draft"));

        assert_eq!(MetaField::Property.extract(&meta), json!("DRAFT"));
        assert_eq!(MetaField::Value.extract(&meta), json!("draft"));
        assert_eq!(MetaField::Groups.extract(&meta), json!(["Default"]));
        assert_eq!(MetaField::Data("name".to_string()).extract(&meta), json!("Draft"));
        assert_eq!(MetaField::Data("missing".to_string()).extract(&meta), Value::Null);
    }
}
