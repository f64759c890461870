//! @acp:module "Metadata Model"
//! @acp:summary "Annotation instances, annotation kinds, groups and constant collections"
//! @acp:domain metadata
//! @acp:layer model
//!
//! A metadata annotation has a common base shape (`property`, `value`,
//! `data`, `groups`) plus a kind-specific payload `K`. Callers pick the kind
//! they want to read; the base kind is [`Plain`].

mod groups;
mod loose;

pub use groups::{Groups, ALL_GROUPS, DEFAULT_GROUP};
pub use loose::loose_eq;

use std::fmt::Debug;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// @acp:summary "An annotation family the resolver can read"
///
/// Implementors are the kind-specific payload of [`Meta`]; their fields are
/// flattened next to the base fields. Anything the payload does not declare
/// is ignored.
///
/// ```
/// use classmeta::meta::{Meta, MetaKind};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// struct MyMeta {
///     #[serde(default)]
///     foo: String,
/// }
///
/// impl MetaKind for MyMeta {
///     const NAME: &'static str = "App\\Annotation\\MyMeta";
/// }
///
/// let meta: Meta<MyMeta> =
///     serde_json::from_value(serde_json::json!({"foo": "Foo thingy"})).unwrap();
/// assert_eq!(meta.kind.foo, "Foo thingy");
/// assert_eq!(meta.groups, vec!["Default"]);
/// ```
pub trait MetaKind: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Fully-qualified annotation name, e.g. `ClassMeta\Annotation\Meta`
    const NAME: &'static str;

    /// Whether an annotation written with this resolved name is of this kind
    fn accepts(name: &str) -> bool {
        name.trim_start_matches('\\')
            .eq_ignore_ascii_case(Self::NAME.trim_start_matches('\\'))
    }
}

/// @acp:summary "The base annotation kind with no extra fields"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plain {}

impl MetaKind for Plain {
    const NAME: &'static str = "ClassMeta\\Annotation\\Meta";
}

/// @acp:summary "A metadata annotation instance"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta<K = Plain> {
    /// Name of the class or constant described; set by the resolver
    #[serde(default)]
    pub property: Option<String>,
    /// Constant value; `null` for class-level metadata
    #[serde(default)]
    pub value: Value,
    /// Free-form payload
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Never empty; falls back to `["Default"]`
    #[serde(default = "default_groups", deserialize_with = "deserialize_groups")]
    pub groups: Vec<String>,
    /// Kind-specific fields
    #[serde(flatten)]
    pub kind: K,
}

impl<K: Default> Default for Meta<K> {
    fn default() -> Self {
        Self {
            property: None,
            value: Value::Null,
            data: Map::new(),
            groups: default_groups(),
            kind: K::default(),
        }
    }
}

impl<K> Meta<K> {
    /// Shorthand for a `data` entry
    pub fn data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// `data[key]` as a string slice
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

fn default_groups() -> Vec<String> {
    vec![DEFAULT_GROUP.to_string()]
}

fn deserialize_groups<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let groups = match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(group)) => vec![group],
        Some(OneOrMany::Many(groups)) => groups,
        None => Vec::new(),
    };
    Ok(if groups.is_empty() { default_groups() } else { groups })
}

/// @acp:summary "Ordered constant name -> metadata collection"
///
/// Keeps insertion order. Inserting an existing name replaces the entry but
/// keeps its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstantsMeta<K = Plain> {
    entries: IndexMap<String, Meta<K>>,
}

impl<K> Default for ConstantsMeta<K> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<K> ConstantsMeta<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the replaced entry
    pub fn insert(&mut self, name: impl Into<String>, meta: Meta<K>) -> Option<Meta<K>> {
        self.entries.insert(name.into(), meta)
    }

    /// Merge `other` into `self`; entries of `other` win
    pub fn extend_overriding(&mut self, other: ConstantsMeta<K>) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, name: &str) -> Option<&Meta<K>> {
        self.entries.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Meta<K>> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Meta<K>)> {
        self.entries.iter().map(|(n, m)| (n.as_str(), m))
    }
}

impl<K> std::ops::Index<&str> for ConstantsMeta<K> {
    type Output = Meta<K>;

    fn index(&self, name: &str) -> &Self::Output {
        self.get(name)
            .unwrap_or_else(|| panic!("no metadata for constant `{}`", name))
    }
}

impl<K> IntoIterator for ConstantsMeta<K> {
    type Item = (String, Meta<K>);
    type IntoIter = indexmap::map::IntoIter<String, Meta<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K> FromIterator<(String, Meta<K>)> for ConstantsMeta<K> {
    fn from_iter<I: IntoIterator<Item = (String, Meta<K>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
