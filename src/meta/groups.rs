//! @acp:module "Group Filter"
//! @acp:summary "Requested group sets and the shared match policy"
//! @acp:domain metadata
//! @acp:layer model

use serde::{Deserialize, Serialize};

/// Group every annotation belongs to unless it declares otherwise
pub const DEFAULT_GROUP: &str = "Default";

/// Wildcard group selecting every annotation
pub const ALL_GROUPS: &str = "_all";

/// @acp:summary "The groups a caller asks for"
///
/// Defaults to `["Default"]`. A candidate matches when its declared groups
/// intersect the requested ones, or when the request contains `_all`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Groups(Vec<String>);

impl Default for Groups {
    fn default() -> Self {
        Self(vec![DEFAULT_GROUP.to_string()])
    }
}

impl Groups {
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(groups.into_iter().map(Into::into).collect())
    }

    /// The `_all` wildcard
    pub fn all() -> Self {
        Self(vec![ALL_GROUPS.to_string()])
    }

    pub fn is_all(&self) -> bool {
        self.0.iter().any(|g| g == ALL_GROUPS)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// First requested group present in `declared`
    pub fn first_match<'g>(&'g self, declared: &[String]) -> Option<&'g str> {
        self.0
            .iter()
            .find(|g| declared.iter().any(|d| d == *g))
            .map(String::as_str)
    }

    /// @acp:summary "Shared filter for class- and constant-level metadata"
    pub fn accepts(&self, declared: &[String]) -> bool {
        self.is_all() || self.first_match(declared).is_some()
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Groups {
    fn from(groups: [S; N]) -> Self {
        Self::new(groups)
    }
}

impl From<Vec<String>> for Groups {
    fn from(groups: Vec<String>) -> Self {
        Self(groups)
    }
}

impl From<&[&str]> for Groups {
    fn from(groups: &[&str]) -> Self {
        Self::new(groups.iter().copied())
    }
}
