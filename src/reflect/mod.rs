//! @acp:module "Reflection"
//! @acp:summary "Adapter seam for class introspection"
//! @acp:domain metadata
//! @acp:layer model
//!
//! The resolver never inspects classes itself; it asks a [`Reflector`].
//! [`crate::index::ClassIndex`] is the source-scanning implementation.

use std::ops::Range;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;
use crate::parse::Imports;

/// @acp:summary "The source a class was declared in"
#[derive(Debug, Clone)]
pub struct ClassSource {
    pub path: PathBuf,
    /// Full text of the declaring file
    pub text: String,
    /// Byte range of the declaration inside `text`; `None` means the whole file
    pub span: Option<Range<usize>>,
    /// Last modification of the file
    pub modified: DateTime<Utc>,
}

impl ClassSource {
    /// The part of the file holding the declaration
    pub fn declaration(&self) -> &str {
        self.span
            .clone()
            .and_then(|span| self.text.get(span))
            .unwrap_or(&self.text)
    }
}

/// @acp:summary "Class introspection used by the metadata resolver"
pub trait Reflector: Send + Sync {
    /// Canonical name of the class; `ClassNotFound` when unknown
    fn class_name(&self, class: &str) -> Result<String>;

    /// Raw doc-comment on the class declaration
    fn doc_comment_of(&self, class: &str) -> Result<Option<String>>;

    /// Constant name -> value, including inherited constants
    fn constants_of(&self, class: &str) -> Result<Vec<(String, Value)>>;

    /// Ancestors root-first, excluding the class itself
    fn ancestors_of(&self, class: &str) -> Result<Vec<String>>;

    fn source_of(&self, class: &str) -> Result<ClassSource>;

    /// Namespace and imports in effect at the declaration
    fn imports_of(&self, class: &str) -> Result<Imports>;

    /// Modification marker that versions cache entries for the class
    fn last_modified(&self, class: &str) -> Result<DateTime<Utc>> {
        Ok(self.source_of(class)?.modified)
    }

    /// Whether `class` extends `ancestor`, directly or transitively.
    /// Unknown classes extend nothing.
    fn is_subclass_of(&self, _class: &str, _ancestor: &str) -> bool {
        false
    }
}

impl<T: Reflector + ?Sized> Reflector for &T {
    fn class_name(&self, class: &str) -> Result<String> {
        (**self).class_name(class)
    }

    fn doc_comment_of(&self, class: &str) -> Result<Option<String>> {
        (**self).doc_comment_of(class)
    }

    fn constants_of(&self, class: &str) -> Result<Vec<(String, Value)>> {
        (**self).constants_of(class)
    }

    fn ancestors_of(&self, class: &str) -> Result<Vec<String>> {
        (**self).ancestors_of(class)
    }

    fn source_of(&self, class: &str) -> Result<ClassSource> {
        (**self).source_of(class)
    }

    fn imports_of(&self, class: &str) -> Result<Imports> {
        (**self).imports_of(class)
    }

    fn last_modified(&self, class: &str) -> Result<DateTime<Utc>> {
        (**self).last_modified(class)
    }

    fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        (**self).is_subclass_of(class, ancestor)
    }
}

/// @acp:summary "Anything that names a class: a class name or an instance"
pub trait ClassTarget {
    fn class_name(&self) -> &str;
}

impl ClassTarget for str {
    fn class_name(&self) -> &str {
        self
    }
}

impl ClassTarget for String {
    fn class_name(&self) -> &str {
        self
    }
}

impl<T: ClassTarget + ?Sized> ClassTarget for &T {
    fn class_name(&self) -> &str {
        (**self).class_name()
    }
}
