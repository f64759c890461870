//! @acp:module "Indexer"
//! @acp:summary "Source index of class declarations, usable as a reflector"
//! @acp:domain metadata
//! @acp:layer service
//!
//! Walks a source tree, scans every matching file for class declarations
//! and keeps an immutable snapshot keyed by class name. Files are parsed in
//! parallel; registration is sequential and deterministic.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use glob::{MatchOptions, Pattern};
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{MetaError, Result};
use crate::parse::{scan_declarations, ClassDecl, DeclKind, Imports};
use crate::reflect::{ClassSource, Reflector};

/// A scanned source file shared by the classes it declares
#[derive(Debug)]
struct SourceFile {
    path: PathBuf,
    text: String,
    modified: DateTime<Utc>,
}

/// @acp:summary "One indexed class declaration"
#[derive(Debug, Clone)]
pub struct IndexedClass {
    decl: ClassDecl,
    file: Arc<SourceFile>,
}

impl IndexedClass {
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn kind(&self) -> DeclKind {
        self.decl.kind
    }

    pub fn parent(&self) -> Option<&str> {
        self.decl.parent.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.file.modified
    }

    pub fn declaration(&self) -> &ClassDecl {
        &self.decl
    }
}

/// @acp:summary "Class index built from source text"
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    /// Lowercased name without leading `\` -> class
    classes: HashMap<String, IndexedClass>,
}

fn index_key(class: &str) -> String {
    class.trim_start_matches('\\').to_ascii_lowercase()
}

impl ClassIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// @acp:summary "Register every class declared in a source text"
    /// Returns the number of classes found.
    pub fn add_source(
        &mut self,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
        modified: DateTime<Utc>,
    ) -> usize {
        let text = text.into();
        let decls = scan_declarations(&text);
        self.register(
            SourceFile {
                path: path.into(),
                text,
                modified,
            },
            decls,
        )
    }

    /// Read a file from disk and register its classes
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let (file, decls) = read_source(path.as_ref())?;
        Ok(self.register(file, decls))
    }

    /// @acp:summary "Index all files under root matching the configured patterns"
    /// @acp:ai-careful "This processes many files in parallel"
    pub fn scan<P: AsRef<Path>>(root: P, config: &Config) -> Result<Self> {
        let root = root.as_ref();
        let files = find_files(root, config)?;
        debug!(root = %root.display(), files = files.len(), "scanning source tree");

        let scanned: Vec<_> = files
            .par_iter()
            .filter_map(|path| match read_source(path) {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    None
                }
            })
            .collect();

        let mut index = Self::new();
        for (file, decls) in scanned {
            index.register(file, decls);
        }
        debug!(classes = index.len(), "index built");
        Ok(index)
    }

    fn register(&mut self, file: SourceFile, decls: Vec<ClassDecl>) -> usize {
        let file = Arc::new(file);
        let count = decls.len();
        for decl in decls {
            let key = index_key(&decl.name);
            if let Some(previous) = self.classes.get(&key) {
                warn!(
                    class = %decl.name,
                    previous = %previous.path().display(),
                    path = %file.path.display(),
                    "class declared twice; keeping the later declaration"
                );
            }
            self.classes.insert(
                key,
                IndexedClass {
                    decl,
                    file: Arc::clone(&file),
                },
            );
        }
        count
    }

    pub fn get(&self, class: &str) -> Option<&IndexedClass> {
        self.classes.get(&index_key(class))
    }

    /// Indexed classes sorted by name
    pub fn classes(&self) -> Vec<&IndexedClass> {
        let mut classes: Vec<_> = self.classes.values().collect();
        classes.sort_by(|a, b| a.name().cmp(b.name()));
        classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn require(&self, class: &str) -> Result<&IndexedClass> {
        self.get(class)
            .ok_or_else(|| MetaError::ClassNotFound(class.to_string()))
    }

    /// Parent chain nearest-first, stopping at the first class not indexed
    fn parent_chain(&self, class: &IndexedClass) -> Vec<&IndexedClass> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([index_key(class.name())]);
        let mut current = class;
        while let Some(parent) = current.parent() {
            if !seen.insert(index_key(parent)) {
                warn!(class = %class.name(), parent, "inheritance cycle; stopping");
                break;
            }
            match self.get(parent) {
                Some(next) => {
                    chain.push(next);
                    current = next;
                }
                None => {
                    debug!(class = %current.name(), parent, "parent is not indexed; stopping");
                    break;
                }
            }
        }
        chain
    }
}

impl Reflector for ClassIndex {
    fn class_name(&self, class: &str) -> Result<String> {
        Ok(self.require(class)?.name().to_string())
    }

    fn doc_comment_of(&self, class: &str) -> Result<Option<String>> {
        Ok(self.require(class)?.decl.doc_comment.clone())
    }

    fn constants_of(&self, class: &str) -> Result<Vec<(String, Value)>> {
        let class = self.require(class)?;
        let mut constants = class.decl.constants.clone();
        for ancestor in self.parent_chain(class) {
            for (name, value) in &ancestor.decl.constants {
                if !constants.iter().any(|(n, _)| n == name) {
                    constants.push((name.clone(), value.clone()));
                }
            }
        }
        Ok(constants)
    }

    fn ancestors_of(&self, class: &str) -> Result<Vec<String>> {
        let class = self.require(class)?;
        Ok(self
            .parent_chain(class)
            .into_iter()
            .rev()
            .map(|c| c.name().to_string())
            .collect())
    }

    fn source_of(&self, class: &str) -> Result<ClassSource> {
        let class = self.require(class)?;
        Ok(ClassSource {
            path: class.file.path.clone(),
            text: class.file.text.clone(),
            span: Some(class.decl.span.clone()),
            modified: class.file.modified,
        })
    }

    fn imports_of(&self, class: &str) -> Result<Imports> {
        Ok(self.require(class)?.decl.imports.clone())
    }

    fn last_modified(&self, class: &str) -> Result<DateTime<Utc>> {
        Ok(self.require(class)?.modified())
    }

    /// Follows declared parents, including a final parent that is not indexed
    fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        let target = index_key(ancestor);
        let Some(mut current) = self.get(class) else {
            return false;
        };
        let mut seen = HashSet::from([index_key(current.name())]);
        while let Some(parent) = current.parent() {
            let key = index_key(parent);
            if key == target {
                return true;
            }
            if !seen.insert(key) {
                return false;
            }
            match self.get(parent) {
                Some(next) => current = next,
                None => return false,
            }
        }
        false
    }
}

fn read_source(path: &Path) -> Result<(SourceFile, Vec<ClassDecl>)> {
    let source_error = |source| MetaError::Source {
        path: path.to_path_buf(),
        source,
    };
    let text = fs::read_to_string(path).map_err(source_error)?;
    let modified: DateTime<Utc> = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(source_error)?
        .into();
    let decls = scan_declarations(&text);
    Ok((
        SourceFile {
            path: path.to_path_buf(),
            text,
            modified,
        },
        decls,
    ))
}

/// @acp:summary "Find all files matching include/exclude patterns"
fn find_files(root: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    let include_patterns = config.include_patterns()?;
    let exclude_patterns = config.exclude_patterns()?;
    let match_opts = MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            // Match on the path relative to root
            let relative = e
                .path()
                .strip_prefix(root)
                .unwrap_or(e.path())
                .to_string_lossy()
                .replace('\\', "/");
            let included = include_patterns.is_empty()
                || include_patterns.iter().any(|p| p.matches_with(&relative, match_opts));
            let excluded = exclude_patterns.iter().any(|p| p.matches_with(&relative, match_opts));
            included && !excluded
        })
        .map(|e| e.into_path())
        .collect();

    files.sort();
    Ok(files)
}

pub(crate) fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| MetaError::Config(format!("invalid pattern `{}`: {}", p, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    const BASE: &str = r#"<?php
namespace App\Dummy;

/** Base */
class Base
{
    const BASE = 'base';
    const SHARED = 'from-base';
}
"#;

    const CHILD: &str = r#"<?php
namespace App\Dummy;

class Child extends Base
{
    const SHARED = 'from-child';
    const OWN = 'own';
}

class GrandChild extends Child {}
"#;

    fn index() -> ClassIndex {
        let mut index = ClassIndex::new();
        index.add_source("Base.php", BASE, Utc::now());
        index.add_source("Child.php", CHILD, Utc::now());
        index
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let index = index();
        assert_eq!(index.len(), 3);
        assert_eq!(
            index.class_name("\\app\\dummy\\child").unwrap(),
            "App\\Dummy\\Child"
        );
        assert!(matches!(
            index.class_name("App\\Dummy\\Missing"),
            Err(MetaError::ClassNotFound(_))
        ));
    }

    #[test]
    fn test_ancestors_are_root_first() {
        let index = index();
        assert_eq!(
            index.ancestors_of("App\\Dummy\\GrandChild").unwrap(),
            vec!["App\\Dummy\\Base", "App\\Dummy\\Child"]
        );
        assert!(index.ancestors_of("App\\Dummy\\Base").unwrap().is_empty());
    }

    #[test]
    fn test_constants_include_inherited() {
        let index = index();
        let constants = index.constants_of("App\\Dummy\\Child").unwrap();
        assert_eq!(
            constants,
            vec![
                ("SHARED".to_string(), json!("from-child")),
                ("OWN".to_string(), json!("own")),
                ("BASE".to_string(), json!("base")),
            ]
        );
    }

    #[test]
    fn test_unindexed_parent_stops_the_chain() {
        let mut index = ClassIndex::new();
        index.add_source("A.php", "<?php class A extends \\Vendor\\Missing {}", Utc::now());
        assert!(index.ancestors_of("A").unwrap().is_empty());
    }

    #[test]
    fn test_inheritance_cycle_terminates() {
        let mut index = ClassIndex::new();
        index.add_source("A.php", "<?php class A extends B {}\nclass B extends A {}", Utc::now());
        assert_eq!(index.ancestors_of("A").unwrap(), vec!["B"]);
    }

    #[test]
    fn test_subclass_through_unindexed_root() {
        let mut index = index();
        index.add_source(
            "MyMeta.php",
            "<?php\nnamespace App\\Annotation;\n\nuse ClassMeta\\Annotation\\Meta;\n\nclass MyMeta extends Meta {}\n",
            Utc::now(),
        );
        assert!(index.is_subclass_of("App\\Annotation\\MyMeta", "ClassMeta\\Annotation\\Meta"));
        assert!(index.is_subclass_of("App\\Dummy\\GrandChild", "\\app\\dummy\\base"));
        assert!(!index.is_subclass_of("App\\Dummy\\Base", "App\\Dummy\\Child"));
        assert!(!index.is_subclass_of("Unknown", "App\\Dummy\\Base"));
    }

    #[test]
    fn test_source_span_covers_declaration() {
        let index = index();
        let source = index.source_of("App\\Dummy\\GrandChild").unwrap();
        assert_eq!(source.declaration(), "class GrandChild extends Child {}");
    }

    #[test]
    fn test_scan_respects_patterns() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("vendor/lib")).unwrap();
        fs::write(dir.path().join("src/Base.php"), BASE).unwrap();
        fs::write(dir.path().join("src/notes.txt"), "class Nope {}").unwrap();
        fs::write(dir.path().join("vendor/lib/Child.php"), CHILD).unwrap();

        let index = ClassIndex::scan(dir.path(), &Config::default()).unwrap();
        let names: Vec<_> = index.classes().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["App\\Dummy\\Base"]);
        assert!(index.get("App\\Dummy\\Base").unwrap().path().ends_with("src/Base.php"));
    }

    #[test]
    fn test_invalid_pattern_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            include: vec!["[".to_string()],
            ..Config::default()
        };
        assert!(matches!(
            ClassIndex::scan(dir.path(), &config),
            Err(MetaError::Config(_))
        ));
    }
}
