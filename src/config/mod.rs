//! @acp:module "Configuration"
//! @acp:summary "Project configuration loading and defaults"
//! @acp:domain metadata
//! @acp:layer config

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheStore, FilesystemCache, MemoryCache, VoidCache, DEFAULT_TTL};
use crate::index::compile_patterns;
use crate::parse::{DocParser, DocParserConfig, Imports};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = ".classmeta.json";

/// @acp:summary "Main classmeta configuration structure"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Source root to index
    #[serde(default = "default_root", skip_serializing_if = "is_default_root")]
    pub root: PathBuf,

    /// File patterns to include (glob syntax, relative to root)
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// File patterns to exclude (glob syntax, relative to root)
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Annotation aliases available in every file: alias -> fully-qualified name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub imports: BTreeMap<String, String>,

    /// Skip annotations whose names are not imported
    #[serde(default = "default_true")]
    pub ignore_not_imported: bool,
}

fn is_default_root(p: &Path) -> bool {
    p == Path::new(".")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            include: default_include(),
            exclude: default_exclude(),
            cache: CacheConfig::default(),
            imports: BTreeMap::new(),
            ignore_not_imported: true,
        }
    }
}

impl Config {
    /// @acp:summary "Load config from a .classmeta.json file"
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// @acp:summary "Save config to a file"
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @acp:summary "Load from default location or create default config"
    pub fn load_or_default() -> Self {
        Self::load(CONFIG_FILE).unwrap_or_default()
    }

    pub fn include_patterns(&self) -> crate::Result<Vec<Pattern>> {
        compile_patterns(&self.include)
    }

    pub fn exclude_patterns(&self) -> crate::Result<Vec<Pattern>> {
        compile_patterns(&self.exclude)
    }

    /// Parser settings derived from `imports` and `ignore_not_imported`
    pub fn parser_config(&self) -> DocParserConfig {
        let mut imports = Imports::default();
        for (alias, name) in &self.imports {
            imports.add(name, Some(alias));
        }
        DocParserConfig {
            ignore_not_imported: self.ignore_not_imported,
            imports,
        }
    }

    pub fn parser(&self) -> DocParser {
        DocParser::new(self.parser_config())
    }

    /// @acp:summary "Build the configured cache backend"
    /// A relative cache directory is resolved against `root`.
    pub fn cache_store(&self) -> Arc<dyn CacheStore> {
        match self.cache.backend {
            CacheBackend::None => Arc::new(VoidCache),
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
            CacheBackend::Filesystem => Arc::new(FilesystemCache::new(self.root.join(&self.cache.dir))),
        }
    }
}

/// @acp:summary "Cache backend selection"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    None,
    Memory,
    Filesystem,
}

/// @acp:summary "Cache configuration"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Directory for the filesystem backend
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// Entry lifetime in seconds; 0 keeps entries forever
    #[serde(default = "default_ttl")]
    pub ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            dir: default_cache_dir(),
            ttl: default_ttl(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_include() -> Vec<String> {
    vec!["**/*.php".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/vendor/**".to_string(),
        "**/node_modules/**".to_string(),
        "**/.git/**".to_string(),
        "**/.classmeta/**".to_string(),
    ]
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".classmeta/cache")
}

fn default_ttl() -> u64 {
    DEFAULT_TTL
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.cache.ttl, 300);
        assert_eq!(config.cache.backend, CacheBackend::None);
        assert!(config.ignore_not_imported);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = Config::default();
        config.cache.backend = CacheBackend::Filesystem;
        config.cache.ttl = 60;
        config
            .imports
            .insert("Meta".to_string(), "ClassMeta\\Annotation\\Meta".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"filesystem\""));
        assert!(!raw.contains("\"root\""));
    }

    #[test]
    fn test_parser_config_carries_global_imports() {
        let mut config = Config::default();
        config
            .imports
            .insert("Meta".to_string(), "ClassMeta\\Annotation\\Meta".to_string());
        let parser_config = config.parser_config();
        assert_eq!(
            parser_config.imports.resolve_imported("Meta").as_deref(),
            Some("ClassMeta\\Annotation\\Meta")
        );
    }
}
