//! @acp:module "Metadata Manager"
//! @acp:summary "Resolves class and constant metadata with group filtering and caching"
//! @acp:domain metadata
//! @acp:layer service
//!
//! Lookups, in dependency order:
//! - [`ClassMetaManager::class_meta`]: the annotation on the class itself
//! - [`ClassMetaManager::constants_meta_for_class`]: constants of one class
//! - [`ClassMetaManager::class_constants_meta`]: constants across the
//!   inheritance chain, most-derived definition winning
//! - [`ClassMetaManager::constant_meta_by_value`] and
//!   [`ClassMetaManager::map_constants_meta`] on top of the inherited view

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::{fingerprint, CacheStore, VoidCache, DEFAULT_TTL};
use crate::error::{MetaError, Result};
use crate::meta::{loose_eq, ConstantsMeta, Groups, Meta, MetaKind, Plain};
use crate::parse::{bind_constant_comments, tokenize, AnnotationParser, DocParser, Imports, RawAnnotation};
use crate::reflect::{ClassTarget, Reflector};

const CLASS_PREFIX: &str = "class_";
const CONSTANTS_PREFIX: &str = "constants_";

/// @acp:summary "Metadata lookup over a reflector, for one annotation kind"
///
/// Synchronous and lock-free; a shared cache store brings its own locking.
pub struct ClassMetaManager<R, K = Plain> {
    reflector: R,
    parser: Box<dyn AnnotationParser>,
    cache: Arc<dyn CacheStore>,
    cache_ttl: u64,
    _kind: PhantomData<fn() -> K>,
}

impl<R: Reflector> ClassMetaManager<R, Plain> {
    /// Manager for the base `Meta` annotation
    pub fn new(reflector: R) -> Self {
        Self::for_kind(reflector)
    }
}

impl<R: Reflector, K: MetaKind> ClassMetaManager<R, K> {
    /// Manager for annotation kind `K`, with the default parser and no cache
    pub fn for_kind(reflector: R) -> Self {
        Self {
            reflector,
            parser: Box::new(DocParser::default()),
            cache: Arc::new(VoidCache),
            cache_ttl: DEFAULT_TTL,
            _kind: PhantomData,
        }
    }

    pub fn with_cache(self, cache: impl CacheStore + 'static, ttl: u64) -> Self {
        self.with_shared_cache(Arc::new(cache), ttl)
    }

    pub fn with_shared_cache(mut self, cache: Arc<dyn CacheStore>, ttl: u64) -> Self {
        self.set_cache(cache, ttl);
        self
    }

    pub fn set_cache(&mut self, cache: Arc<dyn CacheStore>, ttl: u64) {
        self.cache = cache;
        self.cache_ttl = ttl;
    }

    pub fn with_parser(mut self, parser: impl AnnotationParser + 'static) -> Self {
        self.set_parser(Box::new(parser));
        self
    }

    pub fn set_parser(&mut self, parser: Box<dyn AnnotationParser>) {
        self.parser = parser;
    }

    pub fn reflector(&self) -> &R {
        &self.reflector
    }

    pub fn cache_ttl(&self) -> u64 {
        self.cache_ttl
    }

    /// @acp:summary "Metadata annotated on the class declaration"
    ///
    /// `None` when the class carries no annotation of this kind, or when its
    /// groups do not match. Only accepted results are cached.
    pub fn class_meta(
        &self,
        class: &(impl ClassTarget + ?Sized),
        groups: &Groups,
    ) -> Result<Option<Meta<K>>> {
        let name = self.reflector.class_name(class.class_name())?;
        let key = self.cache_key(CLASS_PREFIX, &name, groups)?;
        if let Some(cached) = self.cached::<Meta<K>>(&key)? {
            return Ok(Some(cached));
        }

        let Some(comment) = self.reflector.doc_comment_of(&name)? else {
            return Ok(None);
        };
        let imports = self.reflector.imports_of(&name)?;
        let Some(mut meta) = self.first_annotation(&comment, &imports, &name)? else {
            return Ok(None);
        };
        meta.property = Some(name.clone());
        meta.value = Value::Null;

        match groups.first_match(&meta.groups) {
            _ if groups.is_all() => {}
            Some(group) => debug!(class = %name, group, "class metadata matched group"),
            None => return Ok(None),
        }

        self.store(&key, &meta)?;
        Ok(Some(meta))
    }

    /// @acp:summary "Metadata on the constants declared by one class"
    ///
    /// Inherited constants are not included. The group-filtered result is
    /// cached even when empty.
    pub fn constants_meta_for_class(
        &self,
        class: &(impl ClassTarget + ?Sized),
        groups: &Groups,
    ) -> Result<ConstantsMeta<K>> {
        let name = self.reflector.class_name(class.class_name())?;
        let key = self.cache_key(CONSTANTS_PREFIX, &name, groups)?;
        if let Some(cached) = self.cached::<ConstantsMeta<K>>(&key)? {
            return Ok(cached);
        }

        let source = self.reflector.source_of(&name)?;
        let imports = self.reflector.imports_of(&name)?;
        let constants = self.reflector.constants_of(&name)?;

        // Bind only inside the declaration so other classes in the file are ignored
        let span = source.span.clone().unwrap_or(0..source.text.len());
        let tokens = tokenize(&source.text)
            .into_iter()
            .filter(|t| t.offset >= span.start && t.end() <= span.end);
        let bound = bind_constant_comments(tokens);
        debug!(class = %name, bound = bound.len(), "bound constant doc-comments");

        let mut resolved = ConstantsMeta::new();
        for constant in bound {
            let Some(comment) = constant.doc else {
                continue;
            };
            let context = format!("{}::{}", name, constant.name);
            let Some(mut meta) = self.first_annotation(comment, &imports, &context)? else {
                continue;
            };
            let value = constants
                .iter()
                .find(|(n, _)| n == constant.name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| MetaError::ConstantMismatch {
                    class: name.clone(),
                    constant: constant.name.to_string(),
                })?;
            meta.property = Some(constant.name.to_string());
            meta.value = value;
            resolved.insert(constant.name, meta);
        }

        let filtered: ConstantsMeta<K> = resolved
            .into_iter()
            .filter(|(_, meta)| groups.accepts(&meta.groups))
            .collect();

        self.store(&key, &filtered)?;
        Ok(filtered)
    }

    /// @acp:summary "Constant metadata across the inheritance chain"
    ///
    /// Ancestors are merged root-first, so a constant redeclared in a
    /// subclass takes the subclass's metadata.
    pub fn class_constants_meta(
        &self,
        class: &(impl ClassTarget + ?Sized),
        groups: &Groups,
    ) -> Result<ConstantsMeta<K>> {
        let name = self.reflector.class_name(class.class_name())?;
        let mut chain = self.reflector.ancestors_of(&name)?;
        chain.push(name);

        let mut merged = ConstantsMeta::new();
        for class in &chain {
            merged.extend_overriding(self.constants_meta_for_class(class.as_str(), groups)?);
        }
        Ok(merged)
    }

    /// @acp:summary "First constant metadata whose value loosely equals `value`"
    pub fn constant_meta_by_value(
        &self,
        class: &(impl ClassTarget + ?Sized),
        value: impl Into<Value>,
        groups: &Groups,
    ) -> Result<Option<Meta<K>>> {
        let value = value.into();
        Ok(self
            .class_constants_meta(class, groups)?
            .into_iter()
            .map(|(_, meta)| meta)
            .find(|meta| loose_eq(&meta.value, &value)))
    }

    /// @acp:summary "Map constant metadata into any collection"
    ///
    /// `mapper` receives each entry and its position. Collecting into a map
    /// keeps the last value for a repeated key.
    pub fn map_constants_meta<C, Key, V, F>(
        &self,
        class: &(impl ClassTarget + ?Sized),
        mut mapper: F,
        groups: &Groups,
    ) -> Result<C>
    where
        C: FromIterator<(Key, V)>,
        F: FnMut(&Meta<K>, usize) -> (Key, V),
    {
        Ok(self
            .class_constants_meta(class, groups)?
            .values()
            .enumerate()
            .map(|(i, meta)| mapper(meta, i))
            .collect())
    }

    fn first_annotation(
        &self,
        comment: &str,
        imports: &Imports,
        context: &str,
    ) -> Result<Option<Meta<K>>> {
        let annotations = self.parser.parse(comment, imports)?;
        let Some(RawAnnotation { name, params }) =
            annotations.into_iter().find(|a| self.accepts(&a.name))
        else {
            return Ok(None);
        };
        serde_json::from_value(Value::Object(params))
            .map(Some)
            .map_err(|e| MetaError::annotation(format!("@{} on {}", name, context), e.to_string()))
    }

    /// Annotations of kind `K`, or of an indexed annotation class extending it
    fn accepts(&self, name: &str) -> bool {
        K::accepts(name) || self.reflector.is_subclass_of(name, K::NAME)
    }

    fn cache_key(&self, prefix: &str, class: &str, groups: &Groups) -> Result<String> {
        let marker = self.reflector.last_modified(class)?;
        fingerprint(&format!("{}{}", prefix, K::NAME), class, &marker, groups)
    }

    fn cached<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        if !self.cache.contains(key)? {
            debug!(key, "cache miss");
            return Ok(None);
        }
        match self.cache.fetch(key)? {
            Some(value) => {
                debug!(key, "cache hit");
                Ok(Some(serde_json::from_value(value)?))
            }
            None => Ok(None),
        }
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.cache
            .store(key, serde_json::to_value(value)?, self.cache_ttl)
    }
}
