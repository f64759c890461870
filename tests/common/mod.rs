//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use classmeta::reflect::ClassSource;
use classmeta::{ClassIndex, Config, Imports, MetaKind, Reflector, Result};

pub const INVOICE: &str = "App\\Dummy\\DummyInvoice";
pub const INVOICE_EXTENDED: &str = "App\\Dummy\\DummyInvoiceExtended";
pub const PLAIN_CLASS: &str = "App\\Dummy\\DummyClass";
pub const CUSTOM: &str = "App\\Dummy\\DummyStatusWithCustomAnnot";
pub const CUSTOM_EXTENDED: &str = "App\\Dummy\\DummyStatusWithCustomAnnotExtended";
pub const SCOPED: &str = "App\\Dummy\\DummyClassScopedConstants";

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn fixture_index() -> ClassIndex {
    ClassIndex::scan(fixtures_dir(), &Config::default()).unwrap()
}

/// Custom annotation kind with one extra field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MyMeta {
    #[serde(default)]
    pub foo: String,
}

impl MetaKind for MyMeta {
    const NAME: &'static str = "App\\Annotation\\MyMeta";
}

/// Reflector counting how often class sources and doc-comments are read
pub struct SpyReflector {
    inner: ClassIndex,
    source_reads: AtomicUsize,
    doc_reads: AtomicUsize,
}

impl SpyReflector {
    pub fn new(inner: ClassIndex) -> Self {
        Self {
            inner,
            source_reads: AtomicUsize::new(0),
            doc_reads: AtomicUsize::new(0),
        }
    }

    pub fn source_reads(&self) -> usize {
        self.source_reads.load(Ordering::SeqCst)
    }

    pub fn doc_reads(&self) -> usize {
        self.doc_reads.load(Ordering::SeqCst)
    }
}

impl Reflector for SpyReflector {
    fn class_name(&self, class: &str) -> Result<String> {
        self.inner.class_name(class)
    }

    fn doc_comment_of(&self, class: &str) -> Result<Option<String>> {
        self.doc_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.doc_comment_of(class)
    }

    fn constants_of(&self, class: &str) -> Result<Vec<(String, Value)>> {
        self.inner.constants_of(class)
    }

    fn ancestors_of(&self, class: &str) -> Result<Vec<String>> {
        self.inner.ancestors_of(class)
    }

    fn source_of(&self, class: &str) -> Result<ClassSource> {
        self.source_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.source_of(class)
    }

    fn imports_of(&self, class: &str) -> Result<Imports> {
        self.inner.imports_of(class)
    }

    fn last_modified(&self, class: &str) -> Result<DateTime<Utc>> {
        self.inner.last_modified(class)
    }

    fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        self.inner.is_subclass_of(class, ancestor)
    }
}
