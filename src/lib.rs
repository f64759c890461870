#![forbid(unsafe_code)]

//! @acp:module "classmeta Library"
//! @acp:summary "Class and class-constant metadata from docblock annotations"
//! @acp:domain metadata
//! @acp:layer api
//! @acp:stability stable
//!
//! # classmeta
//!
//! Looks up structured metadata attached to classes and class constants
//! through `@Meta(...)` doc-comment annotations.
//!
//! ## Features
//!
//! - **Groups**: every annotation belongs to `Default` unless it says
//!   otherwise; `_all` selects everything
//! - **Inheritance**: constant metadata merges across the parent chain,
//!   subclasses overriding their ancestors
//! - **Caching**: keys include the source modification time, so edits
//!   invalidate stale entries
//! - **Custom kinds**: read your own annotation types with extra fields
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use classmeta::{ClassIndex, ClassMetaManager, Groups};
//!
//! let source = r#"<?php
//! namespace App;
//!
//! use ClassMeta\Annotation\Meta;
//!
//! class Invoice
//! {
//!     /** @Meta(data={"name"="Draft"}) */
//!     const DRAFT = 'draft';
//! }
//! "#;
//!
//! let mut index = ClassIndex::new();
//! index.add_source("Invoice.php", source, Utc::now());
//!
//! let manager = ClassMetaManager::new(index);
//! let metas = manager.class_constants_meta("App\\Invoice", &Groups::default())?;
//! assert_eq!(metas["DRAFT"].data_str("name"), Some("Draft"));
//! # Ok::<(), classmeta::MetaError>(())
//! ```

pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod index;
pub mod manager;
pub mod meta;
pub mod parse;
pub mod reflect;

// Re-exports
pub use cache::{CacheStore, FilesystemCache, MemoryCache, VoidCache, DEFAULT_TTL};
pub use config::Config;
pub use error::{MetaError, Result};
pub use index::{ClassIndex, IndexedClass};
pub use manager::ClassMetaManager;
pub use meta::{ConstantsMeta, Groups, Meta, MetaKind, Plain, ALL_GROUPS, DEFAULT_GROUP};
pub use parse::{AnnotationParser, DocParser, DocParserConfig, Imports, RawAnnotation};
pub use reflect::{ClassSource, ClassTarget, Reflector};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
