//! @acp:module "Index"
//! @acp:summary "Source-scanning class index"
//! @acp:domain metadata
//! @acp:layer service

mod indexer;

pub use indexer::{ClassIndex, IndexedClass};

pub(crate) use indexer::compile_patterns;
