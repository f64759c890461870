//! @acp:module "Parser"
//! @acp:summary "Source tokenizing, constant binding and docblock annotation parsing"
//! @acp:domain metadata
//! @acp:layer parser
//!
//! The pipeline for one class:
//! 1. [`tokenize`] the source file through its tree-sitter syntax tree
//! 2. [`bind_constant_comments`] pairs each constant with its doc-comment
//! 3. an [`AnnotationParser`] turns each doc-comment into raw annotations
//!
//! [`scan_declarations`] is the structural pass the source index builds on.

pub mod binder;
pub mod const_eval;
pub mod docblock;
pub mod imports;
pub mod structure;
pub mod tokens;

pub use binder::{bind_constant_comments, BoundConstant};
pub use docblock::{AnnotationParser, DocParser, DocParserConfig, RawAnnotation};
pub use imports::{short_name, Imports};
pub use structure::{scan_declarations, ClassDecl, DeclKind};
pub use tokens::{tokenize, Token, TokenKind};
