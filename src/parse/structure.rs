//! @acp:module "Declaration Scanner"
//! @acp:summary "Extracts class declarations, imports and constants from the syntax tree"
//! @acp:domain metadata
//! @acp:layer parser
//!
//! A shallow structural pass over the tree-sitter tree: namespaces, `use`
//! imports, class-like declarations with their parent and doc-comment, and
//! constant declarations directly inside a class body.

use std::ops::Range;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tree_sitter::Node;

use super::const_eval::{evaluate, operands, ConstScope};
use super::imports::Imports;
use super::tokens::{is_doc_comment, parse_tree};

/// Kind of class-like declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Class,
    Interface,
    Trait,
    Enum,
}

impl DeclKind {
    fn from_node(kind: &str) -> Option<Self> {
        match kind {
            "class_declaration" => Some(DeclKind::Class),
            "interface_declaration" => Some(DeclKind::Interface),
            "trait_declaration" => Some(DeclKind::Trait),
            "enum_declaration" => Some(DeclKind::Enum),
            _ => None,
        }
    }
}

/// @acp:summary "A class-like declaration found in a source file"
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    /// Fully-qualified name
    pub name: String,
    pub kind: DeclKind,
    /// Fully-qualified parent class, for classes that extend one
    pub parent: Option<String>,
    pub doc_comment: Option<String>,
    /// Constants declared directly in the body, in declaration order
    pub constants: Vec<(String, Value)>,
    /// Namespace and imports in effect at the declaration
    pub imports: Imports,
    /// Byte range from the doc-comment (or first modifier) to the closing brace
    pub span: Range<usize>,
}

/// @acp:summary "Scan a source text for class-like declarations"
pub fn scan_declarations(source: &str) -> Vec<ClassDecl> {
    let Some(tree) = parse_tree(source) else {
        return Vec::new();
    };
    let mut scanner = Scanner {
        source,
        imports: Imports::default(),
        decls: Vec::new(),
    };
    scanner.visit_children(tree.root_node());
    scanner.decls
}

struct Scanner<'a> {
    source: &'a str,
    imports: Imports,
    decls: Vec<ClassDecl>,
}

impl<'a> Scanner<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }

    fn visit_children(&mut self, node: Node<'_>) {
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i) {
                self.visit(child);
            }
        }
    }

    fn visit(&mut self, node: Node<'_>) {
        match node.kind() {
            "namespace_definition" => self.namespace(node),
            "namespace_use_declaration" => self.use_declaration(node),
            kind => match DeclKind::from_node(kind) {
                Some(decl_kind) => self.declaration(node, decl_kind),
                None => self.visit_children(node),
            },
        }
    }

    fn namespace(&mut self, node: Node<'_>) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_default();
        let imports = Imports::new(name.trim_start_matches('\\'));
        match node.child_by_field_name("body") {
            // A braced namespace scopes its imports to the block
            Some(body) => {
                let outer = std::mem::replace(&mut self.imports, imports);
                self.visit_children(body);
                self.imports = outer;
            }
            None => self.imports = imports,
        }
    }

    fn use_declaration(&mut self, node: Node<'_>) {
        let mut prefix: Option<&'a str> = None;
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else {
                continue;
            };
            match child.kind() {
                // `use function` and `use const` import no classes
                "function" | "const" => return,
                "namespace_use_clause" => self.use_clause(child, None),
                "name" | "qualified_name" | "namespace_name" => prefix = Some(self.text(child)),
                "namespace_use_group" => {
                    for j in 0..child.named_child_count() {
                        if let Some(clause) = child.named_child(j) {
                            self.use_clause(clause, prefix);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// `Name`, `Name as Alias`, optionally below a group prefix
    fn use_clause(&mut self, clause: Node<'_>, prefix: Option<&str>) {
        let mut names: Vec<&str> = Vec::new();
        let mut aliased = false;
        for i in 0..clause.child_count() {
            let Some(child) = clause.child(i) else {
                continue;
            };
            match child.kind() {
                "name" | "qualified_name" | "namespace_name" => names.push(self.text(child)),
                "as" => aliased = true,
                "function" | "const" => return,
                _ => {}
            }
        }
        let Some(target) = names.first() else {
            return;
        };
        let alias = names.get(1).copied().filter(|_| aliased);
        match prefix {
            Some(prefix) => {
                let full = format!("{}\\{}", prefix.trim_end_matches('\\'), target);
                self.imports.add(&full, alias);
            }
            None => self.imports.add(target, alias),
        }
    }

    /// Closest preceding doc-comment, looking past plain comments only
    fn doc_comment_before<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let mut sibling = node.prev_sibling();
        while let Some(prev) = sibling {
            if prev.kind() != "comment" {
                return None;
            }
            if is_doc_comment(self.text(prev)) {
                return Some(prev);
            }
            sibling = prev.prev_sibling();
        }
        None
    }

    fn parent_of(&self, node: Node<'_>) -> Option<String> {
        let base = (0..node.named_child_count())
            .filter_map(|i| node.named_child(i))
            .find(|c| c.kind() == "base_clause")?;
        let parent = (0..base.named_child_count())
            .filter_map(|i| base.named_child(i))
            .find(|c| matches!(c.kind(), "name" | "qualified_name"))?;
        Some(self.imports.resolve_class(self.text(parent)))
    }

    fn declaration(&mut self, node: Node<'_>, kind: DeclKind) {
        let Some(short) = node.child_by_field_name("name").map(|n| self.text(n)) else {
            return;
        };
        let name = self.imports.resolve_class(short);
        let parent = match kind {
            DeclKind::Class => self.parent_of(node),
            _ => None,
        };
        let doc = self.doc_comment_before(node);
        let start = doc.map_or(node.start_byte(), |d| d.start_byte());

        let mut constants: Vec<(String, Value)> = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for i in 0..body.named_child_count() {
                match body.named_child(i) {
                    Some(member) if member.kind() == "const_declaration" => {
                        self.constants(member, short, &mut constants)
                    }
                    _ => {}
                }
            }
        }

        debug!(class = %name, constants = constants.len(), "scanned declaration");
        let decl = ClassDecl {
            name,
            kind,
            parent,
            doc_comment: doc.map(|d| self.text(d).to_string()),
            constants,
            imports: self.imports.clone(),
            span: start..node.end_byte(),
        };
        self.decls.push(decl);
    }

    /// Each `NAME = expr` element of one `const` declaration
    fn constants(&self, declaration: Node<'_>, class: &str, constants: &mut Vec<(String, Value)>) {
        for i in 0..declaration.named_child_count() {
            let Some(element) = declaration.named_child(i) else {
                continue;
            };
            if element.kind() != "const_element" {
                continue;
            }
            let parts = operands(element);
            let [name, .., initializer] = parts.as_slice() else {
                continue;
            };
            let name = self.text(*name);
            let scope = ConstScope {
                class,
                known: constants.as_slice(),
            };
            let value = evaluate(*initializer, self.source, &scope).unwrap_or_else(|| {
                debug!(class, constant = name, "initializer is not a literal; using null");
                Value::Null
            });
            constants.push((name.to_string(), value));
        }
    }
}
