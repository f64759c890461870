//! @acp:module "Tokenizer"
//! @acp:summary "Token stream for PHP-style class sources, backed by tree-sitter"
//! @acp:domain metadata
//! @acp:layer parser
//!
//! Flattens the tree-sitter concrete syntax tree into `(kind, lexeme)`
//! tokens. The stream is lossless: bytes the tree does not cover become
//! whitespace tokens, so concatenating every lexeme reproduces the input.
//! Malformed input never fails; it yields a less structured stream.

use serde::Serialize;
use tracing::warn;
use tree_sitter::{Node, Parser, Tree};

/// Token categories of the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Text outside of `<?php ... ?>`
    InlineHtml,
    OpenTag,
    CloseTag,
    Whitespace,
    /// `//`, `#` and `/* */` comments
    Comment,
    /// `/** */` documentation comments
    DocComment,
    /// The `const` keyword
    Const,
    /// `public`, `protected`, `private`
    Visibility,
    /// Any other reserved word (`class`, `extends`, `namespace`, `use`, ...)
    Keyword,
    /// A bare name: constant, class, function or `true`/`false`/`null`
    Identifier,
    /// A name containing namespace separators (`Foo\Bar`, `\Baz`)
    QualifiedName,
    /// `$name`
    Variable,
    String,
    Number,
    /// Operators and delimiters
    Punct,
}

/// A token borrowing its text from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    /// Byte offset of the lexeme in the source
    pub offset: usize,
}

impl<'a> Token<'a> {
    /// Whitespace and comments carry no syntax
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment
        )
    }

    /// Case-insensitive keyword/name comparison
    pub fn is_word(&self, word: &str) -> bool {
        matches!(
            self.kind,
            TokenKind::Keyword
                | TokenKind::Identifier
                | TokenKind::Const
                | TokenKind::Visibility
        ) && self.lexeme.eq_ignore_ascii_case(word)
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct && self.lexeme.starts_with(c)
    }

    pub fn end(&self) -> usize {
        self.offset + self.lexeme.len()
    }
}

/// @acp:summary "Parse PHP source into a tree-sitter syntax tree"
pub(crate) fn parse_tree(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&tree_sitter_php::LANGUAGE_PHP.into()) {
        warn!(error = %e, "failed to load the PHP grammar");
        return None;
    }
    parser.parse(source, None)
}

/// `/**` followed by whitespace; `/**/` is a plain comment
pub(crate) fn is_doc_comment(text: &str) -> bool {
    text.strip_prefix("/**")
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

fn is_word_like(text: &str) -> bool {
    text.starts_with(|c: char| c == '_' || c.is_ascii_alphabetic())
        && text.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Nodes emitted as a single token without looking at their children
fn atomic_kind(node: Node<'_>, text: &str) -> Option<TokenKind> {
    let kind = match node.kind() {
        "comment" if is_doc_comment(text) => TokenKind::DocComment,
        "comment" => TokenKind::Comment,
        "php_tag" => TokenKind::OpenTag,
        "text" => TokenKind::InlineHtml,
        "string" | "encapsed_string" | "heredoc" | "nowdoc" | "shell_command_expression" => {
            TokenKind::String
        }
        "integer" | "float" => TokenKind::Number,
        "variable_name" => TokenKind::Variable,
        "name" => TokenKind::Identifier,
        "qualified_name" | "namespace_name" if text.contains('\\') => TokenKind::QualifiedName,
        "qualified_name" | "namespace_name" => TokenKind::Identifier,
        _ => return None,
    };
    Some(kind)
}

fn leaf_kind(node: Node<'_>, text: &str) -> TokenKind {
    if text == "?>" {
        return TokenKind::CloseTag;
    }
    if !is_word_like(text) {
        return TokenKind::Punct;
    }
    let in_type = node.kind() == "primitive_type"
        || node.parent().is_some_and(|p| p.kind() == "primitive_type");
    match text.to_ascii_lowercase().as_str() {
        "const" => TokenKind::Const,
        "public" | "protected" | "private" => TokenKind::Visibility,
        "true" | "false" | "null" => TokenKind::Identifier,
        _ if in_type => TokenKind::Identifier,
        _ => TokenKind::Keyword,
    }
}

struct Collector<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    cursor: usize,
}

impl<'a> Collector<'a> {
    fn push(&mut self, start: usize, end: usize, kind: TokenKind) {
        // Missing nodes are zero-width
        if end <= start || start < self.cursor {
            return;
        }
        self.fill_to(start);
        if let Some(lexeme) = self.source.get(start..end) {
            self.tokens.push(Token {
                kind,
                lexeme,
                offset: start,
            });
            self.cursor = end;
        }
    }

    /// Bytes between tokens: whitespace, or text skipped by error recovery
    fn fill_to(&mut self, end: usize) {
        if end <= self.cursor {
            return;
        }
        if let Some(gap) = self.source.get(self.cursor..end) {
            let kind = if gap.trim().is_empty() {
                TokenKind::Whitespace
            } else {
                TokenKind::Punct
            };
            self.tokens.push(Token {
                kind,
                lexeme: gap,
                offset: self.cursor,
            });
            self.cursor = end;
        }
    }

    fn visit(&mut self, node: Node<'_>) {
        let range = node.byte_range();
        let text = self.source.get(range.clone()).unwrap_or_default();
        if let Some(kind) = atomic_kind(node, text) {
            self.push(range.start, range.end, kind);
            return;
        }
        if node.child_count() == 0 {
            self.push(range.start, range.end, leaf_kind(node, text));
            return;
        }
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                self.visit(child);
            }
        }
    }

    fn finish(mut self) -> Vec<Token<'a>> {
        self.fill_to(self.source.len());
        name_declared_constants(&mut self.tokens);
        self.tokens
    }
}

/// Reserved words are legal constant names after `const` and `::`
fn name_declared_constants(tokens: &mut [Token<'_>]) {
    let mut previous: Option<Token<'_>> = None;
    for token in tokens.iter_mut() {
        if token.is_trivia() {
            continue;
        }
        let names_constant = previous
            .is_some_and(|p| p.kind == TokenKind::Const || (p.kind == TokenKind::Punct && p.lexeme == "::"));
        if names_constant && matches!(token.kind, TokenKind::Keyword | TokenKind::Visibility) {
            token.kind = TokenKind::Identifier;
        }
        previous = Some(*token);
    }
}

/// @acp:summary "Tokenize a complete source text"
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut collector = Collector {
        source,
        tokens: Vec::new(),
        cursor: 0,
    };
    match parse_tree(source) {
        Some(tree) => collector.visit(tree.root_node()),
        None => collector.push(0, source.len(), TokenKind::InlineHtml),
    }
    collector.finish()
}
