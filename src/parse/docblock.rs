//! @acp:module "Docblock Annotation Parser"
//! @acp:summary "Parses @Name(key=value, ...) annotations out of doc-comments"
//! @acp:domain metadata
//! @acp:layer parser
//!
//! Supports the subset of the docblock annotation syntax used for metadata:
//!
//! - `@Name` and `@Name(...)` with names resolved through the file's imports
//! - named parameters `key=value` and a single positional parameter (stored
//!   under `value`)
//! - strings (`"..."`, with `""` as an escaped quote), integers, floats,
//!   `true`/`false`/`null`
//! - arrays `{...}` holding values, `"key"=value` or `"key": value` entries
//!
//! Names that cannot be resolved through an import are skipped when
//! `ignore_not_imported` is set, so tags such as `@var` or `@author` never
//! reach the value parser.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::trace;

use super::imports::Imports;
use crate::error::{MetaError, Result};

/// Start of an annotation: `@` at line start or after whitespace
static ANNOTATION_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|\s)@(\\?[A-Za-z_][A-Za-z0-9_\\]*)").unwrap());

/// @acp:summary "An annotation as written, before it becomes a typed instance"
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnnotation {
    /// Fully-qualified annotation name
    pub name: String,
    /// Parameters keyed by name; a positional parameter is keyed `value`
    pub params: Map<String, Value>,
}

/// Turns a doc-comment into zero or more raw annotations
pub trait AnnotationParser: Send + Sync {
    fn parse(&self, comment: &str, imports: &Imports) -> Result<Vec<RawAnnotation>>;
}

/// @acp:summary "Parser configuration, scoped to one parser instance"
#[derive(Debug, Clone)]
pub struct DocParserConfig {
    /// Skip annotations whose names do not resolve through an import
    pub ignore_not_imported: bool,
    /// Aliases available in every file, consulted after the file's own imports
    pub imports: Imports,
}

impl Default for DocParserConfig {
    fn default() -> Self {
        Self {
            ignore_not_imported: true,
            imports: Imports::default(),
        }
    }
}

/// @acp:summary "Default docblock annotation parser"
#[derive(Debug, Clone, Default)]
pub struct DocParser {
    config: DocParserConfig,
}

impl DocParser {
    pub fn new(config: DocParserConfig) -> Self {
        Self { config }
    }

    fn resolve(&self, name: &str, imports: &Imports) -> Option<String> {
        imports
            .resolve_imported(name)
            .or_else(|| self.config.imports.resolve_imported(name))
            .or_else(|| {
                (!self.config.ignore_not_imported).then(|| name.trim_start_matches('\\').to_string())
            })
    }
}

impl AnnotationParser for DocParser {
    fn parse(&self, comment: &str, imports: &Imports) -> Result<Vec<RawAnnotation>> {
        let text = strip_comment(comment);
        let mut annotations = Vec::new();
        let mut pos = 0;

        while let Some(cap) = ANNOTATION_START.captures_at(&text, pos) {
            let written = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            pos = cap.get(0).map(|m| m.end()).unwrap_or(text.len());

            let Some(name) = self.resolve(written, imports) else {
                trace!(annotation = written, "skipping annotation that is not imported");
                continue;
            };

            let mut params = Map::new();
            if text[pos..].starts_with('(') {
                let mut parser = ValueParser::new(&text, pos);
                params = parser
                    .params()
                    .map_err(|message| MetaError::annotation(format!("@{}", written), message))?;
                pos = parser.pos;
            }

            annotations.push(RawAnnotation { name, params });
        }

        Ok(annotations)
    }
}

/// Remove the comment delimiters and the leading `*` of each line
fn strip_comment(comment: &str) -> String {
    let body = comment.trim();
    let body = body.strip_prefix("/**").unwrap_or(body);
    let body = body.strip_suffix("*/").unwrap_or(body);

    body.lines()
        .map(|line| {
            let line = line.trim_start();
            line.strip_prefix('*').unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct ValueParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> ValueParser<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        let rest = &self.src[self.pos..];
        if !rest.starts_with(|c: char| c == '_' || c.is_ascii_alphabetic()) {
            return None;
        }
        let len = rest
            .find(|c: char| c != '_' && !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        self.pos += len;
        Some(&rest[..len])
    }

    fn params(&mut self) -> std::result::Result<Map<String, Value>, String> {
        let mut params = Map::new();
        self.eat('(');
        self.skip_ws();
        if self.eat(')') {
            return Ok(params);
        }

        loop {
            self.skip_ws();
            let save = self.pos;
            let named = match self.ident() {
                Some(name) => {
                    self.skip_ws();
                    if self.eat('=') {
                        Some(name.to_string())
                    } else {
                        self.pos = save;
                        None
                    }
                }
                None => None,
            };

            let value = self.value()?;
            match named {
                Some(name) => {
                    params.insert(name, value);
                }
                None if params.contains_key("value") => {
                    return Err("only one positional parameter is allowed".to_string());
                }
                None => {
                    params.insert("value".to_string(), value);
                }
            }

            self.skip_ws();
            if self.eat(',') {
                self.skip_ws();
                if self.eat(')') {
                    return Ok(params);
                }
                continue;
            }
            if self.eat(')') {
                return Ok(params);
            }
            return Err(self.unexpected("',' or ')'"));
        }
    }

    fn value(&mut self) -> std::result::Result<Value, String> {
        self.skip_ws();
        match self.peek() {
            Some('"') => self.string().map(Value::String),
            Some('{') => self.array(),
            Some(c) if c == '-' || c == '+' || c.is_ascii_digit() => self.number(),
            Some('@') => Err("nested annotations are not supported".to_string()),
            Some(c) if c == '_' || c.is_ascii_alphabetic() || c == '\\' => {
                let start = self.pos;
                self.pos += self.src[start..]
                    .find(|c: char| c != '_' && c != '\\' && c != ':' && !c.is_ascii_alphanumeric())
                    .unwrap_or(self.src.len() - start);
                let word = &self.src[start..self.pos];
                match word.to_ascii_lowercase().as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    _ => Err(format!("unsupported constant reference `{}`", word)),
                }
            }
            Some(_) => Err(self.unexpected("a value")),
            None => Err("unexpected end of annotation".to_string()),
        }
    }

    fn string(&mut self) -> std::result::Result<String, String> {
        self.eat('"');
        let mut out = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.pos += 1;
                    if self.eat('"') {
                        out.push('"');
                    } else {
                        return Ok(out);
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.pos += c.len_utf8();
                }
                None => return Err("unterminated string".to_string()),
            }
        }
    }

    fn number(&mut self) -> std::result::Result<Value, String> {
        let start = self.pos;
        let rest = &self.src[start..];
        let len = rest
            .char_indices()
            .find(|&(i, c)| {
                !(c.is_ascii_digit()
                    || c == '.'
                    || c == 'e'
                    || c == 'E'
                    || ((c == '-' || c == '+') && (i == 0 || rest[..i].ends_with(['e', 'E']))))
            })
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        let text = &rest[..len];

        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::from(int));
        }
        text.parse::<f64>()
            .map(Value::from)
            .map_err(|_| format!("invalid number `{}`", text))
    }

    fn array(&mut self) -> std::result::Result<Value, String> {
        self.eat('{');
        let mut entries: Vec<(Option<String>, Value)> = Vec::new();

        loop {
            self.skip_ws();
            if self.eat('}') {
                break;
            }

            let key = self.array_key()?;
            let value = self.value()?;
            entries.push((key, value));

            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                break;
            }
            return Err(self.unexpected("',' or '}'"));
        }

        if entries.iter().all(|(key, _)| key.is_none()) {
            return Ok(Value::Array(entries.into_iter().map(|(_, v)| v).collect()));
        }

        let mut map = Map::new();
        let mut next_index: i64 = 0;
        for (key, value) in entries {
            let key = match key {
                Some(key) => {
                    if let Ok(index) = key.parse::<i64>() {
                        next_index = next_index.max(index + 1);
                    }
                    key
                }
                None => {
                    next_index += 1;
                    (next_index - 1).to_string()
                }
            };
            map.insert(key, value);
        }
        Ok(Value::Object(map))
    }

    /// Consume `key =` / `key :` when present, otherwise leave the cursor alone
    fn array_key(&mut self) -> std::result::Result<Option<String>, String> {
        let save = self.pos;
        let key = match self.peek() {
            Some('"') => Some(self.string()?),
            Some(c) if c.is_ascii_digit() => {
                let rest = &self.src[self.pos..];
                let len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
                self.pos += len;
                Some(rest[..len].to_string())
            }
            _ => self.ident().map(str::to_string),
        };

        if key.is_some() {
            self.skip_ws();
            if self.eat('=') || self.eat(':') {
                return Ok(key);
            }
        }
        self.pos = save;
        Ok(None)
    }

    fn unexpected(&self, expected: &str) -> String {
        match self.peek() {
            Some(c) => format!("expected {} but found '{}' at offset {}", expected, c, self.pos),
            None => format!("expected {} but reached end of annotation", expected),
        }
    }
}
