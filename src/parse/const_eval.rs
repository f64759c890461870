//! @acp:module "Constant Evaluation"
//! @acp:summary "Evaluates constant initializer expressions to JSON values"
//! @acp:domain metadata
//! @acp:layer parser
//!
//! Only compile-time literal expressions are evaluated: scalars, arrays,
//! references to constants of the same class and string concatenation.
//! Anything else yields `None` and the caller decides the fallback.

use serde_json::{Map, Value};
use tree_sitter::Node;

/// Evaluation scope: the declaring class and the constants seen so far
pub struct ConstScope<'s> {
    /// Short name of the declaring class
    pub class: &'s str,
    pub known: &'s [(String, Value)],
}

impl<'s> ConstScope<'s> {
    fn lookup(&self, class: &str, name: &str) -> Option<Value> {
        let own = class.eq_ignore_ascii_case("self")
            || class.eq_ignore_ascii_case("static")
            || class.trim_start_matches('\\').eq_ignore_ascii_case(self.class)
            || class.rsplit('\\').next().is_some_and(|c| c.eq_ignore_ascii_case(self.class));
        if !own {
            return None;
        }
        self.known
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }
}

/// Named children of a node, comments excluded
pub(crate) fn operands<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    (0..node.named_child_count())
        .filter_map(|i| node.named_child(i))
        .filter(|c| c.kind() != "comment")
        .collect()
}

/// Text of the first anonymous child, e.g. an operator
fn operator<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    if let Some(op) = node.child_by_field_name("operator") {
        return source.get(op.byte_range());
    }
    (0..node.child_count())
        .filter_map(|i| node.child(i))
        .find(|c| !c.is_named())
        .and_then(|c| source.get(c.byte_range()))
}

fn has_child(node: Node<'_>, kind: &str) -> bool {
    (0..node.child_count())
        .filter_map(|i| node.child(i))
        .any(|c| c.kind() == kind)
}

/// Strings with `$var` or `{$expr}` parts are not constant
fn is_interpolated(node: Node<'_>) -> bool {
    (0..node.named_child_count())
        .filter_map(|i| node.named_child(i))
        .any(|c| {
            c.kind() == "variable_name" || c.kind().ends_with("_expression") || is_interpolated(c)
        })
}

/// @acp:summary "Evaluate a constant initializer expression"
pub fn evaluate(node: Node<'_>, source: &str, scope: &ConstScope<'_>) -> Option<Value> {
    let text = source.get(node.byte_range())?;
    match node.kind() {
        "string" | "encapsed_string" if !is_interpolated(node) => Some(Value::String(unquote(text))),
        "heredoc" | "nowdoc" if !is_interpolated(node) => Some(Value::String(heredoc_body(text))),
        "integer" | "float" => parse_number(text),
        "boolean" | "null" | "name" => match text.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            "null" => Some(Value::Null),
            _ => None,
        },
        "parenthesized_expression" => match operands(node).as_slice() {
            [inner] => evaluate(*inner, source, scope),
            _ => None,
        },
        "unary_op_expression" => {
            let [operand] = operands(node)[..] else {
                return None;
            };
            let value = evaluate(operand, source, scope)?;
            match operator(node, source)? {
                "+" if value.is_number() => Some(value),
                "-" => match value.as_i64() {
                    Some(int) => int.checked_neg().map(Value::from),
                    None => value.as_f64().map(|f| Value::from(-f)),
                },
                _ => None,
            }
        }
        "binary_expression" => {
            let [left, right] = operands(node)[..] else {
                return None;
            };
            if operator(node, source)? != "." {
                return None;
            }
            let left = evaluate(left, source, scope)?;
            let right = evaluate(right, source, scope)?;
            Some(Value::String(stringify(&left) + &stringify(&right)))
        }
        "class_constant_access_expression" => {
            let [class, name] = operands(node)[..] else {
                return None;
            };
            scope.lookup(source.get(class.byte_range())?, source.get(name.byte_range())?)
        }
        "array_creation_expression" => evaluate_array(node, source, scope),
        _ => None,
    }
}

fn evaluate_array(node: Node<'_>, source: &str, scope: &ConstScope<'_>) -> Option<Value> {
    let mut entries: Vec<(Option<Value>, Value)> = Vec::new();
    for element in operands(node) {
        if element.kind() != "array_element_initializer" || has_child(element, "...") {
            return None;
        }
        let parts = operands(element);
        if has_child(element, "=>") {
            let [key, value] = parts[..] else {
                return None;
            };
            entries.push((
                Some(evaluate(key, source, scope)?),
                evaluate(value, source, scope)?,
            ));
        } else {
            let [value] = parts[..] else {
                return None;
            };
            entries.push((None, evaluate(value, source, scope)?));
        }
    }

    if entries.iter().all(|(k, _)| k.is_none()) {
        return Some(Value::Array(entries.into_iter().map(|(_, v)| v).collect()));
    }

    let mut map = Map::new();
    let mut next_index: i64 = 0;
    for (key, value) in entries {
        let key = match key {
            Some(Value::Number(n)) if n.is_i64() => {
                let index = n.as_i64().unwrap_or_default();
                next_index = next_index.max(index.saturating_add(1));
                index.to_string()
            }
            Some(other) => stringify(&other),
            None => {
                next_index += 1;
                (next_index - 1).to_string()
            }
        };
        map.insert(key, value);
    }
    Some(Value::Object(map))
}

fn parse_number(lexeme: &str) -> Option<Value> {
    let cleaned = lexeme.replace('_', "");
    let lower = cleaned.to_ascii_lowercase();
    let radix = if lower.starts_with("0x") {
        Some((16, &cleaned[2..]))
    } else if lower.starts_with("0b") {
        Some((2, &cleaned[2..]))
    } else if lower.starts_with("0o") {
        Some((8, &cleaned[2..]))
    } else if cleaned.len() > 1 && cleaned.starts_with('0') && cleaned.bytes().all(|b| b.is_ascii_digit()) {
        Some((8, &cleaned[1..]))
    } else {
        None
    };
    if let Some((radix, digits)) = radix {
        return i64::from_str_radix(digits, radix).ok().map(Value::from);
    }
    if let Ok(int) = cleaned.parse::<i64>() {
        return Some(Value::from(int));
    }
    cleaned.parse::<f64>().ok().map(Value::from)
}

fn unquote(lexeme: &str) -> String {
    // Binary string prefix
    let lexeme = lexeme
        .strip_prefix(['b', 'B'])
        .filter(|rest| rest.starts_with(['\'', '"']))
        .unwrap_or(lexeme);
    let Some(quote) = lexeme.chars().next() else {
        return String::new();
    };
    let inner = lexeme
        .strip_prefix(quote)
        .and_then(|s| s.strip_suffix(quote))
        .unwrap_or(&lexeme[quote.len_utf8()..]);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match (quote, chars.next()) {
            ('\'', Some('\'')) => out.push('\''),
            (_, Some('\\')) => out.push('\\'),
            ('"', Some('"')) => out.push('"'),
            ('"', Some('n')) => out.push('\n'),
            ('"', Some('t')) => out.push('\t'),
            ('"', Some('r')) => out.push('\r'),
            ('"', Some('$')) => out.push('$'),
            (_, Some(other)) => {
                out.push('\\');
                out.push(other);
            }
            (_, None) => out.push('\\'),
        }
    }
    out
}

fn heredoc_body(lexeme: &str) -> String {
    let mut lines: Vec<&str> = lexeme.lines().skip(1).collect();
    lines.pop();
    lines.join("\n")
}

/// String conversion used for concatenation and array keys
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::parse::structure::scan_declarations;
    use serde_json::{json, Value};

    /// Value of constant `X` declared after `PREFIX = 'inv_'` in class `Invoice`
    fn eval(expr: &str) -> Value {
        let source = format!(
            "<?php\nclass Invoice\n{{\n    const PREFIX = 'inv_';\n    const X = {};\n}}\n",
            expr
        );
        let decls = scan_declarations(&source);
        decls[0]
            .constants
            .iter()
            .find(|(name, _)| name == "X")
            .map(|(_, value)| value.clone())
            .unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(eval("'draft'"), json!("draft"));
        assert_eq!(eval(r#""a\tb""#), json!("a\tb"));
        assert_eq!(eval(r"'it\'s'"), json!("it's"));
        assert_eq!(eval("42"), json!(42));
        assert_eq!(eval("-7"), json!(-7));
        assert_eq!(eval("1.5"), json!(1.5));
        assert_eq!(eval("0x1F"), json!(31));
        assert_eq!(eval("1_000"), json!(1000));
        assert_eq!(eval("TRUE"), json!(true));
        assert_eq!(eval("false"), json!(false));
        assert_eq!(eval("null"), Value::Null);
    }

    #[test]
    fn test_arrays() {
        assert_eq!(eval("['a', 'b']"), json!(["a", "b"]));
        assert_eq!(eval("array(1, 2,)"), json!([1, 2]));
        assert_eq!(eval("['k' => 1, 'x']"), json!({"k": 1, "0": "x"}));
        assert_eq!(eval("[[1], ['n' => null]]"), json!([[1], {"n": null}]));
    }

    #[test]
    fn test_self_reference_and_concat() {
        assert_eq!(eval("self::PREFIX . 'draft'"), json!("inv_draft"));
        assert_eq!(eval("(static::PREFIX)"), json!("inv_"));
        assert_eq!(eval("Invoice::PREFIX"), json!("inv_"));
        assert_eq!(eval("Other::PREFIX"), Value::Null);
    }

    #[test]
    fn test_unsupported_expressions() {
        assert_eq!(eval("strtoupper('x')"), Value::Null);
        assert_eq!(eval("1 + 2"), Value::Null);
        assert_eq!(eval("\"{$x}\""), Value::Null);
    }
}
