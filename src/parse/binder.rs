//! @acp:module "Constant Comment Binder"
//! @acp:summary "Associates doc-comments with the constant declarations they precede"
//! @acp:domain metadata
//! @acp:layer parser
//!
//! Constants lose their documentation once a program is running, so the
//! association is recovered from the token stream. The scan keeps two pieces
//! of state: the most recent doc-comment and whether a `const` keyword is
//! waiting for its name.

use indexmap::IndexMap;

use super::tokens::{Token, TokenKind};

/// A constant name together with the doc-comment immediately preceding it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundConstant<'a> {
    pub name: &'a str,
    /// `None` when the declaration had no doc-comment
    pub doc: Option<&'a str>,
}

/// @acp:summary "Bind constant names to their preceding doc-comments"
/// Results keep declaration order; a repeated name overwrites the earlier
/// binding in place.
pub fn bind_constant_comments<'a, I>(tokens: I) -> Vec<BoundConstant<'a>>
where
    I: IntoIterator<Item = Token<'a>>,
{
    let mut bound: IndexMap<&'a str, Option<&'a str>> = IndexMap::new();
    let mut pending_doc: Option<&'a str> = None;
    let mut in_const = false;

    for token in tokens {
        match token.kind {
            TokenKind::DocComment => pending_doc = Some(token.lexeme),
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Visibility => {}
            TokenKind::Const => in_const = true,
            TokenKind::Identifier if in_const => {
                bound.insert(token.lexeme, pending_doc.take());
                in_const = false;
            }
            _ => {
                pending_doc = None;
                in_const = false;
            }
        }
    }

    bound
        .into_iter()
        .map(|(name, doc)| BoundConstant { name, doc })
        .collect()
}
