//! Read-only gate for model-generated Cypher.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("query is empty")]
    Empty,
    #[error("query contains multiple statements")]
    MultipleStatements,
    #[error("query uses a write or admin clause: {0}")]
    Forbidden(String),
    #[error("query must contain MATCH or RETURN")]
    NotAQuery,
}

static FORBIDDEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(CREATE|MERGE|DELETE|DETACH|SET|REMOVE|DROP|LOAD\s+CSV|FOREACH)\b|\bCALL\s+`?(dbms|apoc|db)\b`?\s*\.",
    )
    .expect("valid regex")
});

static READ_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(MATCH|RETURN)\b").expect("valid regex"));

/// Blank out string literals and comments so keywords inside them are ignored.
/// Backtick-quoted identifiers are kept: they can name procedures.
fn strip_literals(cypher: &str) -> String {
    let mut out = String::with_capacity(cypher.len());
    let mut chars = cypher.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == '\\' {
                    chars.next();
                } else if c == q {
                    quote = None;
                    out.push(c);
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    out.push(c);
                }
                '/' if chars.peek() == Some(&'/') => {
                    for next in chars.by_ref() {
                        if next == '\n' {
                            out.push('\n');
                            break;
                        }
                    }
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    let mut prev = '\0';
                    for next in chars.by_ref() {
                        if prev == '*' && next == '/' {
                            break;
                        }
                        prev = next;
                    }
                    out.push(' ');
                }
                _ => out.push(c),
            },
        }
    }
    out
}

/// Accept only single-statement read queries. Returns the trimmed query.
pub fn check_read_only(cypher: &str) -> Result<&str, GuardError> {
    let trimmed = cypher.trim();
    if trimmed.is_empty() {
        return Err(GuardError::Empty);
    }

    let code = strip_literals(trimmed);
    let code = code.trim_end().trim_end_matches(';');
    if code.contains(';') {
        return Err(GuardError::MultipleStatements);
    }
    if let Some(m) = FORBIDDEN.find(code) {
        return Err(GuardError::Forbidden(m.as_str().to_uppercase()));
    }
    if !READ_CLAUSE.is_match(code) {
        return Err(GuardError::NotAQuery);
    }
    Ok(trimmed.trim_end_matches(';').trim_end())
}
