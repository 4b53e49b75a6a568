//! Turtle parser for the curated reading-notes graph.
//!
//! Covers the subset the curated file uses:
//! - `@prefix` / `@base` declarations
//! - `<IRI>` references and `prefix:local` names
//! - quoted literals with `\"`, `\\`, `\n`, `\t` escapes, optional
//!   language tags and `^^` datatype annotations
//! - `a` as shorthand for `rdf:type`
//! - predicate lists (`;`) and object lists (`,`)
//! - `#` comments
//!
//! Anything outside this subset (blank nodes, collections, multi-line
//! literals) is a parse error, which the loader treats as fatal.

use std::collections::HashMap;

use cellstats_shared::{CellStatsError, Result};

/// Expansion of the `a` keyword.
const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One parsed (subject, predicate, object) statement.
///
/// IRIs are fully expanded; literal objects carry their unescaped text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// `<...>` IRI reference (content only).
    Iri(String),
    /// Bareword: `prefix:local`, `a`, `@prefix`, `@base`.
    Word(String),
    /// Quoted literal (unescaped content).
    Literal(String),
    Dot,
    Semicolon,
    Comma,
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

fn tokenize(content: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = content.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            _ if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                // Comment to end of line
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '<' => {
                chars.next();
                let mut iri = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '>' {
                        closed = true;
                        break;
                    }
                    iri.push(c);
                }
                if !closed {
                    return Err(CellStatsError::parse("unterminated IRI reference"));
                }
                tokens.push(Token::Iri(iri));
            }
            '"' => {
                chars.next();
                tokens.push(Token::Literal(read_string(&mut chars)?));
                // Swallow an optional language tag or datatype annotation;
                // only the literal text matters to the loader.
                if chars.peek() == Some(&'@') {
                    chars.next();
                    while let Some(&c) = chars.peek() {
                        if c.is_ascii_alphanumeric() || c == '-' {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                } else if chars.peek() == Some(&'^') {
                    chars.next();
                    if chars.next() != Some('^') {
                        return Err(CellStatsError::parse("expected '^^' after literal"));
                    }
                    match chars.peek() {
                        Some('<') => {
                            chars.next();
                            let mut closed = false;
                            for c in chars.by_ref() {
                                if c == '>' {
                                    closed = true;
                                    break;
                                }
                            }
                            if !closed {
                                return Err(CellStatsError::parse("unterminated datatype IRI"));
                            }
                        }
                        _ => {
                            while let Some(&c) = chars.peek() {
                                if c.is_whitespace() || matches!(c, ';' | ',' | '.') {
                                    break;
                                }
                                chars.next();
                            }
                        }
                    }
                }
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            ';' => {
                chars.next();
                tokens.push(Token::Semicolon);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, ';' | ',' | '"' | '<' | '#') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                // A statement-terminating dot can sit flush against the
                // last term (`wd:Q42.`).
                let trailing_dot = word.ends_with('.');
                if trailing_dot {
                    word.pop();
                }
                if !word.is_empty() {
                    tokens.push(Token::Word(word));
                }
                if trailing_dot {
                    tokens.push(Token::Dot);
                }
            }
        }
    }

    Ok(tokens)
}

/// Read a quoted string body (opening quote already consumed).
fn read_string(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String> {
    let mut s = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok(s),
            Some('\\') => match chars.next() {
                Some('"') => s.push('"'),
                Some('\\') => s.push('\\'),
                Some('n') => s.push('\n'),
                Some('t') => s.push('\t'),
                Some('r') => s.push('\r'),
                Some(other) => {
                    return Err(CellStatsError::parse(format!(
                        "unsupported string escape '\\{other}'"
                    )));
                }
                None => return Err(CellStatsError::parse("unterminated string escape")),
            },
            Some(c) => s.push(c),
            None => return Err(CellStatsError::parse("unterminated string literal")),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse a Turtle document into a flat list of triples.
pub fn parse_turtle(content: &str) -> Result<Vec<Triple>> {
    let tokens = tokenize(content)?;
    let mut cursor = tokens.iter().peekable();
    let mut prefixes: HashMap<String, String> = HashMap::new();
    let mut base = String::new();
    let mut triples = Vec::new();

    while let Some(token) = cursor.next() {
        match token {
            Token::Word(w) if w == "@prefix" => {
                let name = match cursor.next() {
                    Some(Token::Word(p)) if p.ends_with(':') => {
                        p.trim_end_matches(':').to_string()
                    }
                    other => {
                        return Err(CellStatsError::parse(format!(
                            "expected prefix name after @prefix, got {other:?}"
                        )));
                    }
                };
                let iri = match cursor.next() {
                    Some(Token::Iri(iri)) => iri.clone(),
                    other => {
                        return Err(CellStatsError::parse(format!(
                            "expected IRI in @prefix declaration, got {other:?}"
                        )));
                    }
                };
                expect_dot(cursor.next())?;
                prefixes.insert(name, iri);
            }
            Token::Word(w) if w == "@base" => {
                base = match cursor.next() {
                    Some(Token::Iri(iri)) => iri.clone(),
                    other => {
                        return Err(CellStatsError::parse(format!(
                            "expected IRI in @base declaration, got {other:?}"
                        )));
                    }
                };
                expect_dot(cursor.next())?;
            }
            _ => {
                let subject = resolve_term(token, &prefixes, &base, TermPos::Subject)?;
                parse_predicate_object_list(&mut cursor, &subject, &prefixes, &base, &mut triples)?;
            }
        }
    }

    Ok(triples)
}

/// Parse `predicate object (, object)* (; predicate object ...)* .`
fn parse_predicate_object_list<'a>(
    cursor: &mut std::iter::Peekable<std::slice::Iter<'a, Token>>,
    subject: &str,
    prefixes: &HashMap<String, String>,
    base: &str,
    triples: &mut Vec<Triple>,
) -> Result<()> {
    loop {
        let predicate = match cursor.next() {
            Some(t) => resolve_term(t, prefixes, base, TermPos::Predicate)?,
            None => return Err(CellStatsError::parse("statement missing predicate")),
        };

        loop {
            let object = match cursor.next() {
                Some(t) => resolve_term(t, prefixes, base, TermPos::Object)?,
                None => return Err(CellStatsError::parse("statement missing object")),
            };
            triples.push(Triple {
                subject: subject.to_string(),
                predicate: predicate.clone(),
                object,
            });

            if matches!(cursor.peek(), Some(Token::Comma)) {
                cursor.next();
            } else {
                break;
            }
        }

        match cursor.next() {
            Some(Token::Semicolon) => {
                // Trailing `;` before the closing dot is legal.
                if matches!(cursor.peek(), Some(Token::Dot)) {
                    cursor.next();
                    return Ok(());
                }
            }
            Some(Token::Dot) => return Ok(()),
            other => {
                return Err(CellStatsError::parse(format!(
                    "expected ';' or '.' after object, got {other:?}"
                )));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TermPos {
    Subject,
    Predicate,
    Object,
}

/// Resolve one token to an expanded IRI or literal text.
fn resolve_term(
    token: &Token,
    prefixes: &HashMap<String, String>,
    base: &str,
    pos: TermPos,
) -> Result<String> {
    match token {
        Token::Iri(iri) => {
            if iri.contains("://") || base.is_empty() {
                Ok(iri.clone())
            } else {
                Ok(format!("{base}{iri}"))
            }
        }
        Token::Word(w) if w == "a" && pos == TermPos::Predicate => Ok(RDF_TYPE.to_string()),
        Token::Word(w) => {
            let (prefix, local) = w.split_once(':').ok_or_else(|| {
                CellStatsError::parse(format!("expected an IRI or prefixed name, got '{w}'"))
            })?;
            let expansion = prefixes.get(prefix).ok_or_else(|| {
                CellStatsError::parse(format!("undeclared prefix '{prefix}:'"))
            })?;
            Ok(format!("{expansion}{local}"))
        }
        Token::Literal(text) => {
            if pos == TermPos::Object {
                Ok(text.clone())
            } else {
                Err(CellStatsError::parse(
                    "literal is only valid in object position",
                ))
            }
        }
        Token::Dot | Token::Semicolon | Token::Comma => Err(CellStatsError::parse(format!(
            "unexpected punctuation {token:?} where a term was expected"
        ))),
    }
}

fn expect_dot(token: Option<&Token>) -> Result<()> {
    match token {
        Some(Token::Dot) => Ok(()),
        other => Err(CellStatsError::parse(format!(
            "expected '.' terminating declaration, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iri_statement() {
        let triples = parse_turtle(
            "<http://example.org/s> <http://example.org/p> <http://example.org/o> .",
        )
        .unwrap();
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].subject, "http://example.org/s");
        assert_eq!(triples[0].predicate, "http://example.org/p");
        assert_eq!(triples[0].object, "http://example.org/o");
    }

    #[test]
    fn parses_prefixed_names() {
        let ttl = "\
@prefix wd: <http://www.wikidata.org/entity/> .
@prefix ex: <http://example.org/> .
wd:Q42 ex:knows wd:Q7868 .
";
        let triples = parse_turtle(ttl).unwrap();
        assert_eq!(triples[0].subject, "http://www.wikidata.org/entity/Q42");
        assert_eq!(triples[0].object, "http://www.wikidata.org/entity/Q7868");
    }

    #[test]
    fn parses_predicate_and_object_lists() {
        let ttl = "\
@prefix ex: <http://example.org/> .
ex:s ex:p ex:a , ex:b ;
     ex:q \"note\" .
";
        let triples = parse_turtle(ttl).unwrap();
        assert_eq!(triples.len(), 3);
        assert_eq!(triples[1].object, "http://example.org/b");
        assert_eq!(triples[2].object, "note");
    }

    #[test]
    fn a_expands_to_rdf_type() {
        let ttl = "@prefix ex: <http://example.org/> .\nex:s a ex:Thing .";
        let triples = parse_turtle(ttl).unwrap();
        assert_eq!(triples[0].predicate, RDF_TYPE);
    }

    #[test]
    fn comments_and_blank_lines_ignored() {
        let ttl = "\
# curated reading notes
@prefix ex: <http://example.org/> .

ex:s ex:p ex:o . # trailing comment
";
        let triples = parse_turtle(ttl).unwrap();
        assert_eq!(triples.len(), 1);
    }

    #[test]
    fn literal_escapes_and_language_tags() {
        let ttl = r#"@prefix ex: <http://example.org/> .
ex:s ex:p "line\nbreak \"quoted\""@en .
"#;
        let triples = parse_turtle(ttl).unwrap();
        assert_eq!(triples[0].object, "line\nbreak \"quoted\"");
    }

    #[test]
    fn datatype_annotation_is_swallowed() {
        let ttl = "@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n\
                   @prefix ex: <http://example.org/> .\n\
                   ex:s ex:p \"5\"^^xsd:integer .";
        let triples = parse_turtle(ttl).unwrap();
        assert_eq!(triples[0].object, "5");
    }

    #[test]
    fn trailing_semicolon_before_dot() {
        let ttl = "@prefix ex: <http://example.org/> .\nex:s ex:p ex:o ; .";
        let triples = parse_turtle(ttl).unwrap();
        assert_eq!(triples.len(), 1);
    }

    #[test]
    fn undeclared_prefix_is_error() {
        let err = parse_turtle("ex:s ex:p ex:o .").unwrap_err();
        assert!(err.to_string().contains("undeclared prefix"));
    }

    #[test]
    fn unterminated_literal_is_error() {
        let ttl = "@prefix ex: <http://example.org/> .\nex:s ex:p \"oops .";
        assert!(parse_turtle(ttl).is_err());
    }
}
