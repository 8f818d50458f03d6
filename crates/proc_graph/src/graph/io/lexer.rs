//! Tokens of the graph text format.
use std::ops::Range;

use logos::Logos;

use crate::script::lexer::unescape;
use crate::script::ParseError;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum GraphToken {
    #[token("=")]
    Assign,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("->")]
    Arrow,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f32>().ok())]
    Float(f32),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),

    /// Script source between `$` delimiters. Inside, `\$` and `\\` stand for
    /// `$` and `\`; other backslashes are kept as written.
    #[regex(r"\$([^$\\]|\\.)*\$", |lex| unescape_expression(lex.slice()))]
    Expression(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),
}

impl GraphToken {
    pub(crate) fn describe(&self) -> String {
        match self {
            GraphToken::Assign => "'='".into(),
            GraphToken::LParen => "'('".into(),
            GraphToken::RParen => "')'".into(),
            GraphToken::LBrace => "'{'".into(),
            GraphToken::RBrace => "'}'".into(),
            GraphToken::Comma => "','".into(),
            GraphToken::Colon => "':'".into(),
            GraphToken::Semicolon => "';'".into(),
            GraphToken::Arrow => "'->'".into(),
            GraphToken::Lt => "'<'".into(),
            GraphToken::Gt => "'>'".into(),
            GraphToken::True => "'true'".into(),
            GraphToken::False => "'false'".into(),
            GraphToken::Null => "'null'".into(),
            GraphToken::Float(v) => format!("float {}", v),
            GraphToken::Integer(v) => format!("integer {}", v),
            GraphToken::Str(s) => format!("string \"{}\"", s),
            GraphToken::Expression(s) => format!("expression ${}$", s),
            GraphToken::Ident(s) => format!("identifier '{}'", s),
        }
    }
}

pub(crate) fn unescape_expression(delimited: &str) -> String {
    let inner = &delimited[1..delimited.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped @ ('$' | '\\')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Inverse of [`unescape_expression`], including the delimiters.
pub(crate) fn escape_expression(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + 2);
    out.push('$');
    for c in source.chars() {
        if matches!(c, '$' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('$');
    out
}

pub fn tokenize(source: &str) -> Result<Vec<(GraphToken, Range<usize>)>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = GraphToken::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                return Err(ParseError::new(
                    format!("unexpected character sequence '{}'", lexer.slice()),
                    span.start,
                ))
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<GraphToken> {
        tokenize(source)
            .expect("tokenizes")
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn arrows_and_negative_numbers_are_distinct() {
        assert_eq!(
            kinds("a -> b -1 -2.5"),
            vec![
                GraphToken::Ident("a".into()),
                GraphToken::Arrow,
                GraphToken::Ident("b".into()),
                GraphToken::Integer(-1),
                GraphToken::Float(-2.5),
            ]
        );
    }

    #[test]
    fn expressions_keep_their_source() {
        assert_eq!(
            kinds("w: $base * 2.0$ // trailing"),
            vec![
                GraphToken::Ident("w".into()),
                GraphToken::Colon,
                GraphToken::Expression("base * 2.0".into()),
            ]
        );
    }

    #[test]
    fn escaped_dollars_stay_inside_expressions() {
        assert_eq!(
            kinds(r#"s: $"a\$b" + "\\n"$"#),
            vec![
                GraphToken::Ident("s".into()),
                GraphToken::Colon,
                GraphToken::Expression(r#""a$b" + "\n""#.into()),
            ]
        );
        let source = r#"label + "$" + "q\"""#;
        match &kinds(&escape_expression(source))[..] {
            [GraphToken::Expression(read)] => assert_eq!(read, source),
            other => panic!("unexpected tokens {other:?}"),
        }
    }

    #[test]
    fn unknown_characters_report_their_offset() {
        let err = tokenize("a = #").expect_err("bad char");
        assert_eq!(err.offset(), 4);
    }
}
