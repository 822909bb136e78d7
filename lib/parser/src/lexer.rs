use crate::{ParseError, ParseResult};
use logos::Logos;
use std::fmt::{Display, Formatter};
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub(crate) enum Token {
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":-")]
    Implies,
    #[token("=")]
    Equal,
    #[token("!=")]
    #[token("\\=")]
    NotEqual,
    /// Variables, plain predicate names and prefixed names such as `ex:Person`.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(:[A-Za-z0-9_#/\-]*)?", |lex| lex.slice().to_owned())]
    Identifier(String),
    #[regex(r"<[^<>\x22{}|^`\\\x00-\x20]*>", |lex| {
        let slice = lex.slice();
        slice[1..slice.len() - 1].to_owned()
    })]
    Iri(String),
    #[regex(r"[-+]?[0-9]+", |lex| lex.slice().to_owned())]
    Integer(String),
    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().to_owned())]
    Decimal(String),
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r"'([^'\\]|\\.)*'", |lex| unescape(lex.slice()))]
    String(String),
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenParen => f.write_str("("),
            Token::CloseParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
            Token::Dot => f.write_str("."),
            Token::Implies => f.write_str(":-"),
            Token::Equal => f.write_str("="),
            Token::NotEqual => f.write_str("!="),
            Token::Identifier(value) | Token::Integer(value) | Token::Decimal(value) => {
                f.write_str(value)
            }
            Token::Iri(iri) => write!(f, "<{iri}>"),
            Token::String(value) => write!(f, "{value:?}"),
        }
    }
}

/// Removes the quotes of a string literal and resolves its escape sequences.
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut unescaped = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => unescaped.push('\n'),
            Some('t') => unescaped.push('\t'),
            Some('r') => unescaped.push('\r'),
            Some(other) => unescaped.push(other),
            None => unescaped.push('\\'),
        }
    }
    unescaped
}

pub(crate) fn tokenize(input: &str) -> ParseResult<Vec<(Token, Range<usize>)>> {
    Token::lexer(input)
        .spanned()
        .map(|(token, span)| match token {
            Ok(token) => Ok((token, span)),
            Err(()) => Err(ParseError::Lexer {
                position: span.start,
                text: input[span].to_owned(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap_or_default()
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn lexes_query() {
        assert_eq!(
            tokens("Q() :- ex:C(x), x != 'a\\'b'."),
            vec![
                Token::Identifier("Q".to_owned()),
                Token::OpenParen,
                Token::CloseParen,
                Token::Implies,
                Token::Identifier("ex:C".to_owned()),
                Token::OpenParen,
                Token::Identifier("x".to_owned()),
                Token::CloseParen,
                Token::Comma,
                Token::Identifier("x".to_owned()),
                Token::NotEqual,
                Token::String("a'b".to_owned()),
                Token::Dot,
            ]
        );
    }

    #[test]
    fn lexes_constants() {
        assert_eq!(
            tokens("<http://example.com/a> -12 3.25 \"x\""),
            vec![
                Token::Iri("http://example.com/a".to_owned()),
                Token::Integer("-12".to_owned()),
                Token::Decimal("3.25".to_owned()),
                Token::String("x".to_owned()),
            ]
        );
    }

    #[test]
    fn reports_unknown_characters() {
        assert!(
            matches!(tokenize("Q() :- C(x) ;"), Err(ParseError::Lexer { position: 12, .. })),
            "';' is not a token"
        );
    }
}
