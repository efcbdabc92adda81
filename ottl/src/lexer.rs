// SPDX-License-Identifier: Apache-2.0

//! Token definitions for the expression language.

use logos::Logos;

use crate::Result;

/// Expression language tokens
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token<'a> {
    // ===== Keywords =====
    #[token("or")]
    Or,

    #[token("and")]
    And,

    #[token("not")]
    Not,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("nil")]
    Nil,

    // ===== Comparison operators =====
    #[token("==")]
    Eq,

    #[token("!=")]
    NotEq,

    #[token("<=")]
    LessEq,

    #[token(">=")]
    GreaterEq,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    // ===== Arithmetic operators =====
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    // ===== Delimiters =====
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token(":")]
    Colon,

    // ===== Literals =====
    /// String literal: "..."
    #[regex(r#""[^"\\]*(?:\\.[^"\\]*)*""#, |lex| lex.slice())]
    StringLiteral(&'a str),

    /// Bytes literal: 0xC0FFEE
    #[regex(r"0x[0-9a-fA-F]+", |lex| lex.slice())]
    BytesLiteral(&'a str),

    /// Float literal: 3.14, .5 (sign is a separate token)
    #[regex(r"([0-9]+\.[0-9]*|\.[0-9]+)", |lex| lex.slice())]
    FloatLiteral(&'a str),

    /// Integer literal: 42 (sign is a separate token)
    #[regex(r"[0-9]+", priority = 2, callback = |lex| lex.slice())]
    IntLiteral(&'a str),

    // ===== Identifiers =====
    /// Uppercase identifier (converter name or enum constant)
    #[regex(r"[A-Z][a-zA-Z0-9_]*", |lex| lex.slice())]
    UpperIdent(&'a str),

    /// Lowercase identifier (path segment)
    #[regex(r"[a-z][a-zA-Z0-9_]*", priority = 1, callback = |lex| lex.slice())]
    LowerIdent(&'a str),
}

/// Tokenizes the whole input, failing on the first unrecognized byte run.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
    let mut lexer = Token::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(token),
            Err(()) => {
                return Err(format!(
                    "lexer error: unrecognized input {:?} at offset {}",
                    lexer.slice(),
                    lexer.span().start
                )
                .into());
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_and_operators() {
        let tokens = tokenize("or and not true false nil == != <= >= < > + - * /").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Or,
                Token::And,
                Token::Not,
                Token::True,
                Token::False,
                Token::Nil,
                Token::Eq,
                Token::NotEq,
                Token::LessEq,
                Token::GreaterEq,
                Token::Less,
                Token::Greater,
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
            ]
        );
    }

    #[test]
    fn path_with_index() {
        let tokens = tokenize(r#"resource.attributes["service.name"]"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LowerIdent("resource"),
                Token::Dot,
                Token::LowerIdent("attributes"),
                Token::LBracket,
                Token::StringLiteral(r#""service.name""#),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn literals() {
        let tokens = tokenize(r#""a\"b" 12 3.5 0xAB"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::StringLiteral(r#""a\"b""#),
                Token::IntLiteral("12"),
                Token::FloatLiteral("3.5"),
                Token::BytesLiteral("0xAB"),
            ]
        );
    }

    #[test]
    fn keyword_prefix_stays_identifier() {
        let tokens = tokenize("android Normalize").unwrap();
        assert_eq!(
            tokens,
            vec![Token::LowerIdent("android"), Token::UpperIdent("Normalize")]
        );
    }

    #[test]
    fn unrecognized_input_is_an_error() {
        assert!(tokenize("a ~ b").is_err());
    }
}
