use std::fmt;

use logos::Logos;

use crate::errors::{CompilerError, ErrorKind};

#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token {
    // Keywords
    #[token("fn")]
    KwFn,
    #[token("region")]
    KwRegion,
    #[token("if")]
    KwIf,
    #[token("measure")]
    KwMeasure,

    // Literals
    #[regex(r"[0-9]+", |lex| lex.slice().parse().ok())]
    UIntLiteral(i64),
    #[regex(r"\^[01]*\^", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    BitString(String),

    // `Q[]`, `C[]`, and any other register-shaped typename. Unknown names
    // must lex so the resolver can report them as T0.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*\[\]", |lex| lex.slice().to_string())]
    RegTypeName(String),

    // Identifiers
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Operators
    #[token("==")]
    OpEq,
    #[token("!=")]
    OpNeq,
    #[token("<")]
    OpLt,
    #[token(">")]
    OpGt,
    #[token("+")]
    OpAdd,
    #[token("-")]
    OpSub,
    #[token("*")]
    OpMul,
    #[token("/")]
    OpDiv,
    #[token("=")]
    OpAssign,
    #[token("->")]
    Arrow,

    // Delimiters
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,

    // Skip token
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"[ \t\n\r\f]+", logos::skip)]
    __Skip,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::KwFn => write!(f, "'fn'"),
            Token::KwRegion => write!(f, "'region'"),
            Token::KwIf => write!(f, "'if'"),
            Token::KwMeasure => write!(f, "'measure'"),
            Token::UIntLiteral(v) => write!(f, "'{}'", v),
            Token::BitString(s) => write!(f, "'^{}^'", s),
            Token::RegTypeName(s) => write!(f, "'{}'", s),
            Token::Ident(s) => write!(f, "'{}'", s),
            Token::OpEq => write!(f, "'=='"),
            Token::OpNeq => write!(f, "'!='"),
            Token::OpLt => write!(f, "'<'"),
            Token::OpGt => write!(f, "'>'"),
            Token::OpAdd => write!(f, "'+'"),
            Token::OpSub => write!(f, "'-'"),
            Token::OpMul => write!(f, "'*'"),
            Token::OpDiv => write!(f, "'/'"),
            Token::OpAssign => write!(f, "'='"),
            Token::Arrow => write!(f, "'->'"),
            Token::ParenOpen => write!(f, "'('"),
            Token::ParenClose => write!(f, "')'"),
            Token::BraceOpen => write!(f, "'{{'"),
            Token::BraceClose => write!(f, "'}}'"),
            Token::BracketOpen => write!(f, "'['"),
            Token::BracketClose => write!(f, "']'"),
            Token::Comma => write!(f, "','"),
            Token::Colon => write!(f, "':'"),
            Token::Semicolon => write!(f, "';'"),
            Token::__Skip => write!(f, "''"),
        }
    }
}

fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset];
    let line = before.bytes().filter(|&b| b == b'\n').count() + 1;
    let line_start = before.rfind('\n').map(|pos| pos + 1).unwrap_or(0);
    (line, offset - line_start + 1)
}

/// Tokenize a Funq source file into `(token, line, column)` triples.
pub fn tokenize(source: &str) -> Result<Vec<(Token, usize, usize)>, CompilerError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let (line, column) = line_column(source, span.start);
        match result {
            Ok(token) => tokens.push((token, line, column)),
            Err(_) => {
                return Err(CompilerError::new(
                    ErrorKind::UnexpectedToken(format!(
                        "a valid token, found '{}'",
                        lexer.slice()
                    )),
                    line,
                    column,
                ));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_a_region() {
        let tokens = tokenize("region R<1> { Q[] q = ^0^; }").unwrap();
        let kinds: Vec<Token> = tokens.into_iter().map(|(t, _, _)| t).collect();
        assert_eq!(
            kinds,
            vec![
                Token::KwRegion,
                Token::Ident("R".into()),
                Token::OpLt,
                Token::UIntLiteral(1),
                Token::OpGt,
                Token::BraceOpen,
                Token::RegTypeName("Q[]".into()),
                Token::Ident("q".into()),
                Token::OpAssign,
                Token::BitString("0".into()),
                Token::Semicolon,
                Token::BraceClose,
            ]
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = tokenize("fn\n  region").unwrap();
        assert_eq!(tokens[0].1, 1);
        assert_eq!(tokens[0].2, 1);
        assert_eq!(tokens[1].1, 2);
        assert_eq!(tokens[1].2, 3);
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = tokenize("// a comment\nfn").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].0, Token::KwFn);
    }

    #[test]
    fn bad_character_is_a_syntax_error() {
        let err = tokenize("region R<1> { ? }").unwrap_err();
        assert_eq!(err.code(), "S0");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn measure_prefix_is_still_an_identifier() {
        let tokens = tokenize("measurement").unwrap();
        assert_eq!(tokens[0].0, Token::Ident("measurement".into()));
    }
}
