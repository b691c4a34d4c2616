//! Tokenizer for one pragma's text, independent of the IR deserializer (§4.B).

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t]+")]
pub enum Token<'src> {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("=")]
    Equals,
    #[token(":")]
    Colon,
    #[token("/")]
    Slash,
    #[token(",")]
    Comma,

    #[regex(r#""(?:[^"\\]|\\.)*""#, |lex| lex.slice()[1..lex.slice().len() - 1].to_string())]
    String(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().to_string())]
    Integer(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_.\-]*", |lex| lex.slice())]
    Ident(&'src str),
}

/// Lex `src` fully, failing on the first unrecognized character.
pub fn lex(src: &str) -> Result<Vec<Token<'_>>, usize> {
    let mut out = Vec::new();
    let mut lexer = Token::lexer(src);
    while let Some(result) = lexer.next() {
        match result {
            Ok(tok) => out.push(tok),
            Err(()) => return Err(lexer.span().start),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_punctuation() {
        let tokens = lex("( ) = : / ,").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::RParen,
                Token::Equals,
                Token::Colon,
                Token::Slash,
                Token::Comma,
            ]
        );
    }

    #[test]
    fn lexes_identifiers_and_integers() {
        let tokens = lex("loop_extract j n2 42 -1").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("loop_extract"),
                Token::Ident("j"),
                Token::Ident("n2"),
                Token::Integer("42".to_string()),
                Token::Integer("-1".to_string()),
            ]
        );
    }

    #[test]
    fn lexes_quoted_strings() {
        let tokens = lex(r#"kcache("l1","l2")"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("kcache"),
                Token::LParen,
                Token::String("l1".to_string()),
                Token::Comma,
                Token::String("l2".to_string()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn lexes_hyphenated_keyword_as_one_ident() {
        let tokens = lex("loop-extract").unwrap();
        assert_eq!(tokens, vec![Token::Ident("loop-extract")]);
    }

    #[test]
    fn rejects_unrecognized_character() {
        assert_eq!(lex("loop-extract range(j=1:n) %").unwrap_err(), 26);
    }
}
