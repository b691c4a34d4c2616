//! Recursive-descent parser over the token stream of §4.B's grammar.

use indexmap::IndexMap;

use super::ast::{ClauseValue, Directive, Mapping, NamePair, Range};
use super::error::{ParseError, ParseResult};
use super::lexer::{self, Token};

/// Clauses a given directive kind accepts, and which of them are mandatory.
/// Kinds absent from this table are treated as open (§9: the source's `{…}`
/// kind set is non-exhaustive) — their clauses are accepted without
/// validation rather than rejected as unknown.
struct ClauseSpec {
    required: &'static [&'static str],
    optional: &'static [&'static str],
}

fn clause_spec(kind: &str) -> Option<ClauseSpec> {
    Some(match kind {
        "loop-fusion" => ClauseSpec {
            required: &[],
            optional: &["group"],
        },
        "loop-extract" => ClauseSpec {
            required: &["range"],
            optional: &["map", "parallel", "accelerator", "fusion", "group"],
        },
        "loop-interchange" => ClauseSpec {
            required: &["order"],
            optional: &["group"],
        },
        "array-transform" => ClauseSpec {
            required: &["map"],
            optional: &["group"],
        },
        "parallelize" => ClauseSpec {
            required: &[],
            optional: &["accelerator", "group"],
        },
        "remove" => ClauseSpec {
            required: &[],
            optional: &[],
        },
        "kcache" => ClauseSpec {
            required: &["cache"],
            optional: &["group"],
        },
        "block-start" | "block-end" => ClauseSpec {
            required: &[],
            optional: &["group"],
        },
        _ => return None,
    })
}

/// Parse one pragma's text (prefix already stripped by the caller) into a
/// [`Directive`].
pub fn parse(src: &str) -> ParseResult<Directive> {
    let tokens = lexer::lex(src).map_err(ParseError::UnrecognizedCharacter)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_directive()
}

struct Parser<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token<'src>> {
        self.tokens.get(self.pos + offset)
    }

    fn bump(&mut self) -> Option<Token<'src>> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect_ident(&mut self, what: &str) -> ParseResult<String> {
        match self.bump() {
            Some(Token::Ident(s)) => Ok(s.to_string()),
            Some(other) => Err(ParseError::UnexpectedToken {
                expected: what.to_string(),
                found: describe(&other),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: what.to_string(),
            }),
        }
    }

    fn eat(&mut self, pred: impl Fn(&Token<'src>) -> bool) -> bool {
        if self.peek().is_some_and(pred) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, pred: impl Fn(&Token<'src>) -> bool, what: &str) -> ParseResult<()> {
        if self.eat(pred) {
            Ok(())
        } else {
            match self.peek() {
                Some(found) => Err(ParseError::UnexpectedToken {
                    expected: what.to_string(),
                    found: describe(found),
                }),
                None => Err(ParseError::UnexpectedEof {
                    expected: what.to_string(),
                }),
            }
        }
    }

    fn parse_directive(&mut self) -> ParseResult<Directive> {
        let kind = match self.bump() {
            Some(Token::Ident(s)) => s.to_string(),
            Some(other) => {
                return Err(ParseError::UnexpectedToken {
                    expected: "directive keyword".to_string(),
                    found: describe(&other),
                });
            }
            None => return Err(ParseError::MissingKind),
        };

        let mut clauses = IndexMap::new();
        while self.peek().is_some() {
            let (name, value) = self.parse_clause()?;
            clauses.insert(name, value);
        }

        if let Some(spec) = clause_spec(&kind) {
            for (name, _) in &clauses {
                if !spec.required.contains(&name.as_str()) && !spec.optional.contains(&name.as_str()) {
                    return Err(ParseError::UnknownClause {
                        kind,
                        clause: name.clone(),
                    });
                }
            }
            for required in spec.required {
                if !clauses.contains_key(*required) {
                    return Err(ParseError::MissingClause {
                        kind,
                        clause: (*required).to_string(),
                    });
                }
            }
        }

        Ok(Directive { kind, clauses })
    }

    fn parse_clause(&mut self) -> ParseResult<(String, ClauseValue)> {
        let name = self.expect_ident("clause name")?;
        if !self.eat(|t| matches!(t, Token::LParen)) {
            return Ok((name, ClauseValue::Flag));
        }
        let value = self.parse_args()?;
        self.expect(|t| matches!(t, Token::RParen), ")")?;
        Ok((name, value))
    }

    fn parse_args(&mut self) -> ParseResult<ClauseValue> {
        match self.peek() {
            Some(Token::String(_)) => {
                let Some(Token::String(s)) = self.bump() else {
                    unreachable!()
                };
                Ok(ClauseValue::Scalar(s))
            }
            Some(Token::Integer(_)) => {
                let Some(Token::Integer(s)) = self.bump() else {
                    unreachable!()
                };
                Ok(ClauseValue::Scalar(s))
            }
            Some(Token::Ident(_)) if matches!(self.peek_at(1), Some(Token::Equals)) => {
                self.parse_range().map(ClauseValue::Range)
            }
            Some(Token::Ident(_)) => {
                let first = self.parse_var_list()?;
                if self.eat(|t| matches!(t, Token::Colon)) {
                    let second = self.parse_var_list()?;
                    Ok(ClauseValue::Mapping(Mapping {
                        mapped: first,
                        mapping: second,
                    }))
                } else if first.len() == 1 && first[0].alias.is_none() {
                    Ok(ClauseValue::Scalar(first.into_iter().next().unwrap().name))
                } else {
                    Ok(ClauseValue::NameList(first))
                }
            }
            Some(other) => Err(ParseError::UnexpectedToken {
                expected: "clause argument".to_string(),
                found: describe(other),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "clause argument".to_string(),
            }),
        }
    }

    fn parse_range(&mut self) -> ParseResult<Range> {
        let induction_var = self.expect_ident("induction variable")?;
        self.expect(|t| matches!(t, Token::Equals), "=")?;
        let lower = self.parse_expr_text()?;
        self.expect(|t| matches!(t, Token::Colon), ":")?;
        let upper = self.parse_expr_text()?;
        let step = if self.eat(|t| matches!(t, Token::Colon)) {
            self.parse_expr_text()?
        } else {
            "1".to_string()
        };
        Ok(Range {
            induction_var,
            lower,
            upper,
            step,
        })
    }

    /// A range bound is an expression reference; this grammar only needs its
    /// source text (an identifier or integer literal), not its AST (§4.B:
    /// bounds are "expr refs", resolved by the callers of `iterationRangeOf`).
    fn parse_expr_text(&mut self) -> ParseResult<String> {
        match self.bump() {
            Some(Token::Ident(s)) => Ok(s.to_string()),
            Some(Token::Integer(s)) => Ok(s),
            Some(other) => Err(ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found: describe(&other),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "expression".to_string(),
            }),
        }
    }

    fn parse_name_pair(&mut self) -> ParseResult<NamePair> {
        let name = self.expect_ident("name")?;
        let alias = if self.eat(|t| matches!(t, Token::Slash)) {
            Some(self.expect_ident("alias name")?)
        } else {
            None
        };
        Ok(NamePair { name, alias })
    }

    fn parse_var_list(&mut self) -> ParseResult<Vec<NamePair>> {
        let mut list = vec![self.parse_name_pair()?];
        while self.eat(|t| matches!(t, Token::Comma)) {
            let pair = self.parse_name_pair()?;
            if list.iter().any(|p: &NamePair| p.name == pair.name) {
                return Err(ParseError::DuplicateMapping { name: pair.name });
            }
            list.push(pair);
        }
        Ok(list)
    }
}

fn describe(token: &Token<'_>) -> String {
    match token {
        Token::LParen => "(".to_string(),
        Token::RParen => ")".to_string(),
        Token::Equals => "=".to_string(),
        Token::Colon => ":".to_string(),
        Token::Slash => "/".to_string(),
        Token::Comma => ",".to_string(),
        Token::String(s) => format!("string {s:?}"),
        Token::Integer(s) => format!("integer {s}"),
        Token::Ident(s) => format!("identifier {s:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_range_clause() {
        let d = parse("loop-extract range(j=1:n)").unwrap();
        let r = d.range().unwrap();
        assert_eq!(r.induction_var, "j");
        assert_eq!(r.lower, "1");
        assert_eq!(r.upper, "n");
        assert_eq!(r.step, "1");
    }

    #[test]
    fn parses_range_with_explicit_step() {
        let d = parse("loop-extract range(j=1:n:2)").unwrap();
        assert_eq!(d.range().unwrap().step, "2");
    }

    #[test]
    fn parses_mapping_clause() {
        let d = parse("loop-extract range(j=1:n) map(a:j)").unwrap();
        let m = d.mapping().unwrap();
        assert_eq!(m.mapped, vec![NamePair::plain("a")]);
        assert_eq!(m.mapping, vec![NamePair::plain("j")]);
        assert_eq!(m.mapped_dimensions(), 1);
    }

    #[test]
    fn parses_mapping_with_aliased_var_list() {
        let d = parse("loop-extract range(j=1:n) map(a/arg1,b/arg2:j,k)").unwrap();
        let m = d.mapping().unwrap();
        assert_eq!(
            m.mapped,
            vec![
                NamePair {
                    name: "a".to_string(),
                    alias: Some("arg1".to_string())
                },
                NamePair {
                    name: "b".to_string(),
                    alias: Some("arg2".to_string())
                },
            ]
        );
    }

    #[test]
    fn parses_var_list_clause() {
        let d = parse("kcache cache(l1,l2)").unwrap();
        let list = d.name_list("cache").unwrap();
        assert_eq!(list, &[NamePair::plain("l1"), NamePair::plain("l2")]);
    }

    #[test]
    fn parses_flag_clause() {
        let d = parse("loop-extract range(j=1:n) parallel").unwrap();
        assert!(d.has_flag("parallel"));
    }

    #[test]
    fn parses_scalar_clause() {
        let d = parse("loop-extract range(j=1:n) group(g1)").unwrap();
        assert_eq!(d.group_label(), Some("g1"));
    }

    #[test]
    fn clause_order_is_irrelevant() {
        let a = parse("loop-extract parallel range(j=1:n) group(g1)").unwrap();
        let b = parse("loop-extract group(g1) range(j=1:n) parallel").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_duplicate_mapping_entries() {
        let err = parse("loop-extract range(j=1:n) map(a,a:j,k)").unwrap_err();
        assert_eq!(
            err,
            ParseError::DuplicateMapping {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn rejects_unknown_clause() {
        let err = parse("loop-fusion bogus").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownClause {
                kind: "loop-fusion".to_string(),
                clause: "bogus".to_string(),
            }
        );
    }

    #[test]
    fn rejects_missing_mandatory_clause() {
        let err = parse("loop-extract parallel").unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingClause {
                kind: "loop-extract".to_string(),
                clause: "range".to_string(),
            }
        );
    }

    #[test]
    fn unknown_directive_kind_skips_clause_validation() {
        let d = parse("custom-directive whatever(1)").unwrap();
        assert_eq!(d.kind, "custom-directive");
    }
}
