//! Reader: turns a source string into a single value tree.
//!
//! A `nom`-based recursive-descent parser over the token grammar of §4.1:
//! parens and braces, reader macros for quote/quasiquote/unquote/splice, line
//! comments, double-quoted strings, integers, and symbols.

use nom::branch::alt;
use nom::bytes::complete::is_not;
use nom::character::complete::{char, satisfy};
use nom::combinator::{opt, recognize, value};
use nom::multi::{many0, many1};
use nom::sequence::pair;
use nom::{IResult, Parser};

use crate::error::LispError;
use crate::value::Value;

/// Skips whitespace and `;`-to-end-of-line comments.
fn ws_and_comments(input: &str) -> IResult<&str, ()> {
    let (input, _) = many0(alt((
        value((), satisfy(|c| c.is_whitespace())),
        value((), pair(char(';'), opt(is_not("\n")))),
    )))
    .parse(input)?;
    Ok((input, ()))
}

fn is_symbol_char(c: char) -> bool {
    !c.is_whitespace() && !"()[]{}'`,\";".contains(c)
}

fn parse_symbol_text(input: &str) -> IResult<&str, &str> {
    recognize(many1(satisfy(is_symbol_char))).parse(input)
}

fn is_digit_start(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-') => matches!(chars.next(), Some(c) if c.is_ascii_digit()),
        _ => false,
    }
}


fn parse_string_literal(input: &str) -> IResult<&str, Value> {
    let (input, _) = char('"')(input)?;
    let mut out = String::new();
    let mut rest = input;
    loop {
        match rest.chars().next() {
            None => {
                // Unterminated: let the caller surface this as a reader error.
                return Ok((rest, Value::str(format!("\u{0}UNTERMINATED\u{0}{}", out))));
            }
            Some('"') => {
                rest = &rest[1..];
                break;
            }
            Some('\\') => {
                // Only \" is unescaped; every other backslash sequence, and a
                // bare backslash, passes through literally.
                let mut it = rest.char_indices();
                it.next();
                match it.next() {
                    Some((_, '"')) => {
                        out.push('"');
                        rest = &rest[2..];
                    }
                    _ => {
                        out.push('\\');
                        rest = &rest[1..];
                    }
                }
            }
            Some(c) => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    Ok((rest, Value::str(out)))
}

/// `None` means the token looked like an integer (leading digit, or `-`
/// followed by a digit) but didn't fit in `i64` — a hard reader error, not a
/// fallback to reading it as a symbol.
fn parse_atom(input: &str) -> Result<(&str, Value), LispError> {
    let (rest, text) =
        parse_symbol_text(input).map_err(|_| LispError::reader_msg("malformed token"))?;
    let value = match text {
        "nil" => Value::Nil,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        t if is_digit_start(t) => {
            let n = t
                .parse::<i64>()
                .map_err(|_| LispError::reader_msg(format!("integer literal out of range: {}", t)))?;
            Value::Int(n)
        }
        t => Value::sym(t),
    };
    Ok((rest, value))
}

/// Reads exactly one form, then demands end-of-input (after trailing
/// whitespace/comments); extra forms or unterminated/unmatched syntax raise a
/// reader error.
pub fn read(input: &str) -> Result<Value, LispError> {
    let trimmed = input;
    let (rest, _) = ws_and_comments(trimmed).map_err(|_| LispError::reader_msg("bad input"))?;
    if rest.starts_with(')') {
        return Err(LispError::reader_msg("unmatched close parenthesis"));
    }
    if rest.starts_with('}') {
        return Err(LispError::reader_msg("unmatched close brace"));
    }
    let (rest, form) = read_form_checked(rest)?;
    let (rest, _) = ws_and_comments(rest).map_err(|_| LispError::reader_msg("bad input"))?;
    if !rest.is_empty() {
        return Err(LispError::reader_msg(format!(
            "junk at end of input: {}",
            rest
        )));
    }
    Ok(form)
}

/// Like `parse_form`, but rejects unterminated strings, and treats an
/// unmatched `)`/`}` as a hard error rather than a parse failure, matching the
/// original reader's two-marker-sentinel design.
fn read_form_checked(input: &str) -> Result<(&str, Value), LispError> {
    fn go(input: &str) -> Result<(&str, Value), LispError> {
        let (input, _) = ws_and_comments(input).map_err(|_| LispError::reader_msg("bad input"))?;
        if let Some(rest) = input.strip_prefix('(') {
            let mut items = Vec::new();
            let mut rest = rest;
            loop {
                let (after_ws, _) =
                    ws_and_comments(rest).map_err(|_| LispError::reader_msg("bad input"))?;
                if let Some(after_paren) = after_ws.strip_prefix(')') {
                    return Ok((after_paren, Value::list(&items)));
                }
                if after_ws.is_empty() {
                    return Err(LispError::reader_msg("missing closing parenthesis"));
                }
                let (after_form, form) = go(after_ws)?;
                items.push(form);
                rest = after_form;
            }
        } else if let Some(rest) = input.strip_prefix('{') {
            let mut items = Vec::new();
            let mut rest = rest;
            loop {
                let (after_ws, _) =
                    ws_and_comments(rest).map_err(|_| LispError::reader_msg("bad input"))?;
                if let Some(after_brace) = after_ws.strip_prefix('}') {
                    let mut full = vec![Value::sym("make-map")];
                    full.extend(items);
                    return Ok((after_brace, Value::list(&full)));
                }
                if after_ws.is_empty() {
                    return Err(LispError::reader_msg("missing closing brace"));
                }
                let (after_form, form) = go(after_ws)?;
                items.push(form);
                rest = after_form;
            }
        } else if input.starts_with(')') {
            Err(LispError::reader_msg("unmatched close parenthesis"))
        } else if input.starts_with('}') {
            Err(LispError::reader_msg("unmatched close brace"))
        } else if let Some(rest) = input.strip_prefix("'") {
            let (rest, form) = go(rest)?;
            Ok((rest, Value::list(&[Value::sym("quote"), form])))
        } else if let Some(rest) = input.strip_prefix('`') {
            let (rest, form) = go(rest)?;
            Ok((rest, Value::list(&[Value::sym("quasiquote"), form])))
        } else if let Some(rest) = input.strip_prefix(",@") {
            let (rest, form) = go(rest)?;
            Ok((rest, Value::list(&[Value::sym("splice-unquote"), form])))
        } else if let Some(rest) = input.strip_prefix(',') {
            let (rest, form) = go(rest)?;
            Ok((rest, Value::list(&[Value::sym("unquote"), form])))
        } else if input.starts_with('"') {
            match parse_string_literal(input) {
                Ok((rest, Value::Str(s))) if s.starts_with('\u{0}') => {
                    let _ = rest;
                    Err(LispError::reader_msg("unbalanced quotation marks"))
                }
                Ok((rest, v)) => Ok((rest, v)),
                Err(_) => Err(LispError::reader_msg("unbalanced quotation marks")),
            }
        } else if input.is_empty() {
            Err(LispError::reader_msg("no form to read"))
        } else {
            parse_atom(input)
        }
    }
    go(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_integers_and_symbols() {
        assert_eq!(read("42").unwrap().as_int(), Some(42));
        assert_eq!(read("-7").unwrap().as_int(), Some(-7));
        assert_eq!(read("foo?").unwrap().as_symbol(), Some("foo?"));
    }

    #[test]
    fn reads_nested_lists() {
        let v = read("(1 (2 3) 4)").unwrap();
        assert_eq!(v.repr(), "(1 (2 3) 4)");
    }

    #[test]
    fn reads_quote_forms() {
        assert_eq!(read("'x").unwrap().repr(), "(quote x)");
        assert_eq!(read("`x").unwrap().repr(), "(quasiquote x)");
        assert_eq!(read(",x").unwrap().repr(), "(unquote x)");
        assert_eq!(read(",@x").unwrap().repr(), "(splice-unquote x)");
    }

    #[test]
    fn reads_map_literal_as_make_map_call() {
        let v = read("{}").unwrap();
        assert_eq!(v.repr(), "(make-map)");
    }

    #[test]
    fn string_escapes_only_backslash_quote() {
        let v = read(r#""a\"b\nc""#).unwrap();
        assert_eq!(v.as_str().unwrap(), "a\"b\\nc");
    }

    #[test]
    fn unmatched_close_paren_is_an_error() {
        assert!(read(")").is_err());
        assert!(read("(1 2").is_err());
    }

    #[test]
    fn trailing_junk_is_an_error() {
        assert!(read("1 2").is_err());
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(read("").is_err());
        assert!(read("  ; just a comment").is_err());
    }

    #[test]
    fn oversized_integer_literal_is_a_reader_error_not_a_symbol() {
        assert!(read("99999999999999999999").is_err());
    }
}
