//! String and console I/O builtins: `repr`, `prn`, `put`, `strcat`, `str=`,
//! `slurp`, `read-string`, `input`.

use std::io::{self, BufRead, Write};

use gel_macros::builtin;

use crate::error::LispError;
use crate::value::Value;

use super::{check_num_args, with_sandbox};

/// `try_str` in the original: strings print bare, everything else reprs.
fn try_str(v: &Value) -> String {
    v.display_str()
}

#[builtin(name = "repr", category = "String/IO")]
pub fn repr(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    Ok(Value::str(args.car()?.repr()))
}

#[builtin(name = "prn", category = "String/IO")]
pub fn prn(args: &Value) -> Result<Value, LispError> {
    let mut out = String::new();
    for a in args.iter_list() {
        out.push_str(&try_str(&a));
    }
    println!("{}", out);
    Ok(Value::Nil)
}

#[builtin(name = "put", category = "String/IO")]
pub fn put(args: &Value) -> Result<Value, LispError> {
    let mut out = String::new();
    for a in args.iter_list() {
        out.push_str(&try_str(&a));
    }
    print!("{}", out);
    io::stdout()
        .flush()
        .map_err(|e| LispError::lisp_msg(format!("write error: {}", e)))?;
    Ok(Value::Nil)
}

#[builtin(name = "strcat", category = "String/IO")]
pub fn strcat(args: &Value) -> Result<Value, LispError> {
    let mut out = String::new();
    for a in args.iter_list() {
        out.push_str(&try_str(&a));
    }
    Ok(Value::str(out))
}

#[builtin(name = "str=", category = "String/IO")]
pub fn str_eq(args: &Value) -> Result<Value, LispError> {
    let mut items = args.iter_list();
    let Some(first) = items.next() else {
        return Ok(Value::Bool(true));
    };
    let Some(first_str) = first.as_str() else {
        return Ok(Value::Bool(false));
    };
    for item in items {
        match item.as_str() {
            Some(s) if s == first_str => continue,
            _ => return Ok(Value::Bool(false)),
        }
    }
    Ok(Value::Bool(true))
}

#[builtin(name = "slurp", category = "String/IO")]
pub fn slurp(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    let path = args
        .car()?
        .as_str()
        .ok_or_else(|| LispError::eval_msg("argument to slurp should be a string"))?
        .to_string();
    with_sandbox(|sandbox| {
        sandbox
            .read_file(&path)
            .map(Value::str)
            .map_err(|e| LispError::lisp_msg(e.to_string()))
    })
}

#[builtin(name = "read-string", category = "String/IO")]
pub fn read_string(args: &Value) -> Result<Value, LispError> {
    let mut text = String::new();
    for a in args.iter_list() {
        text.push_str(
            a.as_str()
                .ok_or_else(|| LispError::eval_msg(format!("bad argument type: {}", a.repr())))?,
        );
    }
    match crate::reader::read(&text) {
        Ok(v) => Ok(v),
        // Only the empty/no-form case substitutes Nil; a genuine syntax
        // error (unbalanced parens, bad token, junk at end) propagates.
        Err(e) if e.payload.as_str() == Some("no form to read") => Ok(Value::Nil),
        Err(e) => Err(e),
    }
}

#[builtin(name = "input", category = "String/IO")]
pub fn input(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 0)?;
    let mut line = String::new();
    let n = io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| LispError::lisp_msg(format!("read error: {}", e)))?;
    if n == 0 {
        return Ok(Value::Nil);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Value::str(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_prn_use_display_str_not_repr() {
        let args = Value::list(&[Value::str("hi"), Value::Int(1)]);
        assert_eq!(try_str(&args.car().unwrap()), "hi");
        let r = strcat(&args).unwrap();
        assert_eq!(r.as_str(), Some("hi1"));
    }

    #[test]
    fn str_eq_requires_all_strings() {
        let a = Value::list(&[Value::str("x"), Value::str("x")]);
        assert!(str_eq(&a).unwrap().is_truthy());
        let b = Value::list(&[Value::str("x"), Value::Int(1)]);
        assert!(!str_eq(&b).unwrap().is_truthy());
    }

    #[test]
    fn read_string_parses_one_form() {
        let r = read_string(&Value::list(&[Value::str("(+ 1 2)")])).unwrap();
        assert_eq!(r.repr(), "(+ 1 2)");
    }

    #[test]
    fn read_string_of_empty_input_is_nil() {
        let r = read_string(&Value::list(&[Value::str("")])).unwrap();
        assert!(r.is_nil());
    }

    #[test]
    fn read_string_propagates_a_real_syntax_error() {
        assert!(read_string(&Value::list(&[Value::str("(1 2")])).is_err());
    }

    #[test]
    fn repr_quotes_strings_but_display_does_not() {
        assert_eq!(repr(&Value::list(&[Value::str("x")])).unwrap().as_str(), Some("\"x\""));
    }
}
