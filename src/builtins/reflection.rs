//! Introspection: `type`, `hash`, `is-builtin?`, `defined?`, `env-get`,
//! `get-function-name`, `set-function-name!`.
//!
//! `is-builtin?`/`defined?`/`env-get` are contextual: like `eval`, they
//! always consult the global frame rather than a caller's lexical scope.

use crate::env::Environment;
use crate::error::LispError;
use crate::value::{BuiltinKind, Value};

use super::check_num_args;

fn type_of(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    let obj = args.car()?;
    if obj.is_nil() {
        return Ok(Value::sym("nil-type"));
    }
    Ok(Value::sym(obj.type_string()))
}

fn hash(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    Ok(Value::Int(args.car()?.hash_value()))
}

fn expect_symbol_arg(args: &Value, what: &str) -> Result<String, LispError> {
    args.car()?
        .as_symbol()
        .map(String::from)
        .ok_or_else(|| LispError::lisp_msg(format!("{} is not a symbol.", what)))
}

/// Matches the original's `map_get(repl_env, sym) != Nil`: true for any
/// non-nil binding in the global frame, not just `Builtin` values.
fn is_builtin(args: &Value, env: &Environment, _callstack: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    let sym = expect_symbol_arg(args, "Argument")?;
    match env.global().lookup(&sym) {
        Some(v) if !v.is_nil() => Ok(Value::Bool(true)),
        _ => Ok(Value::Bool(false)),
    }
}

fn defined_p(args: &Value, env: &Environment, _callstack: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    let sym = expect_symbol_arg(args, "Argument")?;
    Ok(Value::Bool(env.global().is_defined(&sym)))
}

fn env_get(args: &Value, env: &Environment, _callstack: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    let sym = expect_symbol_arg(args, "First argument to env-get")?;
    env.global()
        .lookup(&sym)
        .ok_or_else(|| LispError::lisp_msg(format!("key to env-get not in symbol table: {}", sym)))
}

fn function_name(v: &Value) -> Option<&std::cell::RefCell<String>> {
    match v {
        Value::Builtin(b) => Some(&b.name),
        Value::UserFn(f) => Some(&f.name),
        _ => None,
    }
}

fn get_function_name(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    let f = args.car()?;
    let name = function_name(&f)
        .ok_or_else(|| LispError::lisp_msg("argument to get-function-name is not a function."))?
        .borrow()
        .clone();
    Ok(Value::str(name))
}

fn set_function_name(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 2)?;
    let f = args.car()?;
    let new_name = args
        .cadr()?
        .as_str()
        .ok_or_else(|| LispError::lisp_msg("second argument to set-function-name is not a string."))?
        .to_string();
    let cell = function_name(&f)
        .ok_or_else(|| LispError::lisp_msg("first argument to set-function-name is not a function."))?;
    *cell.borrow_mut() = new_name;
    Ok(f)
}

pub fn register(env: &Environment) {
    env.define_global("type", Value::new_builtin("type", BuiltinKind::Plain(type_of)));
    env.define_global("hash", Value::new_builtin("hash", BuiltinKind::Plain(hash)));
    env.define_global(
        "is-builtin?",
        Value::new_builtin("is-builtin?", BuiltinKind::Contextual(is_builtin)),
    );
    env.define_global(
        "defined?",
        Value::new_builtin("defined?", BuiltinKind::Contextual(defined_p)),
    );
    env.define_global(
        "env-get",
        Value::new_builtin("env-get", BuiltinKind::Contextual(env_get)),
    );
    env.define_global(
        "get-function-name",
        Value::new_builtin("get-function-name", BuiltinKind::Plain(get_function_name)),
    );
    env.define_global(
        "set-function-name!",
        Value::new_builtin("set-function-name!", BuiltinKind::Plain(set_function_name)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_of_nil_is_nil_type_not_nil() {
        assert_eq!(type_of(&Value::list(&[Value::Nil])).unwrap().as_symbol(), Some("nil-type"));
    }

    #[test]
    fn type_of_int_names_the_variant() {
        assert_eq!(type_of(&Value::list(&[Value::Int(1)])).unwrap().as_symbol(), Some("int"));
    }

    #[test]
    fn is_builtin_is_true_for_any_non_nil_global_binding() {
        let root = Environment::new_root();
        root.define_global("double", Value::new_builtin("double", BuiltinKind::Plain(type_of)));
        root.define_global("x", Value::Int(1));
        let child = root.extend([]);
        assert!(is_builtin(&Value::list(&[Value::sym("double")]), &child, &Value::Nil)
            .unwrap()
            .is_truthy());
        assert!(is_builtin(&Value::list(&[Value::sym("x")]), &child, &Value::Nil)
            .unwrap()
            .is_truthy());
        assert!(!is_builtin(&Value::list(&[Value::sym("y")]), &child, &Value::Nil)
            .unwrap()
            .is_truthy());
    }

    #[test]
    fn defined_p_consults_the_global_frame() {
        let root = Environment::new_root();
        root.define_global("x", Value::Int(1));
        let child = root.extend([]);
        assert!(defined_p(&Value::list(&[Value::sym("x")]), &child, &Value::Nil)
            .unwrap()
            .is_truthy());
        assert!(!defined_p(&Value::list(&[Value::sym("y")]), &child, &Value::Nil)
            .unwrap()
            .is_truthy());
    }

    #[test]
    fn set_function_name_mutates_builtin_name() {
        let f = Value::new_builtin("old", BuiltinKind::Plain(type_of));
        let renamed = set_function_name(&Value::list(&[f, Value::str("new")])).unwrap();
        assert_eq!(get_function_name(&Value::list(&[renamed])).unwrap().as_str(), Some("new"));
    }
}
