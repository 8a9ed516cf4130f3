//! The builtins that reach back into the evaluator, reader, or VM:
//! `-def-internal!`, `-make-macro!`, `eval`, `mapcar`, `throw`, `assemble`,
//! `run-bytecode`.

use gel_macros::builtin;

use crate::env::Environment;
use crate::error::{ErrorKind, LispError};
use crate::eval::apply_to_completion;
use crate::value::Value;

use super::check_num_args;

/// `def`'s primitive: always writes into the global frame, evaluated value
/// already computed by the caller (the `boot.gel` `def` macro quotes the
/// symbol and passes the already-evaluated value).
#[builtin(name = "-def-internal!", contextual)]
pub fn def_internal(args: &Value, env: &Environment, _callstack: &Value) -> Result<Value, LispError> {
    check_num_args(args, 2)?;
    let sym = args
        .car()?
        .as_symbol()
        .ok_or_else(|| LispError::eval_msg(format!("bad values passed to def: {}", args.repr())))?
        .to_string();
    let val = args.cadr()?;
    env.global().define_global(sym, val.clone());
    Ok(val)
}

#[builtin(name = "-make-macro!")]
pub fn make_macro(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    let f = args.car()?;
    let Value::UserFn(u) = &f else {
        return Err(LispError::eval_msg(format!("argument is not a function: {}", f.repr())));
    };
    if u.macro_flag.get() {
        return Err(LispError::eval_msg("argument is already a macro."));
    }
    u.macro_flag.set(true);
    Ok(f)
}

/// Always evaluates in the global frame, never the caller's lexical scope —
/// intentional, matching other Lisps' `eval`.
#[builtin(name = "eval", contextual)]
pub fn eval(args: &Value, env: &Environment, callstack: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    crate::eval::eval(&env.global(), args.car()?, callstack)
}

#[builtin(name = "mapcar", contextual)]
pub fn mapcar(args: &Value, env: &Environment, callstack: &Value) -> Result<Value, LispError> {
    check_num_args(args, 2)?;
    let func = args.car()?;
    if !matches!(func, Value::Builtin(_) | Value::UserFn(_)) {
        return Err(LispError::eval_msg(format!(
            "bad argument type: first argument should be a function: {}",
            func.repr()
        )));
    }
    let mut out = Vec::new();
    for item in args.cadr()?.iter_list() {
        let single = Value::list(&[item]);
        out.push(apply_to_completion(&func, &single, env, callstack)?);
    }
    Ok(Value::list(&out))
}

#[builtin(name = "throw")]
pub fn throw(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    Err(LispError::new(ErrorKind::Lisp, args.car()?, Value::Nil))
}

#[builtin(name = "assemble")]
pub fn assemble(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    crate::vm::assemble(&args.car()?)
}

#[builtin(name = "run-bytecode")]
pub fn run_bytecode(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    crate::vm::run_bytecode(&args.car()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BuiltinKind;

    #[test]
    fn def_internal_writes_global_frame() {
        let root = Environment::new_root();
        let child = root.extend([]);
        def_internal(&Value::list(&[Value::sym("x"), Value::Int(5)]), &child, &Value::Nil).unwrap();
        assert_eq!(root.lookup("x").unwrap().as_int(), Some(5));
    }

    #[test]
    fn make_macro_rejects_builtins() {
        let f = Value::new_builtin("f", BuiltinKind::Plain(throw));
        assert!(make_macro(&Value::list(&[f])).is_err());
    }

    #[test]
    fn make_macro_rejects_already_macro() {
        let env = Environment::new_root();
        let f = Value::new_userfn(Value::Nil, Value::Nil, env);
        let made = make_macro(&Value::list(&[f])).unwrap();
        assert!(make_macro(&Value::list(&[made])).is_err());
    }

    #[test]
    fn throw_preserves_the_raw_payload() {
        let err = throw(&Value::list(&[Value::sym("boom")])).unwrap_err();
        assert_eq!(err.payload.as_symbol(), Some("boom"));
    }

    #[test]
    fn mapcar_applies_a_builtin_to_each_element() {
        // Arguments reach a builtin already evaluated, so `func` here is the
        // builtin value itself, not the symbol naming it.
        fn double(args: &Value) -> Result<Value, LispError> {
            Ok(Value::Int(args.car()?.as_int().unwrap() * 2))
        }
        let env = Environment::new_root();
        let func = Value::new_builtin("double", BuiltinKind::Plain(double));
        let list = Value::list(&[Value::Int(1), Value::Int(2), Value::Int(3)]);
        let r = mapcar(&Value::list(&[func, list]), &env, &Value::Nil).unwrap();
        assert_eq!(r.repr(), "(2 4 6)");
    }
}
