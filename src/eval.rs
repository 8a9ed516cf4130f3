//! The trampolined evaluator: special forms, macro expansion, function
//! application, tail-call optimization, and the `try`/`throw` raise channel.

use std::rc::Rc;

use crate::env::Environment;
use crate::error::LispError;
use crate::value::{BuiltinKind, UserFn, Value};

fn check_num_args(args: &Value, n: i64) -> Result<(), LispError> {
    let len = args.len();
    if len != n {
        return Err(LispError::eval_msg(format!(
            "wrong number of arguments: {}, expected {}",
            args.repr(),
            n
        )));
    }
    Ok(())
}

fn expect_symbol<'a>(v: &'a Value, what: &str) -> Result<&'a str, LispError> {
    v.as_symbol()
        .ok_or_else(|| LispError::eval_msg(format!("{} is not a symbol: {}", what, v.repr())))
}

/// `eval_ast`: a non-cons/non-symbol evaluates to itself; a symbol looks
/// itself up; a cons has each of its elements fully (non-tail) evaluated in
/// order, producing a fresh list.
fn eval_ast(env: &Environment, ast: &Value, callstack: &Value) -> Result<Value, LispError> {
    match ast {
        Value::Nil => Ok(Value::Nil),
        Value::Symbol(s) => env
            .lookup(s)
            .ok_or_else(|| LispError::eval_msg(format!("value {} not in symbol table", s))),
        Value::Cons(_) => {
            let mut items = Vec::new();
            for item in ast.iter_list() {
                items.push(eval(env, item, callstack)?);
            }
            Ok(Value::list(&items))
        }
        other => Ok(other.clone()),
    }
}

/// Expands `(splice-unquote e)`/`(unquote e)`/plain forms per §4.3, folding
/// right to left.
pub fn quasiquote(ast: &Value) -> Value {
    let Some(cell) = ast.as_cons() else {
        return Value::list(&[Value::sym("quote"), ast.clone()]);
    };

    if let Value::Symbol(s) = &*cell.car.borrow() {
        if &**s == "unquote" {
            return cell.cdr.borrow().car().unwrap_or(Value::Nil);
        }
    }

    let mut res = Value::Nil;
    let elements: Vec<Value> = ast.iter_list().collect();
    for elt in elements.into_iter().rev() {
        if let Some(elt_cell) = elt.as_cons() {
            if let Value::Symbol(s) = &*elt_cell.car.borrow() {
                if &**s == "splice-unquote" {
                    let spliced = elt_cell.cdr.borrow().car().unwrap_or(Value::Nil);
                    res = Value::list(&[Value::sym("concat"), spliced, res]);
                    continue;
                }
            }
        }
        res = Value::list(&[Value::sym("cons"), quasiquote(&elt), res]);
    }
    res
}

fn macro_flag(f: &Value) -> Option<bool> {
    match f {
        Value::Builtin(b) => Some(b.macro_flag.get()),
        Value::UserFn(u) => Some(u.macro_flag.get()),
        _ => None,
    }
}

fn is_macro_call(ast: &Value, env: &Environment) -> bool {
    let Some(cell) = ast.as_cons() else { return false };
    let head = cell.car.borrow().clone();
    let Value::Symbol(name) = &head else { return false };
    match env.lookup(name) {
        Some(v) => macro_flag(&v).unwrap_or(false),
        None => false,
    }
}

/// Repeatedly replaces `ast` with the result of calling the macro function on
/// its raw (unevaluated) argument list, until the head no longer names a
/// macro.
pub fn macroexpand(mut ast: Value, env: &Environment) -> Result<Value, LispError> {
    while is_macro_call(&ast, env) {
        let name = ast.car()?;
        let func = env.lookup(expect_symbol(&name, "macro name")?).unwrap();
        let args = ast.cdr()?;
        ast = apply_to_completion(&func, &args, env, &Value::Nil)?;
    }
    Ok(ast)
}

fn bind_params(f: &UserFn, args: &Value) -> Result<Environment, LispError> {
    let new_env = f.env.extend([]);
    let mut binding = f.params.clone();
    let mut arg = args.clone();
    loop {
        let binding_is_nil = binding.is_nil();
        let arg_is_nil = arg.is_nil();
        if binding_is_nil && !arg_is_nil {
            return Err(LispError::eval_msg(format!(
                "too many arguments to function: {}",
                args.repr()
            )));
        }
        if !binding_is_nil && arg_is_nil {
            let head = binding.car()?;
            if head.as_symbol() == Some("&rest") {
                new_env.define_here(expect_symbol(&binding.cadr()?, "&rest target")?, arg);
                return Ok(new_env);
            }
            return Err(LispError::eval_msg(format!(
                "too few arguments to function: {}",
                args.repr()
            )));
        }
        if binding_is_nil {
            break;
        }
        let head = binding.car()?;
        if head.as_symbol() == Some("&rest") {
            new_env.define_here(expect_symbol(&binding.cadr()?, "&rest target")?, arg);
            return Ok(new_env);
        }
        new_env.define_here(expect_symbol(&head, "parameter")?, arg.car()?);
        binding = binding.cdr()?;
        arg = arg.cdr()?;
    }
    Ok(new_env)
}

fn call_builtin(
    b: &Rc<crate::value::Builtin>,
    args: &Value,
    env_for_contextual: &Environment,
    callstack: &Value,
) -> Result<Value, LispError> {
    match b.kind {
        BuiltinKind::Plain(f) => f(args),
        BuiltinKind::Contextual(f) => f(args, env_for_contextual, callstack),
    }
}

/// Applies a function to completion (no tail-call re-entry into a caller's
/// trampoline). Used by macro expansion and by `mapcar`. `env` is consulted
/// only as the source of the global frame when `func` is a builtin — a
/// builtin body never sees a caller's lexical scope.
pub fn apply_to_completion(
    func: &Value,
    args: &Value,
    env: &Environment,
    callstack: &Value,
) -> Result<Value, LispError> {
    match func {
        Value::UserFn(f) => {
            let new_env = bind_params(f, args)?;
            let evald = eval_ast(&new_env, &f.body, callstack)?;
            evald
                .iter_list()
                .last()
                .ok_or_else(|| LispError::eval_msg("function body is empty"))
        }
        Value::Builtin(b) => call_builtin(b, args, &env.global(), callstack),
        _ => Err(LispError::eval_msg(format!(
            "can't apply something that isn't a function: {}",
            func.repr()
        ))),
    }
}

/// The trampoline: evaluates `input` in `env`, re-entering the loop in place
/// of a recursive call whenever a position is in tail position.
pub fn eval(env: &Environment, input: Value, old_callstack: &Value) -> Result<Value, LispError> {
    let mut env = env.clone();
    let mut input = input;
    let new_callstack = Value::cons(input.clone(), old_callstack.clone());

    loop {
        match &input {
            Value::Nil => return Ok(Value::Nil),
            Value::Symbol(_) => return eval_ast(&env, &input, &new_callstack),
            Value::Cons(_) => {}
            _ => return Ok(input),
        }

        input = macroexpand(input, &env)?;
        if input.as_cons().is_none() {
            return eval_ast(&env, &input, &new_callstack);
        }

        let fname = input.car()?;
        let args = input.cdr()?;
        let mut applied_special_form = true;

        if let Value::Symbol(name) = &fname {
            match name.as_ref() {
                "break" => return Ok(Value::Nil),
                "env" => return Ok(Value::Env(env.clone())),
                "set" => {
                    check_num_args(&args, 2)?;
                    let sym = expect_symbol(&args.car()?, "set target")?.to_string();
                    if !env.is_defined(&sym) {
                        return Err(LispError::eval_msg(format!("symbol {} not found", sym))
                            .with_call_stack(new_callstack));
                    }
                    let val = eval(&env, args.cadr()?, &new_callstack)?;
                    env.assign(&sym, val.clone())?;
                    return Ok(val);
                }
                "if" => {
                    check_num_args(&args, 3)?;
                    let cond = eval(&env, args.car()?, &new_callstack)?;
                    input = if cond.is_truthy() {
                        args.cadr()?
                    } else {
                        args.cddr()?.car()?
                    };
                    continue;
                }
                "fn" => {
                    let params = args.car()?;
                    let body = args.cdr()?;
                    return Ok(Value::new_userfn(params, body, env.clone()));
                }
                "quote" => {
                    check_num_args(&args, 1)?;
                    return args.car();
                }
                "quasiquote" => {
                    check_num_args(&args, 1)?;
                    input = quasiquote(&args.car()?);
                    continue;
                }
                "macroexpand" => {
                    check_num_args(&args, 1)?;
                    return macroexpand(args.car()?, &env);
                }
                "try" => {
                    check_num_args(&args, 3)?;
                    match eval(&env, args.car()?, &new_callstack) {
                        Ok(v) => return Ok(v),
                        Err(e) => {
                            let catch_form = args.cdr()?;
                            let catch_car = catch_form.car()?;
                            let sym = expect_symbol(&catch_car, "try handler binding")?;
                            env = env.extend([(sym.to_string(), e.payload.clone())]);
                            input = catch_form.cadr()?;
                            continue;
                        }
                    }
                }
                "apply" => {
                    // Falls through to the shared call path below, which
                    // re-evaluates every element of `arglist` as if it were
                    // a fresh form — fine for atoms, but a cons value in the
                    // argument list is evaluated as code, not data.
                    check_num_args(&args, 2)?;
                    let arglist = eval(&env, args.cadr()?, &new_callstack)?;
                    input = Value::cons(args.car()?, arglist);
                    applied_special_form = false;
                }
                _ => applied_special_form = false,
            }
        } else {
            applied_special_form = false;
        }

        if applied_special_form {
            continue;
        }

        let evald = eval_ast(&env, &input, &new_callstack)?;
        let Some(cell) = evald.as_cons() else {
            return Ok(evald);
        };
        let func = cell.car.borrow().clone();
        let call_args = cell.cdr.borrow().clone();

        match &func {
            Value::UserFn(f) => {
                let new_env = bind_params(f, &call_args)?;
                let body_list: Vec<Value> = f.body.iter_list().collect();
                if body_list.is_empty() {
                    return Err(LispError::eval_msg("function body is empty"));
                }
                if body_list.len() > 1 {
                    for form in &body_list[..body_list.len() - 1] {
                        eval(&new_env, form.clone(), &new_callstack)?;
                    }
                }
                env = new_env;
                input = body_list[body_list.len() - 1].clone();
                continue;
            }
            Value::Builtin(b) => {
                return call_builtin(b, &call_args, &env.global(), &new_callstack);
            }
            _ => {
                return Err(LispError::eval_msg(format!(
                    "failed to eval: first arg is not a function: {}",
                    func.repr()
                ))
                .with_call_stack(new_callstack))
            }
        }
    }
}
