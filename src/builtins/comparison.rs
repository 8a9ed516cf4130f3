//! Value comparison: `=` (structural/identity equality, per `Value::equals`)
//! and the integer-only `<`/`>`.

use crate::env::Environment;
use crate::error::LispError;
use crate::value::{BuiltinKind, Value};

use super::check_num_args;

fn eq(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 2)?;
    Ok(Value::Bool(args.car()?.equals(&args.cadr()?)))
}

fn int_pair(args: &Value, op_name: &str) -> Result<(i64, i64), LispError> {
    check_num_args(args, 2)?;
    let (a, b) = (args.car()?, args.cadr()?);
    match (a.as_int(), b.as_int()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(LispError::eval_msg(format!(
            "bad argument types to {}: {} {}",
            op_name,
            a.repr(),
            b.repr()
        ))),
    }
}

fn lt(args: &Value) -> Result<Value, LispError> {
    let (a, b) = int_pair(args, "<")?;
    Ok(Value::Bool(a < b))
}

fn gt(args: &Value) -> Result<Value, LispError> {
    let (a, b) = int_pair(args, ">")?;
    Ok(Value::Bool(a > b))
}

pub fn register(env: &Environment) {
    env.define_global("=", Value::new_builtin("=", BuiltinKind::Plain(eq)));
    env.define_global("<", Value::new_builtin("<", BuiltinKind::Plain(lt)));
    env.define_global(">", Value::new_builtin(">", BuiltinKind::Plain(gt)));
}
