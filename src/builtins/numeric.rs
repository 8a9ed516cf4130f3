//! Integer arithmetic: `+`, `-`, `*`, `//`, `%`, and the `INT_MAX`/`INT_MIN`
//! constants. All arithmetic is checked, per the fixed-width integer
//! contract: overflow raises rather than wrapping.
//!
//! Variadic shape mirrors the original: `+`/`-`/`*`/`//` fold left to right
//! over any number of arguments (`-`/`*`/`//` need at least one), `%` takes
//! exactly two.

use crate::env::Environment;
use crate::value::{BuiltinKind, Value};

use super::{check_num_args, expect_int};
use crate::error::LispError;

fn fold_ints(args: &Value, op_name: &str) -> Result<Vec<i64>, LispError> {
    args.iter_list()
        .map(|a| expect_int(&a, &format!("argument to {}", op_name)))
        .collect()
}

fn add(args: &Value) -> Result<Value, LispError> {
    let mut sum: i64 = 0;
    for n in fold_ints(args, "+")? {
        sum = sum
            .checked_add(n)
            .ok_or_else(|| LispError::lisp_msg("integer overflow in +"))?;
    }
    Ok(Value::Int(sum))
}

fn sub(args: &Value) -> Result<Value, LispError> {
    check_num_args_at_least(args, 1, "-")?;
    let nums = fold_ints(args, "-")?;
    let mut acc = nums[0];
    for n in &nums[1..] {
        acc = acc
            .checked_sub(*n)
            .ok_or_else(|| LispError::lisp_msg("integer overflow in -"))?;
    }
    Ok(Value::Int(acc))
}

fn mul(args: &Value) -> Result<Value, LispError> {
    check_num_args_at_least(args, 1, "*")?;
    let nums = fold_ints(args, "*")?;
    let mut acc = nums[0];
    for n in &nums[1..] {
        acc = acc
            .checked_mul(*n)
            .ok_or_else(|| LispError::lisp_msg("integer overflow in *"))?;
    }
    Ok(Value::Int(acc))
}

fn int_divide(args: &Value) -> Result<Value, LispError> {
    check_num_args_at_least(args, 1, "//")?;
    let nums = fold_ints(args, "//")?;
    let mut acc = nums[0];
    for n in &nums[1..] {
        if *n == 0 {
            return Err(LispError::lisp_msg("division by zero in //"));
        }
        acc = acc
            .checked_div(*n)
            .ok_or_else(|| LispError::lisp_msg("integer overflow in //"))?;
    }
    Ok(Value::Int(acc))
}

fn rem(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 2)?;
    let lhs = expect_int(&args.car()?, "argument to %")?;
    let rhs = expect_int(&args.cadr()?, "argument to %")?;
    if rhs == 0 {
        return Err(LispError::lisp_msg("division by zero in %"));
    }
    Ok(Value::Int(lhs % rhs))
}

fn rand(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 0)?;
    // Not seeded, matching the original's bare libc `rand()` call: callers
    // who need reproducibility are out of luck in both implementations.
    Ok(Value::Int(rand_i64()))
}

fn rand_i64() -> i64 {
    use std::cell::Cell;
    use std::time::{SystemTime, UNIX_EPOCH};
    thread_local! {
        static STATE: Cell<u64> = Cell::new(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x9E3779B97F4A7C15)
                | 1,
        );
    }
    STATE.with(|state| {
        // xorshift64*: good enough for a language-level `rand`, not a CSPRNG.
        let mut x = state.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        state.set(x);
        (x.wrapping_mul(0x2545F4914F6CDD1D) >> 1) as i64
    })
}

fn check_num_args_at_least(args: &Value, n: i64, op_name: &str) -> Result<(), LispError> {
    if args.len() < n {
        return Err(LispError::lisp_msg(format!(
            "{} needs at least {} argument(s), got {}",
            op_name,
            n,
            args.repr()
        )));
    }
    Ok(())
}

pub fn register(env: &Environment) {
    env.define_global("+", Value::new_builtin("+", BuiltinKind::Plain(add)));
    env.define_global("-", Value::new_builtin("-", BuiltinKind::Plain(sub)));
    env.define_global("*", Value::new_builtin("*", BuiltinKind::Plain(mul)));
    env.define_global("//", Value::new_builtin("//", BuiltinKind::Plain(int_divide)));
    env.define_global("%", Value::new_builtin("%", BuiltinKind::Plain(rem)));
    env.define_global("rand", Value::new_builtin("rand", BuiltinKind::Plain(rand)));
    env.define_global("INT_MAX", Value::Int(i64::MAX));
    env.define_global("INT_MIN", Value::Int(i64::MIN));
}
