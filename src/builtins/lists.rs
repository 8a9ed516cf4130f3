//! List operations. All copy-on-write at the Lisp level: `copy-list`/
//! `concat`/`reversed` never share structure with their input, so later
//! `rplaca!`/`rplacd!` on a result doesn't alias the argument.

use crate::env::Environment;
use crate::error::LispError;
use crate::value::{BuiltinKind, Value};

use super::check_num_args;

fn cons(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 2)?;
    Ok(Value::cons(args.car()?, args.cadr()?))
}

fn cons_p(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    Ok(Value::Bool(args.car()?.as_cons().is_some()))
}

fn empty_p(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    Ok(Value::Bool(args.car()?.is_nil()))
}

fn len(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    Ok(Value::Int(args.car()?.len()))
}

fn list(args: &Value) -> Result<Value, LispError> {
    Ok(args.clone())
}

fn car(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    args.car()?.car()
}

fn cdr(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    args.car()?.cdr()
}

fn cadr(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    args.car()?.cadr()
}

fn cddr(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    args.car()?.cddr()
}

/// The last cons of the spine, per the original's `tail`.
fn tail_of(v: &Value) -> Result<Value, LispError> {
    let mut ret = v.clone();
    loop {
        let next = ret.cdr()?;
        if next.is_nil() {
            return Ok(ret);
        }
        ret = next;
    }
}

fn tail(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    tail_of(&args.car()?)
}

fn last(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    tail_of(&args.car()?)?.car()
}

fn copy_list(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    Ok(Value::list(&args.car()?.iter_list().collect::<Vec<_>>()))
}

fn reversed(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 1)?;
    let mut res = Value::Nil;
    for item in args.car()?.iter_list() {
        res = Value::cons(item, res);
    }
    Ok(res)
}

fn concat(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 2)?;
    let (l1, l2) = (args.car()?, args.cadr()?);
    let res = Value::list(&l1.iter_list().collect::<Vec<_>>());
    if res.is_nil() {
        return Ok(Value::list(&l2.iter_list().collect::<Vec<_>>()));
    }
    tail_of(&res)?.rplacd(Value::list(&l2.iter_list().collect::<Vec<_>>()))?;
    Ok(res)
}

fn rplaca(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 2)?;
    args.car()?.rplaca(args.cadr()?)
}

fn rplacd(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 2)?;
    args.car()?.rplacd(args.cadr()?)
}

pub fn register(env: &Environment) {
    env.define_global("cons", Value::new_builtin("cons", BuiltinKind::Plain(cons)));
    env.define_global("cons?", Value::new_builtin("cons?", BuiltinKind::Plain(cons_p)));
    env.define_global("empty?", Value::new_builtin("empty?", BuiltinKind::Plain(empty_p)));
    env.define_global("len", Value::new_builtin("len", BuiltinKind::Plain(len)));
    env.define_global("list", Value::new_builtin("list", BuiltinKind::Plain(list)));
    env.define_global("car", Value::new_builtin("car", BuiltinKind::Plain(car)));
    env.define_global("cdr", Value::new_builtin("cdr", BuiltinKind::Plain(cdr)));
    env.define_global("cadr", Value::new_builtin("cadr", BuiltinKind::Plain(cadr)));
    env.define_global("cddr", Value::new_builtin("cddr", BuiltinKind::Plain(cddr)));
    env.define_global("last", Value::new_builtin("last", BuiltinKind::Plain(last)));
    env.define_global("tail", Value::new_builtin("tail", BuiltinKind::Plain(tail)));
    env.define_global(
        "copy-list",
        Value::new_builtin("copy-list", BuiltinKind::Plain(copy_list)),
    );
    env.define_global(
        "reversed",
        Value::new_builtin("reversed", BuiltinKind::Plain(reversed)),
    );
    env.define_global("concat", Value::new_builtin("concat", BuiltinKind::Plain(concat)));
    env.define_global(
        "rplaca!",
        Value::new_builtin("rplaca!", BuiltinKind::Plain(rplaca)),
    );
    env.define_global(
        "rplacd!",
        Value::new_builtin("rplacd!", BuiltinKind::Plain(rplacd)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cons_builds_a_pair() {
        let r = cons(&Value::list(&[Value::Int(1), Value::Int(2)])).unwrap();
        assert_eq!(r.repr(), "(1 . 2)");
    }

    #[test]
    fn last_and_tail_differ() {
        let l = Value::list(&[Value::Int(1), Value::Int(2), Value::Int(3)]);
        let args = Value::list(&[l]);
        assert_eq!(last(&args).unwrap().as_int(), Some(3));
        assert_eq!(tail(&args).unwrap().repr(), "(3)");
    }

    #[test]
    fn reversed_builds_a_distinct_chain() {
        let l = Value::list(&[Value::Int(1), Value::Int(2), Value::Int(3)]);
        let r = reversed(&Value::list(&[l.clone()])).unwrap();
        assert_eq!(r.repr(), "(3 2 1)");
        assert!(reversed(&Value::list(&[r])).unwrap().equals(&l));
    }

    #[test]
    fn concat_copies_left_argument() {
        let l1 = Value::list(&[Value::Int(1), Value::Int(2)]);
        let l2 = Value::list(&[Value::Int(3), Value::Int(4)]);
        let r = concat(&Value::list(&[l1.clone(), l2])).unwrap();
        assert_eq!(r.repr(), "(1 2 3 4)");
        // mutating the result's spine must not affect l1
        r.rplaca(Value::Int(99)).unwrap();
        assert_eq!(l1.car().unwrap().as_int(), Some(1));
    }

    #[test]
    fn rplacd_can_build_a_cycle() {
        let a = Value::cons(Value::Int(1), Value::Nil);
        let r = rplacd(&Value::list(&[a.clone(), a.clone()])).unwrap();
        assert!(r.cdr().unwrap().equals(&a));
    }
}
