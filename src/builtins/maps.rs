//! Map operations: `make-map`, `map-get`, `map-set`. Keys are compared by
//! `repr`, not identity, so `1` and the symbol naming it are distinct keys
//! but two equal strings collide.

use gel_macros::builtin;

use crate::error::LispError;
use crate::value::Value;

use super::check_num_args;

/// Builds a map from an even-length, flat `key val key val ...` argument
/// list.
#[builtin(name = "make-map", category = "Maps")]
pub fn make_map(args: &Value) -> Result<Value, LispError> {
    let map = Value::new_map();
    let mut cur = args.clone();
    while !cur.is_nil() {
        let key = cur.car()?;
        let val = cur.cadr()?;
        if let Value::Map(m) = &map {
            m.borrow_mut().set(key, val);
        }
        cur = cur.cddr()?;
    }
    Ok(map)
}

#[builtin(name = "map-get", category = "Maps")]
pub fn map_get(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 2)?;
    match args.car()? {
        Value::Map(m) => Ok(m.borrow().get(&args.cadr()?)),
        other => Err(LispError::lisp_msg(format!("not a map: {}", other.repr()))),
    }
}

#[builtin(name = "map-set", category = "Maps")]
pub fn map_set(args: &Value) -> Result<Value, LispError> {
    check_num_args(args, 3)?;
    let key = args.cadr()?;
    let val = args.cddr()?.car()?;
    match args.car()? {
        Value::Map(m) => {
            m.borrow_mut().set(key, val.clone());
            Ok(val)
        }
        other => Err(LispError::lisp_msg(format!("not a map: {}", other.repr()))),
    }
}
