//! The fixed built-in library, organized into one submodule per category.
//!
//! Registration follows the teacher's organic split: categories whose
//! functions are all plain `fn(&Value) -> Result<Value, LispError>` register
//! by hand (numeric, comparison, lists, reflection); categories that lean on
//! the `#[builtin]` attribute (maps, strings, language) let the macro
//! generate the `env.define_global` boilerplate.

use std::cell::RefCell;

use crate::env::Environment;
use crate::error::LispError;
use crate::sandbox::Sandbox;
use crate::value::Value;

pub mod comparison;
pub mod language;
pub mod lists;
pub mod maps;
pub mod numeric;
pub mod reflection;
pub mod strings;

thread_local! {
    static SANDBOX: RefCell<Option<Sandbox>> = const { RefCell::new(None) };
}

/// Installs the sandbox used by `slurp`. Must be called once before running
/// any script that touches the filesystem.
pub fn install_sandbox(sandbox: Sandbox) {
    SANDBOX.with(|cell| *cell.borrow_mut() = Some(sandbox));
}

fn with_sandbox<T>(f: impl FnOnce(&Sandbox) -> Result<T, LispError>) -> Result<T, LispError> {
    SANDBOX.with(|cell| match &*cell.borrow() {
        Some(sandbox) => f(sandbox),
        None => Err(LispError::lisp_msg("filesystem sandbox is not installed")),
    })
}

/// Checks `args` has exactly `n` elements, per the original's
/// `check_num_args` used at the top of nearly every builtin.
pub(crate) fn check_num_args(args: &Value, n: i64) -> Result<(), LispError> {
    let len = args.len();
    if len != n {
        return Err(LispError::lisp_msg(format!(
            "wrong number of arguments: {}, expected {}",
            args.repr(),
            n
        )));
    }
    Ok(())
}

pub(crate) fn expect_int(v: &Value, what: &str) -> Result<i64, LispError> {
    v.as_int()
        .ok_or_else(|| LispError::lisp_msg(format!("{} is not an int: {}", what, v.repr())))
}

pub(crate) fn expect_str<'a>(v: &'a Value, what: &str) -> Result<&'a str, LispError> {
    v.as_str()
        .ok_or_else(|| LispError::lisp_msg(format!("{} is not a string: {}", what, v.repr())))
}

pub fn register_builtins(env: &Environment) {
    numeric::register(env);
    comparison::register(env);
    lists::register(env);
    maps::register_make_map(env);
    maps::register_map_get(env);
    maps::register_map_set(env);
    strings::register_repr(env);
    strings::register_prn(env);
    strings::register_put(env);
    strings::register_strcat(env);
    strings::register_str_eq(env);
    strings::register_slurp(env);
    strings::register_read_string(env);
    strings::register_input(env);
    reflection::register(env);
    language::register_def_internal(env);
    language::register_make_macro(env);
    language::register_eval(env);
    language::register_mapcar(env);
    language::register_throw(env);
    language::register_assemble(env);
    language::register_run_bytecode(env);
}
