//! End-to-end scenarios: reader -> evaluator -> VM, exercised the way a
//! script would exercise them, without going through the CLI.

use gel::builtins::register_builtins;
use gel::env::Environment;
use gel::eval::eval;
use gel::reader::read;
use gel::value::Value;

fn setup() -> Environment {
    let builtins_env = Environment::new_root();
    register_builtins(&builtins_env);
    builtins_env.extend([])
}

fn run(env: &Environment, src: &str) -> Value {
    let form = read(src).unwrap_or_else(|e| panic!("parse error in {:?}: {}", src, e));
    eval(env, form, &Value::Nil).unwrap_or_else(|e| panic!("eval error in {:?}: {}", src, e))
}

#[test]
fn scenario_1_variadic_addition() {
    let env = setup();
    assert_eq!(run(&env, "(+ 1 2 3)").as_int(), Some(6));
}

#[test]
fn scenario_2_repeated_def_in_a_function_body() {
    let env = setup();
    let result = run(
        &env,
        "((fn () (-def-internal! 'x 1) (-def-internal! 'x 2) x))",
    );
    assert_eq!(result.as_int(), Some(2));
}

#[test]
fn scenario_3_mutual_recursion_via_global_self_reference() {
    let env = setup();
    let make_fn = read(
        "(fn (n) (if (< n 2) n (+ (rec (- n 1)) (rec (- n 2)))))",
    )
    .unwrap();
    let rec = eval(&env, make_fn, &Value::Nil).unwrap();
    env.define_global("rec", rec);
    assert_eq!(run(&env, "(rec 10)").as_int(), Some(55));
}

#[test]
fn scenario_4_try_catches_a_thrown_string() {
    let env = setup();
    let result = run(&env, "(try (throw \"oops\") e e)");
    assert_eq!(result.repr(), "\"oops\"");
}

#[test]
fn scenario_5_eval_of_a_quasiquoted_form_with_unquote() {
    let env = setup();
    let result = run(&env, "(eval `(+ 1 ,(+ 2 3)))");
    assert_eq!(result.as_int(), Some(6));
}

#[test]
fn scenario_6_bytecode_cons_pops_top_of_stack_as_car() {
    let env = setup();
    let result = run(&env, "(run-bytecode (assemble '((PUSH 1) (PUSH 2) (CONS))))");
    assert_eq!(result.repr(), "(2 . 1)");
}
