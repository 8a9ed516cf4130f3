//! The bytecode VM: a small stack machine reachable from the language via
//! `assemble`/`run-bytecode`. Not used by the evaluator itself.

use std::rc::Rc;

use crate::error::LispError;
use crate::value::{Bytecode, Continuation, Instruction, Opcode, Value};

pub const MAX_STACK_SIZE: usize = 1024;

/// `assemble`: turns a list of `(OPCODE)` / `(OPCODE operand)` forms into a
/// Bytecode value. Opcodes are named by symbol, matching `opcode_names`.
pub fn assemble(list: &Value) -> Result<Value, LispError> {
    let mut code = Vec::new();
    for form in list.iter_list() {
        let len = form.len();
        let op_sym = form.car()?;
        let name = op_sym
            .as_symbol()
            .ok_or_else(|| LispError::lisp_msg(format!("bad opcode name: {}", op_sym.repr())))?;
        let op = Opcode::from_name(name)
            .ok_or_else(|| LispError::lisp_msg(format!("bad opcode name: {}", name)))?;
        let operand = match len {
            1 => Value::Nil,
            2 => form.cadr()?,
            _ => {
                return Err(LispError::lisp_msg(format!(
                    "bad number of arguments in opcode: {}; expected 0 or 1",
                    form.repr()
                )))
            }
        };
        code.push(Instruction { op, operand });
    }
    Ok(Value::Bytecode(Rc::new(Bytecode { code })))
}

/// `run-bytecode`: executes a Bytecode value and returns the value left at
/// the bottom of the operand stack.
pub fn run_bytecode(block: &Value) -> Result<Value, LispError> {
    let Value::Bytecode(start) = block else {
        return Err(LispError::lisp_msg("trying to run something that isn't bytecode"));
    };

    let mut stack: Vec<Value> = Vec::with_capacity(64);
    let mut current: Rc<Bytecode> = start.clone();
    let mut pc: usize = 0;

    macro_rules! push {
        ($v:expr) => {{
            if stack.len() >= MAX_STACK_SIZE {
                return Err(LispError::lisp_msg("bytecode stack overflow"));
            }
            stack.push($v);
        }};
    }
    macro_rules! pop {
        () => {
            stack
                .pop()
                .ok_or_else(|| LispError::lisp_msg("bytecode stack underflow"))?
        };
    }

    while pc < current.code.len() {
        let instr = &current.code[pc];
        match instr.op {
            Opcode::Push => {
                push!(instr.operand.clone());
            }
            Opcode::Cons => {
                if stack.len() < 2 {
                    return Err(LispError::lisp_msg("not enough arguments to CONS"));
                }
                let car = pop!();
                let cdr = pop!();
                push!(Value::cons(car, cdr));
            }
            Opcode::CallBuiltin => {
                let arglist = pop!();
                let result = match &instr.operand {
                    Value::Builtin(b) => match b.kind {
                        crate::value::BuiltinKind::Plain(f) => f(&arglist)?,
                        crate::value::BuiltinKind::Contextual(_) => {
                            return Err(LispError::lisp_msg(
                                "CALL_BUILTIN cannot invoke a contextual builtin",
                            ))
                        }
                    },
                    _ => return Err(LispError::lisp_msg("CALL_BUILTIN takes a function")),
                };
                push!(result);
            }
            Opcode::Call => {
                let new_block = match &instr.operand {
                    Value::Bytecode(b) => b.clone(),
                    _ => {
                        return Err(LispError::lisp_msg(
                            "tried to jump to something that isn't code",
                        ))
                    }
                };
                push!(Value::Continuation(Rc::new(Continuation {
                    block: current.clone(),
                    pc,
                })));
                current = new_block;
                pc = 0;
                continue;
            }
            Opcode::Ret => {
                let cont = match pop!() {
                    Value::Continuation(c) => c,
                    _ => return Err(LispError::lisp_msg("not a continuation")),
                };
                current = cont.block.clone();
                pc = cont.pc + 1;
                continue;
            }
            Opcode::Pop => {
                pop!();
            }
            Opcode::Jif => {
                let addr = instr
                    .operand
                    .as_int()
                    .ok_or_else(|| LispError::lisp_msg("jump address is not an int"))?;
                if addr < 0 {
                    return Err(LispError::lisp_msg("jump address is < 0"));
                }
                let cond = pop!();
                if cond.is_truthy() {
                    pc = addr as usize;
                    continue;
                }
            }
            Opcode::Jmp => {
                let addr = instr
                    .operand
                    .as_int()
                    .ok_or_else(|| LispError::lisp_msg("jump address is not an int"))?;
                if addr < 0 {
                    return Err(LispError::lisp_msg("jump address is < 0"));
                }
                pc = addr as usize;
                continue;
            }
        }
        pc += 1;
    }

    Ok(stack.into_iter().next().unwrap_or(Value::Nil))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cons_pops_top_of_stack_as_car() {
        let prog = Value::list(&[
            Value::list(&[Value::sym("PUSH"), Value::Int(1)]),
            Value::list(&[Value::sym("PUSH"), Value::Int(2)]),
            Value::list(&[Value::sym("CONS")]),
        ]);
        let bytecode = assemble(&prog).unwrap();
        let result = run_bytecode(&bytecode).unwrap();
        assert_eq!(result.repr(), "(2 . 1)");
    }

    #[test]
    fn call_and_ret_round_trip_through_a_continuation() {
        // inner block: PUSH 99, RET
        let inner = assemble(&Value::list(&[
            Value::list(&[Value::sym("PUSH"), Value::Int(99)]),
            Value::list(&[Value::sym("RET")]),
        ]))
        .unwrap();
        // outer block: CALL inner
        let outer = assemble(&Value::list(&[Value::list(&[
            Value::sym("CALL"),
            inner,
        ])]))
        .unwrap();
        let result = run_bytecode(&outer).unwrap();
        assert_eq!(result.as_int(), Some(99));
    }

    #[test]
    fn jmp_skips_forward() {
        let prog = Value::list(&[
            Value::list(&[Value::sym("JMP"), Value::Int(2)]),
            Value::list(&[Value::sym("PUSH"), Value::Int(1)]),
            Value::list(&[Value::sym("PUSH"), Value::Int(2)]),
        ]);
        let bytecode = assemble(&prog).unwrap();
        let result = run_bytecode(&bytecode).unwrap();
        assert_eq!(result.as_int(), Some(2));
    }

    #[test]
    fn bad_opcode_name_is_an_assembler_error() {
        let prog = Value::list(&[Value::list(&[Value::sym("NOPE")])]);
        assert!(assemble(&prog).is_err());
    }
}
