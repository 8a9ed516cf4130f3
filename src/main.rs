mod builtins;
mod config;
mod env;
mod error;
mod eval;
mod reader;
mod sandbox;
mod value;
mod vm;

use std::path::PathBuf;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use builtins::{install_sandbox, register_builtins};
use config::FsConfig;
use env::Environment;
use error::LispError;
use sandbox::Sandbox;
use value::Value;

/// A small Lisp-family language: reader, trampolined evaluator, macros, and
/// a stack-based bytecode VM.
#[derive(Parser, Debug)]
#[command(name = "gel")]
#[command(version = config::VERSION)]
#[command(about = "A small Lisp-family language interpreter")]
struct CliArgs {
    /// Script file to run (omit to start the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Add an allowed filesystem root for `slurp` (repeatable)
    #[arg(long = "fs-sandbox", value_name = "PATH", action = clap::ArgAction::Append)]
    fs_paths: Vec<PathBuf>,

    /// Maximum file size `slurp` will read, in bytes
    #[arg(long = "max-file-size", value_name = "BYTES", default_value = "10485760")]
    max_file_size: usize,
}

const HISTORY_FILE: &str = ".gel_history";

fn main() {
    let args = CliArgs::parse();

    let mut fs_config = FsConfig {
        max_file_size: args.max_file_size,
        ..FsConfig::default()
    };
    fs_config.allowed_paths.extend(args.fs_paths.clone());
    if let Some(script) = &args.script {
        if let Some(parent) = script.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_config.allowed_paths.push(parent.to_path_buf());
        }
    }

    let sandbox = match Sandbox::new(fs_config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to start sandbox: {}", e);
            std::process::exit(1);
        }
    };
    install_sandbox(sandbox);

    let env = boot();

    if let Some(script) = &args.script {
        let file_name = script
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| script.to_string_lossy().to_string());
        match load_file(&env, &file_name) {
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}", e.unhandled_report());
                std::process::exit(1);
            }
        }
        return;
    }

    run_repl(&env);
}

/// The builtin frame plus a fresh empty frame for user definitions, then the
/// three-form boot sequence that loads `boot.gel`.
fn boot() -> Environment {
    let builtins_env = Environment::new_root();
    register_builtins(&builtins_env);
    let env = builtins_env.extend([]);

    for form in [
        "(-def-internal! 'progn (fn (&rest forms) (if (empty? forms) nil (last forms))))",
        "(-def-internal! 'load-file (fn (path) (eval (read-string \"(progn \n\" (slurp path) \"\nnil)\"))))",
    ] {
        let parsed = reader::read(form).expect("boot form is well-formed");
        eval::eval(&env, parsed, &Value::Nil).expect("boot form must evaluate");
    }

    if let Err(e) = load_file(&env, "boot.gel") {
        eprintln!("warning: failed to load boot.gel: {}", e.unhandled_report());
    }

    env
}

fn load_file(env: &Environment, path: &str) -> Result<Value, LispError> {
    let call = Value::list(&[Value::sym("load-file"), Value::str(path)]);
    eval::eval(env, call, &Value::Nil)
}

fn run_repl(env: &Environment) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("failed to start the line editor: {}", e);
            std::process::exit(1);
        }
    };
    let _ = rl.load_history(HISTORY_FILE);

    loop {
        match rl.readline("gel> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                if trimmed == "(quit)" || trimmed == "(exit)" {
                    break;
                }
                match reader::read(trimmed) {
                    Ok(form) => match eval::eval(env, form, &Value::Nil) {
                        Ok(v) => println!("{}", v.repr()),
                        Err(e) => println!("{}", e.unhandled_report()),
                    },
                    Err(e) => println!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                println!("bye");
                break;
            }
            Err(e) => {
                eprintln!("readline error: {}", e);
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    std::process::exit(0);
}
