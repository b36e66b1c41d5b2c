use minischeme::Error;
use minischeme::ast::Value;
use minischeme::builtinops::{BuiltinOp, primitive_ops, reserved_word_ops};
use minischeme::environment::Environment;
use minischeme::evaluator::evaluate;
use minischeme::resolver::resolve;
use minischeme::scheme::{ParseConfig, parse_scheme_with_config};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;

fn main() {
    env_logger::init();

    let result = panic::catch_unwind(|| {
        run_repl();
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

fn run_repl() {
    println!("minischeme interpreter");
    println!("Enter S-expressions like: (let ((x 2)) (* x 21))");
    println!("Type :help for more commands, (exit) or Ctrl+D to leave.");
    println!();

    let mut rl = DefaultEditor::new().expect("Could not initialize REPL");
    let env = Environment::empty();
    let config = ParseConfig {
        handle_comments: true,
    };

    loop {
        match rl.readline("scm> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(&env);
                        continue;
                    }
                    ":quit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                match run_line(line, config, &env) {
                    Ok(Value::Termination) => break,
                    Ok(Value::Void) => {}
                    Ok(result) => println!("{result}"),
                    Err(e) => println!("Error: {e}"),
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

fn run_line(line: &str, config: ParseConfig, env: &Environment) -> Result<Value, Error> {
    let syntax = parse_scheme_with_config(line, config)?;
    let expr = resolve(&syntax, env)?;
    evaluate(&expr, env)
}

fn print_help() {
    println!("Commands:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show top-level bindings and keywords");
    println!("  :quit      - Exit the interpreter");
    println!("  (exit)     - Exit the interpreter");
    println!("  Ctrl+D     - Exit the interpreter");
    println!();
    println!("Language:");
    println!("  Integers: 42, -5        Booleans: #t, #f        Quote: 'x, '(1 2)");
    println!("  Binding:  (let ((x 1)) x), (letrec ((f (lambda (n) n))) (f 1))");
    println!("  Control:  (if c a b), (begin e1 e2 ...), (void)");
    println!("  Only #f is false. Procedures take exactly their declared arguments.");
    println!("  ; starts a comment");
    println!();
}

fn print_columns(ops: &[BuiltinOp]) {
    let mut col = 0;
    for op in ops {
        print!("  {:<15}", op.scheme_id);
        col += 1;
        if col % 4 == 0 {
            println!();
        }
    }
    if col % 4 != 0 {
        println!();
    }
    println!();
}

fn print_environment(env: &Environment) {
    println!("Special forms ({}):", reserved_word_ops().len());
    print_columns(reserved_word_ops());
    println!("Primitives ({}):", primitive_ops().len());
    print_columns(primitive_ops());

    let bindings = env.bindings();
    if bindings.is_empty() {
        println!("No top-level bindings.");
        return;
    }
    println!("Top-level bindings ({}):", bindings.len());
    for (name, value) in bindings {
        println!("  {name} = {value}");
    }
}
