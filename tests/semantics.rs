//! End-to-end behaviour of the public pipeline: parse_scheme -> resolve -> evaluate
#![expect(clippy::unwrap_used)] // test code OK

use minischeme::Error;
use minischeme::ast::{NumberType, Value, nil, sym, val};
use minischeme::environment::Environment;
use minischeme::evaluator::evaluate;
use minischeme::resolver::resolve;
use minischeme::scheme::parse_scheme;

fn run(source: &str, env: &Environment) -> Result<Value, Error> {
    let syntax = parse_scheme(source)?;
    let expr = resolve(&syntax, env)?;
    evaluate(&expr, env)
}

fn run_empty(source: &str) -> Result<Value, Error> {
    run(source, &Environment::empty())
}

const SAMPLE_INTEGERS: [NumberType; 9] = [
    NumberType::MIN,
    -1_000_000_007,
    -42,
    -1,
    0,
    1,
    17,
    4_294_967_296,
    NumberType::MAX,
];

#[test]
fn arithmetic_matches_native_integers() {
    for a in SAMPLE_INTEGERS {
        for b in SAMPLE_INTEGERS {
            let cases: [(&str, Value); 8] = [
                ("+", val(a.wrapping_add(b))),
                ("-", val(a.wrapping_sub(b))),
                ("*", val(a.wrapping_mul(b))),
                ("<", val(a < b)),
                ("<=", val(a <= b)),
                ("=", val(a == b)),
                (">=", val(a >= b)),
                (">", val(a > b)),
            ];
            for (op, expected) in cases {
                let source = format!("({op} {a} {b})");
                assert_eq!(run_empty(&source).unwrap(), expected, "{source}");
            }
        }
    }
}

#[test]
fn car_and_cdr_undo_cons() {
    let operands = ["1", "#f", "'sym", "'()", "(cons 1 2)", "(lambda (x) x)", "(void)"];
    for a in operands {
        for b in operands {
            let env = Environment::empty();
            let car = run(&format!("(let ([a {a}] [b {b}]) (eq? (car (cons a b)) a))"), &env);
            let cdr = run(&format!("(let ([a {a}] [b {b}]) (eq? (cdr (cons a b)) b))"), &env);
            assert_eq!(car.unwrap(), val(true), "car of (cons {a} {b})");
            assert_eq!(cdr.unwrap(), val(true), "cdr of (cons {a} {b})");
        }
    }
}

#[test]
fn eq_compares_atoms_by_value_and_pairs_by_identity() {
    for atom in ["0", "-7", "#t", "#f", "'a", "'hello-world"] {
        let source = format!("(eq? {atom} {atom})");
        assert_eq!(run_empty(&source).unwrap(), val(true), "{source}");
    }
    assert_eq!(run_empty("(eq? (cons 1 2) (cons 1 2))").unwrap(), val(false));

    // structurally equal, but distinct objects
    let a = run_empty("(cons 1 2)").unwrap();
    let b = run_empty("(cons 1 2)").unwrap();
    assert_eq!(a, b);
    assert!(!a.is_same(&b));
}

#[test]
fn inner_bindings_shadow_and_then_disappear() {
    assert_eq!(run_empty("(let ([x 1]) (let ([x 2]) x))").unwrap(), val(2));

    let outer = Environment::empty().extend("x", val(5));
    assert_eq!(run("(let ([x 1]) x)", &outer).unwrap(), val(1));
    assert_eq!(run("x", &outer).unwrap(), val(5));
    assert_eq!(outer.bindings(), vec![("x".to_owned(), val(5))]);
}

#[test]
fn letrec_supports_mutual_recursion() {
    let source = "(letrec ([even? (lambda (n) (if (= n 0) #t (odd? (- n 1))))] \
                           [odd? (lambda (n) (if (= n 0) #f (even? (- n 1))))]) \
                    (even? 10))";
    assert_eq!(run_empty(source).unwrap(), val(true));
}

#[test]
fn closures_demand_exact_argument_counts() {
    for call in ["(f 1)", "(f 1 2 3)"] {
        let source = format!("(let ([f (lambda (a b) a)]) {call})");
        match run_empty(&source) {
            Err(Error::ArityError { expected, .. }) => assert_eq!(expected, 2, "{source}"),
            other => panic!("{source}: expected an arity error, got {other:?}"),
        }
    }
    assert_eq!(run_empty("(let ([f (lambda (a b) a)]) (f 1 2))").unwrap(), val(1));
}

#[test]
fn keywords_are_not_values() {
    for source in ["+", "car", "if", "lambda", "(let ([f +]) 1)"] {
        match run_empty(source) {
            Err(Error::SyntaxError(_)) => {}
            other => panic!("{source}: expected a syntax error, got {other:?}"),
        }
    }
}

#[test]
fn quote_builds_pair_chains() {
    let value = run_empty("(quote (1 #t a))").unwrap();

    let first = value.as_pair().unwrap();
    assert!(matches!(first.car, Value::Integer(1)));
    let second = first.cdr.as_pair().unwrap();
    assert!(matches!(second.car, Value::Boolean(true)));
    let third = second.cdr.as_pair().unwrap();
    assert_eq!(third.car, sym("a"));
    assert!(third.cdr.is_nil());

    assert_eq!(value, val(vec![val(1), val(true), sym("a")]));
    assert_eq!(run_empty("'()").unwrap(), nil());
}

#[test]
fn only_false_is_false() {
    assert_eq!(run_empty("(if 0 1 2)").unwrap(), val(1));
    assert_eq!(run_empty("(if #f 1 2)").unwrap(), val(2));
    assert_eq!(run_empty("(if '() 1 2)").unwrap(), val(1));
}

#[test]
fn exit_reaches_the_caller_as_termination() {
    for source in ["(exit)", "(+ (exit) 1)", "(let ([x 1]) (begin x (exit) (car 1)))"] {
        assert!(
            matches!(run_empty(source), Ok(Value::Termination)),
            "{source} should terminate"
        );
    }
}

#[test]
fn closures_capture_their_defining_environment() {
    let env = Environment::empty().extend("base", val(10));
    let closure = run("(lambda (n) (+ base n))", &env).unwrap();
    let Value::Closure(procedure) = &closure else {
        panic!("expected a closure, got {closure}");
    };
    assert!(procedure.env.ptr_eq(&env));

    // the caller rebinds `base`, but the closure still sees its own
    let caller = Environment::empty()
        .extend("add", closure.clone())
        .extend("base", val(1000));
    assert_eq!(run("(add 5)", &caller).unwrap(), val(15));
}

#[test]
fn errors_are_reported_at_the_right_stage() {
    let cases: [(&str, fn(&Error) -> bool); 6] = [
        ("(1 2", |e| matches!(e, Error::ParseError(_))),
        ("(if 1 2)", |e| matches!(e, Error::ArityError { .. })),
        ("(lambda (1) 1)", |e| matches!(e, Error::SyntaxError(_))),
        ("(car 5)", |e| matches!(e, Error::TypeError(op) if op == "car")),
        ("(5 5)", |e| matches!(e, Error::TypeError(op) if op == "apply")),
        ("nope", |e| matches!(e, Error::UnboundVariable(name) if name == "nope")),
    ];
    for (source, check) in cases {
        let err = run_empty(source).unwrap_err();
        assert!(check(&err), "{source}: unexpected error {err:?}");
    }
    assert_eq!(run_empty("(car 5)").unwrap_err().to_string(), "car: type error.");
    assert_eq!(run_empty("nope").unwrap_err().to_string(), "nope: undefined.");
}
