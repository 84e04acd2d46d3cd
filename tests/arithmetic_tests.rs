// The library macros computed end to end through the engine

use pretty_assertions::assert_eq;
use rstest::rstest;
use tally::interpreter::{Machine, MachineError};
use tally::program::{library, Instruction};

fn run_macro(name: &str, args: &[&str], inputs: &[(&str, u64)]) -> (Machine, Result<u64, MachineError>) {
    let mut machine = Machine::new();
    machine
        .register_macros(library::standard_macros(), false)
        .expect("library registers");
    machine.set_inputs(inputs.iter().copied());
    machine
        .set_program(vec![Instruction::call(name, args.iter().copied())])
        .expect("program resolves");
    let result = machine.run_default(false);
    (machine, result)
}

#[rstest]
#[case(0, 0, 0)]
#[case(2, 3, 5)]
#[case(4, 0, 4)]
#[case(0, 6, 6)]
#[case(7, 8, 15)]
fn test_add(#[case] x1: u64, #[case] x2: u64, #[case] expected: u64) {
    let (machine, result) = run_macro("add", &["y", "x1", "x2"], &[("x1", x1), ("x2", x2)]);
    assert_eq!(result, Ok(expected));
    // operands survive the computation
    assert_eq!(machine.value("x1"), x1);
    assert_eq!(machine.value("x2"), x2);
}

#[rstest]
#[case(5, 3, 2)]
#[case(4, 4, 0)]
#[case(9, 0, 9)]
fn test_subtract(#[case] x1: u64, #[case] x2: u64, #[case] expected: u64) {
    let (_, result) = run_macro("subtract", &["y", "x1", "x2"], &[("x1", x1), ("x2", x2)]);
    assert_eq!(result, Ok(expected));
}

#[test]
fn test_subtract_below_zero_never_halts() {
    let mut machine = Machine::new();
    machine
        .register_macros(library::standard_macros(), false)
        .unwrap();
    machine.set_inputs([("x1", 3), ("x2", 5)]);
    machine
        .set_program(vec![Instruction::call("subtract", ["y", "x1", "x2"])])
        .unwrap();

    assert_eq!(
        machine.run(1000, false),
        Err(MachineError::StepLimitExceeded { limit: 1000 })
    );
    assert_eq!(machine.step_count(), 1000);
}

#[rstest]
#[case(0, 5, 0)]
#[case(1, 1, 1)]
#[case(3, 4, 12)]
#[case(5, 2, 10)]
fn test_mul(#[case] x1: u64, #[case] x2: u64, #[case] expected: u64) {
    let (_, result) = run_macro("mul", &["y", "x1", "x2"], &[("x1", x1), ("x2", x2)]);
    assert_eq!(result, Ok(expected));
}

#[rstest]
#[case(0, 1)]
#[case(1, 1)]
#[case(2, 2)]
#[case(3, 6)]
#[case(4, 24)]
fn test_fact(#[case] x: u64, #[case] expected: u64) {
    let (machine, result) = run_macro("fact", &["y", "x"], &[("x", x)]);
    assert_eq!(result, Ok(expected));
    assert_eq!(machine.value("x"), x);
}

#[test]
fn test_zeros_clears_argument() {
    let (machine, result) = run_macro("zeros", &["x"], &[("x", 5)]);
    assert_eq!(result, Ok(0));
    assert_eq!(machine.value("x"), 0);
}

#[test]
fn test_equals_copies_and_preserves_source() {
    let (machine, result) = run_macro("equals", &["y", "x"], &[("x", 4)]);
    assert_eq!(result, Ok(4));
    assert_eq!(machine.value("x"), 4);
    // equals is activation 1; its scratch counter drains back to zero
    assert_eq!(machine.variables().get("_z#1"), Some(&0));
}

#[test]
fn test_macros_compose_in_one_program() {
    // y = (2 + 3) * 2
    let mut machine = Machine::new();
    machine
        .register_macros(library::standard_macros(), false)
        .unwrap();
    machine.set_inputs([("a", 2), ("b", 3), ("two", 2)]);
    machine
        .set_program(vec![
            Instruction::call("add", ["sum", "a", "b"]),
            Instruction::call("mul", ["y", "sum", "two"]),
        ])
        .unwrap();

    assert_eq!(machine.run_default(false), Ok(10));
    assert_eq!(machine.value("sum"), 5);
}

#[test]
fn test_describe_macro_renders_definition() {
    let mut machine = Machine::new();
    machine
        .register_macros(library::standard_macros(), false)
        .unwrap();

    assert_eq!(
        machine.describe_macro("zeros").unwrap(),
        "zeros(y)\nA:\n    dec y\n    jnz y A"
    );
    assert_eq!(
        machine.describe_macro("goto").unwrap(),
        "goto(label)  locals [_z]\n    inc _z\n    jnz _z label"
    );
    assert!(machine.describe_macros().contains("\n\nfact(y, x)  locals [_z1, _z2, _y]"));
}

#[rstest]
#[case("fact", &["y", "x"][..], &[("x", 5)][..], 120)]
#[case("mul", &["y", "x1", "x2"][..], &[("x1", 10), ("x2", 10)][..], 100)]
fn test_long_runs_fit_default_history(
    #[case] name: &str,
    #[case] args: &[&str],
    #[case] inputs: &[(&str, u64)],
    #[case] expected: u64,
) {
    // both take well over 20k steps
    let (machine, result) = run_macro(name, args, inputs);
    assert_eq!(result, Ok(expected));
    assert!(machine.step_count() > 20_000);
    assert_eq!(machine.history_len(), machine.step_count() + 1);
}
