use pretty_assertions::assert_eq;
use rpncalc::builtinops::get_builtin_ops;
use rpncalc::value::ParamKind;
use rpncalc::{Engine, OperatorError, OutputStyle, Session, tokenize};

/// Helper function to feed a whitespace-separated line to an engine
fn run(engine: &mut Engine, input: &str) -> Result<(), OperatorError> {
    for token in input.split_whitespace() {
        engine.parse(token)?;
    }
    Ok(())
}

/// Helper function to evaluate with a fresh engine and return the displayed stack
fn eval_fresh(input: &str) -> Result<Vec<String>, OperatorError> {
    let mut engine = Engine::new();
    run(&mut engine, input)?;
    Ok(engine.display_stack())
}

fn stack(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[test]
fn test_basic_arithmetic() {
    assert_eq!(eval_fresh("3 4 +").unwrap(), stack(&["7"]));
    assert_eq!(eval_fresh("1 3 /").unwrap(), stack(&["1/3"]));
    assert_eq!(eval_fresh("10 4 -").unwrap(), stack(&["6"]));
    assert_eq!(eval_fresh("2/3 3/4 *").unwrap(), stack(&["1/2"]));
    assert_eq!(eval_fresh("-7 2 %").unwrap(), stack(&["1"]));
    assert_eq!(eval_fresh("3 5 < 3 5 >").unwrap(), stack(&["3", "5"]));
}

#[test]
fn test_binary_operator_replaces_top_two() {
    assert_eq!(
        eval_fresh(":keep 1 2 8 2 /").unwrap(),
        stack(&[":keep", "1", "2", "4"])
    );
    assert_eq!(eval_fresh(":keep 1 2 ^").unwrap(), stack(&[":keep", "1"]));
}

#[test]
fn test_division_by_zero_consumes_arguments() {
    let mut engine = Engine::new();
    assert_eq!(run(&mut engine, "1 0 /"), Err(OperatorError::DivisionByZero));
    assert!(engine.stack().is_empty());

    assert_eq!(eval_fresh("5 0 %"), Err(OperatorError::DivisionByZero));
}

#[test]
fn test_radix() {
    assert_eq!(eval_fresh("2 b 5").unwrap(), stack(&["101"]));
    assert_eq!(eval_fresh(":hex b 255 ff +").unwrap(), stack(&["354"]));
    assert_eq!(eval_fresh(":oct b 1 8 /").unwrap(), stack(&["1/10"]));
    assert_eq!(eval_fresh("36 b zz").unwrap(), stack(&["zz"]));
    // exponents are read in the radix too
    assert_eq!(eval_fresh("2 b 1e11").unwrap(), stack(&["1000"]));
}

#[test]
fn test_decimal_display() {
    assert_eq!(eval_fresh("f 1 4 /").unwrap(), stack(&["0.25"]));
    assert_eq!(eval_fresh("f 2 3 /").unwrap(), stack(&["0.6666666666666666"]));
    assert_eq!(eval_fresh("f 7 2 / -1 *").unwrap(), stack(&["-3.5"]));
    assert_eq!(eval_fresh("f 1 10 17 ^ /").unwrap(), stack(&["0"]));
    assert_eq!(
        eval_fresh("f :bin b 1 3 /").unwrap(),
        stack(&["0.0101010101010101"])
    );
}

#[test]
fn test_variables() {
    assert_eq!(eval_fresh(":x 5 set :x get").unwrap(), stack(&["5"]));
    assert_eq!(eval_fresh("1 2 + sum= sum? sum? *").unwrap(), stack(&["9"]));
    assert_eq!(eval_fresh(":a :b set :b get").unwrap(), stack(&[":a"]));
    assert_eq!(
        eval_fresh("y?"),
        Err(OperatorError::UnboundVariable("y".to_string()))
    );
}

#[test]
fn test_folds_and_maps() {
    assert_eq!(eval_fresh("1 2 3 +$").unwrap(), stack(&["6"]));
    assert_eq!(eval_fresh("1 10 r *$").unwrap(), stack(&["3628800"]));
    assert_eq!(eval_fresh("2 3 2 :^ foldr").unwrap(), stack(&["64"]));
    assert_eq!(eval_fresh("2 3 2 ^$").unwrap(), stack(&["64"]));
    assert_eq!(
        eval_fresh("1 5 r 2 *.").unwrap(),
        stack(&["2", "4", "6", "8", "10"])
    );
    assert_eq!(eval_fresh("(1 3 r copy.) +$").unwrap(), stack(&["12"]));
}

#[test]
fn test_scopes() {
    assert_eq!(eval_fresh("1 (2 3 +) 4").unwrap(), stack(&["1", "5", "4"]));
    assert_eq!(eval_fresh("100 (1 4 r +$) -").unwrap(), stack(&["90"]));
    assert_eq!(eval_fresh("1 ( )").unwrap(), stack(&["1"]));
    assert_eq!(eval_fresh("( ) )"), Err(OperatorError::ScopeUnderflow));
}

#[test]
fn test_characters() {
    assert_eq!(eval_fresh(":hi ord").unwrap(), stack(&["104", "105"]));
    assert_eq!(eval_fresh("72 chr").unwrap(), stack(&[":H"]));
    assert_eq!(
        eval_fresh(":abc ord 1 +. chr.").unwrap(),
        stack(&[":b", ":c", ":d"])
    );
}

#[test]
fn test_ranges() {
    assert_eq!(eval_fresh("1 4 r").unwrap(), stack(&["1", "2", "3", "4"]));
    assert_eq!(eval_fresh("4 1 r").unwrap(), Vec::<String>::new());
    assert_eq!(eval_fresh("0 9 3 r'").unwrap(), stack(&["0", "3", "6", "9"]));
    assert_eq!(eval_fresh("5 1 -2 range'").unwrap(), stack(&["5", "3"]));
}

#[test]
fn test_every_operator_reports_missing_arguments() {
    for op in get_builtin_ops() {
        let fixed = op
            .params
            .iter()
            .filter(|kind| **kind != ParamKind::RestOfStack)
            .count();
        if fixed == 0 {
            continue;
        }
        let result = eval_fresh(op.name);
        assert!(
            matches!(result, Err(OperatorError::ArityMismatch { got: 0, .. })),
            "{} gave {:?}",
            op.name,
            result
        );
    }
}

#[test]
fn test_error_cases() {
    assert_eq!(
        eval_fresh("1 2 nope"),
        Err(OperatorError::OperatorNotFound("nope".to_string()))
    );
    assert_eq!(
        eval_fresh(":a 1 +"),
        Err(OperatorError::TypeMismatch {
            value: ":a".to_string(),
            expected: ParamKind::Number,
        })
    );
    assert_eq!(eval_fresh("-1 1/2 ^"), Err(OperatorError::NonrealResult));
    assert_eq!(eval_fresh("1/0"), Err(OperatorError::DivisionByZero));
    assert!(matches!(
        eval_fresh("1 0 0 r'"),
        Err(OperatorError::InvalidArgument(_))
    ));
    assert!(matches!(
        eval_fresh("1114112 chr"),
        Err(OperatorError::InvalidArgument(_))
    ));
}

#[test]
fn test_error_messages() {
    let cases = [
        ("nope", "operator not found"),
        ("1 +", "expected 2 arguments, got 1"),
        (":a 1 +", ":a is not of type num"),
        ("1 0 /", "division by zero"),
        ("1 b", "radix too small"),
        ("99 b", "radix too large"),
        (":foo b", "base name \"foo\" not found"),
        (")", "cannot close the outermost scope"),
        ("z?", "variable \"z\" is not set"),
    ];
    for (input, message) in cases {
        let err = eval_fresh(input).unwrap_err();
        assert_eq!(err.to_string(), message, "{}", input);
    }
}

#[test]
fn test_session_lines() {
    let mut session = Session::default();
    let report = session.run_line("1 2 + # comment ; ignored");
    assert_eq!(report.render(OutputStyle::Full), "=3\t(9+1)");

    let report = session.run_line("4 :x *; 10 b; 5 *");
    assert_eq!(
        report.render(OutputStyle::Simple),
        "!:x is not of type num (in \"*\")\n3\n3\n15"
    );
}

#[test]
fn test_tokenize() {
    assert_eq!(tokenize("1 2;3 4 # 5"), vec![vec!["1", "2"], vec!["3", "4"]]);
}
