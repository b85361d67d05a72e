//! Tests for error module

use std::path::PathBuf;

use fixeval::error::{EvalError, OptionExt};

#[test]
fn test_error_display() {
    let err = EvalError::GroupCountMismatch {
        file: PathBuf::from("route1/gps/1.json"),
        observed: 2,
        expected: 3,
    };
    let text = err.to_string();
    assert!(text.contains("route1/gps/1.json"));
    assert!(text.contains("got 2 fixes"));
    assert!(text.contains("3 reference points"));
}

#[test]
fn test_option_ext() {
    let none: Option<i32> = None;
    let result = none.ok_or_empty_population("gps");
    assert!(matches!(
        result,
        Err(EvalError::EmptyPopulation { ref mode }) if mode == "gps"
    ));

    assert_eq!(Some(5).ok_or_empty_population("gps").unwrap(), 5);
}

#[test]
fn test_fatal_errors() {
    assert!(EvalError::UnknownRoute {
        directory: PathBuf::from("route9")
    }
    .is_fatal());
    assert!(EvalError::Config("bad".into()).is_fatal());
    assert!(!EvalError::MalformedRecord {
        file: PathBuf::from("a.json"),
        index: "0".into(),
        reason: "missing lat".into(),
    }
    .is_fatal());
}
