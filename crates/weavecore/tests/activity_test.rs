mod common;

use common::FnActivity;
use std::collections::HashMap;
use weavecore::{Activity, ActivityError, Parameter, Value, ValueMap};

fn inputs(pairs: Vec<(&str, Value)>) -> ValueMap {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn adder() -> std::sync::Arc<dyn Activity> {
    FnActivity::new(
        "adder",
        vec![Parameter::number("num1"), Parameter::number("num2")],
        vec![Parameter::number("sum")],
        |inputs| {
            let a = inputs["num1"].as_f64().unwrap_or_default();
            let b = inputs["num2"].as_f64().unwrap_or_default();
            Ok(HashMap::from([("sum".to_string(), Value::Number(a + b))]))
        },
    )
}

#[tokio::test]
async fn test_invoke_success() {
    let activity = adder();
    let out = activity
        .invoke(inputs(vec![("num1", Value::Integer(2)), ("num2", Value::Number(3.5))]))
        .await
        .unwrap();
    assert_eq!(out["sum"], Value::Number(5.5));
}

#[tokio::test]
async fn test_missing_input() {
    let err = adder()
        .invoke(inputs(vec![("num1", Value::Integer(2))]))
        .await
        .unwrap_err();
    assert_eq!(err, ActivityError::MissingInputParameter("num2".to_string()));
}

#[tokio::test]
async fn test_unexpected_input() {
    let err = adder()
        .invoke(inputs(vec![
            ("num1", Value::Integer(1)),
            ("num2", Value::Integer(2)),
            ("num3", Value::Integer(3)),
        ]))
        .await
        .unwrap_err();
    assert_eq!(err, ActivityError::UnexpectedInputParameter("num3".to_string()));
}

#[tokio::test]
async fn test_invalid_input_type() {
    let err = adder()
        .invoke(inputs(vec![("num1", Value::from("one")), ("num2", Value::Integer(2))]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ActivityError::InvalidInputType {
            name: "num1".to_string(),
            expected: "number".to_string(),
            actual: "string".to_string(),
        }
    );
}

#[tokio::test]
async fn test_output_checks() {
    let missing = FnActivity::new(
        "missing",
        vec![],
        vec![Parameter::string("out")],
        |_| Ok(ValueMap::new()),
    );
    assert_eq!(
        missing.invoke(ValueMap::new()).await.unwrap_err(),
        ActivityError::MissingOutputParameter("out".to_string())
    );

    let extra = FnActivity::new("extra", vec![], vec![], |_| {
        Ok(HashMap::from([("surprise".to_string(), Value::Bool(true))]))
    });
    assert_eq!(
        extra.invoke(ValueMap::new()).await.unwrap_err(),
        ActivityError::UnexpectedOutputParameter("surprise".to_string())
    );

    let wrong = FnActivity::new("wrong", vec![], vec![Parameter::integer("n")], |_| {
        Ok(HashMap::from([("n".to_string(), Value::Number(1.5))]))
    });
    assert!(matches!(
        wrong.invoke(ValueMap::new()).await.unwrap_err(),
        ActivityError::InvalidOutputType { name, .. } if name == "n"
    ));
}

#[tokio::test]
async fn test_run_failure_is_propagated() {
    let failing = FnActivity::new("failing", vec![], vec![], |_| {
        Err(ActivityError::ExecutionFailed("boom".to_string()))
    });
    assert_eq!(
        failing.invoke(ValueMap::new()).await.unwrap_err(),
        ActivityError::ExecutionFailed("boom".to_string())
    );
}

#[test]
fn test_descriptors_get_distinct_ids() {
    let a = adder();
    let b = adder();
    assert_ne!(a.descriptor().id, b.descriptor().id);
    assert_eq!(a.descriptor().input_params, b.descriptor().input_params);
}
