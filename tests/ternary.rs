use djson::process;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn ternary_in_interpolation() {
    let template = r#"{"status": "{{user.age >= 18 ? \"adult\" : \"minor\"}}"}"#;

    assert_eq!(
        process(template, &json!({"user": {"age": 25}})).unwrap(),
        json!({"status": "adult"})
    );
    assert_eq!(
        process(template, &json!({"user": {"age": 15}})).unwrap(),
        json!({"status": "minor"})
    );
}

#[test]
fn ternary_with_truthy_condition() {
    let template = r#"{"label": "{{user.premium ? \"Premium\" : \"Free\"}}"}"#;

    assert_eq!(
        process(template, &json!({"user": {"premium": true}})).unwrap(),
        json!({"label": "Premium"})
    );
    assert_eq!(
        process(template, &json!({"user": {}})).unwrap(),
        json!({"label": "Free"})
    );
}

#[test]
fn ternary_branches_resolve_paths() {
    let template = r#"{"shown": "{{useAlias ? user.alias : user.name}}"}"#;
    let data = json!({"useAlias": true, "user": {"alias": "ace", "name": "Adam"}});

    assert_eq!(process(template, &data).unwrap(), json!({"shown": "ace"}));
}

#[test]
fn ternary_with_numeric_branches() {
    let template = r#"{"discount": "{{user.vip ? 20 : 0}}"}"#;

    assert_eq!(
        process(template, &json!({"user": {"vip": true}})).unwrap(),
        json!({"discount": 20})
    );
    assert_eq!(
        process(template, &json!({"user": {"vip": false}})).unwrap(),
        json!({"discount": 0})
    );
}

#[test]
fn ternary_with_equality_and_inequality() {
    let template = r#"{
        "eq": "{{role == \"admin\" ? \"yes\" : \"no\"}}",
        "ne": "{{role != \"admin\" ? \"yes\" : \"no\"}}"
    }"#;

    assert_eq!(
        process(template, &json!({"role": "admin"})).unwrap(),
        json!({"eq": "yes", "ne": "no"})
    );
}

#[test]
fn ternary_in_loop_uses_loop_bindings() {
    let template = r#"{
        "items": {
            "@djson for items as item": {
                "name": "{{item.name}}",
                "stock": "{{item.qty > 0 ? \"in stock\" : \"sold out\"}}"
            }
        }
    }"#;
    let data = json!({"items": [{"name": "A", "qty": 3}, {"name": "B", "qty": 0}]});

    assert_eq!(
        process(template, &data).unwrap(),
        json!({"items": [
            {"name": "A", "stock": "in stock"},
            {"name": "B", "stock": "sold out"}
        ]})
    );
}

#[test]
fn ternary_with_logical_condition() {
    let template = r#"{"flag": "{{a && b ? \"both\" : \"not both\"}}"}"#;

    assert_eq!(
        process(template, &json!({"a": true, "b": true})).unwrap(),
        json!({"flag": "both"})
    );
    assert_eq!(
        process(template, &json!({"a": true, "b": false})).unwrap(),
        json!({"flag": "not both"})
    );
}

// Branches are literals or paths, never nested arithmetic. An arithmetic
// branch reads as a path, fails to resolve, and degrades to null.
#[test]
fn ternary_branches_are_not_arithmetic() {
    let template = r#"{"v": "{{flag ? a + b : 0}}"}"#;

    assert_eq!(
        process(template, &json!({"flag": true, "a": 1, "b": 2})).unwrap(),
        json!({"v": null})
    );
}
