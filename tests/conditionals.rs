use djson::process;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn if_else_with_adult_user() {
    let template = r#"{
        "user": {
            "name": "{{user.name}}",
            "@djson if user.age >= 18": {
                "status": "adult",
                "canVote": true
            },
            "@djson else": {
                "status": "minor",
                "canVote": false
            }
        }
    }"#;

    let result = process(template, &json!({"user": {"name": "John", "age": 25}})).unwrap();
    assert_eq!(
        result,
        json!({"user": {"name": "John", "status": "adult", "canVote": true}})
    );
}

#[test]
fn if_else_with_minor_user() {
    let template = r#"{
        "user": {
            "name": "{{user.name}}",
            "@djson if user.age >= 18": {"status": "adult", "canVote": true},
            "@djson else": {"status": "minor", "canVote": false}
        }
    }"#;

    let result = process(template, &json!({"user": {"name": "Alice", "age": 15}})).unwrap();
    assert_eq!(
        result,
        json!({"user": {"name": "Alice", "status": "minor", "canVote": false}})
    );
}

#[test]
fn comparison_against_literal() {
    let template = r#"{
        "product": "{{product.name}}",
        "@djson if product.price > 100": {"category": "premium", "freeShipping": true},
        "@djson else": {"category": "standard", "freeShipping": false}
    }"#;

    let result = process(template, &json!({"product": {"name": "Laptop", "price": 999}})).unwrap();
    assert_eq!(result["category"], json!("premium"));
    assert_eq!(result["freeShipping"], json!(true));
}

#[test]
fn string_equality_condition() {
    let template = r#"{
        "order": {
            "@djson if order.status == \"completed\"": {
                "message": "Order completed",
                "canReview": true
            },
            "@djson else": {
                "message": "Order pending",
                "canReview": false
            }
        }
    }"#;

    let result = process(template, &json!({"order": {"status": "completed"}})).unwrap();
    assert_eq!(result["order"]["message"], json!("Order completed"));
    assert_eq!(result["order"]["canReview"], json!(true));
}

#[test]
fn unless_is_the_inverse_of_if() {
    let template = r#"{
        "@djson unless user.banned": {"access": "granted"},
        "@djson else": {"access": "denied"}
    }"#;

    let open = process(template, &json!({"user": {"banned": false}})).unwrap();
    assert_eq!(open, json!({"access": "granted"}));

    let blocked = process(template, &json!({"user": {"banned": true}})).unwrap();
    assert_eq!(blocked, json!({"access": "denied"}));
}

#[test]
fn exactly_one_branch_contributes() {
    let template = r#"{
        "@djson if flag": {"taken": "if"},
        "@djson else": {"taken": "else"}
    }"#;

    for flag in [true, false] {
        let result = process(template, &json!({"flag": flag})).unwrap();
        let taken = result["taken"].as_str().unwrap();
        assert_eq!(taken, if flag { "if" } else { "else" });
        assert_eq!(result.as_object().unwrap().len(), 1);
    }
}

#[test]
fn else_requires_an_adjacent_omitted_conditional() {
    // a literal key between the conditional and the else closes the gate
    let template = r#"{
        "@djson if flag": {"status": "on"},
        "spacer": 1,
        "@djson else": {"status": "off"}
    }"#;

    let result = process(template, &json!({"flag": false})).unwrap();
    assert_eq!(result, json!({"spacer": 1}));
}

#[test]
fn if_with_as_key_wraps_scalar_subtree() {
    let template = r#"{
        "@djson if user.premium as badge": "gold"
    }"#;

    let result = process(template, &json!({"user": {"premium": true}})).unwrap();
    assert_eq!(result, json!({"badge": "gold"}));

    let none = process(template, &json!({"user": {"premium": false}})).unwrap();
    assert_eq!(none, json!({}));
}

#[test]
fn exists_checks_truthiness_of_the_path() {
    let template = r#"{
        "@djson exists user.email": {"hasEmail": true}
    }"#;

    let with_email = process(template, &json!({"user": {"email": "a@b.c"}})).unwrap();
    assert_eq!(with_email, json!({"hasEmail": true}));

    let empty = process(template, &json!({"user": {"email": ""}})).unwrap();
    assert_eq!(empty, json!({}));

    let missing = process(template, &json!({"user": {}})).unwrap();
    assert_eq!(missing, json!({}));
}

#[test]
fn exists_with_as_key() {
    let template = r#"{
        "@djson exists user.nickname as nickname": "{{user.nickname}}"
    }"#;

    let result = process(template, &json!({"user": {"nickname": "ace"}})).unwrap();
    assert_eq!(result, json!({"nickname": "ace"}));
}

#[test]
fn nested_conditionals() {
    let template = r#"{
        "@djson if user.active": {
            "status": "active",
            "@djson if user.verified": {"trust": "high"},
            "@djson else": {"trust": "low"}
        }
    }"#;

    let result = process(
        template,
        &json!({"user": {"active": true, "verified": false}}),
    )
    .unwrap();
    assert_eq!(result, json!({"status": "active", "trust": "low"}));
}

#[test]
fn missing_path_in_condition_is_falsy() {
    let template = r#"{
        "@djson if ghost.flag": {"x": 1},
        "@djson else": {"x": 2}
    }"#;

    let result = process(template, &json!({})).unwrap();
    assert_eq!(result, json!({"x": 2}));
}
