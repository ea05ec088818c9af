use super::*;
use serde_json::json;

#[test]
fn direct_parse_is_a_no_op() {
    let v = json!({ "thesis": "x", "palette": ["#000000"], "storyboard": [] });
    let text = serde_json::to_string_pretty(&v).unwrap();
    let r = repair_json_text(&text).unwrap();
    assert_eq!(r.stage, RepairStage::Direct);
    assert_eq!(r.value, v);
}

#[test]
fn fences_and_surrounding_prose_are_removed() {
    let raw = "Here you go:\n```json\n{\"thesis\": \"fenced\"}\n```\nEnjoy!";
    let r = repair_json_text(raw).unwrap();
    assert_eq!(r.stage, RepairStage::Direct);
    assert_eq!(r.value, json!({ "thesis": "fenced" }));
    assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
    assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
}

#[test]
fn comments_and_trailing_commas_are_cleaned() {
    let raw = r##"{
        // the big idea
        "thesis": "a // not a comment",
        /* block */ "palette": ["#000000", "#ffffff",],
    }"##;
    let r = repair_json_text(raw).unwrap();
    assert_eq!(r.stage, RepairStage::Cleaned);
    assert_eq!(
        r.value,
        json!({ "thesis": "a // not a comment", "palette": ["#000000", "#ffffff"] })
    );
}

#[test]
fn truncated_number_is_cut_back_to_open_object() {
    let raw = r#"{"thesis": "t", "chapters": [{"title": "a", "typographyShift": {"fontWeight": 5"#;
    let r = repair_json_text(raw).unwrap();
    assert_eq!(r.stage, RepairStage::Truncated);
    assert_eq!(
        r.value,
        json!({ "thesis": "t", "chapters": [{ "title": "a", "typographyShift": {} }] })
    );
}

#[test]
fn truncated_mid_string_and_after_comma() {
    let r = repair_json_text(r#"{"a": [1, 2, {"b": "x"}, {"c": "unfini"#).unwrap();
    assert_eq!(r.value, json!({ "a": [1, 2, { "b": "x" }, {}] }));

    let r = repair_json_text(r#"{"a": "done", "b": 3,"#).unwrap();
    assert_eq!(r.value, json!({ "a": "done", "b": 3 }));
}

#[test]
fn complete_string_values_are_kept() {
    let r = repair_json_text(r#"{"a": {"b": "kept""#).unwrap();
    assert_eq!(r.value, json!({ "a": { "b": "kept" } }));
}

#[test]
fn dangling_key_is_dropped() {
    let r = repair_json_text(r#"{"a": 1, "climax": "#).unwrap();
    assert_eq!(r.value, json!({ "a": 1 }));
    let r = repair_json_text(r#"{"a": 1, "clim"#).unwrap();
    assert_eq!(r.value, json!({ "a": 1 }));
}

#[test]
fn escaped_quotes_do_not_confuse_the_scanner() {
    let r = repair_json_text(r#"{"a": "say \"hi\" {", "b": [true"#).unwrap();
    assert_eq!(r.value, json!({ "a": "say \"hi\" {", "b": [] }));
}

#[test]
fn text_without_object_fails_with_raw_text() {
    let err = repair_json_text("I cannot help with that.").unwrap_err();
    assert_eq!(err.raw, "I cannot help with that.");
    assert!(repair_json_text("[1, 2, 3]").is_err());
}

#[test]
fn close_truncated_balances_brackets() {
    let closed = close_truncated(r#"{"a": [{"b": [1, {"#).unwrap();
    assert_eq!(closed, r#"{"a": [{"b": [1, {}]}]}"#);
    assert!(serde_json::from_str::<Value>(&closed).is_ok());
}

#[test]
fn prose_after_a_complete_object_is_ignored() {
    let r = repair_json_text(r#"{"k": "v"} trailing } junk"#).unwrap();
    assert_eq!(r.value, json!({ "k": "v" }));
    assert_eq!(r.stage, RepairStage::Truncated);

    let r = repair_json_text("Sure! {\"k\": [1, 2]} Hope that helps :} {").unwrap();
    assert_eq!(r.value, json!({ "k": [1, 2] }));
}
