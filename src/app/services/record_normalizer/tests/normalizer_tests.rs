//! Tests for the normalization rules

use super::*;
use crate::app::models::{FieldValue, NormalizedRecord};
use crate::app::services::record_normalizer::{
    country_code_from_flag, normalize_entries, normalize_entry,
};

#[test]
fn test_normalize_delhi_scenario() {
    let entry = raw_entry(
        r#"{"rank":1,"city":"Delhi","country":"India","flag":"https://x/in.png","weather":{"temp_c":41.2,"condition":{"text":"Sunny","icon":"s.png"}}}"#,
    );

    let expected: NormalizedRecord = [
        ("rank", FieldValue::Int(1)),
        ("city", FieldValue::from("Delhi")),
        ("country", FieldValue::from("India")),
        ("country_code", FieldValue::from("in")),
        ("temp_c", FieldValue::Float(41.2)),
        ("condition_text", FieldValue::from("Sunny")),
    ]
    .into_iter()
    .collect();

    assert_eq!(normalize_entry(&entry), expected);
}

#[test]
fn test_condition_and_weather_keys_never_survive() {
    let entry = raw_entry(
        r#"{"rank":4,"city":"Basra","weather":{"temp_c":44,"humidity":12,"wind_kph":9.4,"condition":{"text":"Partly cloudy","icon":"p.png","code":1003}}}"#,
    );

    let record = normalize_entry(&entry);

    assert!(!record.contains_key("weather"));
    assert!(!record.contains_key("condition"));
    assert!(!record.contains_key("icon"));
    assert_eq!(record.text("condition_text"), Some("Partly cloudy"));
    assert_eq!(record.get("temp_c"), Some(&FieldValue::Int(44)));
    assert_eq!(record.get("humidity"), Some(&FieldValue::Int(12)));
    assert_eq!(record.number("wind_kph"), Some(9.4));
}

#[test]
fn test_missing_weather_omits_only_weather_fields() {
    let entry = raw_entry(r#"{"rank":2,"city":"Aswan","country":"Egypt","flag":"https://x/eg.svg"}"#);
    let record = normalize_entry(&entry);

    assert_eq!(record.len(), 4);
    assert_eq!(record.rank(), Some(2));
    assert_eq!(record.text("country_code"), Some("eg"));
    assert!(!record.contains_key("temp_c"));
    assert!(!record.contains_key("condition_text"));
}

#[test]
fn test_missing_flag_omits_country_code() {
    let entry = raw_entry(
        r#"{"rank":3,"city":"Ahvaz","weather":{"temp_c":43.5,"condition":{"text":"Clear"}}}"#,
    );
    let record = normalize_entry(&entry);

    assert!(!record.contains_key("country_code"));
    assert!(!record.contains_key("flag"));
    assert_eq!(record.number("temp_c"), Some(43.5));
}

#[test]
fn test_missing_weather_and_flag_keeps_top_level_fields() {
    let entry = raw_entry(r#"{"rank":9,"city":"Nowhere","country":"Unknown"}"#);
    let record = normalize_entry(&entry);

    let keys: Vec<&str> = record.keys().collect();
    assert_eq!(keys, vec!["city", "country", "rank"]);
}

#[test]
fn test_condition_without_text_is_omitted() {
    let entry = raw_entry(r#"{"rank":1,"weather":{"temp_c":40,"condition":{"icon":"x.png"}}}"#);
    let record = normalize_entry(&entry);
    assert!(!record.contains_key("condition_text"));
    assert!(!record.contains_key("condition"));

    let entry = raw_entry(r#"{"rank":1,"weather":{"condition":{"text":null}}}"#);
    assert!(!normalize_entry(&entry).contains_key("condition_text"));
}

#[test]
fn test_non_object_weather_is_dropped() {
    let entry = raw_entry(r#"{"rank":1,"city":"Doha","weather":null}"#);
    let record = normalize_entry(&entry);
    assert!(!record.contains_key("weather"));
    assert_eq!(record.len(), 2);
}

#[test]
fn test_other_nested_values_become_json_text() {
    let entry = raw_entry(r#"{"rank":1,"coords":{"lat":28.6,"lon":77.2},"aliases":["Dilli"]}"#);
    let record = normalize_entry(&entry);

    assert_eq!(record.text("coords"), Some(r#"{"lat":28.6,"lon":77.2}"#));
    assert_eq!(record.text("aliases"), Some(r#"["Dilli"]"#));
}

#[test]
fn test_field_set_is_deterministic_for_same_shape() {
    let a = raw_entry(r#"{"rank":1,"city":"A","flag":"https://x/aa.png","weather":{"temp_c":1.5,"condition":{"text":"Sunny"}}}"#);
    let b = raw_entry(r#"{"city":"B","weather":{"condition":{"text":"Rain"},"temp_c":2.5},"flag":"https://x/bb.png","rank":2}"#);

    let keys_a: Vec<String> = normalize_entry(&a).keys().map(str::to_string).collect();
    let keys_b: Vec<String> = normalize_entry(&b).keys().map(str::to_string).collect();
    assert_eq!(keys_a, keys_b);
}

#[test]
fn test_normalize_entries_preserves_order() {
    let entries = vec![
        raw_entry(r#"{"rank":2,"city":"Second"}"#),
        raw_entry(r#"{"rank":1,"city":"First"}"#),
    ];

    let records = normalize_entries(&entries);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text("city"), Some("Second"));
    assert_eq!(records[1].text("city"), Some("First"));
}

#[test]
fn test_country_code_from_flag_urls() {
    assert_eq!(country_code_from_flag("https://x/in.png"), Some("in".to_string()));
    assert_eq!(
        country_code_from_flag("https://cdn.example.com/flags/w320/sa.webp?v=3"),
        Some("sa".to_string())
    );
    assert_eq!(country_code_from_flag("/static/flags/kw"), Some("kw".to_string()));
    assert_eq!(country_code_from_flag("om.svg"), Some("om".to_string()));
    assert_eq!(country_code_from_flag("https://x/.png"), None);
    assert_eq!(country_code_from_flag(""), None);
}

#[test]
fn test_non_string_flag_is_dropped_without_code() {
    let entry = raw_entry(r#"{"rank":1,"flag":42}"#);
    let record = normalize_entry(&entry);
    assert!(!record.contains_key("flag"));
    assert!(!record.contains_key("country_code"));
}
