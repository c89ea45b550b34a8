use jsondoc::{parse, parse_str, DecodeError, Error, JsonArray, Value};
use rstest::rstest;
use serde_json::json;

/// Decodes the document text through serde_json, independently of the
/// tape, to verify the buffer and the index agree.
fn independent(doc_bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(doc_bytes).expect("document buffer must stay valid JSON")
}

#[rstest]
#[case("plain")]
#[case("")]
#[case("tab\there")]
#[case("quote \" backslash \\")]
#[case("all five \n \r \t \" \\")]
#[case("control \u{1} byte")]
#[case("unicode caf\u{e9} \u{1F600}")]
fn strings_round_trip_through_append_and_parse(#[case] text: &str) {
    let mut array = JsonArray::new();
    array.append(text);
    assert_eq!(array.get(0).unwrap(), Value::String(text.into()));

    let reparsed = parse(array.to_bytes()).unwrap().into_array().unwrap();
    assert_eq!(reparsed.get(0).unwrap(), Value::String(text.into()));
}

#[rstest]
#[case(0i64)]
#[case(1)]
#[case(-1)]
#[case(i64::MAX)]
#[case(i64::MIN)]
fn integers_round_trip(#[case] value: i64) {
    let mut array = JsonArray::new();
    array.append(value);
    let reparsed = parse(array.to_bytes()).unwrap().into_array().unwrap();
    assert_eq!(reparsed.get(0).unwrap(), Value::Int(value));
}

#[rstest]
#[case(1.5)]
#[case(-0.25)]
#[case(1.0)]
#[case(1e300)]
#[case(5e-324)]
fn floats_round_trip_and_keep_their_kind(#[case] value: f64) {
    let mut array = JsonArray::new();
    array.append(value);
    let reparsed = parse(array.to_bytes()).unwrap().into_array().unwrap();
    assert_eq!(reparsed.get(0).unwrap(), Value::Float(value));
}

#[test]
fn nested_containers_round_trip() {
    let json = json!([[1, [2, [3, "deep"]]], {"k": [true, null]}]);
    let Value::Array(array) = Value::from_json(&json) else {
        panic!("expected an array");
    };
    assert_eq!(independent(array.to_bytes()), json);

    let reparsed = parse(array.to_bytes()).unwrap().into_array().unwrap();
    assert_eq!(reparsed, array);
}

#[test]
fn mutation_sequences_keep_buffer_and_tape_consistent() {
    let mut array = parse_str("[1, 2, 3]").unwrap().into_array().unwrap();
    array.append("tail");
    array.set(1, json_array(&[4i64, 5]));
    array.remove(0);
    array.append(false);
    array.set(0, "head");

    assert_eq!(independent(array.to_bytes()), json!(["head", 3, "tail", false]));
    // And the tape agrees with what serde_json sees.
    let values: Vec<Value> = array.iter().map(Result::unwrap).collect();
    assert_eq!(
        values,
        vec![
            Value::String("head".into()),
            Value::Int(3),
            Value::String("tail".into()),
            Value::Bool(false),
        ]
    );
}

#[test]
fn object_mutation_sequences_stay_consistent() {
    let mut object = parse_str(r#"{"a": 1, "b": [2], "c": "x"}"#)
        .unwrap()
        .into_object()
        .unwrap();
    object.set(1, 2i64);
    object.remove(0);
    object.append("d", json_array(&[9i64]));
    object.set(1, "y");

    assert_eq!(
        independent(object.to_bytes()),
        json!({"b": 2, "c": "y", "d": [9]})
    );
}

#[test]
fn documents_share_storage_until_mutated() {
    let original = parse_str(r#"[1, {"k": 2}]"#).unwrap();
    let kept = original.clone();
    let mut array = original.into_array().unwrap();
    array.set(0, 99i64);

    assert_eq!(kept.to_text().unwrap(), r#"[1, {"k": 2}]"#);
    assert_eq!(array.to_text().unwrap(), r#"[99, {"k": 2}]"#);
}

#[test]
fn invalid_utf8_surfaces_at_materialization_not_parse() {
    let doc = parse(b"[\"\xff\xfe\"]").unwrap();
    let array = doc.into_array().unwrap();
    assert_eq!(
        array.get(0).unwrap_err(),
        Error::Decode(DecodeError::InvalidUtf8)
    );
    // The rest of the document stays readable.
    assert_eq!(array.count(), 1);
}

#[test]
fn bad_escapes_surface_at_materialization() {
    let array = parse(br#"["\q"]"#).unwrap().into_array().unwrap();
    assert_eq!(
        array.get(0).unwrap_err(),
        Error::Decode(DecodeError::InvalidEscape('q'))
    );
}

#[test]
fn out_of_range_integers_surface_at_materialization() {
    let array = parse(b"[9223372036854775808]").unwrap().into_array().unwrap();
    assert!(matches!(
        array.get(0).unwrap_err(),
        Error::Decode(DecodeError::MalformedNumber(_))
    ));
}

#[test]
fn to_bytes_is_verbatim_never_reserialized() {
    let input = b" [1,\n  {\"k\": [true]}\n] ";
    let doc = parse(input).unwrap();
    assert_eq!(doc.to_bytes(), input);
}

#[test]
fn from_iterator_matches_repeated_append() {
    let collected: JsonArray = [1i64, 2, 3].into_iter().collect();
    let mut appended = JsonArray::new();
    for value in [1i64, 2, 3] {
        appended.append(value);
    }
    assert_eq!(collected.to_bytes(), appended.to_bytes());
}

fn json_array(values: &[i64]) -> JsonArray {
    values.iter().copied().collect()
}
