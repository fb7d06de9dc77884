//! Check the serializer and the response parser against JSON vectors stored
//! in `test-vectors/`.
//!
//! Vectors are plain strings so they can be shared with non-Rust consumers of
//! the C library; the wire format is compared byte for byte.

use snapreq::{parse_response, serialize_request, ExchangeError, RequestSpec};

const DEFAULT_CAPACITY: usize = 10 * 1024;

// ---------------------------------------------------------------------------
// Serialize
// ---------------------------------------------------------------------------

#[test]
fn serialize_test_vectors() {
    let raw = include_str!("../../test-vectors/serialize.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let spec: RequestSpec = serde_json::from_value(case["spec"].clone()).unwrap();
        let capacity = case["capacity"]
            .as_u64()
            .map(|c| c as usize)
            .unwrap_or(DEFAULT_CAPACITY);

        let wire = serialize_request(&spec, capacity);
        let expected = case["expected"].as_str().unwrap();
        assert_eq!(
            String::from_utf8_lossy(&wire),
            expected,
            "{name}: wire bytes"
        );
        assert!(wire.len() <= capacity, "{name}: capacity");
    }
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

#[test]
fn parse_test_vectors() {
    let raw = include_str!("../../test-vectors/parse.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = case["raw"].as_str().unwrap();
        let expected = &case["expected"];

        let record = parse_response(input.as_bytes(), false).unwrap();
        assert_eq!(
            u64::from(record.status()),
            expected["status"].as_u64().unwrap(),
            "{name}: status"
        );
        assert_eq!(
            record.headers_str(),
            expected["headers"].as_str().unwrap(),
            "{name}: headers"
        );
        match expected["body"].as_str() {
            Some(body) => {
                assert!(record.has_body(), "{name}: body present");
                assert_eq!(record.body_str(), body, "{name}: body");
            }
            None => assert!(!record.has_body(), "{name}: body absent"),
        }
        assert!(!record.is_truncated(), "{name}: truncated");
    }
}

#[test]
fn malformed_parse_vectors() {
    let raw = include_str!("../../test-vectors/parse.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["malformed"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = case["raw"].as_str().unwrap();

        let err = parse_response(input.as_bytes(), false).unwrap_err();
        assert!(matches!(err, ExchangeError::Parse(_)), "{name}: {err}");
    }
}
