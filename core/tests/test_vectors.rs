//! Verify transport selection against JSON test vectors stored in `test-vectors/`.
//!
//! Each case names an environment, a configured method and a payload, and
//! describes the request the dispatcher must plan. Bodies are compared as
//! parsed JSON to avoid false negatives from field ordering.

use std::time::Duration;

use findify_core::{build_request, make_settings, ApiError, Config, Environment, HttpMethod, TransportMethod};

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_transport(s: &str) -> TransportMethod {
    serde_json::from_value(serde_json::Value::String(s.to_string())).unwrap()
}

fn parse_environment(s: &str) -> Environment {
    serde_json::from_value(serde_json::Value::String(s.to_string())).unwrap()
}

/// Drop the generated `callback` parameter so urls compare deterministically.
fn without_callback(url: &str) -> &str {
    match url.find("&callback=") {
        Some(i) => &url[..i],
        None => url,
    }
}

#[test]
fn dispatch_test_vectors() {
    let raw = include_str!("../../test-vectors/dispatch.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let environment = parse_environment(case["environment"].as_str().unwrap());

        let mut config = Config::new(case["key"].as_str().unwrap()).with_host(case["host"].as_str().unwrap());
        config.method = case["method"].as_str().map(parse_transport);
        let settings = make_settings(&config, environment);

        let result = build_request(case["path"].as_str().unwrap(), &case["data"], &settings, environment);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "MethodNotAllowed" => {
                    assert!(matches!(err, ApiError::MethodNotAllowed { .. }), "{name}: expected MethodNotAllowed")
                }
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            continue;
        }

        let dispatch = result.unwrap();
        let expected = &case["expected_request"];

        assert_eq!(
            dispatch.transport,
            parse_transport(expected["transport"].as_str().unwrap()),
            "{name}: transport"
        );
        assert_eq!(
            dispatch.request.method,
            parse_method(expected["method"].as_str().unwrap()),
            "{name}: method"
        );
        assert_eq!(
            without_callback(&dispatch.request.url),
            expected["url"].as_str().unwrap(),
            "{name}: url"
        );

        let expected_headers: Vec<(String, String)> = expected["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(dispatch.request.headers, expected_headers, "{name}: headers");

        match dispatch.request.body.as_deref() {
            Some(body) => {
                let body: serde_json::Value = serde_json::from_str(body).unwrap();
                assert_eq!(body, expected["body"], "{name}: body");
            }
            None => assert!(expected["body"].is_null(), "{name}: body should be None"),
        }

        let timeout = expected["timeout_ms"].as_u64().map(Duration::from_millis);
        assert_eq!(dispatch.request.timeout, timeout, "{name}: timeout");

        if dispatch.transport == TransportMethod::Jsonp {
            let callback = dispatch.callback.as_deref().unwrap();
            assert!(callback.starts_with("findifyCallback"), "{name}: callback prefix");
            assert!(dispatch.request.url.ends_with(&format!("&callback={callback}")), "{name}: callback param");
        }
    }
}
