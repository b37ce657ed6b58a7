//! Transport selection and response decoding.
//!
//! # Design
//! `build_request` turns a payload into exactly one planned request, either a
//! JSON `POST` or a callback `GET`, and `parse_response` turns the matching
//! response back into JSON. Nothing here performs I/O. The environment is an
//! argument so both branches can be exercised from any host.

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::{Environment, Settings, TransportMethod};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::{count_bytes_in_string, join_params, stringify, MAX_QUERY_BYTES};
use crate::url::resolve_url;

/// Fixed timeout of the callback transport.
pub const JSONP_TIMEOUT: Duration = Duration::from_millis(1000);

/// Header carrying the API key on `POST`.
pub const KEY_HEADER: &str = "x-key";

/// Query parameter naming the callback on the callback transport.
pub const CALLBACK_PARAM: &str = "callback";

/// A request ready to be executed, plus what is needed to decode its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub transport: TransportMethod,
    pub request: HttpRequest,
    /// Generated callback name; set only for the callback transport.
    pub callback: Option<String>,
}

/// Plan the request for `path` carrying `data`.
///
/// Falls back from the callback transport to `POST` when the query string
/// exceeds `MAX_QUERY_BYTES`.
#[instrument(level = "debug", skip(data, settings), fields(method = %settings.method))]
pub fn build_request<T: Serialize + ?Sized>(
    path: &str,
    data: &T,
    settings: &Settings,
    environment: Environment,
) -> Result<Dispatch, ApiError> {
    if environment == Environment::Server && settings.method == TransportMethod::Jsonp {
        return Err(ApiError::MethodNotAllowed {
            method: TransportMethod::Jsonp,
            environment,
        });
    }

    let data = serde_json::to_value(data).map_err(|e| ApiError::SerializationError(e.to_string()))?;
    let mut with_key = match &data {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    with_key.insert("key".to_string(), Value::String(settings.key.clone()));
    let query = stringify(&Value::Object(with_key));
    let query_bytes = count_bytes_in_string(&query);
    let url = resolve_url(&settings.host, path);

    if settings.method == TransportMethod::Post || query_bytes > MAX_QUERY_BYTES {
        if settings.method == TransportMethod::Jsonp {
            warn!(query_bytes, limit = MAX_QUERY_BYTES, "query too large for jsonp, falling back to post");
        }
        debug!(%url, "dispatching post");
        let body = serde_json::to_string(&data).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        return Ok(Dispatch {
            transport: TransportMethod::Post,
            request: HttpRequest {
                method: HttpMethod::Post,
                url,
                headers: vec![
                    (KEY_HEADER.to_string(), settings.key.clone()),
                    ("content-type".to_string(), "application/json".to_string()),
                ],
                body: Some(body),
                timeout: None,
            },
            callback: None,
        });
    }

    let callback = format!("{}{}", settings.jsonp_callback_prefix, Uuid::new_v4().simple());
    let url = join_params(
        &join_params(&url, &query),
        &format!("{CALLBACK_PARAM}={callback}"),
    );
    debug!(%url, query_bytes, "dispatching jsonp");
    Ok(Dispatch {
        transport: TransportMethod::Jsonp,
        request: HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: Vec::new(),
            body: None,
            timeout: Some(JSONP_TIMEOUT),
        },
        callback: Some(callback),
    })
}

/// Decode the response to a request planned by `build_request`.
pub fn parse_response(dispatch: &Dispatch, response: HttpResponse) -> Result<Value, ApiError> {
    debug!(status = response.status, transport = %dispatch.transport, "response received");
    if !response.is_success() {
        return Err(ApiError::Http {
            status: response.status,
            body: response.body,
        });
    }
    match (dispatch.transport, dispatch.callback.as_deref()) {
        (TransportMethod::Post, _) => serde_json::from_str(&response.body)
            .map_err(|e| ApiError::DeserializationError(e.to_string())),
        (TransportMethod::Jsonp, Some(callback)) => {
            parse_jsonp(callback, &response.body).map(to_plain_object)
        }
        (TransportMethod::Jsonp, None) => Err(ApiError::DeserializationError(
            "jsonp dispatch has no callback name".to_string(),
        )),
    }
}

/// Extract the argument of `callback(...)` from a script body such as
/// `typeof cb === 'function' && cb({...});`.
pub fn parse_jsonp(callback: &str, body: &str) -> Result<Value, ApiError> {
    let call = format!("{callback}(");
    let start = body
        .find(&call)
        .map(|i| i + call.len())
        .ok_or_else(|| ApiError::DeserializationError(format!("callback {callback} not invoked")))?;
    let args = body[start..].trim_end().trim_end_matches(';').trim_end();
    let args = args
        .strip_suffix(')')
        .ok_or_else(|| ApiError::DeserializationError("unterminated callback invocation".to_string()))?;
    serde_json::from_str(args).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Objects pass through; arrays become index-keyed objects; anything else
/// becomes an empty object.
fn to_plain_object(value: Value) -> Value {
    match value {
        Value::Object(_) => value,
        Value::Array(items) => Value::Object(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
        ),
        _ => Value::Object(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{make_settings, Config};
    use serde_json::json;

    const KEY: &str = "testApiKey";
    const PATH: &str = "/test-path";

    fn settings(method: Option<TransportMethod>, environment: Environment) -> Settings {
        let mut config = Config::new(KEY).with_host("http://localhost:3000");
        config.method = method;
        make_settings(&config, environment)
    }

    fn query_param(url: &str, name: &str) -> Option<String> {
        let query = url.split_once('?')?.1;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.to_string())
    }

    #[test]
    fn browser_defaults_to_jsonp() {
        let d = build_request(PATH, &json!({ "value": "testValue" }), &settings(None, Environment::Browser), Environment::Browser).unwrap();
        assert_eq!(d.transport, TransportMethod::Jsonp);
        assert_eq!(d.request.method, HttpMethod::Get);
        assert_eq!(d.request.timeout, Some(Duration::from_millis(1000)));
        assert!(d.request.body.is_none());
    }

    #[test]
    fn jsonp_sends_key_and_data_as_query() {
        let d = build_request(PATH, &json!({ "value": "testValue" }), &settings(None, Environment::Browser), Environment::Browser).unwrap();
        assert!(d.request.url.starts_with("http://localhost:3000/test-path?"));
        assert_eq!(query_param(&d.request.url, "key").as_deref(), Some(KEY));
        assert_eq!(query_param(&d.request.url, "value").as_deref(), Some("testValue"));
    }

    #[test]
    fn jsonp_callback_uses_prefix_and_is_unique() {
        let s = settings(None, Environment::Browser);
        let a = build_request(PATH, &json!({}), &s, Environment::Browser).unwrap();
        let b = build_request(PATH, &json!({}), &s, Environment::Browser).unwrap();
        let callback = a.callback.clone().unwrap();
        assert!(callback.starts_with("findifyCallback"));
        assert_eq!(query_param(&a.request.url, "callback"), a.callback);
        assert_ne!(a.callback, b.callback);
    }

    #[test]
    fn server_defaults_to_post() {
        let d = build_request(PATH, &json!({ "value": "testValue" }), &settings(None, Environment::Server), Environment::Server).unwrap();
        assert_eq!(d.transport, TransportMethod::Post);
        assert_eq!(d.request.method, HttpMethod::Post);
    }

    #[test]
    fn jsonp_in_server_is_rejected() {
        let err = build_request(
            PATH,
            &json!({ "value": "testValue" }),
            &settings(Some(TransportMethod::Jsonp), Environment::Server),
            Environment::Server,
        )
        .unwrap_err();
        assert!(err.to_string().contains("jsonp method is not allowed in server environment"));
    }

    #[test]
    fn explicit_post_wins_in_browser() {
        let d = build_request(
            PATH,
            &json!({ "value": "testValue" }),
            &settings(Some(TransportMethod::Post), Environment::Browser),
            Environment::Browser,
        )
        .unwrap();
        assert_eq!(d.request.method, HttpMethod::Post);
    }

    #[test]
    fn large_query_falls_back_to_post() {
        let value = ".".repeat(4096);
        let d = build_request(
            PATH,
            &json!({ "value": value }),
            &settings(Some(TransportMethod::Jsonp), Environment::Browser),
            Environment::Browser,
        )
        .unwrap();
        assert_eq!(d.transport, TransportMethod::Post);
        assert!(d.callback.is_none());
    }

    #[test]
    fn explicit_post_ignores_query_size() {
        let value = ".".repeat(MAX_QUERY_BYTES + 1);
        let settings = settings(Some(TransportMethod::Post), Environment::Browser);
        let dispatch =
            build_request("/search", &json!({ "q": value }), &settings, Environment::Browser)
                .unwrap();
        assert_eq!(dispatch.transport, TransportMethod::Post);
        assert_eq!(dispatch.request.method, HttpMethod::Post);
        assert!(dispatch.callback.is_none());
    }

    #[test]
    fn query_at_limit_stays_jsonp() {
        // "key=testApiKey&v=" is 17 bytes
        let value = "a".repeat(MAX_QUERY_BYTES - 17);
        let d = build_request(
            PATH,
            &json!({ "v": value }),
            &settings(Some(TransportMethod::Jsonp), Environment::Browser),
            Environment::Browser,
        )
        .unwrap();
        assert_eq!(d.transport, TransportMethod::Jsonp);
    }

    #[test]
    fn post_headers_and_body() {
        let data = json!({ "value": "testValue" });
        let d = build_request(PATH, &data, &settings(Some(TransportMethod::Post), Environment::Server), Environment::Server).unwrap();
        assert_eq!(d.request.url, "http://localhost:3000/test-path");
        assert_eq!(d.request.header("x-key"), Some(KEY));
        assert_eq!(d.request.header("content-type"), Some("application/json"));
        assert_eq!(d.request.body.as_deref(), Some(r#"{"value":"testValue"}"#));
        assert!(d.request.timeout.is_none());
    }

    #[test]
    fn post_to_search_example() {
        let config = Config::new("k1");
        let s = make_settings(&config, Environment::Server);
        let d = build_request("/search", &json!({ "q": "shoe" }), &s, Environment::Server).unwrap();
        assert_eq!(d.request.url, "https://api-v3.findify.io/search");
        assert_eq!(d.request.body.as_deref(), Some(r#"{"q":"shoe"}"#));
        assert_eq!(d.request.header("x-key"), Some("k1"));

        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"items":[],"meta":{"total":0}}"#.to_string(),
        };
        let value = parse_response(&d, response).unwrap();
        assert_eq!(value, json!({ "items": [], "meta": { "total": 0 } }));
    }

    #[test]
    fn parse_post_bad_json() {
        let d = build_request(PATH, &json!({}), &settings(None, Environment::Server), Environment::Server).unwrap();
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "not json".to_string(),
        };
        assert!(matches!(parse_response(&d, response), Err(ApiError::DeserializationError(_))));
    }

    #[test]
    fn parse_http_error_status() {
        let d = build_request(PATH, &json!({}), &settings(None, Environment::Server), Environment::Server).unwrap();
        let response = HttpResponse {
            status: 401,
            headers: Vec::new(),
            body: "unauthorized".to_string(),
        };
        let err = parse_response(&d, response).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 401, .. }));
    }

    #[test]
    fn parse_jsonp_response_body() {
        let d = build_request(PATH, &json!({}), &settings(None, Environment::Browser), Environment::Browser).unwrap();
        let callback = d.callback.clone().unwrap();
        let body = json!({
            "value": "test response body value",
            "value2": "test response body value2",
        });
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: format!("typeof {callback} === 'function' && {callback}({body});"),
        };
        assert_eq!(parse_response(&d, response).unwrap(), body);
    }

    #[test]
    fn parse_jsonp_plain_invocation() {
        let value = parse_jsonp("cb", "/**/ cb({\"a\":1})").unwrap();
        assert_eq!(value, json!({ "a": 1 }));
    }

    #[test]
    fn parse_jsonp_missing_callback() {
        let err = parse_jsonp("cb", "other({})").unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn jsonp_arrays_become_keyed_objects() {
        assert_eq!(to_plain_object(json!(["a", "b"])), json!({ "0": "a", "1": "b" }));
        assert_eq!(to_plain_object(json!("text")), json!({}));
        assert_eq!(to_plain_object(Value::Null), json!({}));
    }
}
