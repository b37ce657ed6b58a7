use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{Path, Query},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::info;

/// How long `/slow` waits before answering; longer than the client's
/// callback timeout.
pub const SLOW_DELAY: Duration = Duration::from_millis(1500);

/// What the server saw, echoed back as the response body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub transport: String,
    pub path: String,
    pub key: Option<String>,
    pub content_type: Option<String>,
    #[serde(default)]
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

pub fn app() -> Router {
    Router::new()
        .route("/autocomplete", get(jsonp_autocomplete).post(post_autocomplete))
        .route("/search", get(jsonp_search).post(post_search))
        .route(
            "/smart-collection/{slot}",
            get(jsonp_collection).post(post_collection),
        )
        .route("/slow", get(slow_jsonp).post(slow_post))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock findify api listening");
    }
    axum::serve(listener, app()).await
}

async fn post_autocomplete(headers: HeaderMap, body: String) -> Response {
    echo_post("/autocomplete".to_string(), &headers, &body)
}

async fn post_search(headers: HeaderMap, body: String) -> Response {
    echo_post("/search".to_string(), &headers, &body)
}

async fn post_collection(Path(slot): Path<String>, headers: HeaderMap, body: String) -> Response {
    echo_post(format!("/smart-collection/{slot}"), &headers, &body)
}

async fn jsonp_autocomplete(Query(query): Query<HashMap<String, String>>) -> Response {
    echo_jsonp("/autocomplete".to_string(), query)
}

async fn jsonp_search(Query(query): Query<HashMap<String, String>>) -> Response {
    echo_jsonp("/search".to_string(), query)
}

async fn jsonp_collection(
    Path(slot): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    echo_jsonp(format!("/smart-collection/{slot}"), query)
}

async fn slow_post(headers: HeaderMap, body: String) -> Response {
    tokio::time::sleep(SLOW_DELAY).await;
    echo_post("/slow".to_string(), &headers, &body)
}

async fn slow_jsonp(Query(query): Query<HashMap<String, String>>) -> Response {
    tokio::time::sleep(SLOW_DELAY).await;
    echo_jsonp("/slow".to_string(), query)
}

fn echo_post(path: String, headers: &HeaderMap, body: &str) -> Response {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let key = header_value("x-key");
    if key.is_none() {
        return error(StatusCode::UNAUTHORIZED, "missing x-key header");
    }
    let body: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return error(StatusCode::BAD_REQUEST, "body is not json"),
    };
    let echo = Echo {
        transport: "post".to_string(),
        path,
        key,
        content_type: header_value("content-type"),
        query: HashMap::new(),
        body: Some(body),
    };
    Json(echo).into_response()
}

fn echo_jsonp(path: String, query: HashMap<String, String>) -> Response {
    let Some(callback) = query.get("callback").cloned() else {
        return error(StatusCode::BAD_REQUEST, "missing callback param");
    };
    let Some(key) = query.get("key").cloned() else {
        return error(StatusCode::UNAUTHORIZED, "missing key param");
    };
    let echo = Echo {
        transport: "jsonp".to_string(),
        path,
        key: Some(key),
        content_type: None,
        query,
        body: None,
    };
    let payload = serde_json::to_string(&echo).unwrap_or_else(|_| "{}".to_string());
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        format!("typeof {callback} === 'function' && {callback}({payload});"),
    )
        .into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_serializes_to_json() {
        let echo = Echo {
            transport: "post".to_string(),
            path: "/search".to_string(),
            key: Some("k".to_string()),
            content_type: Some("application/json".to_string()),
            query: HashMap::new(),
            body: Some(serde_json::json!({ "q": "shoe" })),
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["transport"], "post");
        assert_eq!(json["body"]["q"], "shoe");
    }

    #[test]
    fn echo_query_defaults_to_empty() {
        let echo: Echo = serde_json::from_str(
            r#"{"transport":"post","path":"/","key":null,"content_type":null,"body":null}"#,
        )
        .unwrap();
        assert!(echo.query.is_empty());
    }

    #[test]
    fn jsonp_without_callback_is_bad_request() {
        let response = echo_jsonp("/search".to_string(), HashMap::new());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn post_without_key_is_unauthorized() {
        let response = echo_post("/search".to_string(), &HeaderMap::new(), "{}");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
