use axum::{
    body::{Body, Bytes},
    extract::{
        rejection::{BytesRejection, JsonRejection},
        FromRequest, Request, State,
    },
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::{Map, Value};
use service::StringService;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::errors::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub strings: StringService,
}

/// HTML fragment for the read endpoint. The value is embedded as-is, without escaping.
pub fn render_saved_string(value: &str) -> String {
    format!("<h1>The saved string is {value}</h1>")
}

/// GET / : render the current value
pub async fn read_string(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let value = state.strings.read().await?;
    Ok(Html(render_saved_string(&value)))
}

/// Parse the raw body as a JSON object with the same content-type and
/// syntax rules as the `Json` extractor.
async fn parse_json_object(headers: HeaderMap, raw: Bytes) -> Result<Map<String, Value>, JsonRejection> {
    let mut req = Request::new(Body::from(raw));
    *req.headers_mut() = headers;
    let Json(body) = Json::<Map<String, Value>>::from_request(req, &()).await?;
    Ok(body)
}

/// PUT /set_string : overwrite the value, echo the body back
///
/// The echo is the request bytes as received; re-serialising the parsed map
/// would turn integers beyond 64 bits into floats.
pub async fn set_string(
    State(state): State<AppState>,
    headers: HeaderMap,
    raw: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let raw = raw?;
    let body = parse_json_object(headers, raw.clone()).await?;
    state.strings.write(&body).await?;
    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        raw,
    )
        .into_response())
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(read_string))
        .route("/set_string", put(set_string))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
