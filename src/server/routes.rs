//! Request routing and handlers.

use crate::error::LoadError;
use crate::server::page;
use crate::state::{AppState, Source};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::error::Error as StdError;
use std::str::FromStr;
use tracing::{debug, error};

/// Uploaded files larger than this are refused.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;
const FILE_NAME_HEADER: &str = "x-file-name";
const JSON: &str = "application/json";
const HTML: &str = "text/html; charset=utf-8";

type BoxError = Box<dyn StdError + Send + Sync>;

/// Routes a request. Never fails: every error becomes a response with a JSON `error` body.
pub async fn handle<B>(state: &AppState, req: Request<B>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!("{method} {path}");

    match (&method, path.as_str()) {
        (&Method::GET, "/") => respond(StatusCode::OK, HTML, page::INDEX),
        (&Method::GET, "/health") => health(state),
        (&Method::GET, "/api/dashboard") => dashboard(state),
        (&Method::GET, "/api/grid") => grid(state, req.uri().query()),
        (&Method::POST, "/api/reload") => reload(state).await,
        (&Method::POST, "/api/upload") => upload(state, req).await,
        (_, "/" | "/health" | "/api/dashboard" | "/api/grid") => method_not_allowed("GET"),
        (_, "/api/reload" | "/api/upload") => method_not_allowed("POST"),
        _ => error_response(StatusCode::NOT_FOUND, format!("No route for {path}")),
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    reload_state: String,
    published: bool,
}

fn health(state: &AppState) -> Response<Full<Bytes>> {
    json(
        StatusCode::OK,
        &Health {
            status: "alive",
            version: env!("CARGO_PKG_VERSION"),
            reload_state: state.reload_state().to_string(),
            published: state.current().is_some(),
        },
    )
}

fn dashboard(state: &AppState) -> Response<Full<Bytes>> {
    match state.current() {
        Some(dashboard) => json(StatusCode::OK, &dashboard.view()),
        None => not_loaded(),
    }
}

/// Serves one grid page. When the caller names the snapshot it is paging through and that
/// snapshot is no longer published, answers 409 so the page re-fetches the whole dashboard
/// instead of mixing rows from one table with charts from another.
fn grid(state: &AppState, query: Option<&str>) -> Response<Full<Bytes>> {
    let (page, snapshot) = match (
        query_param::<usize>(query, "page"),
        query_param::<u64>(query, "snapshot"),
    ) {
        (Ok(page), Ok(snapshot)) => (page.unwrap_or(1), snapshot),
        (Err(message), _) | (_, Err(message)) => {
            return error_response(StatusCode::BAD_REQUEST, message)
        }
    };
    let Some(dashboard) = state.current() else {
        return not_loaded();
    };
    match snapshot {
        Some(wanted) if wanted != dashboard.snapshot() => error_response(
            StatusCode::CONFLICT,
            format!(
                "Snapshot {wanted} has been replaced by snapshot {}; reload the dashboard",
                dashboard.snapshot()
            ),
        ),
        _ => json(StatusCode::OK, &dashboard.page(page)),
    }
}

/// Reads `key` from the query string. Absent keys are `None`; unparseable values are an error.
fn query_param<T: FromStr>(query: Option<&str>, key: &str) -> Result<Option<T>, String> {
    let Some(query) = query else {
        return Ok(None);
    };
    match url::form_urlencoded::parse(query.as_bytes()).find(|(k, _)| k == key) {
        None => Ok(None),
        Some((_, value)) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Invalid {key} '{value}'")),
    }
}

async fn reload(state: &AppState) -> Response<Full<Bytes>> {
    match state.reload().await {
        Ok(dashboard) => json(StatusCode::OK, &dashboard.view()),
        Err(e) => load_failed(e),
    }
}

async fn upload<B>(state: &AppState, req: Request<B>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let name = req
        .headers()
        .get(FILE_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("uploaded.csv")
        .to_string();

    let bytes = match Limited::new(req.into_body(), MAX_UPLOAD_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Uploads are limited to {MAX_UPLOAD_BYTES} bytes"),
            )
        }
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Unable to read the upload: {e}"),
            )
        }
    };
    debug!("Received upload '{name}' of {} bytes", bytes.len());

    let source = Source::Upload {
        name,
        bytes: bytes.to_vec(),
    };
    match state.reload_from(source).await {
        Ok(dashboard) => json(StatusCode::OK, &dashboard.view()),
        Err(e) => load_failed(e),
    }
}

/// Maps a failed reload to a status code. Bad data is the client's problem; a missing configured
/// file is the server's.
fn load_failed(e: anyhow::Error) -> Response<Full<Bytes>> {
    let status = match e.downcast_ref::<LoadError>() {
        Some(LoadError::ParseError { .. }) | Some(LoadError::SchemaError(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, format!("{e:#}"))
}

fn not_loaded() -> Response<Full<Bytes>> {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "No transactions have been loaded yet; reload or upload a CSV file",
    )
}

fn method_not_allowed(allow: &'static str) -> Response<Full<Bytes>> {
    let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response<Full<Bytes>> {
    json(
        status,
        &ErrorBody {
            error: message.into(),
        },
    )
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => respond(status, JSON, body),
        Err(e) => {
            error!("Unable to serialize a response: {e}");
            respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                JSON,
                r#"{"error":"Unable to serialize the response"}"#,
            )
        }
    }
}

fn respond(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use serde_json::Value;

    fn get(uri: &str) -> Request<Full<Bytes>> {
        Request::get(uri).body(Full::new(Bytes::new())).unwrap()
    }

    fn post(uri: &str, body: &'static str) -> Request<Full<Bytes>> {
        Request::post(uri)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    async fn body_json(response: Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn loaded_state(env: &TestEnv) -> AppState {
        let state = AppState::new(env.config().clone());
        state.reload().await.unwrap();
        state
    }

    #[tokio::test]
    async fn test_index_page() {
        let env = TestEnv::new().await;
        let state = AppState::new(env.config().clone());
        let response = handle(&state, get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], HTML);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("id=\"amount-chart\""));
        assert!(html.contains("id=\"units-chart\""));
        assert!(html.contains("id=\"transactions\""));
    }

    #[tokio::test]
    async fn test_dashboard() {
        let env = TestEnv::new().await;
        let state = loaded_state(&env).await;
        let response = handle(&state, get("/api/dashboard")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;

        assert_eq!(value["amount_chart"]["data"][0]["y"], serde_json::json!([15.0, 7.0]));
        assert_eq!(value["units_chart"]["data"][0]["y"], serde_json::json!([2.0, 1.0]));
        assert_eq!(
            value["columns"],
            serde_json::json!(["Date", "Description", "Total (EUR)", "Channel", "Week", "Units Sold"])
        );
        assert_eq!(value["grid"]["page"], 1);
        assert_eq!(value["grid"]["page_count"], 1);
        assert_eq!(value["grid"]["rows"].as_array().unwrap().len(), 3);
        assert_eq!(value["summary"][0]["week"], "2024-01-01");
        assert_eq!(value["summary"][0]["total_amount"], "15.00");
        assert_eq!(value["summary"][0]["total_units"], 2);
    }

    #[tokio::test]
    async fn test_dashboard_before_first_load() {
        let env = TestEnv::new().await;
        let state = AppState::new(env.config().clone());
        let response = handle(&state, get("/api/dashboard")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let response = handle(&state, get("/api/grid?page=1")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_grid_pages() {
        let env = TestEnv::new().await;
        let mut csv = String::from("Date,Total (EUR)\n");
        for day in 1..=25 {
            csv.push_str(&format!("{day:02}/01/2024,{day}.00\n"));
        }
        env.write_source(&csv).await;
        let state = loaded_state(&env).await;

        let value = body_json(handle(&state, get("/api/grid")).await).await;
        assert_eq!(value["page"], 1);
        assert_eq!(value["page_count"], 3);
        assert_eq!(value["total_rows"], 25);
        assert_eq!(value["rows"].as_array().unwrap().len(), 10);
        assert_eq!(value["rows"][0][0], "2024-01-01");

        let value = body_json(handle(&state, get("/api/grid?page=3")).await).await;
        assert_eq!(value["rows"].as_array().unwrap().len(), 5);
        assert_eq!(value["rows"][0][0], "2024-01-21");

        let response = handle(&state, get("/api/grid?page=two")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = handle(&state, get("/api/grid?page=1&snapshot=new")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_grid_from_replaced_snapshot_conflicts() {
        let env = TestEnv::new().await;
        let state = loaded_state(&env).await;

        let view = body_json(handle(&state, get("/api/dashboard")).await).await;
        let first = view["snapshot"].as_u64().unwrap();
        assert_eq!(view["grid"]["snapshot"], first);

        let uri = format!("/api/grid?page=1&snapshot={first}");
        let value = body_json(handle(&state, get(&uri)).await).await;
        assert_eq!(value["snapshot"], first);
        assert_eq!(value["rows"].as_array().unwrap().len(), 3);

        // Another client replaces the table between two page requests.
        let req = Request::post("/api/upload")
            .header(FILE_NAME_HEADER, "other.csv")
            .body(Full::new(Bytes::from_static(
                b"Shop,Date,Total (EUR)\nx,05/02/2024,99.00\n",
            )))
            .unwrap();
        assert_eq!(handle(&state, req).await.status(), StatusCode::OK);

        let response = handle(&state, get(&uri)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let value = body_json(response).await;
        assert!(value["error"].as_str().unwrap().contains("replaced"));

        let view = body_json(handle(&state, get("/api/dashboard")).await).await;
        let second = view["snapshot"].as_u64().unwrap();
        assert!(second > first);
        assert_eq!(view["columns"][0], "Shop");
        let uri = format!("/api/grid?page=1&snapshot={second}");
        let value = body_json(handle(&state, get(&uri)).await).await;
        assert_eq!(value["rows"][0][0], "x");
    }

    #[tokio::test]
    async fn test_reload_reads_configured_path() {
        let env = TestEnv::new().await;
        let state = loaded_state(&env).await;
        env.write_source("Date,Total (EUR)\n15/01/2024,1.00\n").await;

        let response = handle(&state, post("/api/reload", "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["grid"]["total_rows"], 1);
        assert_eq!(value["summary"][0]["week"], "2024-01-15");
    }

    #[tokio::test]
    async fn test_upload_consumes_body() {
        let env = TestEnv::new().await;
        let state = loaded_state(&env).await;
        let req = Request::post("/api/upload")
            .header(FILE_NAME_HEADER, "feb.csv")
            .body(Full::new(Bytes::from_static(
                b"Date,Total (EUR),Shop\n05/02/2024,3.00,A\n06/02/2024,4.00,B\n",
            )))
            .unwrap();
        let response = handle(&state, req).await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["source"], "upload: feb.csv");
        assert_eq!(value["summary"][0]["total_amount"], "7.00");
        assert_eq!(value["columns"][2], "Shop");
    }

    #[tokio::test]
    async fn test_bad_upload_keeps_dashboard() {
        let env = TestEnv::new().await;
        let state = loaded_state(&env).await;

        let response = handle(
            &state,
            post("/api/upload", "Date,Total (EUR)\n31/02/2024,1.00\n"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let value = body_json(response).await;
        assert!(value["error"].as_str().unwrap().contains("line 2"));

        let response = handle(&state, post("/api/upload", "When,Total (EUR)\n")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let value = body_json(handle(&state, get("/api/dashboard")).await).await;
        assert_eq!(value["grid"]["total_rows"], 3);
    }

    #[tokio::test]
    async fn test_overflowing_upload_keeps_dashboard() {
        let env = TestEnv::new().await;
        let state = loaded_state(&env).await;
        let response = handle(
            &state,
            post(
                "/api/upload",
                "Date,Total (EUR)\n02/01/2024,79228162514264337593543950335\n\
                03/01/2024,79228162514264337593543950335\n",
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let value = body_json(handle(&state, get("/api/dashboard")).await).await;
        assert_eq!(value["snapshot"], 1);
        assert_eq!(value["grid"]["total_rows"], 3);
    }

    #[tokio::test]
    async fn test_reload_with_missing_source() {
        let env = TestEnv::new().await;
        let state = loaded_state(&env).await;
        env.remove_source().await;
        let response = handle(&state, post("/api/reload", "")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let value = body_json(handle(&state, get("/api/dashboard")).await).await;
        assert_eq!(value["grid"]["total_rows"], 3);
    }

    #[tokio::test]
    async fn test_health() {
        let env = TestEnv::new().await;
        let state = AppState::new(env.config().clone());
        let value = body_json(handle(&state, get("/health")).await).await;
        assert_eq!(value["status"], "alive");
        assert_eq!(value["reload_state"], "idle");
        assert_eq!(value["published"], false);
    }

    #[tokio::test]
    async fn test_unknown_route_and_wrong_method() {
        let env = TestEnv::new().await;
        let state = AppState::new(env.config().clone());
        let response = handle(&state, get("/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = handle(&state, get("/api/reload")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST");

        let response = handle(&state, post("/api/dashboard", "")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
