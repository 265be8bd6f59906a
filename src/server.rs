// HTTP surface: the dashboard page and its two JSON endpoints.
//
// - `GET /`: dashboard page with the logo inlined.
// - `GET /api/data/:department`: raw backend records, `[]` on any failure.
// - `GET /api/dashboard/:department?source=&sheet_id=&person=`: people list
//   plus the aggregated summary or an error.
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::Engine;
use chrono::Local;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SourceKind;
use crate::reports::{dashboard_view, DashboardView};
use crate::source::{load_records, RecordSource, SheetSource};
use crate::types::{Department, Record};

const PAGE: &str = include_str!("../assets/dashboard.html");

/// Where direct spreadsheet loads go.
#[derive(Clone)]
pub struct SheetsConfig {
    pub client: Client,
    pub base_url: String,
    pub default_sheet_id: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    backend: Arc<dyn RecordSource>,
    sheets: SheetsConfig,
    logo_src: Arc<str>,
}

impl AppState {
    pub fn new(backend: Arc<dyn RecordSource>, sheets: SheetsConfig, logo_src: String) -> Self {
        Self {
            backend,
            sheets,
            logo_src: logo_src.into(),
        }
    }

    fn source_for(&self, kind: SourceKind, sheet_id: Option<&str>) -> Arc<dyn RecordSource> {
        match kind {
            SourceKind::Backend => self.backend.clone(),
            SourceKind::Sheets => {
                let id = sheet_id
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .or(self.sheets.default_sheet_id.as_deref())
                    .unwrap_or_default();
                Arc::new(SheetSource::new(
                    self.sheets.client.clone(),
                    self.sheets.base_url.clone(),
                    id,
                ))
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/api/data/:department", get(raw_records))
        .route("/api/dashboard/:department", get(dashboard_data))
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("dashboard available at http://localhost:{}", port);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}

/// Read an image and return it as a `data:` URL for inlining.
///
/// A missing or unreadable file is logged and gives an empty string, which
/// leaves the page without a logo.
pub fn logo_data_url(path: &Path) -> String {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "logo not loaded");
            return String::new();
        }
    };
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "image/svg+xml",
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, encoded)
}

async fn dashboard_page(State(state): State<AppState>) -> Html<String> {
    Html(PAGE.replace("{{ logo_src }}", &state.logo_src))
}

// Failures are only logged here; the page just sees an empty list.
async fn raw_records(
    State(state): State<AppState>,
    UrlPath(department): UrlPath<String>,
) -> (StatusCode, Json<Vec<Record>>) {
    let department: Department = match department.parse() {
        Ok(d) => d,
        Err(e) => {
            warn!("{}", e);
            return (StatusCode::NOT_FOUND, Json(Vec::new()));
        }
    };
    let fetched = load_records(state.backend.as_ref(), department).await;
    (StatusCode::OK, Json(fetched.records))
}

#[derive(Debug, Default, Deserialize)]
struct DashboardQuery {
    #[serde(default)]
    source: SourceKind,
    sheet_id: Option<String>,
    #[serde(default)]
    person: String,
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    #[serde(flatten)]
    view: DashboardView,
    updated_at: String,
}

async fn dashboard_data(
    State(state): State<AppState>,
    UrlPath(department): UrlPath<String>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let department: Department = match department.parse() {
        Ok(d) => d,
        Err(e) => {
            let body = serde_json::json!({
                "department": e.0,
                "people": [],
                "person": "",
                "record_count": 0,
                "summary": null,
                "error": format!("Unknown department: {}", e.0),
                "updated_at": Local::now().to_rfc3339(),
            });
            return (StatusCode::NOT_FOUND, Json(body)).into_response();
        }
    };

    let source = state.source_for(query.source, query.sheet_id.as_deref());
    let fetched = load_records(source.as_ref(), department).await;
    let view = dashboard_view(fetched, department, &query.person);
    info!(
        department = %department,
        person = %view.person,
        rows = view.record_count,
        "dashboard load"
    );
    Json(DashboardResponse {
        view,
        updated_at: Local::now().to_rfc3339(),
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{http_client, SourceError};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    struct Fixed(Result<Vec<Record>, String>);

    #[async_trait]
    impl RecordSource for Fixed {
        fn label(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self, _department: Department) -> Result<Vec<Record>, SourceError> {
            match &self.0 {
                Ok(rows) => Ok(rows.clone()),
                Err(msg) => Err(SourceError::Backend(msg.clone())),
            }
        }
    }

    fn state(backend: Fixed) -> AppState {
        let sheets = SheetsConfig {
            client: http_client(Duration::from_secs(1)).unwrap(),
            base_url: "http://127.0.0.1:9/".to_string(),
            default_sheet_id: None,
        };
        AppState::new(Arc::new(backend), sheets, "data:image/png;base64,AAAA".to_string())
    }

    fn shell_rows() -> Vec<Record> {
        vec![
            [("Project Code", "P-1"), ("Shell Plan By", "Alice"), ("status", "Completed")]
                .into_iter()
                .collect(),
            [("Project Code", "P-2"), ("Shell Plan By", "bob"), ("status", "In Progress")]
                .into_iter()
                .collect(),
        ]
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn page_inlines_logo() {
        let app = router(state(Fixed(Ok(Vec::new()))));
        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r#"src="data:image/png;base64,AAAA""#));
        assert!(!html.contains("{{ logo_src }}"));
    }

    #[tokio::test]
    async fn proxy_returns_records() {
        let app = router(state(Fixed(Ok(shell_rows()))));
        let (status, body) = get_json(app, "/api/data/Shell").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["Project Code"], "P-1");
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn proxy_hides_backend_failures() {
        let app = router(state(Fixed(Err("Unauthorized".into()))));
        let (status, body) = get_json(app, "/api/data/MD").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn proxy_rejects_unknown_department() {
        let app = router(state(Fixed(Ok(shell_rows()))));
        let (status, body) = get_json(app, "/api/data/Finance").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn dashboard_filters_by_person() {
        let app = router(state(Fixed(Ok(shell_rows()))));
        let (status, body) =
            get_json(app, "/api/dashboard/Shell?source=backend&person=ALICE").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["people"], serde_json::json!(["Alice", "bob"]));
        assert_eq!(body["person"], "Alice");
        assert_eq!(body["summary"]["kpis"]["total"], 1);
        assert_eq!(body["summary"]["kpis"]["completion_rate"], 100);
        assert_eq!(body["summary"]["table"][0]["status_class"], "status-completed");
        assert!(body["error"].is_null());
        assert!(body["updated_at"].is_string());
    }

    #[tokio::test]
    async fn dashboard_surfaces_backend_errors() {
        let app = router(state(Fixed(Err("Unauthorized".into()))));
        let (status, body) = get_json(app, "/api/dashboard/Area").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"], "Backend error: Unauthorized");
        assert!(body["summary"].is_null());
    }

    #[tokio::test]
    async fn sheets_without_an_id_asks_for_one() {
        let app = router(state(Fixed(Ok(shell_rows()))));
        let (_, body) = get_json(app, "/api/dashboard/Shell?source=sheets&sheet_id=").await;
        assert_eq!(body["error"], "Please enter your Google Sheets ID");
    }

    #[tokio::test]
    async fn dashboard_unknown_department() {
        let app = router(state(Fixed(Ok(shell_rows()))));
        let (status, body) = get_json(app, "/api/dashboard/Finance").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Unknown department: Finance");

        let app = router(state(Fixed(Ok(shell_rows()))));
        let (_, ok) = get_json(app, "/api/dashboard/Shell").await;
        let keys = |v: &serde_json::Value| {
            let mut k: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
            k.sort();
            k
        };
        assert_eq!(keys(&body), keys(&ok));
        assert_eq!(body["department"], "Finance");
        assert!(body["updated_at"].is_string());
    }

    #[test]
    fn logo_becomes_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("logo.PNG");
        std::fs::write(&png, [0x89, b'P', b'N', b'G']).unwrap();
        assert_eq!(logo_data_url(&png), "data:image/png;base64,iVBORw==");

        let jpg = dir.path().join("logo.jpeg");
        std::fs::write(&jpg, b"x").unwrap();
        assert!(logo_data_url(&jpg).starts_with("data:image/jpeg;base64,"));

        let svg = dir.path().join("logo.svg");
        std::fs::write(&svg, b"<svg/>").unwrap();
        assert!(logo_data_url(&svg).starts_with("data:image/svg+xml;base64,"));

        assert_eq!(logo_data_url(&dir.path().join("missing.png")), "");
    }
}
