//! Read-only HTTP view over recorded findings
//!
//! - `GET /` redirects to `/home`
//! - `GET /home?start=&end=` returns one JSON page plus the "view more" bounds
//! - `GET /health` reports liveness and store counters
//! - anything else is a JSON 404

use crate::query::{Page, PageParams, QueryService};
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::get,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn internal_error(e: impl std::fmt::Display) -> ApiError {
    tracing::error!("Read view request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: e.to_string(),
        }),
    )
}

#[derive(Clone)]
pub struct ReadServer {
    queries: Arc<QueryService>,
}

impl ReadServer {
    pub fn new(queries: QueryService) -> Self {
        Self {
            queries: Arc::new(queries),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(|| async { Redirect::to("/home") }))
            .route("/home", get(home))
            .route("/health", get(health))
            .fallback(not_found)
            .with_state(self.clone())
    }

    /// Serve on `addr` until `shutdown` resolves
    pub async fn serve<F>(&self, addr: &str, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind read view to {addr}"))?;
        self.serve_on(listener, shutdown).await
    }

    pub async fn serve_on<F>(&self, listener: tokio::net::TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr().context("Listener has no local address")?;
        tracing::info!("Read view listening on http://{}", local);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("Read view server failed")
    }
}

async fn home(State(server): State<ReadServer>, Query(params): Query<PageParams>) -> Result<Json<Page>, ApiError> {
    server.queries.page(&params).await.map(Json).map_err(internal_error)
}

async fn health(State(server): State<ReadServer>) -> Result<impl IntoResponse, ApiError> {
    let stats = server
        .queries
        .store()
        .call(|s| s.stats())
        .await
        .map_err(internal_error)?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "gistwatch",
        "version": env!("CARGO_PKG_VERSION"),
        "findings": stats.findings,
        "checkpoint": stats.checkpoint,
    })))
}

async fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "not found".to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    async fn spawn_server(findings: usize) -> (tempfile::TempDir, String, oneshot::Sender<()>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("view.db"), Duration::from_secs(1), Utc::now()).unwrap();
        for i in 1..=findings {
            store
                .record_finding(&format!("g{i}"), &format!("https://gist/g{i}"), "creds.env", &[i])
                .unwrap();
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel::<()>();
        let server = ReadServer::new(QueryService::new(store, 10));
        tokio::spawn(async move {
            server
                .serve_on(listener, async {
                    rx.await.ok();
                })
                .await
                .unwrap();
        });
        (dir, base, tx)
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_redirects_home() {
        let (_dir, base, _stop) = spawn_server(0).await;
        let response = client().get(format!("{base}/")).send().await.unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(response.headers()["location"], "/home");
    }

    #[tokio::test]
    async fn test_home_pages() {
        let (_dir, base, _stop) = spawn_server(12).await;

        let page: serde_json::Value = client()
            .get(format!("{base}/home"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(page["view"]["kind"], "latest");
        assert_eq!(page["rows"].as_array().unwrap().len(), 10);
        assert_eq!(page["rows"][0]["internal_id"], 12);
        assert_eq!(page["rows"][0]["html_url"], "https://gist/g12");
        assert_eq!(page["next"]["start"], 2);
        assert_eq!(page["next"]["end"], -8);

        let more: serde_json::Value = client()
            .get(format!("{base}/home?start=2&end=-8"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(more["view"]["kind"], "range");
        let ids: Vec<i64> = more["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["internal_id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(more["next"].is_null());
    }

    #[tokio::test]
    async fn test_bad_bounds_fall_back_to_latest() {
        let (_dir, base, _stop) = spawn_server(3).await;

        for query in ["start=5&end=100", "start=abc&end=5"] {
            let page: serde_json::Value = client()
                .get(format!("{base}/home?{query}"))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(page["view"]["kind"], "latest", "query: {query}");
            assert_eq!(page["rows"].as_array().unwrap().len(), 3);
        }
    }

    #[tokio::test]
    async fn test_health_and_not_found() {
        let (_dir, base, _stop) = spawn_server(2).await;

        let health: serde_json::Value = client()
            .get(format!("{base}/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["findings"], 2);

        let missing = client().get(format!("{base}/about")).send().await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
        let body: serde_json::Value = missing.json().await.unwrap();
        assert_eq!(body["error"], "not found");
    }
}
