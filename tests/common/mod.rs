use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    routing::get,
    Router,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use eventbook_api::{
    api_status, api_v1_routes, codes::TimestampCodeGenerator, config::AppConfig, db,
    events::{self, EventSender}, handlers::AppServices, health_check, storage::LocalFileStore,
    AppState,
};

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Helper harness backing the application with an in-memory SQLite database
/// and a temporary upload directory.
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub state: AppState,
    _uploads: tempfile::TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps every query on the same SQLite memory
        // instance.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let db_pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("test database");
        db::run_migrations(&db_pool).await.expect("test migrations");
        let db_arc = Arc::new(db_pool);

        let (event_tx, event_rx) = mpsc::channel(16);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let uploads = tempfile::tempdir().expect("upload dir");
        let file_store = Arc::new(LocalFileStore::new(
            uploads.path(),
            "http://localhost:18080",
        ));

        let services = AppServices::new(
            db_arc.clone(),
            Some(Arc::new(event_sender.clone())),
            file_store,
            Arc::new(TimestampCodeGenerator),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .route("/status", get(api_status))
            .route("/health", get(health_check))
            .nest("/api/v1", api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _uploads: uploads,
            _event_task: event_task,
        }
    }

    /// Sends a request with an optional JSON body.
    pub async fn request(&self, method: Method, uri: &str, json: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match json {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response")
    }

    /// Sends a multipart form with the given text fields.
    pub async fn request_multipart(
        &self,
        method: Method,
        uri: &str,
        fields: &[(&str, &str)],
    ) -> Response {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("multipart request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("response")
    }
}

/// Decodes a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
