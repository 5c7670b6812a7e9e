//! Shared harness for API integration tests: ephemeral PostgreSQL, a
//! recording SMS double, and request helpers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use sheba_api::{AppState, config::ApiConfig};
use sheba_core::db::DbManager;
use sheba_core::sms::{SmsError, SmsSender};

/// SMS double that records (phone, message) pairs instead of delivering.
pub struct RecordingSms {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSms {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Messages recorded for a given phone.
    pub fn messages_for(&self, phone: &str) -> Vec<String> {
        self.sent
            .lock()
            .expect("sms lock")
            .iter()
            .filter(|(p, _)| p == phone)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send(&self, phone: &str, message: &str) -> Result<(), SmsError> {
        self.sent
            .lock()
            .expect("sms lock")
            .push((phone.to_string(), message.to_string()));
        Ok(())
    }
}

/// A running test application: ephemeral PG + router + SMS recorder.
pub struct TestApp {
    pub db: DbManager,
    pub pool: sqlx::PgPool,
    pub sms: Arc<RecordingSms>,
    pub state: AppState,
}

impl TestApp {
    /// Spin up ephemeral PostgreSQL, run migrations, build state.
    pub async fn spawn() -> Self {
        let mut db = DbManager::ephemeral().await.expect("DbManager::ephemeral");
        db.setup().await.expect("db setup");
        db.start().await.expect("db start");

        let pool = sqlx::PgPool::connect(&db.connection_url())
            .await
            .expect("connect to ephemeral PG");

        sheba_api::migrate(&pool).await.expect("migrations");

        let sms = Arc::new(RecordingSms::new());
        let state = AppState {
            pool: pool.clone(),
            config: ApiConfig {
                bind_addr: "127.0.0.1:0".into(),
                database_url: db.connection_url(),
                jwt_secret: "test-secret".into(),
                otp_ttl_secs: 300,
                otp_max_per_hour: 10,
            },
            sms: sms.clone(),
        };

        Self {
            db,
            pool,
            sms,
            state,
        }
    }

    pub fn router(&self) -> Router {
        sheba_api::router(self.state.clone())
    }

    /// POST a JSON body, returning (status, parsed JSON response).
    pub async fn post(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        self.send(req).await
    }

    /// GET with an optional bearer token, returning (status, parsed JSON).
    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let req = builder.body(Body::empty()).expect("request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = self.router().oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse JSON body")
        };
        (status, json)
    }

    pub async fn stop(mut self) {
        self.pool.close().await;
        self.db.stop().await.expect("db stop");
    }
}
