#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use opportunity_api::config::AppConfig;
use opportunity_api::database::models::{Opportunity, OpportunityId, User};
use opportunity_api::database::{DatabaseError, MemoryStore, OpportunityStore, UserStore};
use opportunity_api::{app, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Memory store that counts every call and can be switched to stall or to
/// fail like a broken driver.
#[derive(Default)]
pub struct SpyStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    failing: AtomicBool,
    delay_ms: AtomicU64,
}

pub const DRIVER_DETAIL: &str = "connection reset by 10.0.0.7:5432";

impl SpyStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Hold every later call for `delay` before it reaches the store.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub async fn opportunity_count(&self) -> usize {
        self.inner.len().await
    }

    async fn record(&self) -> Result<(), DatabaseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DatabaseError::Sqlx(sqlx::Error::Protocol(DRIVER_DETAIL.to_string())));
        }
        Ok(())
    }
}

#[async_trait]
impl OpportunityStore for SpyStore {
    async fn find_one(&self, id: OpportunityId) -> Result<Option<Opportunity>, DatabaseError> {
        self.record().await?;
        self.inner.find_one(id).await
    }

    async fn find_many(&self, owner: &str) -> Result<Vec<Opportunity>, DatabaseError> {
        self.record().await?;
        self.inner.find_many(owner).await
    }

    async fn insert_one(&self, opportunity: &Opportunity) -> Result<OpportunityId, DatabaseError> {
        self.record().await?;
        self.inner.insert_one(opportunity).await
    }

    async fn update_one(&self, opportunity: &Opportunity) -> Result<u64, DatabaseError> {
        self.record().await?;
        self.inner.update_one(opportunity).await
    }

    async fn delete_one(&self, id: OpportunityId, owner: &str) -> Result<u64, DatabaseError> {
        self.record().await?;
        self.inner.delete_one(id, owner).await
    }

    async fn delete_many(&self, owner: &str) -> Result<u64, DatabaseError> {
        self.record().await?;
        self.inner.delete_many(owner).await
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.record().await?;
        self.inner.ping().await
    }
}

#[async_trait]
impl UserStore for SpyStore {
    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        self.record().await?;
        self.inner.insert_user(user).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        self.record().await?;
        self.inner.find_by_email(email).await
    }
}

pub struct TestServer {
    pub base_url: String,
    pub store: Arc<SpyStore>,
    pub client: reqwest::Client,
}

pub struct TestUser {
    pub id: String,
    pub username: String,
    pub token: String,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Serve the app in-process on a free port, backed by a fresh `SpyStore`.
pub async fn spawn_app() -> Result<TestServer> {
    spawn_app_with(AppConfig::for_memory_store(TEST_SECRET)).await
}

pub async fn spawn_app_with(mut config: AppConfig) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    config.server.host = "127.0.0.1".to_string();
    config.server.port = port;

    let store = Arc::new(SpyStore::default());
    let state = AppState::new(config.clone(), store.clone(), store.clone());

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    })
}

/// Sign up and log in a fresh user, returning its id and bearer token.
pub async fn register(server: &TestServer, username: &str) -> Result<TestUser> {
    let email = format!("{}@example.com", username);
    let password = "correct horse battery staple";

    let res = server
        .client
        .post(server.url("/signup"))
        .json(&json!({ "username": username, "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "signup failed: {}", res.status());
    let body: Value = res.json().await?;
    let id = body["user"]["id"].as_str().context("signup response has no user id")?.to_string();

    let res = server
        .client
        .post(server.url("/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
    let body: Value = res.json().await?;
    let token = body["token"].as_str().context("login response has no token")?.to_string();

    Ok(TestUser { id, username: username.to_string(), token })
}

/// Create an opportunity for `user` and return its id.
pub async fn add_opportunity(server: &TestServer, user: &TestUser, name: &str, value: f64) -> Result<String> {
    let res = server
        .client
        .post(server.url(&format!("/opportunity/{}", user.id)))
        .bearer_auth(&user.token)
        .json(&json!({ "name": name, "value": value, "status": "open" }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "add failed: {}", res.status());
    let body: Value = res.json().await?;
    Ok(body["insertedId"].as_str().context("no insertedId")?.to_string())
}
