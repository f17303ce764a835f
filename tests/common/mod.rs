#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

use character_api::auth::{StaticCredentialStore, TokenService};
use character_api::config::PaginationConfig;
use character_api::seed::{load_seed_file, seed_store};
use character_api::store::JsonFileStore;
use character_api::{router, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

/// In-process server backed by a private, freshly seeded character file
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub tokens: Arc<TokenService>,
    _dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Logs in and returns the bearer token
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

        let body = res.json::<Value>().await?;
        body["token"].as_str().map(str::to_string).context("login response missing token")
    }

    pub async fn admin_token(&self) -> Result<String> {
        self.login("admin", "adminpassword").await
    }

    /// GET /characters/list with the given query string, returning status and body
    pub async fn list(&self, query: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.url(&format!("/characters/list?{}", query))).send().await?;
        let status = res.status();
        Ok((status, res.json::<Value>().await?))
    }
}

pub fn ids(body: &Value) -> Vec<i64> {
    body["characters"]
        .as_array()
        .map(|list| list.iter().filter_map(|c| c["id"].as_i64()).collect())
        .unwrap_or_default()
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(PaginationConfig::default()).await
}

pub async fn spawn_server_with(pagination: PaginationConfig) -> Result<TestServer> {
    let dir = TempDir::new()?;
    let store = JsonFileStore::new(dir.path().join("characters.json"));
    let seed = load_seed_file(&Path::new(env!("CARGO_MANIFEST_DIR")).join("data/seed.json")).await?;
    seed_store(&store, seed).await?;

    let credentials = StaticCredentialStore::with_default_accounts().map_err(|e| anyhow::anyhow!("{}", e))?;
    let tokens = Arc::new(TokenService::new(TEST_SECRET, 1));
    let state = AppState {
        store: Arc::new(store),
        credentials: Arc::new(credentials),
        tokens: tokens.clone(),
        pagination,
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(state);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("test server stopped: {}", e);
        }
    });

    Ok(TestServer { base_url: format!("http://{}", addr), client: reqwest::Client::new(), tokens, _dir: dir })
}
