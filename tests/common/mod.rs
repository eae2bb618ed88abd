#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "Pa$$w0rd";

/// A `villa-api` process on a private port, backed by the in-memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    /// New accounts become admins
    pub async fn start() -> Result<Self> {
        Self::start_with_default_role("admin").await
    }

    pub async fn start_with_default_role(role: &str) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_villa-api"))
            .env("APP_ENV", "development")
            .env("VILLA_API_PORT", port.to_string())
            .env("VILLA_API_BIND", "127.0.0.1")
            .env("DATABASE_BACKEND", "memory")
            .env("DATABASE_SEED", "true")
            .env("SECURITY_JWT_SECRET", JWT_SECRET)
            .env("SECURITY_DEFAULT_ROLE", role)
            .env("API_ENABLE_REQUEST_LOGGING", "false")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        let server = Self { port, base_url, child };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register `user_name` with the server's default role and return a bearer token
    pub async fn token_for(&self, user_name: &str) -> Result<String> {
        let client = reqwest::Client::new();
        client
            .post(self.url("/api/v1/UsersAuth/register"))
            .json(&json!({ "userName": user_name, "name": user_name, "password": PASSWORD }))
            .send()
            .await?
            .error_for_status()?;

        let login: Value = client
            .post(self.url("/api/v1/UsersAuth/login"))
            .json(&json!({ "userName": user_name, "password": PASSWORD }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        login["result"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response carried no token")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
