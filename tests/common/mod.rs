#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use hbm_admin_api::auth::{issue_session_token, Principal, Role, SessionClaims};
use reqwest::StatusCode;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const ADMIN_EMAILS: &str = "admin@hbm.com, ops@hbm.com";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Token sessions and no database: the guard must work without the data store
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_hbm-admin-api"));
        cmd.arg("serve")
            .env("HBM_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("JWT_SECRET", JWT_SECRET)
            .env("ADMIN_EMAILS", ADMIN_EMAILS)
            .env("SESSION_SOURCE", "token")
            .env("DATABASE_URL", "")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
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
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

pub fn principal(email: &str, role: Role) -> Principal {
    Principal {
        id: Uuid::new_v4(),
        email: email.to_string(),
        role,
        name: Some("Test Caller".to_string()),
        avatar: None,
    }
}

/// Session token for `principal`, signed with the server's secret.
pub fn session_token(principal: &Principal) -> String {
    let claims = SessionClaims::new(principal, 1).expect("valid test lifetime");
    issue_session_token(&claims, JWT_SECRET).expect("sign test token")
}
