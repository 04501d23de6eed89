use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::json;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/recipe-api-rust");
        cmd.env("RECIPE_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server can see DATABASE_URL from .env (loaded by the server)
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
            match client.get(&url).send().await {
                Ok(resp) => {
                    if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                        return Ok(());
                    }
                }
                Err(_) => {}
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    // Use stable get_or_init and convert init errors into a panic with context.
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// A registered identity plus its bearer token
pub struct AuthSession {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub password: String,
}

/// Register a fresh identity with a unique email and log it in.
/// Each test gets its own identity, so suites sharing the server stay isolated.
pub async fn register_user(server: &TestServer, client: &reqwest::Client) -> Result<AuthSession> {
    let email = format!("cook-{}@example.com", uuid::Uuid::new_v4().simple());
    let password = "sup3r-secret-pass".to_string();

    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({ "email": &email, "password": &password, "name": "Test Cook" }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "registration failed: {}",
        res.text().await.unwrap_or_default()
    );
    let body = res.json::<serde_json::Value>().await?;
    let user_id = body["data"]["id"]
        .as_str()
        .context("registration response missing id")?
        .to_string();

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": &email, "password": &password }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::OK,
        "login failed: {}",
        res.text().await.unwrap_or_default()
    );
    let body = res.json::<serde_json::Value>().await?;
    let token = body["data"]["token"]
        .as_str()
        .context("login response missing token")?
        .to_string();

    Ok(AuthSession { token, user_id, email, password })
}
