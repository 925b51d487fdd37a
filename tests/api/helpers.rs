//! Spawns the full application (router + middleware) on an ephemeral port, backed by an in-memory store.
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, OnceLock},
};

use anyhow::Result;
use reqwest::{Method, Response};
use secrecy::SecretString;
use serde_json::Value;
use tokio::net::TcpListener;
use waitlist::{
    init_dbg_tracing,
    store::{
        MemorySignupStore, NewSignup, SignupReceipt, SignupStore, SignupSummary, StoreError,
        StoreResult,
    },
    App, AppState,
};

pub const TEST_LIST_SECRET: &str = "test-list-secret";

/// Trying to bind port 0 will trigger an OS scan for an available port
/// which will then be bound to the application.
const TEST_SOCK_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 0);

pub struct TestApp {
    pub addr: SocketAddr,
    pub http_client: reqwest::Client,
    pub store: Arc<MemorySignupStore>,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        let store = Arc::new(MemorySignupStore::new());
        let addr = spawn_server(store.clone()).await?;

        Ok(TestApp {
            addr,
            http_client: reqwest::Client::new(),
            store,
        })
    }

    pub fn waitlist_url(&self) -> String {
        format!("http://{}/api/waitlist", self.addr)
    }

    pub async fn post_signup(&self, body: &Value) -> Result<Response> {
        let res = self
            .http_client
            .post(self.waitlist_url())
            .json(body)
            .send()
            .await?;
        Ok(res)
    }

    pub async fn get_signups(&self, secret: Option<&str>) -> Result<Response> {
        let mut req = self.http_client.get(self.waitlist_url());
        if let Some(secret) = secret {
            req = req.query(&[("secret", secret)]);
        }
        Ok(req.send().await?)
    }

    pub async fn request(&self, method: Method) -> Result<Response> {
        let res = self
            .http_client
            .request(method, self.waitlist_url())
            .send()
            .await?;
        Ok(res)
    }
}

/// Serves the app with an arbitrary store and returns the address it listens on.
pub async fn spawn_server(store: Arc<dyn SignupStore>) -> Result<SocketAddr> {
    init_test_subscriber();

    let app_state = AppState::new(store, SecretString::from(TEST_LIST_SECRET));
    let listener = TcpListener::bind(&TEST_SOCK_ADDR).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(waitlist::serve(App::new(app_state, listener)));

    Ok(addr)
}

/// Set `TEST_LOG` to see the application logs while running the tests.
fn init_test_subscriber() {
    static SUBSCRIBER: OnceLock<()> = OnceLock::new();
    SUBSCRIBER.get_or_init(|| {
        if std::env::var("TEST_LOG").is_ok() {
            init_dbg_tracing();
        }
    });
}

/// A store whose backend is always down.
pub struct UnreachableStore;

#[async_trait::async_trait]
impl SignupStore for UnreachableStore {
    async fn upsert_signup(&self, _signup: NewSignup) -> StoreResult<SignupReceipt> {
        Err(StoreError::Unavailable(
            "connection refused: postgres://admin:hunter2@db".to_string(),
        ))
    }

    async fn recent_signups(&self, _limit: u32) -> StoreResult<Vec<SignupSummary>> {
        Err(StoreError::Unavailable(
            "connection refused: postgres://admin:hunter2@db".to_string(),
        ))
    }
}

/// A store that blows up mid-request.
pub struct PanickingStore;

#[async_trait::async_trait]
impl SignupStore for PanickingStore {
    async fn upsert_signup(&self, _signup: NewSignup) -> StoreResult<SignupReceipt> {
        panic!("store exploded");
    }

    async fn recent_signups(&self, _limit: u32) -> StoreResult<Vec<SignupSummary>> {
        panic!("store exploded");
    }
}

pub async fn json_body(res: Response) -> Result<Value> {
    Ok(res.json::<Value>().await?)
}
