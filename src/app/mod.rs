pub mod serve;

// re-export
pub use serve::serve;

use std::{net::SocketAddr, sync::Arc};

use derive_more::Deref;
use secrecy::SecretString;
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    config::{AppConfig, StoreKind},
    database::DbManager,
    store::{MemorySignupStore, PgSignupStore, SignupStore},
    Result,
};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
}
impl App {
    pub fn new(app_state: AppState, listener: TcpListener) -> Self {
        App {
            app_state,
            listener,
        }
    }

    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn SignupStore> = match config.waitlist_config.store {
            StoreKind::Postgres => {
                let dm = DbManager::init(&config.db_config).await?;
                Arc::new(PgSignupStore::new(dm))
            }
            StoreKind::Memory => {
                tracing::warn!("Using the in-memory signup store, signups will not survive a restart");
                Arc::new(MemorySignupStore::new())
            }
        };
        info!(
            "{:<20} - {}",
            "Signup store:",
            config.waitlist_config.store.as_ref()
        );

        let app_state = AppState::new(store, config.waitlist_config.list_secret);

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        let app = App::new(app_state, listener);
        Ok(app)
    }
}

pub struct InternalState {
    pub store: Arc<dyn SignupStore>,
    pub list_secret: SecretString,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(store: Arc<dyn SignupStore>, list_secret: SecretString) -> Self {
        AppState(Arc::new(InternalState { store, list_secret }))
    }
}
