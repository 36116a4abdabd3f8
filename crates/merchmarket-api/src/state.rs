//! Application state shared across handlers

use std::sync::Arc;

use merchmarket_auth::AuthService;
use merchmarket_db::Store;
use merchmarket_ledger::{LedgerConfig, QueryFacade, TransferEngine};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Storage backend
    pub store: Arc<dyn Store>,
    /// Identity gateway and token verification
    pub auth: Arc<AuthService>,
    /// Coin transfers and purchases
    pub engine: TransferEngine,
    /// Account summaries
    pub query: QueryFacade,
}

impl AppState {
    /// Wire the services over one store
    pub fn new(store: Arc<dyn Store>, auth: AuthService, ledger: LedgerConfig) -> Self {
        Self {
            engine: TransferEngine::new(store.clone(), ledger),
            query: QueryFacade::new(store.clone()),
            auth: Arc::new(auth),
            store,
        }
    }
}
