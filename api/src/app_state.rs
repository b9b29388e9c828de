/// Application state
use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::Catalog;
use crate::config::{Config, ServiceConfig, SessionConfig};
use crate::purchase::PurchaseFlow;
use crate::repository::{ListingRepository, ListingStore, TransactionRepository, TransactionStore};
use crate::session::{AuthService, SessionManager};
use crate::wallet::Wallet;

#[derive(Clone)]
pub struct AppState {
    pub service_config: ServiceConfig,
    pub session_config: SessionConfig,
    pub postgres: Option<PgPool>,
    pub sessions: SessionManager,
    pub catalog: Arc<Catalog>,
    pub purchases: Arc<PurchaseFlow>,
    pub transactions: Option<Arc<dyn TransactionStore>>,
    pub listings: Option<Arc<dyn ListingStore>>,
}

impl AppState {
    pub fn new(
        config: &Config,
        postgres: Option<PgPool>,
        auth: Arc<dyn AuthService>,
        wallet: Option<Arc<dyn Wallet>>,
    ) -> Self {
        let transactions = postgres
            .clone()
            .map(|pool| Arc::new(TransactionRepository::new(pool)) as Arc<dyn TransactionStore>);
        let listings = postgres
            .clone()
            .map(|pool| Arc::new(ListingRepository::new(pool)) as Arc<dyn ListingStore>);

        let mut state = Self::with_stores(config, auth, wallet, transactions, listings);
        state.postgres = postgres;
        state
    }

    /// State over arbitrary stores, without a Postgres pool behind them
    pub fn with_stores(
        config: &Config,
        auth: Arc<dyn AuthService>,
        wallet: Option<Arc<dyn Wallet>>,
        transactions: Option<Arc<dyn TransactionStore>>,
        listings: Option<Arc<dyn ListingStore>>,
    ) -> Self {
        let purchases = PurchaseFlow::new(
            wallet,
            transactions.clone(),
            config.wallet.merchant_address.clone(),
            config.wallet.eth_usd_rate,
        )
        .with_dialog_ttl(chrono::Duration::seconds(
            config.purchase.dialog_ttl_secs.min(u32::MAX as u64) as i64,
        ));

        Self {
            service_config: config.service.clone(),
            session_config: config.session.clone(),
            postgres: None,
            sessions: SessionManager::new(auth),
            catalog: Arc::new(Catalog::builtin()),
            purchases: Arc::new(purchases),
            transactions,
            listings,
        }
    }
}
