// Repository layer for backend row storage
// Handlers and the purchase flow only see the store traits; sqlx stays in here

pub mod listings;
pub mod transactions;

pub use listings::{ListingRecord, ListingRepository, NewListing};
pub use transactions::{NewTransaction, TransactionRecord, TransactionRepository, STATUS_COMPLETED};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Unavailable(String),
}

/// Purchase records, one row per confirmed payment
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Returns the new row id
    async fn insert(&self, tx: NewTransaction) -> Result<i64, StoreError>;

    /// Newest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<TransactionRecord>, StoreError>;

    async fn has_purchased(&self, user_id: Uuid, data_id: i64) -> Result<bool, StoreError>;
}

/// Listings created through the sell-data form
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn insert(&self, listing: NewListing) -> Result<i64, StoreError>;

    async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<ListingRecord>, StoreError>;
}
