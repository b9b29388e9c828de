use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, TransactionStore};

pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct TransactionRecord {
    pub id: i64,
    pub user_id: Uuid,
    pub data_id: i64,
    pub data_title: String,
    pub price: String,
    pub eth_price: Option<String>,
    pub provider: String,
    pub date: DateTime<Utc>,
    pub status: String,
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_id: Uuid,
    pub data_id: i64,
    pub data_title: String,
    pub price: String,
    pub eth_price: Option<String>,
    pub provider: String,
    pub tx_hash: Option<String>,
}

pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for TransactionRepository {
    /// Rows are written once and never updated
    async fn insert(&self, tx: NewTransaction) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (
                user_id, data_id, data_title, price, eth_price,
                provider, date, status, tx_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(tx.user_id)
        .bind(tx.data_id)
        .bind(&tx.data_title)
        .bind(&tx.price)
        .bind(&tx.eth_price)
        .bind(&tx.provider)
        .bind(Utc::now())
        .bind(STATUS_COMPLETED)
        .bind(&tx.tx_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT id, user_id, data_id, data_title, price, eth_price,
                   provider, date, status, tx_hash
            FROM transactions
            WHERE user_id = $1
            ORDER BY date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn has_purchased(&self, user_id: Uuid, data_id: i64) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM transactions
                WHERE user_id = $1 AND data_id = $2 AND status = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(data_id)
        .bind(STATUS_COMPLETED)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
