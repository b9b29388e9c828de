use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ListingStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct ListingRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: String,
    pub provider: String,
    pub provider_id: Uuid,
    pub category: String,
    pub update_frequency: String,
    pub sample_data: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: String,
    pub provider: String,
    pub provider_id: Uuid,
    pub category: String,
    pub update_frequency: String,
    pub sample_data: String,
    pub tags: Vec<String>,
}

pub struct ListingRepository {
    pool: PgPool,
}

impl ListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for ListingRepository {
    async fn insert(&self, listing: NewListing) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO iot_data_listings (
                title, description, price, provider, provider_id,
                category, update_frequency, sample_data, tags, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(&listing.price)
        .bind(&listing.provider)
        .bind(listing.provider_id)
        .bind(&listing.category)
        .bind(&listing.update_frequency)
        .bind(&listing.sample_data)
        .bind(&listing.tags)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<ListingRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ListingRecord>(
            r#"
            SELECT id, title, description, price, provider, provider_id,
                   category, update_frequency, sample_data, tags, created_at
            FROM iot_data_listings
            WHERE provider_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
