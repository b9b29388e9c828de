// Sell-data form
// Builds the backend row for a new provider listing

use iotmarket_eth::{parse_usd, SUBSCRIPTION_SUFFIX};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ApiError;
use crate::repository::NewListing;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SellForm {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub category: String,
    /// Fiat amount, with or without a leading `$`
    #[serde(default)]
    #[validate(length(min = 1))]
    pub price: String,
    #[serde(default, alias = "isSubscription")]
    pub is_subscription: bool,
    #[serde(default = "default_true", alias = "sampleIncluded")]
    pub sample_included: bool,
    #[serde(default = "default_data_format", alias = "dataFormat")]
    pub data_format: String,
    #[serde(default, alias = "updateFrequency")]
    pub update_frequency: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SellFormError {
    Missing(Vec<String>),
    InvalidPrice,
}

fn default_true() -> bool {
    true
}

fn default_data_format() -> String {
    "json".to_string()
}

impl SellForm {
    /// Display price as stored: `$12.50` or `$12.50/month`
    fn display_price(&self) -> Result<String, SellFormError> {
        let amount = parse_usd(self.price.trim()).map_err(|_| SellFormError::InvalidPrice)?;
        let suffix = if self.is_subscription {
            SUBSCRIPTION_SUFFIX
        } else {
            ""
        };
        Ok(format!("${:.2}{}", amount, suffix))
    }

    pub fn into_listing(
        self,
        provider_id: Uuid,
        provider: &str,
    ) -> Result<NewListing, SellFormError> {
        self.validate().map_err(|errors| {
            let mut missing: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|field| field.to_string())
                .collect();
            missing.sort();
            SellFormError::Missing(missing)
        })?;

        let price = self.display_price()?;
        let sample_data = if self.sample_included {
            self.data_format.clone()
        } else {
            String::new()
        };

        Ok(NewListing {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            price,
            provider: provider.to_string(),
            provider_id,
            category: self.category,
            update_frequency: self
                .update_frequency
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| "Daily".to_string()),
            sample_data,
            tags: self.tags,
        })
    }
}

impl From<SellFormError> for ApiError {
    fn from(err: SellFormError) -> Self {
        match err {
            SellFormError::Missing(missing) => ApiError::BadRequest {
                missing,
                reason: Some("Please fill in all required fields".to_string()),
            },
            SellFormError::InvalidPrice => ApiError::bad_request("Please enter a valid price"),
        }
    }
}
