// Listing catalog
// The whole catalog is held in memory; filtering never touches the backend

mod data;
mod sell;

pub use sell::{SellForm, SellFormError};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub full_description: String,
    pub category: String,
    /// Display price, e.g. `$24.99` or `$49.99/month`
    pub price: String,
    pub provider: String,
    pub rating: f32,
    pub updated_at: String,
    pub data_points: String,
    pub frequency: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => CategoryFilter::All,
            Some(name) => CategoryFilter::Named(name.to_string()),
        }
    }

    fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => name == category,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(default, alias = "search")]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

pub struct Catalog {
    listings: Vec<Listing>,
}

impl Catalog {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    pub fn builtin() -> Self {
        Self::new(data::builtin_listings())
    }

    pub fn all(&self) -> &[Listing] {
        &self.listings
    }

    pub fn get(&self, id: i64) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == id)
    }

    /// Case-insensitive substring match on title or description, AND exact category match
    pub fn filter(&self, query: &ListingQuery) -> Vec<&Listing> {
        let needle = query
            .q
            .as_deref()
            .map(|q| q.to_lowercase())
            .unwrap_or_default();
        let category = CategoryFilter::parse(query.category.as_deref());

        self.listings
            .iter()
            .filter(|l| {
                let matches_search = needle.is_empty()
                    || l.title.to_lowercase().contains(&needle)
                    || l.description.to_lowercase().contains(&needle);
                matches_search && category.matches(&l.category)
            })
            .collect()
    }

    /// Distinct categories in catalog order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for listing in &self.listings {
            if !seen.contains(&listing.category.as_str()) {
                seen.push(&listing.category);
            }
        }
        seen
    }
}
