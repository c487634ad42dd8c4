use serde::{Deserialize, Serialize};

use super::product_url::ProductRef;

/// Price bounds in whole site-currency units, as entered by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFilter {
    pub min: u32,
    pub max: u32,
}

impl PriceFilter {
    /// The site encodes filter bounds in minor units (cents)
    pub const MINOR_UNITS: u64 = 100;

    /// Listing-URL clause for this range, e.g. `&rh=p_36%3A27500-65000`
    pub fn url_clause(&self) -> String {
        format!(
            "&rh=p_36%3A{}-{}",
            u64::from(self.min) * Self::MINOR_UNITS,
            u64::from(self.max) * Self::MINOR_UNITS
        )
    }
}

/// What to search for. Immutable once built; drives the listing URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub search_term: String,
    pub filter: PriceFilter,
    pub currency: String,
}

impl SearchQuery {
    pub fn new(search_term: impl Into<String>, min: u32, max: u32, currency: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            filter: PriceFilter { min, max },
            currency: currency.into(),
        }
    }

    pub const fn price_min(&self) -> u32 {
        self.filter.min
    }

    pub const fn price_max(&self) -> u32 {
        self.filter.max
    }
}

/// Harvested product data. Every extracted field may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub asin: String,
    pub url: String,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub photo_url: Option<String>,
    pub seller: Option<String>,
    pub review_count: Option<u64>,
}

impl ProductRecord {
    /// A record with only its identity filled in
    pub fn empty(product_ref: &ProductRef) -> Self {
        Self {
            asin: product_ref.asin.clone(),
            url: product_ref.url.clone(),
            title: None,
            price: None,
            rating: None,
            photo_url: None,
            seller: None,
            review_count: None,
        }
    }

    /// Title, price and rating are mandatory. Presence is all that counts:
    /// an empty title and a zero price (out of stock) are both present.
    pub const fn is_valid(&self) -> bool {
        self.title.is_some()
            && self.price.is_some()
            && self.rating.is_some()
    }
}
