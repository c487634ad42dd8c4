//! Parsing configuration for HTML extraction
//!
//! Centralized CSS selectors. Every list is tried in order.

use serde::{Deserialize, Serialize};

use crate::infrastructure::config::amazon;

/// Main parsing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Search results page selectors
    pub listing: ListingSelectors,

    /// Product detail page selectors
    pub detail: DetailSelectors,
}

/// CSS selectors for search results pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// Elements that carry a product identifier
    pub product_tile: String,

    /// Attribute holding the identifier
    pub identifier_attribute: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            product_tile: format!("div[{}]", amazon::ASIN_ATTRIBUTE),
            identifier_attribute: amazon::ASIN_ATTRIBUTE.to_string(),
        }
    }
}

/// CSS selectors for product detail pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    pub title: Vec<String>,

    /// Buy box price, tried in order
    pub price: Vec<String>,

    /// Stock status text fields: availability, availability message, out of stock
    pub stock_status: String,
    pub availability_message: String,
    pub out_of_stock: String,

    /// Last price selector before the availability block is consulted
    pub secondary_price: String,

    /// Availability block whose leading text classifies the listing
    pub availability_block: String,

    /// Byline first, brand byline second
    pub seller: Vec<String>,

    pub review_count: String,
    pub rating: String,

    pub photo: String,
    pub photo_attribute: String,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            title: vec!["span#productTitle".to_string(), "h1.a-size-large".to_string()],
            price: vec![
                "span.apexPriceToPay".to_string(),
                "span#priceblock_ourprice".to_string(),
            ],
            stock_status: "span.a-color-price".to_string(),
            availability_message: "span.qa-availability-message".to_string(),
            out_of_stock: "div#outOfStock".to_string(),
            secondary_price: "span.a-color-price:nth-child(2)".to_string(),
            availability_block: "div#availability".to_string(),
            seller: vec!["a#bylineInfo".to_string(), "a.qa-byline-url".to_string()],
            review_count: "span#acrCustomerReviewText".to_string(),
            rating: "span.a-icon-alt".to_string(),
            photo: "img#landingImage".to_string(),
            photo_attribute: "src".to_string(),
        }
    }
}
