use serde::{Deserialize, Serialize};
use std::fmt;

/// A listing candidate that survived collection: the site identifier plus
/// the canonical detail-page URL built from it.
///
/// Produced by the listing collector and consumed by the product pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Site-assigned product identifier (ASIN)
    pub asin: String,
    /// Detail page URL
    pub url: String,
    /// Position in the listing page, in DOM order (0-based)
    pub position: usize,
}

impl ProductRef {
    /// Build a ref by appending the identifier to the detail-page base URL
    pub fn from_asin(asin: &str, detail_base_url: &str, position: usize) -> Self {
        Self {
            asin: asin.to_string(),
            url: format!("{detail_base_url}{asin}"),
            position,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, position: {})", self.url, self.asin, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_detail_url_from_asin() {
        let product_ref = ProductRef::from_asin("B08FC5L3RG", "https://www.amazon.com/dp/", 3);
        assert_eq!(product_ref.url(), "https://www.amazon.com/dp/B08FC5L3RG");
        assert_eq!(product_ref.asin, "B08FC5L3RG");
        assert_eq!(product_ref.position, 3);
    }

    #[test]
    fn display_names_url_identifier_and_position() {
        let product_ref = ProductRef::from_asin("B08FC5L3RG", "https://www.amazon.com/dp/", 0);
        assert_eq!(
            product_ref.to_string(),
            "https://www.amazon.com/dp/B08FC5L3RG (B08FC5L3RG, position: 0)"
        );
    }
}
