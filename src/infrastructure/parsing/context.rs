//! Parsing context for listing and detail extraction

use crate::domain::ProductRef;

/// What the listing parser needs beyond the document itself
#[derive(Debug, Clone)]
pub struct ListingContext {
    /// Detail page URL prefix for building refs
    pub detail_base_url: String,

    /// Identifiers to drop, wherever and however often they appear
    pub blocklist: Vec<String>,
}

impl ListingContext {
    pub fn new(detail_base_url: impl Into<String>) -> Self {
        Self {
            detail_base_url: detail_base_url.into(),
            blocklist: Vec::new(),
        }
    }

    pub fn with_blocklist(mut self, blocklist: Vec<String>) -> Self {
        self.blocklist = blocklist;
        self
    }

    pub fn is_blocked(&self, identifier: &str) -> bool {
        self.blocklist.iter().any(|blocked| blocked == identifier)
    }
}

/// Detail parsing context: the ref whose page is being read
#[derive(Debug, Clone)]
pub struct DetailParseContext {
    pub product: ProductRef,
}

impl DetailParseContext {
    pub const fn new(product: ProductRef) -> Self {
        Self { product }
    }
}
