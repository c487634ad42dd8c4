//! Parsing error types for listing and detail page extraction
//!
//! Extraction failures never leave the extractor: they are logged and mapped
//! to a missing field. These variants carry enough context for that log line.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("No element matches '{selector}'")]
    ElementNotFound { selector: String },

    #[error("Element '{selector}' has no '{attribute}' attribute")]
    AttributeMissing { selector: String, attribute: String },

    #[error("Cannot read {field} from '{text}'")]
    NumberParseFailed { field: String, text: String },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No {field} strategy applied: {reason}")]
    NoStrategyApplied { field: String, reason: String },

    #[error("All {attempts} strategies for {field} failed, last: {last}")]
    StrategiesExhausted {
        field: String,
        attempts: usize,
        last: Box<ParsingError>,
    },
}

impl ParsingError {
    pub fn element_not_found(selector: &str) -> Self {
        Self::ElementNotFound {
            selector: selector.to_string(),
        }
    }

    pub fn attribute_missing(selector: &str, attribute: &str) -> Self {
        Self::AttributeMissing {
            selector: selector.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn number_parse_failed(field: &str, text: &str) -> Self {
        Self::NumberParseFailed {
            field: field.to_string(),
            text: text.to_string(),
        }
    }

    pub fn invalid_selector(selector: &str, reason: &str) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn no_strategy_applied(field: &str, reason: &str) -> Self {
        Self::NoStrategyApplied {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the page simply lacks the data, as opposed to a broken setup
    pub const fn is_page_shape(&self) -> bool {
        !matches!(self, Self::InvalidSelector { .. })
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
