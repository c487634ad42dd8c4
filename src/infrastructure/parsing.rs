//! HTML parsing infrastructure
//!
//! Trait-based parsers over `scraper` documents, selector configuration,
//! and the ordered fallback strategies used for fields whose markup varies
//! from page to page.

pub mod config;
pub mod context;
pub mod product_detail_parser;
pub mod product_list_parser;
pub mod strategy;

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
pub use config::{DetailSelectors, ListingSelectors, ParsingConfig};
pub use context::{DetailParseContext, ListingContext};
pub use product_detail_parser::{ExtractedFields, ProductDetailParser};
pub use product_list_parser::ProductListParser;
pub use strategy::{Strategy, first_of};

use scraper::{ElementRef, Html, Selector};

/// Parser that needs information beyond the document
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse a document. Parsers in this crate are total: failures inside
    /// are logged and degrade the output instead of erroring.
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> Self::Output;
}

/// A compiled selector that remembers its source text for diagnostics
#[derive(Debug, Clone)]
pub struct NamedSelector {
    css: String,
    selector: Selector,
}

impl NamedSelector {
    pub fn parse(css: &str) -> ParsingResult<Self> {
        let selector =
            Selector::parse(css).map_err(|e| ParsingError::invalid_selector(css, &e.to_string()))?;
        Ok(Self {
            css: css.to_string(),
            selector,
        })
    }

    /// Compile an ordered selector list
    pub fn parse_all(css_list: &[String]) -> ParsingResult<Vec<Self>> {
        css_list.iter().map(|css| Self::parse(css)).collect()
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn first<'a>(&self, html: &'a Html) -> ParsingResult<ElementRef<'a>> {
        html.select(&self.selector)
            .next()
            .ok_or_else(|| ParsingError::element_not_found(&self.css))
    }

    /// Whitespace-normalized text of the first match
    pub fn first_text(&self, html: &Html) -> ParsingResult<String> {
        self.first(html).map(|el| element_text(&el))
    }

    pub fn first_attr(&self, html: &Html, attribute: &str) -> ParsingResult<String> {
        let element = self.first(html)?;
        element
            .value()
            .attr(attribute)
            .map(str::to_string)
            .ok_or_else(|| ParsingError::attribute_missing(&self.css, attribute))
    }
}

/// Element text with runs of whitespace collapsed to single spaces
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Non-empty trimmed lines of an element's text
pub fn element_lines(element: &ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .collect::<String>()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Amount after the first currency symbol, e.g. `"$1,299.99"` -> `1299.99`
pub fn parse_amount(field: &str, text: &str, currency_symbol: &str) -> ParsingResult<f64> {
    let after_symbol = text
        .split(currency_symbol)
        .nth(1)
        .ok_or_else(|| ParsingError::number_parse_failed(field, text))?;

    after_symbol
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| ParsingError::number_parse_failed(field, text))
}

/// Leading whitespace-separated token, e.g. `"4.7 out of 5 stars"` -> `"4.7"`
pub fn leading_token(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("$299.99", 299.99)]
    #[case("$1,299.00", 1299.0)]
    #[case("$49.99$49.99", 49.99)]
    #[case(" $ 15.5 ", 15.5)]
    fn amounts_follow_the_currency_symbol(#[case] text: &str, #[case] expected: f64) {
        assert_eq!(parse_amount("price", text, "$"), Ok(expected));
    }

    #[rstest]
    #[case("299.99")]
    #[case("$")]
    #[case("$call for price")]
    #[case("")]
    fn unreadable_amounts_fail(#[case] text: &str) {
        assert!(parse_amount("price", text, "$").is_err());
    }

    #[test]
    fn text_is_whitespace_normalized() {
        let html = Html::parse_fragment("<div id='t'>\n  PlayStation   5\n <b>Console</b>\n</div>");
        let selector = NamedSelector::parse("div#t").unwrap();
        assert_eq!(selector.first_text(&html).unwrap(), "PlayStation 5 Console");
    }

    #[test]
    fn lines_skip_blanks() {
        let html = Html::parse_fragment("<div id='a'>\n  Only 3 left in stock.\n\n  Ships soon\n</div>");
        let selector = NamedSelector::parse("div#a").unwrap();
        let element = selector.first(&html).unwrap();
        assert_eq!(element_lines(&element), vec!["Only 3 left in stock.", "Ships soon"]);
    }

    #[test]
    fn invalid_selector_is_reported() {
        let err = NamedSelector::parse("div[").unwrap_err();
        assert!(matches!(err, ParsingError::InvalidSelector { .. }));
    }

    #[test]
    fn missing_attribute_is_reported() {
        let html = Html::parse_fragment("<img id='landingImage'>");
        let selector = NamedSelector::parse("img#landingImage").unwrap();
        assert_eq!(
            selector.first_attr(&html, "src"),
            Err(ParsingError::attribute_missing("img#landingImage", "src"))
        );
    }

    #[test]
    fn leading_token_takes_first_word() {
        assert_eq!(leading_token("4.7 out of 5 stars"), "4.7");
        assert_eq!(leading_token("   "), "");
    }
}
