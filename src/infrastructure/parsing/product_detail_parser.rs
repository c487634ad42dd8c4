//! Product detail parser
//!
//! One extractor per field. Each is total: it returns the value or `None`,
//! logging why the value is missing. Fields with inconsistent markup are
//! read through an ordered list of strategies (see [`super::strategy`]).

#![allow(clippy::uninlined_format_args)]

use scraper::Html;
use tracing::{debug, info, warn};

use super::config::DetailSelectors;
use super::context::DetailParseContext;
use super::strategy::{Strategy, first_of};
use super::{
    ContextualParser, NamedSelector, ParsingError, ParsingResult, element_lines, leading_token,
    parse_amount,
};
use crate::domain::ProductRecord;

/// Stock-status markers as they appear on the page
pub mod stock {
    pub const IN_STOCK: &str = "In Stock.";
    pub const TEMPORARILY_OUT: &str = "Temporarily out of stock.";
    pub const UNAVAILABLE: &str = "Currently unavailable.";
}

/// The six harvested fields of one detail page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub seller: Option<String>,
    pub review_count: Option<u64>,
    pub rating: Option<f64>,
    pub photo_url: Option<String>,
}

/// Parser for extracting product fields from detail pages
pub struct ProductDetailParser {
    title: Vec<NamedSelector>,
    price: Vec<NamedSelector>,
    stock_status: NamedSelector,
    availability_message: NamedSelector,
    out_of_stock: NamedSelector,
    secondary_price: NamedSelector,
    availability_block: NamedSelector,
    seller: Vec<NamedSelector>,
    review_count: NamedSelector,
    rating: NamedSelector,
    photo: NamedSelector,
    photo_attribute: String,
    currency_symbol: String,
}

impl ProductDetailParser {
    /// Create a new product detail parser with default configuration
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&DetailSelectors::default(), "$")
    }

    /// Create parser with custom selector configuration
    pub fn with_config(selectors: &DetailSelectors, currency_symbol: &str) -> ParsingResult<Self> {
        Ok(Self {
            title: NamedSelector::parse_all(&selectors.title)?,
            price: NamedSelector::parse_all(&selectors.price)?,
            stock_status: NamedSelector::parse(&selectors.stock_status)?,
            availability_message: NamedSelector::parse(&selectors.availability_message)?,
            out_of_stock: NamedSelector::parse(&selectors.out_of_stock)?,
            secondary_price: NamedSelector::parse(&selectors.secondary_price)?,
            availability_block: NamedSelector::parse(&selectors.availability_block)?,
            seller: NamedSelector::parse_all(&selectors.seller)?,
            review_count: NamedSelector::parse(&selectors.review_count)?,
            rating: NamedSelector::parse(&selectors.rating)?,
            photo: NamedSelector::parse(&selectors.photo)?,
            photo_attribute: selectors.photo_attribute.clone(),
            currency_symbol: currency_symbol.to_string(),
        })
    }

    /// Run all six extractors against one parsed page
    pub fn extract_all(&self, html: &Html) -> ExtractedFields {
        ExtractedFields {
            title: self.extract_title(html),
            price: self.extract_price(html),
            seller: self.extract_seller(html),
            review_count: self.extract_review_count(html),
            rating: self.extract_rating(html),
            photo_url: self.extract_photo_url(html),
        }
    }

    /// Title from the first matching heading. A page with no title element
    /// yields an empty title rather than a missing one.
    pub fn extract_title(&self, html: &Html) -> Option<String> {
        let strategies = self
            .title
            .iter()
            .map(|selector| Strategy::found("heading", move || selector.first_text(html)))
            .chain(std::iter::once(Strategy::found("empty", || Ok(String::new()))));

        settle("title", first_of("title", strategies))
    }

    /// Price, falling back through stock status, a secondary price element
    /// and finally the availability block.
    pub fn extract_price(&self, html: &Html) -> Option<f64> {
        let strategies = vec![
            Strategy::found("buy_box", || self.price_from_buy_box(html)),
            Strategy::new("stock_status", || self.price_from_stock_status(html)),
            Strategy::found("secondary_price", || {
                let text = self.secondary_price.first_text(html)?;
                parse_amount("price", &text, &self.currency_symbol)
            }),
            Strategy::new("availability_block", || self.price_from_availability_block(html)),
        ];

        settle("price", first_of("price", strategies))
    }

    /// Seller from the byline. "Visit the X Store" drops the leading two
    /// words; any other byline text is returned as is.
    pub fn extract_seller(&self, html: &Html) -> Option<String> {
        let strategies = self.seller.iter().enumerate().map(|(i, selector)| {
            let name = if i == 0 { "byline" } else { "brand_byline" };
            Strategy::found(name, move || {
                let text = selector.first_text(html)?;
                Ok(if i == 0 { seller_from_byline(&text) } else { text })
            })
        });

        settle("seller", first_of("seller", strategies))
    }

    /// Leading integer of the review count text, thousands separators removed
    pub fn extract_review_count(&self, html: &Html) -> Option<u64> {
        let result = self.review_count.first_text(html).and_then(|text| {
            leading_token(&text)
                .replace(',', "")
                .parse::<u64>()
                .map_err(|_| ParsingError::number_parse_failed("review_count", &text))
        });

        settle("review_count", result.map(Some))
    }

    /// Leading decimal of the star icon's alt text
    pub fn extract_rating(&self, html: &Html) -> Option<f64> {
        let result = self.rating.first_text(html).and_then(|text| {
            leading_token(&text)
                .parse::<f64>()
                .ok()
                .filter(|rating| rating.is_finite())
                .ok_or_else(|| ParsingError::number_parse_failed("rating", &text))
        });

        settle("rating", result.map(Some))
    }

    /// Source of the main product image
    pub fn extract_photo_url(&self, html: &Html) -> Option<String> {
        let result = self.photo.first_attr(html, &self.photo_attribute);
        settle("photo_url", result.map(Some))
    }

    fn price_from_buy_box(&self, html: &Html) -> ParsingResult<f64> {
        let strategies = self.price.iter().map(|selector| {
            Strategy::found("price_element", move || {
                let text = selector.first_text(html)?;
                parse_amount("price", &text, &self.currency_symbol)
            })
        });

        first_of("price", strategies)?
            .ok_or_else(|| ParsingError::no_strategy_applied("price", "buy box is empty"))
    }

    fn price_from_stock_status(&self, html: &Html) -> ParsingResult<Option<f64>> {
        let availability = self.stock_status.first_text(html).ok();
        let message = self.availability_message.first_text(html).ok();
        let out_of_stock = self.out_of_stock.first_text(html).ok();

        if availability.is_none() && message.is_none() && out_of_stock.is_none() {
            return Err(ParsingError::no_strategy_applied("price", "no stock status on page"));
        }

        let mentions = |text: &Option<String>, marker: &str| {
            text.as_deref().is_some_and(|t| t.contains(marker))
        };

        if mentions(&availability, stock::IN_STOCK) {
            debug!("Stock status says in stock, re-reading buy box");
            return self.price_from_buy_box(html).map(Some);
        }
        if mentions(&out_of_stock, stock::TEMPORARILY_OUT)
            || mentions(&availability, stock::TEMPORARILY_OUT)
        {
            return Ok(Some(0.0));
        }
        if [&availability, &message, &out_of_stock]
            .into_iter()
            .any(|text| mentions(text, stock::UNAVAILABLE))
        {
            return Ok(Some(0.0));
        }

        Err(ParsingError::no_strategy_applied(
            "price",
            "stock status does not decide the price",
        ))
    }

    fn price_from_availability_block(&self, html: &Html) -> ParsingResult<Option<f64>> {
        let block = self.availability_block.first(html)?;
        let lines = element_lines(&block);
        let first_line = lines.first().map(String::as_str).unwrap_or_default();

        if first_line.starts_with('P') {
            info!("Product N/A");
            return Ok(None);
        }
        if lines.iter().any(|line| line.contains(stock::IN_STOCK)) {
            return Ok(Some(0.0));
        }

        info!("Product {}", first_line);
        Ok(None)
    }
}

impl ContextualParser for ProductDetailParser {
    type Output = ProductRecord;
    type Context = DetailParseContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> Self::Output {
        let fields = self.extract_all(html);
        debug!("Extracted fields for {}: {:?}", context.product.url, fields);

        ProductRecord {
            title: fields.title,
            price: fields.price,
            rating: fields.rating,
            photo_url: fields.photo_url,
            seller: fields.seller,
            review_count: fields.review_count,
            ..ProductRecord::empty(&context.product)
        }
    }
}

/// "Visit the Sony Store" -> "Sony Store"
fn seller_from_byline(text: &str) -> String {
    if text.contains("Visit the") {
        text.split(' ').skip(2).collect::<Vec<_>>().join(" ")
    } else {
        text.to_string()
    }
}

/// Collapse an extraction result into the field value, logging the reason
/// when the value is missing.
fn settle<T>(field: &str, result: ParsingResult<Option<T>>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(e) if e.is_page_shape() => {
            debug!(field, error = %e, "Field not found on page");
            None
        }
        Err(e) => {
            warn!(field, error = %e, "Field extraction failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductRef;
    use rstest::rstest;

    fn parser() -> ProductDetailParser {
        ProductDetailParser::new().unwrap()
    }

    fn page(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    const FULL_PAGE: &str = r#"
        <span id="productTitle">
            PlayStation 5 Console
        </span>
        <a id="bylineInfo" href="/stores/sony">Visit the PlayStation Store</a>
        <span id="acrCustomerReviewText">12,345 ratings</span>
        <i class="a-icon a-icon-star"><span class="a-icon-alt">4.8 out of 5 stars</span></i>
        <span class="a-price apexPriceToPay"><span class="a-offscreen">$499.99</span></span>
        <img id="landingImage" src="https://m.media-amazon.com/images/I/ps5.jpg">
    "#;

    #[test]
    fn test_parser_creation() {
        assert!(ProductDetailParser::new().is_ok());
    }

    #[test]
    fn invalid_selector_fails_construction() {
        let selectors = DetailSelectors {
            rating: "span[".to_string(),
            ..DetailSelectors::default()
        };
        assert!(ProductDetailParser::with_config(&selectors, "$").is_err());
    }

    #[test]
    fn full_page_yields_every_field() {
        let fields = parser().extract_all(&page(FULL_PAGE));
        assert_eq!(
            fields,
            ExtractedFields {
                title: Some("PlayStation 5 Console".to_string()),
                price: Some(499.99),
                seller: Some("PlayStation Store".to_string()),
                review_count: Some(12345),
                rating: Some(4.8),
                photo_url: Some("https://m.media-amazon.com/images/I/ps5.jpg".to_string()),
            }
        );
    }

    #[test]
    fn title_falls_back_to_heading_then_empty() {
        let html = page(r#"<h1 class="a-size-large">DualSense Controller</h1>"#);
        assert_eq!(parser().extract_title(&html), Some("DualSense Controller".to_string()));

        let html = page("<p>nothing here</p>");
        assert_eq!(parser().extract_title(&html), Some(String::new()));
    }

    #[test]
    fn primary_price_text_is_parsed() {
        let html = page(r#"<span class="apexPriceToPay">$299.99</span>"#);
        assert_eq!(parser().extract_price(&html), Some(299.99));
    }

    #[test]
    fn our_price_block_is_second_choice() {
        let html = page(r#"<span id="priceblock_ourprice">$1,049.00</span>"#);
        assert_eq!(parser().extract_price(&html), Some(1049.0));
    }

    #[test]
    fn currently_unavailable_means_zero() {
        let html = page(r#"<span class="a-color-price">Currently unavailable.</span>"#);
        assert_eq!(parser().extract_price(&html), Some(0.0));
    }

    #[rstest]
    #[case(r#"<span class="a-color-price">Temporarily out of stock.</span>"#)]
    #[case(r#"<div id="outOfStock">Temporarily out of stock.</div>"#)]
    #[case(r#"<span class="qa-availability-message">Currently unavailable.</span>"#)]
    #[case(r#"<div id="outOfStock"><span>Currently unavailable.</span></div>"#)]
    fn stock_status_fields_zero_the_price(#[case] body: &str) {
        assert_eq!(parser().extract_price(&page(body)), Some(0.0));
    }

    #[test]
    fn in_stock_without_readable_price_moves_on() {
        let html = page(
            r#"<div><b>x</b><span class="a-color-price">In Stock.</span></div>
               <div id="availability"><span>In Stock.</span></div>"#,
        );
        assert_eq!(parser().extract_price(&html), Some(0.0));
    }

    #[test]
    fn secondary_price_element_is_read() {
        let html = page(
            r#"<div><span>List:</span><span class="a-color-price">$89.50</span></div>"#,
        );
        assert_eq!(parser().extract_price(&html), Some(89.5));
    }

    #[rstest]
    #[case("<div id=\"availability\">\n  Pre-order now\n</div>")]
    #[case("<div id=\"availability\">\n  Usually ships within 6 to 10 days.\n</div>")]
    fn availability_block_can_rule_out_a_price(#[case] body: &str) {
        assert_eq!(parser().extract_price(&page(body)), None);
    }

    #[test]
    fn price_is_missing_when_nothing_applies() {
        assert_eq!(parser().extract_price(&page("<p>empty</p>")), None);
    }

    #[rstest]
    #[case(r#"<a id="bylineInfo">Visit the Sony Store</a>"#, Some("Sony Store"))]
    #[case(r#"<a id="bylineInfo">Brand: Sony</a>"#, Some("Brand: Sony"))]
    #[case(r#"<a class="qa-byline-url">Logitech</a>"#, Some("Logitech"))]
    #[case(r#"<p>no byline</p>"#, None)]
    fn seller_variants(#[case] body: &str, #[case] expected: Option<&str>) {
        assert_eq!(parser().extract_seller(&page(body)), expected.map(str::to_string));
    }

    #[rstest]
    #[case("1,024 ratings", Some(1024))]
    #[case("7 rating", Some(7))]
    #[case("ratings", None)]
    fn review_count_variants(#[case] text: &str, #[case] expected: Option<u64>) {
        let html = page(&format!(r#"<span id="acrCustomerReviewText">{text}</span>"#));
        assert_eq!(parser().extract_review_count(&html), expected);
    }

    #[test]
    fn rating_needs_a_number() {
        let html = page(r#"<span class="a-icon-alt">Previous page</span>"#);
        assert_eq!(parser().extract_rating(&html), None);
        assert_eq!(parser().extract_rating(&page("")), None);
    }

    #[test]
    fn photo_needs_src() {
        let html = page(r#"<img id="landingImage" data-old-hires="x.jpg">"#);
        assert_eq!(parser().extract_photo_url(&html), None);
    }

    #[test]
    fn record_carries_ref_identity() {
        let product = ProductRef::from_asin("B08FC5L3RG", "https://www.amazon.com/dp/", 0);
        let record = parser().parse_with_context(&page(FULL_PAGE), &DetailParseContext::new(product));
        assert_eq!(record.asin, "B08FC5L3RG");
        assert_eq!(record.url, "https://www.amazon.com/dp/B08FC5L3RG");
        assert!(record.is_valid());
    }
}
