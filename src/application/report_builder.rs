//! Report assembly and best-item selection

use chrono::{Local, NaiveDateTime};
use tracing::warn;

use crate::domain::{ProductRecord, Report, SearchQuery};

/// Highest-rated record; ties go to the earliest. Records without a
/// comparable rating are skipped.
pub fn best_item(records: &[ProductRecord]) -> Option<&ProductRecord> {
    let mut best: Option<(&ProductRecord, f64)> = None;
    for record in records {
        let Some(rating) = record.rating.filter(|r| !r.is_nan()) else {
            continue;
        };
        match best {
            Some((_, top)) if rating <= top => {}
            _ => best = Some((record, rating)),
        }
    }
    best.map(|(record, _)| record)
}

/// Build the report stamped with the current local time
pub fn build_report(
    title: &str,
    query: &SearchQuery,
    base_link: &str,
    currency: &str,
    records: Vec<ProductRecord>,
) -> Report {
    build_report_at(title, query, base_link, currency, records, Local::now().naive_local())
}

/// Build the report with an explicit timestamp
pub fn build_report_at(
    title: &str,
    query: &SearchQuery,
    base_link: &str,
    currency: &str,
    records: Vec<ProductRecord>,
    generated_at: NaiveDateTime,
) -> Report {
    let best = best_item(&records).cloned();
    if best.is_none() {
        warn!("No best item could be determined from {} records", records.len());
    }

    Report {
        title: title.to_string(),
        generated_at,
        product_count: records.len(),
        best_item: best,
        currency: currency.to_string(),
        filters: query.filter,
        base_link: base_link.to_string(),
        products: records,
    }
}
