//! Ordered fallback over fallible extraction strategies
//!
//! A strategy answers one of three ways:
//! - `Ok(Some(v))`: found, stop here
//! - `Ok(None)`: the page says the value does not exist, stop here
//! - `Err(_)`: this strategy does not apply, try the next one

use tracing::debug;

use super::{ParsingError, ParsingResult};

/// A named, one-shot extraction attempt
pub struct Strategy<'a, T> {
    name: &'static str,
    run: Box<dyn FnOnce() -> ParsingResult<Option<T>> + 'a>,
}

impl<'a, T> Strategy<'a, T> {
    /// A strategy that may conclude the value is absent
    pub fn new(name: &'static str, run: impl FnOnce() -> ParsingResult<Option<T>> + 'a) -> Self {
        Self {
            name,
            run: Box::new(run),
        }
    }

    /// A strategy that either finds the value or does not apply
    pub fn found(name: &'static str, run: impl FnOnce() -> ParsingResult<T> + 'a) -> Self {
        Self::new(name, move || run().map(Some))
    }
}

/// Run strategies in order and return the first conclusive answer.
/// Errors only when every strategy declined; the error keeps the last reason.
pub fn first_of<'a, T>(
    field: &str,
    strategies: impl IntoIterator<Item = Strategy<'a, T>>,
) -> ParsingResult<Option<T>> {
    let mut attempts = 0;
    let mut last = None;

    for strategy in strategies {
        attempts += 1;
        match (strategy.run)() {
            Ok(Some(value)) => {
                debug!(field, strategy = strategy.name, "strategy matched");
                return Ok(Some(value));
            }
            Ok(None) => {
                debug!(field, strategy = strategy.name, "strategy concluded value is absent");
                return Ok(None);
            }
            Err(e) => {
                debug!(field, strategy = strategy.name, error = %e, "strategy declined");
                last = Some(e);
            }
        }
    }

    Err(match last {
        Some(last) => ParsingError::StrategiesExhausted {
            field: field.to_string(),
            attempts,
            last: Box::new(last),
        },
        None => ParsingError::no_strategy_applied(field, "no strategies configured"),
    })
}
