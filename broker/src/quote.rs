//! Current-price resolution across regular and extended-hours ticks.

use allocsync::{Price, Symbol};
use log::debug;

use crate::error::BrokerError;
use crate::types::{Quote, Tick};
use crate::Broker;

/// Most recent tick in a quote.
///
/// Candidates are the regular, pre-market and post-market ticks; the one with
/// the latest timestamp wins. On a tie the earlier candidate in that order
/// is kept.
pub fn latest_tick(quote: &Quote) -> Tick {
    [quote.pre_market, quote.post_market]
        .into_iter()
        .flatten()
        .fold(quote.regular, |best, tick| {
            if tick.timestamp > best.timestamp {
                tick
            } else {
                best
            }
        })
}

/// Resolves a symbol to its most recent traded price through a broker.
pub struct QuoteResolver<'a> {
    broker: &'a dyn Broker,
}

impl<'a> QuoteResolver<'a> {
    pub fn new(broker: &'a dyn Broker) -> Self {
        Self { broker }
    }

    /// Latest price for the symbol. May be zero or negative if the broker
    /// reports no trade; callers decide whether that is usable.
    pub fn resolve(&self, symbol: &Symbol) -> Result<Price, BrokerError> {
        let quote = self.broker.quote(symbol)?;
        let tick = latest_tick(&quote);
        debug!("{symbol}: resolved {} (ts {})", tick.last_done, tick.timestamp);
        Ok(tick.last_done)
    }
}
