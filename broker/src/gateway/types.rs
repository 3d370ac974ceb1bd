//! Gateway wire types. Prices and quantities travel as decimal strings.

use serde::{Deserialize, Serialize};

/// One holding in `GET /v1/positions`.
#[derive(Debug, Deserialize)]
pub struct PositionInfo {
    pub symbol: String,
    pub cost_price: String,
    pub quantity: String,
    pub available_quantity: String,
}

/// `GET /v1/positions` response.
#[derive(Debug, Deserialize)]
pub struct PositionsResponse {
    #[serde(default)]
    pub positions: Vec<PositionInfo>,
}

/// Extended-hours tick inside a quote.
#[derive(Debug, Deserialize)]
pub struct SessionQuote {
    pub timestamp: i64,
    pub last_done: String,
}

/// `GET /v1/quote?symbol=S` response.
#[derive(Debug, Deserialize)]
pub struct QuoteResponse {
    pub symbol: String,
    pub timestamp: i64,
    pub last_done: String,
    #[serde(default)]
    pub pre_market_quote: Option<SessionQuote>,
    #[serde(default)]
    pub post_market_quote: Option<SessionQuote>,
}

/// `POST /v1/orders` request body.
#[derive(Debug, Serialize)]
pub struct SubmitOrderRequest<'a> {
    pub symbol: &'a str,
    /// `Buy` or `Sell`.
    pub side: &'a str,
    /// `LO` (limit) or `MO` (market).
    pub order_type: &'a str,
    pub submitted_quantity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_price: Option<String>,
    /// `Day` or `GTC`.
    pub time_in_force: &'a str,
    pub remark: &'a str,
}

/// `POST /v1/orders` response.
#[derive(Debug, Deserialize)]
pub struct SubmitOrderResponse {
    pub order_id: String,
}
