//! Blocking REST client for the brokerage gateway.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use zeroize::Zeroizing;

use super::auth;
use super::types::{PositionsResponse, QuoteResponse, SubmitOrderRequest, SubmitOrderResponse};
use crate::error::BrokerError;

/// Signed, blocking gateway client.
pub struct GatewayClient {
    client: Client,
    api_key: String,
    secret_key: Zeroizing<String>,
    base_url: String,
}

impl GatewayClient {
    /// Create a new client. `base_url` has no trailing slash.
    pub fn new(
        base_url: &str,
        api_key: &str,
        secret_key: &str,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BrokerError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            secret_key: Zeroizing::new(secret_key.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Test connectivity (GET /v1/ping).
    pub fn ping(&self) -> Result<(), BrokerError> {
        let url = format!("{}/v1/ping", self.base_url);
        let resp = self.client.get(&url).send().map_err(transport_error)?;

        if !resp.status().is_success() {
            return Err(BrokerError::Connection(format!(
                "ping returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    /// List holdings (GET /v1/positions).
    pub fn positions(&self) -> Result<PositionsResponse, BrokerError> {
        let path = "/v1/positions";
        let resp = self
            .signed(self.client.get(format!("{}{path}", self.base_url)), "GET", path, "")
            .send()
            .map_err(transport_error)?;

        let resp = check_status(resp, "positions", BrokerError::Connection)?;
        resp.json::<PositionsResponse>()
            .map_err(|e| BrokerError::Decode(format!("failed to parse positions: {e}")))
    }

    /// Quote a symbol (GET /v1/quote?symbol=S).
    pub fn quote(&self, symbol: &str) -> Result<QuoteResponse, BrokerError> {
        let path = quote_path(symbol);
        let resp = self
            .signed(self.client.get(format!("{}{path}", self.base_url)), "GET", &path, "")
            .send()
            .map_err(transport_error)?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BrokerError::InvalidSymbol(symbol.to_string()));
        }
        let resp = check_status(resp, "quote", BrokerError::Connection)?;
        resp.json::<QuoteResponse>()
            .map_err(|e| BrokerError::Decode(format!("failed to parse quote: {e}")))
    }

    /// Submit an order (POST /v1/orders).
    pub fn submit_order(
        &self,
        request: &SubmitOrderRequest<'_>,
    ) -> Result<SubmitOrderResponse, BrokerError> {
        let path = "/v1/orders";
        let body = serde_json::to_string(request)
            .map_err(|e| BrokerError::Order(format!("failed to encode order: {e}")))?;

        debug!("Submitting gateway order: {body}");

        let resp = self
            .signed(self.client.post(format!("{}{path}", self.base_url)), "POST", path, &body)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .map_err(transport_error)?;

        let resp = check_status(resp, "order", BrokerError::Order)?;
        resp.json::<SubmitOrderResponse>()
            .map_err(|e| BrokerError::Decode(format!("failed to parse order response: {e}")))
    }

    fn signed(&self, req: RequestBuilder, method: &str, path: &str, body: &str) -> RequestBuilder {
        let timestamp = current_timestamp_ms();
        let signature = auth::sign(&auth::payload(timestamp, method, path, body), &self.secret_key);
        req.header("X-Api-Key", &self.api_key)
            .header("X-Timestamp", timestamp.to_string())
            .header("X-Signature", signature)
    }
}

fn transport_error(e: reqwest::Error) -> BrokerError {
    if e.is_timeout() {
        BrokerError::Timeout(e.to_string())
    } else {
        BrokerError::Connection(e.to_string())
    }
}

/// Map non-2xx responses. 401/403 and 429 get their own variants; anything
/// else is wrapped by `other`.
fn check_status(
    resp: Response,
    what: &str,
    other: fn(String) -> BrokerError,
) -> Result<Response, BrokerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(match status.as_u16() {
        401 | 403 => BrokerError::Auth(format!("{what} returned {status}: {body}")),
        429 => BrokerError::RateLimit,
        _ => other(format!("{what} returned {status}: {body}")),
    })
}

/// Current timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Quote path with the symbol percent-encoded; the signature covers this exact string.
fn quote_path(symbol: &str) -> String {
    format!("/v1/quote?symbol={}", urlencoding::encode(symbol))
}
