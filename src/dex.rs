//! DEX ticker endpoints.
//!
//! Tickers are served by explorer-style endpoints as self-describing objects,
//! so they deserialize directly with serde and need no table descriptor.
//! Price and volume fields are decimal strings on the wire and parse into
//! `BigDecimal` to keep full precision.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::client::Client;
use crate::errors::TzQueryError;

/// 24h market statistics for one DEX trading pair.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DexTicker {
    pub pair: String,
    pub pool: String,
    pub name: String,
    pub entity: String,
    pub price_change: BigDecimal,
    pub price_change_bps: BigDecimal,
    pub ask_price: BigDecimal,
    pub weighted_avg_price: BigDecimal,
    pub last_price: BigDecimal,
    pub last_qty: BigDecimal,
    pub last_trade_time: String,
    pub base_volume: BigDecimal,
    pub quote_volume: BigDecimal,
    pub open_price: BigDecimal,
    pub high_price: BigDecimal,
    pub low_price: BigDecimal,
    pub open_time: Option<DateTime<Utc>>,
    pub close_time: Option<DateTime<Utc>>,
    pub num_trades: i64,
    pub liquidity_usd: BigDecimal,
    pub price_usd: BigDecimal,
}

impl Client {
    /// Fetches the ticker for one pool, addressed as `{contract}_{pool_id}`.
    pub async fn dex_ticker(
        &self,
        address: &str,
        pool_id: u64,
    ) -> Result<DexTicker, TzQueryError> {
        let path = format!("/v1/dex/{address}_{pool_id}/ticker");
        self.get_json(&path, &[]).await
    }

    /// Lists tickers for all known DEX pools.
    pub async fn dex_tickers(&self) -> Result<Vec<DexTicker>, TzQueryError> {
        self.get_json("/v1/dex/tickers", &[]).await
    }
}
