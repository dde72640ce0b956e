use serde::Deserialize;
use serde_json::Value;

use common::models::Candle;

use crate::{error::MarketDataError, traits::RemoteResponse};

/// One row of `GET /api/v3/klines`:
/// `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`.
#[derive(Deserialize, Debug)]
#[serde(transparent)]
pub struct KlineRow(pub Vec<Value>);

impl RemoteResponse<Candle> for KlineRow {
    fn to_model(&self) -> Result<Candle, MarketDataError> {
        let open_time = self
            .0
            .first()
            .and_then(Value::as_i64)
            .ok_or_else(|| MarketDataError::Malformed("kline open time".into()))?;

        let close = match self.0.get(4) {
            Some(Value::String(s)) => s.parse::<f64>().ok(),
            Some(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
        .ok_or_else(|| MarketDataError::Malformed("kline close price".into()))?;

        Ok(Candle::new(open_time, close))
    }
}
