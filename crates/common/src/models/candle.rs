use serde::{Deserialize, Serialize};

/// One closed sample of a kline series: open time in epoch millis and the close price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub close: f64,
}

impl Candle {
    pub fn new(open_time: i64, close: f64) -> Self {
        Self { open_time, close }
    }
}

/// Close prices in series order.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}
