use serde::Deserialize;

use crate::{error::MarketDataError, traits::RemoteResponse};

#[derive(Deserialize, Debug)]
pub struct TickerPriceResponse {
    pub symbol: String,
    pub price: String,
}

impl RemoteResponse<f64> for TickerPriceResponse {
    fn to_model(&self) -> Result<f64, MarketDataError> {
        self.price
            .parse::<f64>()
            .map_err(|_| MarketDataError::Malformed(format!("price {:?}", self.price)))
    }
}
