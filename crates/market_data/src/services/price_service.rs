use std::sync::Arc;

use tracing::{debug, warn};

use crate::traits::SpotPriceSource;

/// Spot price lookup over an ordered list of sources; the first quote wins.
#[derive(Clone)]
pub struct PriceService {
    sources: Vec<Arc<dyn SpotPriceSource>>,
}

impl PriceService {
    pub fn new(sources: Vec<Arc<dyn SpotPriceSource>>) -> Self {
        Self { sources }
    }

    pub async fn lookup(&self, symbol: &str) -> Option<f64> {
        for source in &self.sources {
            match source.usd_price(symbol).await {
                Ok(price) if price.is_finite() && price > 0.0 => {
                    debug!("{} quote for {}: {}", source.name(), symbol, price);
                    return Some(price);
                }
                Ok(price) => {
                    warn!("{} returned unusable quote {} for {}", source.name(), price, symbol);
                }
                Err(e) => {
                    warn!("{} price lookup for {} failed: {}", source.name(), symbol, e);
                }
            }
        }
        None
    }
}
