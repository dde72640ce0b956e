use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// A directional trade recommendation. Produced once and only transmitted, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub symbol: String,
    pub direction: Direction,
    pub confidence: f64,
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub leverage: u8,
    pub quantity: f64,
}

/// Everything a chart renderer needs: the price tail plus the three reference levels.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub symbol: String,
    pub times: Vec<i64>,
    pub closes: Vec<f64>,
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
}

#[derive(Debug, Clone)]
pub struct SignalPost {
    pub signal: TradeSignal,
    pub text: String,
    pub chart: ChartSpec,
}
