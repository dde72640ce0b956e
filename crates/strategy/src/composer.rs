use tracing::debug;

use common::format::group_thousands;
use common::models::{Candle, ChartSpec, Direction, SignalPost, TradeSignal, closes};

use crate::direction::{MIN_SERIES_LEN, infer_direction, leverage_from_confidence};

pub const RISK_FRACTION: f64 = 0.05;
pub const CHART_POINTS: usize = 120;

const LONG_TAKE_PROFIT: f64 = 1.025;
const LONG_STOP_LOSS: f64 = 0.985;
const SHORT_TAKE_PROFIT: f64 = 0.975;
const SHORT_STOP_LOSS: f64 = 1.015;

// Floor on the stop distance, as a fraction of entry.
const MIN_STOP_FRACTION: f64 = 0.001;
// Keeps capped exposure at or below the limit after float rounding.
const CAP_MARGIN: f64 = 1e-12;

/// Fixed take-profit / stop-loss bands around `entry`.
pub fn levels(direction: Direction, entry: f64) -> (f64, f64) {
    match direction {
        Direction::Long => (entry * LONG_TAKE_PROFIT, entry * LONG_STOP_LOSS),
        Direction::Short => (entry * SHORT_TAKE_PROFIT, entry * SHORT_STOP_LOSS),
    }
}

/// Risks `RISK_FRACTION` of equity over the stop distance, then scales down so
/// that `quantity * entry` never exceeds `equity * leverage`.
pub fn position_size(entry: f64, stop_loss: f64, equity: f64, leverage: u8) -> f64 {
    let stop_distance = (entry - stop_loss).abs();
    let distance = if stop_distance > f64::EPSILON * entry.abs() {
        stop_distance
    } else {
        MIN_STOP_FRACTION * entry.abs()
    };

    let mut quantity = equity * RISK_FRACTION / distance;

    let notional = quantity * entry;
    let cap = equity * f64::from(leverage);
    if notional > cap {
        quantity *= cap / (notional * (1.0 + CAP_MARGIN));
    }
    quantity
}

/// `BTCUSDT` -> `BTC`.
pub fn coin_name(symbol: &str) -> &str {
    symbol.strip_suffix("USDT").unwrap_or(symbol)
}

/// Builds a signal from the latest close. Returns `None` for series shorter
/// than the inference warm-up or a non-positive last price.
pub fn compose_signal(symbol: &str, candles: &[Candle], equity: f64) -> Option<SignalPost> {
    if candles.len() < MIN_SERIES_LEN {
        return None;
    }
    let series = closes(candles);
    let entry = *series.last()?;
    if !(entry.is_finite() && entry > 0.0) {
        return None;
    }

    let call = infer_direction(&series);
    let leverage = leverage_from_confidence(call.confidence);
    let (take_profit, stop_loss) = levels(call.direction, entry);
    let quantity = position_size(entry, stop_loss, equity, leverage);
    debug!(
        "{} {} confidence {:.2} leverage x{} qty {}",
        symbol, call.direction, call.confidence, leverage, quantity
    );

    let signal = TradeSignal {
        symbol: symbol.to_string(),
        direction: call.direction,
        confidence: call.confidence,
        entry,
        take_profit,
        stop_loss,
        leverage,
        quantity,
    };

    let tail = &candles[candles.len().saturating_sub(CHART_POINTS)..];
    let chart = ChartSpec {
        symbol: symbol.to_string(),
        times: tail.iter().map(|c| c.open_time).collect(),
        closes: closes(tail),
        entry,
        take_profit,
        stop_loss,
    };

    Some(SignalPost {
        text: format_signal(&signal),
        signal,
        chart,
    })
}

pub fn format_signal(signal: &TradeSignal) -> String {
    let coin = coin_name(&signal.symbol);
    let direction = match signal.direction {
        Direction::Long => "🟢 LONG",
        Direction::Short => "🔴 SHORT",
    };

    format!(
        "📊 Signal: {coin}\n\n\
         🎯 Entry: {entry} $\n\
         💰 Take profit: {tp} $\n\
         🛑 Stop loss: {sl} $\n\n\
         ⚖ Leverage: x{lev}\n\
         💵 Risk: {risk}% of equity\n\
         Position size ≈ {qty} {coin}\n\
         Direction: {direction}\n\
         Confidence: {conf}%\n\
         #signal #{tag} #crypto",
        entry = group_thousands(signal.entry, 4),
        tp = group_thousands(signal.take_profit, 4),
        sl = group_thousands(signal.stop_loss, 4),
        lev = signal.leverage,
        risk = (RISK_FRACTION * 100.0).round(),
        qty = group_thousands(signal.quantity, 6),
        conf = (signal.confidence * 100.0) as u32,
        tag = coin.to_lowercase(),
    )
}
