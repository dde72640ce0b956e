use common::models::Direction;

use crate::indicators::{DEFAULT_RSI_PERIOD, ema, rsi};

pub const MIN_SERIES_LEN: usize = 40;
pub const FAST_EMA: usize = 10;
pub const SLOW_EMA: usize = 30;

pub const MIN_CONFIDENCE: f64 = 0.15;
pub const MAX_CONFIDENCE: f64 = 1.0;
pub const FALLBACK_CONFIDENCE: f64 = 0.4;

pub const MIN_LEVERAGE: u8 = 2;
pub const MAX_LEVERAGE: u8 = 7;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionCall {
    pub direction: Direction,
    pub confidence: f64,
}

impl DirectionCall {
    /// Returned for series too short to read; not a real call.
    pub const FALLBACK: Self = Self {
        direction: Direction::Long,
        confidence: FALLBACK_CONFIDENCE,
    };
}

/// EMA(10)/EMA(30) trend vote plus an RSI(14) momentum vote.
///
/// Ties go LONG. Confidence blends how far RSI sits from 50 with how far
/// the EMAs are apart relative to 1% of the last price, clamped to
/// `[MIN_CONFIDENCE, MAX_CONFIDENCE]`.
pub fn infer_direction(closes: &[f64]) -> DirectionCall {
    if closes.len() < MIN_SERIES_LEN {
        return DirectionCall::FALLBACK;
    }

    let (Some(&fast), Some(&slow)) = (
        ema(closes, FAST_EMA).last(),
        ema(closes, SLOW_EMA).last(),
    ) else {
        return DirectionCall::FALLBACK;
    };
    let rsi_last = rsi(closes, DEFAULT_RSI_PERIOD)
        .last()
        .copied()
        .flatten()
        .unwrap_or(50.0);
    let last_price = closes[closes.len() - 1];

    let ema_vote = if fast >= slow { 1 } else { -1 };
    let rsi_vote = if rsi_last >= 55.0 {
        1
    } else if rsi_last <= 45.0 {
        -1
    } else {
        0
    };
    let direction = if ema_vote + rsi_vote >= 0 {
        Direction::Long
    } else {
        Direction::Short
    };

    let rsi_conf = ((rsi_last - 50.0).abs() / 30.0).min(1.0);
    let ema_conf = ((fast - slow).abs() / (0.01 * last_price + EPSILON)).min(1.0);
    let blended = 0.5 * rsi_conf + 0.5 * ema_conf;
    let confidence = if blended.is_nan() {
        MIN_CONFIDENCE
    } else {
        blended.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    };

    DirectionCall {
        direction,
        confidence,
    }
}

/// Maps confidence linearly onto `[MIN_LEVERAGE, MAX_LEVERAGE]`, rounded to the nearest integer.
pub fn leverage_from_confidence(confidence: f64) -> u8 {
    let span = f64::from(MAX_LEVERAGE - MIN_LEVERAGE);
    let step = (confidence.clamp(0.0, 1.0) * span).round();
    let step = if step.is_nan() { 0.0 } else { step };
    (MIN_LEVERAGE + step as u8).clamp(MIN_LEVERAGE, MAX_LEVERAGE)
}
