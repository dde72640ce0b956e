use ta::Next;
use ta::indicators::ExponentialMovingAverage;

pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Exponential moving average aligned with `series`: seeded with the first
/// element, smoothing factor `2 / (span + 1)`. Empty input or a zero span
/// yields an empty vector.
pub fn ema(series: &[f64], span: usize) -> Vec<f64> {
    let Ok(mut indicator) = ExponentialMovingAverage::new(span) else {
        return Vec::new();
    };
    series.iter().map(|&v| indicator.next(v)).collect()
}

/// Wilder RSI. The first `period` positions are `None`; the first defined value
/// comes from simple averages over the first `period` differences, later ones
/// from Wilder smoothing. A zero average loss saturates at 100.
///
/// Returns an empty vector when `series.len() < period + 1`.
pub fn rsi(series: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || series.len() < period + 1 {
        return Vec::new();
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = series
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let n = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / n;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / n;

    let mut out = vec![None; period];
    out.push(Some(rsi_value(avg_gain, avg_loss)));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (n - 1.0) + gains[i]) / n;
        avg_loss = (avg_loss * (n - 1.0) + losses[i]) / n;
        out.push(Some(rsi_value(avg_gain, avg_loss)));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss != 0.0 {
        avg_gain / avg_loss
    } else {
        f64::INFINITY
    };
    100.0 - 100.0 / (1.0 + rs)
}
