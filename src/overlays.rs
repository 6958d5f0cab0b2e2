//! Display overlays: moving averages and RSI aligned to the series.
//!
//! The detectors never read these. They exist so a caller can drop the
//! warm-up bars where an overlay is still undefined and evaluate the same
//! trimmed series it is going to draw.

use serde::{Deserialize, Serialize};

use crate::{Period, OHLCV};

/// Overlay windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub fast_sma: Period,
    pub slow_sma: Period,
    pub rsi: Period,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            fast_sma: Period::new_const(20),
            slow_sma: Period::new_const(50),
            rsi: Period::new_const(14),
        }
    }
}

/// Overlay values per bar, `None` where the window is not yet full
#[derive(Debug, Clone, PartialEq)]
pub struct Overlays {
    pub sma_fast: Vec<Option<f64>>,
    pub sma_slow: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}

impl Overlays {
    pub fn compute<T: OHLCV>(bars: &[T], config: &OverlayConfig) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();
        Self {
            sma_fast: sma(&closes, config.fast_sma),
            sma_slow: sma(&closes, config.slow_sma),
            rsi: rsi(&closes, config.rsi),
        }
    }

    /// Number of leading bars where at least one overlay is undefined
    pub fn warmup(&self) -> usize {
        let series = [&self.sma_fast, &self.sma_slow, &self.rsi];
        (0..self.sma_fast.len())
            .find(|&i| series.iter().all(|s| s[i].is_some()))
            .unwrap_or(self.sma_fast.len())
    }
}

/// The cleaned series plus overlays with no undefined values
#[derive(Debug, Clone)]
pub struct Prepared<'a, T> {
    pub bars: &'a [T],
    pub sma_fast: Vec<f64>,
    pub sma_slow: Vec<f64>,
    pub rsi: Vec<f64>,
    /// Leading bars removed
    pub dropped: usize,
}

/// Compute overlays and drop the warm-up bars from the front of the series
pub fn prepare<'a, T: OHLCV>(bars: &'a [T], config: &OverlayConfig) -> Prepared<'a, T> {
    let overlays = Overlays::compute(bars, config);
    let dropped = overlays.warmup();
    let defined = |values: &[Option<f64>]| -> Vec<f64> {
        values[dropped..].iter().flatten().copied().collect()
    };

    Prepared {
        bars: &bars[dropped..],
        sma_fast: defined(&overlays.sma_fast),
        sma_slow: defined(&overlays.sma_slow),
        rsi: defined(&overlays.rsi),
        dropped,
    }
}

/// Simple moving average, defined from index `window - 1`
pub fn sma(values: &[f64], window: Period) -> Vec<Option<f64>> {
    let w = window.get();
    let mut out = vec![None; values.len()];
    let mut sum = 0.0;
    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= w {
            sum -= values[i - w];
        }
        if i + 1 >= w {
            out[i] = Some(sum / w as f64);
        }
    }
    out
}

/// Wilder RSI: gains and losses smoothed with an EMA of `alpha = 1/window`
/// seeded by the first change. Defined from index `window`.
pub fn rsi(closes: &[f64], window: Period) -> Vec<Option<f64>> {
    let w = window.get();
    let alpha = 1.0 / w as f64;
    let mut out = vec![None; closes.len()];
    let (mut up, mut down) = (0.0, 0.0);

    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        let (gain, loss) = (change.max(0.0), (-change).max(0.0));
        if i == 1 {
            up = gain;
            down = loss;
        } else {
            up = (1.0 - alpha) * up + alpha * gain;
            down = (1.0 - alpha) * down + alpha * loss;
        }
        if i >= w {
            out[i] = Some(rsi_value(up, down));
        }
    }
    out
}

/// 100 whenever the averaged loss is zero, flat windows included
fn rsi_value(up: f64, down: f64) -> f64 {
    if down <= 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + up / down)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bar;

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(i as i64, c, c + 1.0, c - 1.0, c, 1000.0))
            .collect()
    }

    #[test]
    fn test_sma() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], Period::new(3).unwrap());
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_rsi_extremes() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&rising, Period::new(14).unwrap());
        assert!(out[13].is_none());
        assert_eq!(out[14], Some(100.0));

        let flat = vec![100.0; 30];
        assert_eq!(rsi(&flat, Period::new(14).unwrap())[20], Some(100.0));

        let falling: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        assert_eq!(rsi(&falling, Period::new(14).unwrap())[20], Some(0.0));
    }

    #[test]
    fn test_rsi_stays_in_range() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + ((i * 7 + 3) % 11) as f64 - 5.0)
            .collect();
        for value in rsi(&closes, Period::new(14).unwrap()).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_prepare_drops_warmup() {
        let closes: Vec<f64> = (0..100).map(|i| 100.0 + (i % 5) as f64).collect();
        let bars = bars_from_closes(&closes);
        let prepared = prepare(&bars, &OverlayConfig::default());

        assert_eq!(prepared.dropped, 49);
        assert_eq!(prepared.bars.len(), 51);
        assert_eq!(prepared.bars[0].timestamp, 49);
        assert_eq!(prepared.sma_fast.len(), 51);
        assert_eq!(prepared.sma_slow.len(), 51);
        assert_eq!(prepared.rsi.len(), 51);
    }

    #[test]
    fn test_prepare_short_series_is_empty() {
        let bars = bars_from_closes(&[100.0; 30]);
        let prepared = prepare(&bars, &OverlayConfig::default());
        assert!(prepared.bars.is_empty());
        assert_eq!(prepared.dropped, 30);
    }
}
