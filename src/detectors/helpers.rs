//! Window helpers shared by the formation detectors.
//!
//! All ranges are inclusive bar indices. Swing points come from the same
//! series, so an index range is the same thing as a timestamp range.

use crate::OHLCV;

/// Highest high over `bars[start..=end]`
#[inline]
pub fn max_high<T: OHLCV>(bars: &[T], start: usize, end: usize) -> f64 {
    bars[start..=end]
        .iter()
        .map(|b| b.high())
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Lowest low over `bars[start..=end]`
#[inline]
pub fn min_low<T: OHLCV>(bars: &[T], start: usize, end: usize) -> f64 {
    bars[start..=end]
        .iter()
        .map(|b| b.low())
        .fold(f64::INFINITY, f64::min)
}

/// Simple average volume over a slice. None for an empty slice.
#[inline]
pub fn mean_volume<T: OHLCV>(bars: &[T]) -> Option<f64> {
    if bars.is_empty() {
        return None;
    }
    let sum: f64 = bars.iter().map(|b| b.volume()).sum();
    Some(sum / bars.len() as f64)
}

#[inline]
pub fn last_close<T: OHLCV>(bars: &[T]) -> Option<f64> {
    bars.last().map(|b| b.close())
}

/// Piecewise-linear test series through `waypoints`, `leg` bars per leg.
/// Each bar has high = path, low = path - 2, open = close = path - 1.
#[cfg(test)]
pub(crate) fn zigzag(waypoints: &[f64], leg: usize) -> Vec<crate::Bar> {
    let mut path = Vec::new();
    for pair in waypoints.windows(2) {
        for step in 0..leg {
            path.push(pair[0] + (pair[1] - pair[0]) * step as f64 / leg as f64);
        }
    }
    path.extend(waypoints.last().copied());
    path.iter()
        .enumerate()
        .map(|(i, &p)| crate::Bar::new(i as i64 * 60, p - 1.0, p, p - 2.0, p - 1.0, 1000.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bar;

    fn bars() -> Vec<Bar> {
        vec![
            Bar::new(0, 10.0, 12.0, 9.0, 11.0, 100.0),
            Bar::new(1, 11.0, 15.0, 10.0, 14.0, 200.0),
            Bar::new(2, 14.0, 14.5, 8.0, 9.0, 300.0),
            Bar::new(3, 9.0, 11.0, 8.5, 10.0, 400.0),
        ]
    }

    #[test]
    fn test_max_high_is_inclusive() {
        let bars = bars();
        assert_eq!(max_high(&bars, 0, 1), 15.0);
        assert_eq!(max_high(&bars, 2, 3), 14.5);
        assert_eq!(max_high(&bars, 3, 3), 11.0);
    }

    #[test]
    fn test_min_low_is_inclusive() {
        let bars = bars();
        assert_eq!(min_low(&bars, 0, 1), 9.0);
        assert_eq!(min_low(&bars, 0, 3), 8.0);
        assert_eq!(min_low(&bars, 3, 3), 8.5);
    }

    #[test]
    fn test_mean_volume() {
        let bars = bars();
        assert_eq!(mean_volume(&bars), Some(250.0));
        assert_eq!(mean_volume(&bars[..0]), None);
        assert_eq!(last_close(&bars), Some(10.0));
    }
}
