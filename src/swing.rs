//! Swing point extraction
//!
//! A swing high is a bar whose high is strictly above the highs of the
//! `order` bars on each side; a swing low is the mirror on lows. Equal
//! neighbours disqualify a bar, and bars closer than `order` to either end
//! of the series are never classified.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{PatternError, Period, Result, OHLCV};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwingKind {
    High,
    Low,
}

/// A local extremum. `price` is the bar's high for swing highs and its low
/// for swing lows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub timestamp: i64,
    pub price: f64,
    pub kind: SwingKind,
}

/// Swing highs and lows of one series, each in chronological order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Swings {
    pub highs: Vec<SwingPoint>,
    pub lows: Vec<SwingPoint>,
}

impl Swings {
    pub fn of_kind(&self, kind: SwingKind) -> &[SwingPoint] {
        match kind {
            SwingKind::High => &self.highs,
            SwingKind::Low => &self.lows,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.highs.is_empty() && self.lows.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.highs.len() + self.lows.len()
    }
}

/// Find swing highs and lows with a half-window of `order` bars.
///
/// Returns empty sequences when `order >= bars.len() / 2`, since no bar has
/// enough neighbours. A bar that is both above its neighbours' highs and
/// below their lows (an outside bar) has no single direction and is left
/// out of both sequences.
pub fn extract<T: OHLCV>(bars: &[T], order: Period) -> Swings {
    let order = order.get();
    let n = bars.len();
    let mut swings = Swings::default();

    if order.saturating_mul(2) >= n {
        return swings;
    }

    for i in order..(n - order) {
        let high = bars[i].high();
        let low = bars[i].low();
        let mut is_high = true;
        let mut is_low = true;

        for j in 1..=order {
            let before = &bars[i - j];
            let after = &bars[i + j];
            if high <= before.high() || high <= after.high() {
                is_high = false;
            }
            if low >= before.low() || low >= after.low() {
                is_low = false;
            }
            if !is_high && !is_low {
                break;
            }
        }

        match (is_high, is_low) {
            (true, false) => swings.highs.push(SwingPoint {
                index: i,
                timestamp: bars[i].timestamp(),
                price: high,
                kind: SwingKind::High,
            }),
            (false, true) => swings.lows.push(SwingPoint {
                index: i,
                timestamp: bars[i].timestamp(),
                price: low,
                kind: SwingKind::Low,
            }),
            _ => {}
        }
    }

    swings
}

// ============================================================
// BAR INTERVALS
// ============================================================

/// Bar interval of the series. Only used to pick a swing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    Hour1,
    Hour2,
    Hour4,
    Day1,
    Week1,
    Month1,
}

impl Interval {
    pub fn code(self) -> &'static str {
        match self {
            Interval::Hour1 => "1h",
            Interval::Hour2 => "2h",
            Interval::Hour4 => "4h",
            Interval::Day1 => "1d",
            Interval::Week1 => "1wk",
            Interval::Month1 => "1mo",
        }
    }

    #[inline]
    pub fn is_intraday(self) -> bool {
        matches!(self, Interval::Hour1 | Interval::Hour2 | Interval::Hour4)
    }

    /// 8 bars either side for intraday data, 5 for daily and slower
    pub fn default_swing_order(self) -> Period {
        if self.is_intraday() {
            Period::new_const(8)
        } else {
            Period::new_const(5)
        }
    }
}

impl FromStr for Interval {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1h" => Ok(Interval::Hour1),
            "2h" => Ok(Interval::Hour2),
            "4h" => Ok(Interval::Hour4),
            "1d" => Ok(Interval::Day1),
            "1wk" => Ok(Interval::Week1),
            "1mo" => Ok(Interval::Month1),
            _ => Err(PatternError::InvalidValue("unknown interval code")),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
