//! Volume breakout detector
//!
//! Looks at the final bar only. The volume average includes the final bar
//! itself, so the spike has to stand out against a window it is part of.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::helpers::mean_volume;
use crate::{
    params::{check_factor, get_factor, get_period, ParamMeta, ParameterizedDetector},
    swing::Swings,
    Anchor, PatternDetector, PatternEvent, PatternKind, Period, Result, Span,
    VolumeBreakoutMatch, OHLCV,
};

impl_with_defaults!(VolumeBreakoutDetector);

/// High-volume close above the recent highs. Always Live, no target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeBreakoutDetector {
    /// Final volume must exceed this multiple of the average
    pub volume_multiplier: f64,
    /// Trailing bars in the volume average, final bar included
    pub volume_window: Period,
    /// Bars before the final one whose highs form the resistance
    pub breakout_lookback: Period,
}

impl Default for VolumeBreakoutDetector {
    fn default() -> Self {
        Self {
            volume_multiplier: 2.0,
            volume_window: Period::new_const(20),
            breakout_lookback: Period::new_const(9),
        }
    }
}

impl PatternDetector for VolumeBreakoutDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::VolumeBreakout
    }

    fn min_points(&self) -> usize {
        self.volume_window
            .get()
            .max(self.breakout_lookback.get() + 1)
    }

    fn detect<T: OHLCV>(&self, bars: &[T], _swings: &Swings) -> Vec<PatternEvent> {
        let n = bars.len();
        if n < self.min_points() {
            return Vec::new();
        }
        let last = &bars[n - 1];

        let Some(average_volume) = mean_volume(&bars[n - self.volume_window.get()..]) else {
            return Vec::new();
        };
        if last.volume() <= average_volume * self.volume_multiplier {
            return Vec::new();
        }

        let start = n - 1 - self.breakout_lookback.get();
        let resistance = bars[start..n - 1]
            .iter()
            .map(|b| b.high())
            .fold(f64::NEG_INFINITY, f64::max);
        if last.close() <= resistance {
            return Vec::new();
        }

        trace!(volume = last.volume(), average_volume, resistance, "volume breakout");
        vec![PatternEvent::VolumeBreakout(VolumeBreakoutMatch {
            anchor: Anchor {
                index: n - 1,
                timestamp: last.timestamp(),
                price: last.close(),
            },
            volume: last.volume(),
            average_volume,
            resistance,
            span: Span::new(start, n - 1),
        })]
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("volume_multiplier", self.volume_multiplier)
    }
}

static VOLUME_BREAKOUT_PARAMS: &[ParamMeta] = &[
    ParamMeta::factor("volume_multiplier", 2.0, (1.5, 3.0, 0.5), "Volume spike multiple"),
    ParamMeta::period("volume_window", 20.0, (10.0, 30.0, 5.0), "Volume average window"),
    ParamMeta::period("breakout_lookback", 9.0, (5.0, 20.0, 1.0), "Resistance lookback"),
];

impl ParameterizedDetector for VolumeBreakoutDetector {
    fn param_meta() -> &'static [ParamMeta] {
        VOLUME_BREAKOUT_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            volume_multiplier: get_factor(params, "volume_multiplier", 2.0)?,
            volume_window: get_period(params, "volume_window", 20)?,
            breakout_lookback: get_period(params, "breakout_lookback", 9)?,
        })
    }

    fn pattern_kind() -> PatternKind {
        PatternKind::VolumeBreakout
    }
}
