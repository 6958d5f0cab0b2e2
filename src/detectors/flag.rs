//! Bull and bear flag detectors
//!
//! Both walk a fixed-size window of swing points: the first point is the
//! pole's base, the second half of the window is the flag. Windows are
//! counted in swing points, not in bars or calendar time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::helpers::{last_close, max_high, min_low};
use crate::{
    params::{check_factor, get_factor, get_period, get_ratio, ParamMeta, ParameterizedDetector},
    swing::{SwingPoint, Swings},
    Anchor, FlagMatch, PatternDetector, PatternEvent, PatternKind, Period, Ratio, Result, Span,
    Status, OHLCV,
};

impl_with_defaults!(BullFlagDetector, BearFlagDetector);

/// Thresholds shared by both flag directions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagParams {
    /// Lookahead in swing points from the pole base to the end of the flag
    pub window: Period,
    /// Minimum pole move relative to its starting extreme (0.2 = 20%)
    pub min_pole_ratio: f64,
    /// Flag range must stay below this fraction of the pole height
    pub flag_range_ratio: Ratio,
}

impl Default for FlagParams {
    fn default() -> Self {
        Self {
            window: Period::new_const(12),
            min_pole_ratio: 0.2,
            flag_range_ratio: Ratio::new_const(0.5),
        }
    }
}

impl FlagParams {
    fn validate(&self) -> Result<()> {
        check_factor("min_pole_ratio", self.min_pole_ratio)
    }

    fn from_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", 12)?,
            min_pole_ratio: get_factor(params, "min_pole_ratio", 0.2)?,
            flag_range_ratio: get_ratio(params, "flag_range_ratio", 0.5)?,
        })
    }
}

/// Bull flag: a rally off a swing low followed by a tight range near the top
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BullFlagDetector {
    pub params: FlagParams,
}

/// Bear flag: a drop off a swing high followed by a tight range near the bottom
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearFlagDetector {
    pub params: FlagParams,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Bull,
    Bear,
}

fn scan<T: OHLCV>(
    bars: &[T],
    points: &[SwingPoint],
    params: &FlagParams,
    side: Side,
) -> Vec<PatternEvent> {
    let w = params.window.get();
    if points.len() <= w {
        return Vec::new();
    }
    let Some(close) = last_close(bars) else {
        return Vec::new();
    };

    let mut events = Vec::new();

    for i in 0..points.len() - w {
        let base = points[i];
        let end = points[i + w].index;

        let (pole_high, pole_low) = match side {
            Side::Bull => (max_high(bars, base.index, end), base.price),
            Side::Bear => (base.price, min_low(bars, base.index, end)),
        };
        if pole_high < pole_low * (1.0 + params.min_pole_ratio) {
            continue;
        }

        let flag_start = points[i + w / 2].index;
        let flag_high = max_high(bars, flag_start, end);
        let flag_low = min_low(bars, flag_start, end);
        let pole_height = pole_high - pole_low;
        if flag_high - flag_low >= pole_height * params.flag_range_ratio.get() {
            continue;
        }

        let (target, confirmed) = match side {
            Side::Bull => (flag_high + pole_height, close > flag_high),
            Side::Bear => (flag_low - pole_height, close < flag_low),
        };
        trace!(base = base.index, pole_height, confirmed, "flag");

        let found = FlagMatch {
            anchor: Anchor::from(points[i + w * 3 / 4]),
            pole_high,
            pole_low,
            flag_high,
            flag_low,
            target,
            status: Status::confirmed_if(confirmed),
            span: Span::new(base.index, end),
        };
        events.push(match side {
            Side::Bull => PatternEvent::BullFlag(found),
            Side::Bear => PatternEvent::BearFlag(found),
        });
    }

    events
}

impl PatternDetector for BullFlagDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::BullFlag
    }

    fn min_points(&self) -> usize {
        self.params.window.get() + 1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], swings: &Swings) -> Vec<PatternEvent> {
        scan(bars, &swings.lows, &self.params, Side::Bull)
    }

    fn validate_config(&self) -> Result<()> {
        self.params.validate()
    }
}

impl PatternDetector for BearFlagDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::BearFlag
    }

    fn min_points(&self) -> usize {
        self.params.window.get() + 1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], swings: &Swings) -> Vec<PatternEvent> {
        scan(bars, &swings.highs, &self.params, Side::Bear)
    }

    fn validate_config(&self) -> Result<()> {
        self.params.validate()
    }
}

static FLAG_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("window", 12.0, (8.0, 16.0, 2.0), "Swing points from pole base to flag end"),
    ParamMeta::factor("min_pole_ratio", 0.2, (0.1, 0.3, 0.05), "Minimum pole move"),
    ParamMeta::ratio(
        "flag_range_ratio",
        0.5,
        (0.3, 0.6, 0.1),
        "Maximum flag range relative to pole height",
    ),
];

impl ParameterizedDetector for BullFlagDetector {
    fn param_meta() -> &'static [ParamMeta] {
        FLAG_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            params: FlagParams::from_params(params)?,
        })
    }

    fn pattern_kind() -> PatternKind {
        PatternKind::BullFlag
    }
}

impl ParameterizedDetector for BearFlagDetector {
    fn param_meta() -> &'static [ParamMeta] {
        FLAG_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            params: FlagParams::from_params(params)?,
        })
    }

    fn pattern_kind() -> PatternKind {
        PatternKind::BearFlag
    }
}
