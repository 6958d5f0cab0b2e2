//! Head-and-shoulders top detector
//!
//! Slides over consecutive swing-high triples (left shoulder, head, right
//! shoulder). Overlapping triples are evaluated independently and can all
//! match; see [`crate::suppress_overlapping`] for an optional post-pass.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::helpers::{last_close, min_low};
use crate::{
    params::{get_flag, get_ratio, ParamMeta, ParamType, ParameterizedDetector},
    swing::Swings,
    Anchor, HeadAndShouldersMatch, PatternDetector, PatternError, PatternEvent, PatternKind,
    Ratio, Result, Span, Status, OHLCV,
};

impl_with_defaults!(HeadAndShouldersDetector);

/// Head-and-shoulders top (bearish reversal)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadAndShouldersDetector {
    /// Fraction by which the head must clear each shoulder
    pub head_margin: Ratio,
    /// Upper bound (exclusive) on `|left - right| / head`
    pub shoulder_tolerance: Ratio,
    /// When set, a match is Live only once the last close is below the
    /// neckline. When cleared, every match is reported Live as a forming top.
    pub neckline_confirmation: bool,
}

impl Default for HeadAndShouldersDetector {
    fn default() -> Self {
        Self {
            head_margin: Ratio::new_const(0.01),
            shoulder_tolerance: Ratio::new_const(0.10),
            neckline_confirmation: true,
        }
    }
}

impl PatternDetector for HeadAndShouldersDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::HeadAndShoulders
    }

    fn min_points(&self) -> usize {
        5
    }

    fn detect<T: OHLCV>(&self, bars: &[T], swings: &Swings) -> Vec<PatternEvent> {
        let highs = &swings.highs;
        if highs.len() < self.min_points() {
            return Vec::new();
        }
        let Some(close) = last_close(bars) else {
            return Vec::new();
        };

        let clearance = 1.0 + self.head_margin.get();
        let mut events = Vec::new();

        for i in 2..=highs.len() - 3 {
            let (ls, hd, rs) = (highs[i - 2], highs[i - 1], highs[i]);

            if hd.price <= 0.0 {
                continue;
            }
            if hd.price <= ls.price * clearance || hd.price <= rs.price * clearance {
                continue;
            }
            if (ls.price - rs.price).abs() / hd.price >= self.shoulder_tolerance.get() {
                continue;
            }

            let neckline = min_low(bars, ls.index, rs.index);
            let confirmed = !self.neckline_confirmation || close < neckline;
            trace!(head = hd.index, neckline, confirmed, "head and shoulders");

            events.push(PatternEvent::HeadAndShoulders(HeadAndShouldersMatch {
                anchor: Anchor::from(hd),
                left_shoulder: ls.price,
                right_shoulder: rs.price,
                neckline,
                target: neckline - (hd.price - neckline),
                status: Status::confirmed_if(confirmed),
                span: Span::new(ls.index, rs.index),
            }));
        }

        events
    }

    fn validate_config(&self) -> Result<()> {
        if self.shoulder_tolerance.get() <= 0.0 {
            return Err(PatternError::InvalidConfig(
                "shoulder_tolerance must be > 0".into(),
            ));
        }
        Ok(())
    }
}

static HEAD_AND_SHOULDERS_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "head_margin",
        param_type: ParamType::Ratio,
        default: 0.01,
        range: (0.0, 0.05, 0.01),
        description: "Minimum head clearance over each shoulder",
    },
    ParamMeta {
        name: "shoulder_tolerance",
        param_type: ParamType::Ratio,
        default: 0.10,
        range: (0.05, 0.10, 0.01),
        description: "Maximum shoulder asymmetry relative to the head",
    },
    ParamMeta::flag(
        "neckline_confirmation",
        true,
        "Require a close below the neckline before reporting Live",
    ),
];

impl ParameterizedDetector for HeadAndShouldersDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HEAD_AND_SHOULDERS_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            head_margin: get_ratio(params, "head_margin", 0.01)?,
            shoulder_tolerance: get_ratio(params, "shoulder_tolerance", 0.10)?,
            neckline_confirmation: get_flag(params, "neckline_confirmation", true)?,
        })
    }

    fn pattern_kind() -> PatternKind {
        PatternKind::HeadAndShoulders
    }
}

#[cfg(test)]
mod tests {
    use super::super::helpers::zigzag;
    use super::*;
    use crate::{swing::extract, Bar, Period};

    fn detect(detector: &HeadAndShouldersDetector, bars: &[Bar]) -> Vec<PatternEvent> {
        let swings = extract(bars, Period::new(2).unwrap());
        detector.detect(bars, &swings)
    }

    fn only_match(events: &[PatternEvent]) -> HeadAndShouldersMatch {
        assert_eq!(events.len(), 1, "expected exactly one match: {events:?}");
        match events[0] {
            PatternEvent::HeadAndShoulders(m) => m,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_classic_top_with_neckline_break() {
        let bars = zigzag(
            &[80.0, 100.0, 92.0, 130.0, 92.0, 101.0, 85.0, 99.0, 85.0, 98.0, 80.0],
            5,
        );
        let events = detect(&HeadAndShouldersDetector::with_defaults(), &bars);
        let m = only_match(&events);

        assert_eq!(m.neckline, 90.0);
        assert_eq!(m.target, 50.0);
        assert_eq!(m.anchor.index, 15);
        assert_eq!(m.anchor.price, 130.0);
        assert_eq!(m.anchor.timestamp, 15 * 60);
        assert_eq!(m.left_shoulder, 100.0);
        assert_eq!(m.right_shoulder, 101.0);
        assert_eq!(m.span, Span::new(5, 25));
        assert_eq!(m.status, Status::Live);
        assert_eq!(events[0].signal(), crate::Signal::Bearish);
    }

    #[test]
    fn test_pending_until_neckline_breaks() {
        let bars = zigzag(
            &[80.0, 100.0, 92.0, 130.0, 92.0, 101.0, 85.0, 99.0, 85.0, 98.0, 95.0],
            5,
        );
        let m = only_match(&detect(&HeadAndShouldersDetector::with_defaults(), &bars));
        assert_eq!(m.status, Status::Pending);

        let forming = HeadAndShouldersDetector {
            neckline_confirmation: false,
            ..Default::default()
        };
        let m = only_match(&detect(&forming, &bars));
        assert_eq!(m.status, Status::Live);
    }

    #[test]
    fn test_asymmetric_shoulders_rejected() {
        let bars = zigzag(
            &[80.0, 100.0, 92.0, 130.0, 92.0, 115.0, 85.0, 99.0, 85.0, 98.0, 80.0],
            5,
        );
        assert!(detect(&HeadAndShouldersDetector::with_defaults(), &bars).is_empty());
    }

    #[test]
    fn test_head_must_clear_margin() {
        let bars = zigzag(
            &[80.0, 100.0, 92.0, 100.5, 92.0, 100.0, 85.0, 99.0, 85.0, 98.0, 80.0],
            5,
        );
        assert!(detect(&HeadAndShouldersDetector::with_defaults(), &bars).is_empty());

        let loose = HeadAndShouldersDetector {
            head_margin: Ratio::new(0.0).unwrap(),
            ..Default::default()
        };
        assert_eq!(detect(&loose, &bars).len(), 1);
    }

    #[test]
    fn test_fewer_than_five_highs() {
        let bars = zigzag(&[80.0, 100.0, 92.0, 130.0, 92.0, 101.0, 80.0], 5);
        let swings = extract(&bars, Period::new(2).unwrap());
        assert_eq!(swings.highs.len(), 3);
        assert!(HeadAndShouldersDetector::with_defaults()
            .detect(&bars, &swings)
            .is_empty());
    }

    #[test]
    fn test_overlapping_triples_both_reported() {
        let bars = zigzag(
            &[
                80.0, 100.0, 92.0, 130.0, 92.0, 101.0, 92.0, 131.0, 92.0, 102.0, 85.0, 95.0, 85.0,
                94.0, 80.0,
            ],
            5,
        );
        let events = detect(&HeadAndShouldersDetector::with_defaults(), &bars);
        assert_eq!(events.len(), 2);
        assert!(events[0].span().overlaps(&events[1].span()));
        assert_eq!(events[0].anchor().price, 130.0);
        assert_eq!(events[1].anchor().price, 131.0);
    }

    #[test]
    fn test_with_params() {
        let mut params = HashMap::new();
        params.insert("shoulder_tolerance", 0.05);
        params.insert("neckline_confirmation", 0.0);

        let d = HeadAndShouldersDetector::with_params(&params).unwrap();
        assert_eq!(d.shoulder_tolerance.get(), 0.05);
        assert_eq!(d.head_margin.get(), 0.01);
        assert!(!d.neckline_confirmation);

        params.insert("head_margin", 1.5);
        assert!(HeadAndShouldersDetector::with_params(&params).is_err());

        params.insert("head_margin", 0.01);
        params.insert("neckline_confirmation", 0.5);
        assert!(HeadAndShouldersDetector::with_params(&params).is_err());
    }

    #[test]
    fn test_zero_tolerance_is_invalid() {
        let d = HeadAndShouldersDetector {
            shoulder_tolerance: Ratio::new(0.0).unwrap(),
            ..Default::default()
        };
        assert!(d.validate_config().is_err());
    }
}
