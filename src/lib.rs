//! # chartscan - chart formation scanner
//!
//! Finds swing points in an OHLCV series and matches multi-swing chart
//! formations on top of them: head-and-shoulders, bull and bear flags and
//! volume breakouts. Every match carries an anchor to annotate, a signal,
//! a measured-move target where one applies and a Live/Pending status.
//!
//! ## Quick Start
//!
//! ```rust
//! use chartscan::prelude::*;
//!
//! let bars: Vec<Bar> = (0..60i64)
//!     .map(|t| Bar::new(t, 100.0, 101.0, 99.0, 100.0, 1_000.0))
//!     .collect();
//!
//! let engine = EngineBuilder::new().with_all_defaults().build().unwrap();
//! let result = engine.evaluate(&bars, Period::new(5).unwrap()).unwrap();
//!
//! assert_eq!(result.data_point_count, 60);
//! assert_eq!(result.active_count, 0);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod detectors;
pub mod overlays;
pub mod params;
pub mod swing;

pub mod prelude {
    pub use crate::{
        // Detectors
        detectors::*,
        // Free-standing evaluation
        evaluate,
        evaluate_parallel,
        // Overlays
        overlays::{prepare, OverlayConfig, Overlays, Prepared},
        // Parameters
        params::{get_factor, get_flag, get_period, get_ratio, ParamMeta, ParamType, ParameterizedDetector},
        suppress_overlapping,
        // Swing points
        swing::{extract, Interval, SwingKind, SwingPoint, Swings},
        validate_series,
        Anchor,
        Bar,
        // Engine
        BuiltinDetector,
        EngineBuilder,
        EngineResult,
        // Events
        FlagMatch,
        HeadAndShouldersMatch,
        // Core traits
        OHLCVExt,
        OverlapPolicy,
        PatternConfig,
        PatternDetector,
        PatternEngine,
        // Errors
        PatternError,
        PatternEvent,
        PatternKind,
        Period,
        Ratio,
        Result,
        ScanError,
        ScanResult,
        Signal,
        Span,
        Status,
        VolumeBreakoutMatch,
        OHLCV,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors raised while configuring the engine or validating a series.
///
/// Detectors never produce errors: an undersized swing set is simply
/// "nothing found". Errors are reserved for "cannot compute".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("No data: the series is empty")]
    NoData,

    #[error("Insufficient data: need {need} bars, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("Timestamps not strictly increasing at index {index}")]
    UnorderedTimestamps { index: usize },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Fraction in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(PatternError::InvalidValue("Ratio must be finite"));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(PatternError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Window length or neighbourhood width (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(PatternError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV DATA
// ============================================================

/// Core OHLCV data trait. Any bar type the caller already has can be
/// scanned by implementing this.
pub trait OHLCV {
    fn timestamp(&self) -> i64;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    /// Validate a single bar. Prices are used as divisors downstream so they
    /// must be finite and strictly positive.
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(PatternError::InvalidBar {
                index: 0,
                reason: "non-finite price",
            });
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Err(PatternError::InvalidBar {
                index: 0,
                reason: "price must be positive",
            });
        }
        if self.high() < self.low() {
            return Err(PatternError::InvalidBar {
                index: 0,
                reason: "high < low",
            });
        }
        if !self.volume().is_finite() || self.volume() < 0.0 {
            return Err(PatternError::InvalidBar {
                index: 0,
                reason: "volume must be finite and non-negative",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

/// Plain OHLCV bar, timestamp in whatever unit the data source uses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl OHLCV for Bar {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}

/// Check the series invariants: non-empty, every bar valid, timestamps
/// strictly increasing. The series is never re-sorted.
pub fn validate_series<T: OHLCV>(bars: &[T]) -> Result<()> {
    if bars.is_empty() {
        return Err(PatternError::NoData);
    }
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            PatternError::InvalidBar { reason, .. } => PatternError::InvalidBar { index: i, reason },
            other => other,
        })?;
        if i > 0 && bar.timestamp() <= bars[i - 1].timestamp() {
            return Err(PatternError::UnorderedTimestamps { index: i });
        }
    }
    Ok(())
}

// ============================================================
// PATTERN EVENTS
// ============================================================

/// Direction a formation points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Bullish,
    Bearish,
}

impl Signal {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Signal::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Signal::Bearish)
    }
}

/// Whether the confirming price condition already holds at the last bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Live,
    Pending,
}

impl Status {
    #[inline]
    pub fn is_live(self) -> bool {
        matches!(self, Status::Live)
    }

    #[inline]
    pub(crate) fn confirmed_if(confirmed: bool) -> Self {
        if confirmed {
            Status::Live
        } else {
            Status::Pending
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Live => f.write_str("LIVE"),
            Status::Pending => f.write_str("Pending"),
        }
    }
}

/// The formations the engine knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    HeadAndShoulders,
    BullFlag,
    BearFlag,
    VolumeBreakout,
}

impl PatternKind {
    /// All kinds in engine order
    pub const ALL: [PatternKind; 4] = [
        PatternKind::HeadAndShoulders,
        PatternKind::BullFlag,
        PatternKind::BearFlag,
        PatternKind::VolumeBreakout,
    ];

    /// Short label used in reports
    pub fn label(self) -> &'static str {
        match self {
            PatternKind::HeadAndShoulders => "H&S",
            PatternKind::BullFlag => "Bull Flag",
            PatternKind::BearFlag => "Bear Flag",
            PatternKind::VolumeBreakout => "Breakout",
        }
    }

    pub fn signal(self) -> Signal {
        match self {
            PatternKind::HeadAndShoulders | PatternKind::BearFlag => Signal::Bearish,
            PatternKind::BullFlag | PatternKind::VolumeBreakout => Signal::Bullish,
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where to annotate an event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub index: usize,
    pub timestamp: i64,
    pub price: f64,
}

impl From<swing::SwingPoint> for Anchor {
    fn from(point: swing::SwingPoint) -> Self {
        Self {
            index: point.index,
            timestamp: point.timestamp,
            price: point.price,
        }
    }
}

/// Inclusive bar index range covered by a formation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_index: usize,
    pub end_index: usize,
}

impl Span {
    pub fn new(start_index: usize, end_index: usize) -> Self {
        Self {
            start_index,
            end_index,
        }
    }

    #[inline]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start_index <= other.end_index && other.start_index <= self.end_index
    }
}

/// Head-and-shoulders top
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadAndShouldersMatch {
    /// The head
    pub anchor: Anchor,
    pub left_shoulder: f64,
    pub right_shoulder: f64,
    /// Lowest low between the shoulders
    pub neckline: f64,
    pub target: f64,
    pub status: Status,
    pub span: Span,
}

/// Bull or bear flag; the enclosing [`PatternEvent`] variant says which
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlagMatch {
    pub anchor: Anchor,
    pub pole_high: f64,
    pub pole_low: f64,
    pub flag_high: f64,
    pub flag_low: f64,
    pub target: f64,
    pub status: Status,
    pub span: Span,
}

impl FlagMatch {
    #[inline]
    pub fn pole_height(&self) -> f64 {
        self.pole_high - self.pole_low
    }
}

/// High-volume close above recent resistance on the final bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBreakoutMatch {
    pub anchor: Anchor,
    pub volume: f64,
    pub average_volume: f64,
    /// Highest high of the lookback bars that the close cleared
    pub resistance: f64,
    pub span: Span,
}

/// A detected formation. Only flags and head-and-shoulders project a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PatternEvent {
    HeadAndShoulders(HeadAndShouldersMatch),
    BullFlag(FlagMatch),
    BearFlag(FlagMatch),
    VolumeBreakout(VolumeBreakoutMatch),
}

impl PatternEvent {
    pub fn kind(&self) -> PatternKind {
        match self {
            PatternEvent::HeadAndShoulders(_) => PatternKind::HeadAndShoulders,
            PatternEvent::BullFlag(_) => PatternKind::BullFlag,
            PatternEvent::BearFlag(_) => PatternKind::BearFlag,
            PatternEvent::VolumeBreakout(_) => PatternKind::VolumeBreakout,
        }
    }

    #[inline]
    pub fn signal(&self) -> Signal {
        self.kind().signal()
    }

    pub fn anchor(&self) -> Anchor {
        match self {
            PatternEvent::HeadAndShoulders(m) => m.anchor,
            PatternEvent::BullFlag(m) | PatternEvent::BearFlag(m) => m.anchor,
            PatternEvent::VolumeBreakout(m) => m.anchor,
        }
    }

    pub fn target(&self) -> Option<f64> {
        match self {
            PatternEvent::HeadAndShoulders(m) => Some(m.target),
            PatternEvent::BullFlag(m) | PatternEvent::BearFlag(m) => Some(m.target),
            PatternEvent::VolumeBreakout(_) => None,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            PatternEvent::HeadAndShoulders(m) => m.status,
            PatternEvent::BullFlag(m) | PatternEvent::BearFlag(m) => m.status,
            PatternEvent::VolumeBreakout(_) => Status::Live,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            PatternEvent::HeadAndShoulders(m) => m.span,
            PatternEvent::BullFlag(m) | PatternEvent::BearFlag(m) => m.span,
            PatternEvent::VolumeBreakout(m) => m.span,
        }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.status().is_live()
    }
}

/// Report line: `Bull Flag • 1700000000 • $135.00 → $172.00 • Pending`
impl fmt::Display for PatternEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let anchor = self.anchor();
        write!(
            f,
            "{} • {} • ${:.2}",
            self.kind(),
            anchor.timestamp,
            anchor.price
        )?;
        if let Some(target) = self.target() {
            write!(f, " → ${target:.2}")?;
        }
        write!(f, " • {}", self.status())
    }
}

// ============================================================
// PATTERN DETECTOR TRAIT
// ============================================================

use swing::Swings;

/// A stateless formation matcher.
///
/// Detectors see the full series plus the swing points extracted once by the
/// engine, never each other's output. Too few points is not an error: the
/// detector returns an empty vector.
pub trait PatternDetector: Send + Sync {
    fn kind(&self) -> PatternKind;

    /// Minimum number of inputs needed to produce anything: swing points for
    /// swing-based detectors, bars for bar-based ones.
    fn min_points(&self) -> usize;

    fn detect<T: OHLCV>(&self, bars: &[T], swings: &Swings) -> Vec<PatternEvent>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - enum dispatch
        #[derive(Debug, Clone, PartialEq)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect<T: OHLCV>(&self, bars: &[T], swings: &Swings) -> Vec<PatternEvent> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, bars, swings)),*
                }
            }

            #[inline]
            pub fn kind(&self) -> PatternKind {
                match self {
                    $(Self::$variant(d) => PatternDetector::kind(d)),*
                }
            }

            #[inline]
            pub fn min_points(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::min_points(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }
        }
    };
}

define_builtin_detectors! {
    HeadAndShoulders(HeadAndShouldersDetector),
    BullFlag(BullFlagDetector),
    BearFlag(BearFlagDetector),
    VolumeBreakout(VolumeBreakoutDetector),
}

// ============================================================
// CONFIGURATION
// ============================================================

/// What to do with matches of the same kind whose spans intersect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapPolicy {
    /// Report every match, including overlapping neighbours
    #[default]
    KeepAll,
    /// Greedy earliest-match suppression per pattern kind
    SuppressOverlapping,
}

/// Every threshold the engine uses, in one serde-friendly place.
/// The swing `order` is not here: it is passed per evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub head_and_shoulders: HeadAndShouldersDetector,
    pub bull_flag: BullFlagDetector,
    pub bear_flag: BearFlagDetector,
    pub volume_breakout: VolumeBreakoutDetector,
    /// Shortest series the engine will evaluate
    pub minimum_bars: Period,
    pub overlap_policy: OverlapPolicy,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            head_and_shoulders: HeadAndShouldersDetector::default(),
            bull_flag: BullFlagDetector::default(),
            bear_flag: BearFlagDetector::default(),
            volume_breakout: VolumeBreakoutDetector::default(),
            minimum_bars: Period::new_const(DEFAULT_MINIMUM_BARS),
            overlap_policy: OverlapPolicy::KeepAll,
        }
    }
}

pub const DEFAULT_MINIMUM_BARS: usize = 50;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub minimum_bars: Period,
    pub pattern_filter: Option<Vec<PatternKind>>,
    pub overlap_policy: OverlapPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            minimum_bars: Period::new_const(DEFAULT_MINIMUM_BARS),
            pattern_filter: None,
            overlap_policy: OverlapPolicy::KeepAll,
        }
    }
}

// ============================================================
// PATTERN ENGINE
// ============================================================

/// Output of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResult {
    /// Detector order, each detector's own order preserved
    pub events: Vec<PatternEvent>,
    pub data_point_count: usize,
    /// Events whose status is Live
    pub active_count: usize,
    pub last_close: f64,
}

impl EngineResult {
    fn new<T: OHLCV>(bars: &[T], events: Vec<PatternEvent>) -> Self {
        let active_count = events.iter().filter(|e| e.is_live()).count();
        Self {
            data_point_count: bars.len(),
            active_count,
            last_close: bars.last().map_or(f64::NAN, |b| b.close()),
            events,
        }
    }

    pub fn live_events(&self) -> impl Iterator<Item = &PatternEvent> {
        self.events.iter().filter(|e| e.is_live())
    }

    pub fn of_kind(&self, kind: PatternKind) -> impl Iterator<Item = &PatternEvent> {
        self.events.iter().filter(move |e| e.kind() == kind)
    }
}

/// Main pattern detection engine
#[derive(Debug, Clone)]
pub struct PatternEngine {
    detectors: Vec<BuiltinDetector>,
    config: EngineConfig,
}

impl PatternEngine {
    /// Build an engine running all four detectors with the given thresholds
    pub fn from_config(config: &PatternConfig) -> Result<Self> {
        EngineBuilder::from_config(config).build()
    }

    #[inline]
    pub fn minimum_bars(&self) -> usize {
        self.config.minimum_bars.get()
    }

    pub fn detectors(&self) -> &[BuiltinDetector] {
        &self.detectors
    }

    // ===========================================
    // LOW-LEVEL: Primitives
    // ===========================================

    /// Swing extraction alone, no gating
    #[inline]
    pub fn swings<T: OHLCV>(&self, bars: &[T], order: Period) -> Swings {
        swing::extract(bars, order)
    }

    /// Run every detector over precomputed swing points. No validation or
    /// minimum-length gate is applied here.
    pub fn detect<T: OHLCV>(&self, bars: &[T], swings: &Swings) -> Vec<PatternEvent> {
        let mut events = Vec::new();
        for detector in &self.detectors {
            if !self.should_include(detector.kind()) {
                continue;
            }
            let found = detector.detect(bars, swings);
            debug!(
                pattern = %detector.kind(),
                matches = found.len(),
                "detector finished"
            );
            events.extend(found);
        }
        events
    }

    // ===========================================
    // HIGH-LEVEL: One-shot evaluation
    // ===========================================

    /// Validate the series, extract swing points once and run all detectors.
    ///
    /// Fails fast with [`PatternError::NoData`] on an empty series and with
    /// [`PatternError::InsufficientData`] below `minimum_bars`.
    pub fn evaluate<T: OHLCV>(&self, bars: &[T], order: Period) -> Result<EngineResult> {
        if bars.is_empty() {
            return Err(PatternError::NoData);
        }
        let need = self.minimum_bars();
        if bars.len() < need {
            return Err(PatternError::InsufficientData {
                need,
                got: bars.len(),
            });
        }
        validate_series(bars)?;

        let swings = self.swings(bars, order);
        debug!(
            bars = bars.len(),
            order = order.get(),
            highs = swings.highs.len(),
            lows = swings.lows.len(),
            "extracted swing points"
        );

        let mut events = self.detect(bars, &swings);
        if self.config.overlap_policy == OverlapPolicy::SuppressOverlapping {
            events = suppress_overlapping(events);
        }

        let result = EngineResult::new(bars, events);
        debug!(
            events = result.events.len(),
            live = result.active_count,
            "evaluation finished"
        );
        Ok(result)
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn should_include(&self, kind: PatternKind) -> bool {
        match self.config.pattern_filter {
            Some(ref filter) => filter.contains(&kind),
            None => true,
        }
    }

    fn validate(&self) -> Result<()> {
        for d in &self.detectors {
            d.validate_config()?;
        }
        Ok(())
    }
}

/// One-shot evaluation with every detector configured from `config`
pub fn evaluate<T: OHLCV>(bars: &[T], order: Period, config: &PatternConfig) -> Result<EngineResult> {
    PatternEngine::from_config(config)?.evaluate(bars, order)
}

/// Greedy earliest-match suppression: within each pattern kind, drop any
/// event whose span intersects an event of that kind kept before it.
/// Events of different kinds never suppress each other.
pub fn suppress_overlapping(events: Vec<PatternEvent>) -> Vec<PatternEvent> {
    let mut kept: HashMap<PatternKind, Span> = HashMap::new();
    events
        .into_iter()
        .filter(|event| {
            let span = event.span();
            match kept.get(&event.kind()) {
                Some(last) if last.overlaps(&span) => false,
                _ => {
                    kept.insert(event.kind(), span);
                    true
                }
            }
        })
        .collect()
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating PatternEngine instances
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    detectors: Vec<BuiltinDetector>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All four detectors with the thresholds from `config`
    pub fn from_config(config: &PatternConfig) -> Self {
        Self::new()
            .add(BuiltinDetector::HeadAndShoulders(config.head_and_shoulders.clone()))
            .add(BuiltinDetector::BullFlag(config.bull_flag.clone()))
            .add(BuiltinDetector::BearFlag(config.bear_flag.clone()))
            .add(BuiltinDetector::VolumeBreakout(config.volume_breakout.clone()))
            .minimum_bars(config.minimum_bars)
            .overlap_policy(config.overlap_policy)
    }

    /// Add all builtin detectors with default configurations
    pub fn with_all_defaults(self) -> Self {
        self.add(BuiltinDetector::HeadAndShoulders(HeadAndShouldersDetector::with_defaults()))
            .add(BuiltinDetector::BullFlag(BullFlagDetector::with_defaults()))
            .add(BuiltinDetector::BearFlag(BearFlagDetector::with_defaults()))
            .add(BuiltinDetector::VolumeBreakout(VolumeBreakoutDetector::with_defaults()))
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        self.detectors.push(detector);
        self
    }

    /// Add with config validation
    pub fn add_checked(mut self, detector: BuiltinDetector) -> Result<Self> {
        detector.validate_config()?;
        self.detectors.push(detector);
        Ok(self)
    }

    /// Shortest series `evaluate` accepts
    pub fn minimum_bars(mut self, bars: Period) -> Self {
        self.config.minimum_bars = bars;
        self
    }

    /// Filter to specific patterns only
    pub fn only_patterns(mut self, kinds: impl IntoIterator<Item = PatternKind>) -> Self {
        self.config.pattern_filter = Some(kinds.into_iter().collect());
        self
    }

    pub fn overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.config.overlap_policy = policy;
        self
    }

    /// Build the engine. Detectors are put in `PatternKind::ALL` order
    /// whatever order they were added in, and each kind may appear once.
    pub fn build(mut self) -> Result<PatternEngine> {
        self.detectors
            .sort_by_key(|d| PatternKind::ALL.iter().position(|&k| k == d.kind()));
        if let Some(pair) = self.detectors.windows(2).find(|w| w[0].kind() == w[1].kind()) {
            return Err(PatternError::InvalidConfig(format!(
                "{} detector added more than once",
                pair[0].kind()
            )));
        }

        let engine = PatternEngine {
            detectors: self.detectors,
            config: self.config,
        };
        engine.validate()?;
        Ok(engine)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of evaluating a single instrument
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub result: EngineResult,
}

/// Error from evaluating a single instrument
#[derive(Debug)]
pub struct ScanError {
    pub symbol: String,
    pub error: PatternError,
}

/// Evaluate several independent instruments on the rayon pool.
/// Instruments are never compared with each other.
pub fn evaluate_parallel<'a, T, I>(
    engine: &PatternEngine,
    instruments: I,
    order: Period,
) -> (Vec<ScanResult>, Vec<ScanError>)
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            engine
                .evaluate(bars, order)
                .map(|result| ScanResult {
                    symbol: symbol.to_string(),
                    result,
                })
                .map_err(|error| ScanError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
