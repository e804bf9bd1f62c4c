//! Range inference over data sources.

use serde::{Deserialize, Serialize};

use crate::source::{ChartDataSource, SourceHandle};

/// Result of [`RangeGroup::calculate_range`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RangeResult {
    pub start: f64,
    pub end: f64,
    pub distance: f64,
}

impl RangeResult {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            distance: end - start,
        }
    }

    /// Ranges with no extent must not be rendered.
    pub fn is_degenerate(&self) -> bool {
        !(self.distance > 0.0)
    }
}

/// Explicit or data-derived bounds for one chart axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeGroup {
    pub from: f64,
    pub to: f64,
    /// Derive bounds from the data instead of `from`/`to`.
    pub automatic: bool,
    /// Smallest span an automatic range may have.
    pub minimum: f64,
    /// Automatic spans are rounded up to a multiple of this when positive.
    pub increment: f64,
}

impl Default for RangeGroup {
    fn default() -> Self {
        Self {
            from: 0.0,
            to: 0.0,
            automatic: true,
            minimum: 0.0,
            increment: 0.0,
        }
    }
}

impl RangeGroup {
    pub fn automatic() -> Self {
        Self::default()
    }

    pub fn fixed(from: f64, to: f64) -> Self {
        Self {
            from,
            to,
            automatic: false,
            ..Self::default()
        }
    }

    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = minimum;
        self
    }

    pub fn with_increment(mut self, increment: f64) -> Self {
        self.increment = increment;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.automatic || self.to > self.from
    }

    /// Resolve the range over `sources`.
    ///
    /// `min_of` and `max_of` extract a bound from one source; sources for
    /// which they return `None` do not contribute. An automatic range with no
    /// contributing source is `{0, 0, 0}`.
    pub fn calculate_range<Min, Max>(&self, sources: &[SourceHandle], min_of: Min, max_of: Max) -> RangeResult
    where
        Min: Fn(&dyn ChartDataSource) -> Option<f64>,
        Max: Fn(&dyn ChartDataSource) -> Option<f64>,
    {
        if !self.automatic {
            return RangeResult::new(self.from, self.to);
        }

        let mut start: Option<f64> = None;
        let mut end: Option<f64> = None;
        for source in sources {
            let source: &dyn ChartDataSource = source.as_ref();
            if let Some(v) = min_of(source).filter(|v| v.is_finite()) {
                start = Some(start.map_or(v, |s| s.min(v)));
            }
            if let Some(v) = max_of(source).filter(|v| v.is_finite()) {
                end = Some(end.map_or(v, |e| e.max(v)));
            }
        }

        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            (Some(start), None) => (start, start),
            (None, Some(end)) => (end, end),
            (None, None) => return RangeResult::default(),
        };

        let mut end = end.max(start + self.minimum);
        if self.increment > 0.0 {
            let steps = ((end - start) / self.increment).ceil();
            end = start + self.increment * steps;
        }
        RangeResult::new(start, end)
    }
}
