//! Chart configuration loaded from TOML.
//!
//! Every section and field is optional; missing ones take the same defaults
//! the in-memory setters start from.
//!
//! ```toml
//! stacked = true
//! direction = "zero_at_end"
//!
//! [y_range]
//! increment = 10.0
//!
//! [line]
//! smooth = true
//!
//! [history]
//! maximum_history = 30
//! interval_ms = 500
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bar::{BarChart, BarChartStyle};
use crate::chart::IndexingMode;
use crate::error::Result;
use crate::line::{LineChart, LineChartStyle};
use crate::pie::{PieChart, PieChartStyle};
use crate::range::RangeGroup;
use crate::source::{FillMode, HistoryProxySource};
use crate::xy::{Direction, XYChart};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default)]
    pub x_range: RangeGroup,
    #[serde(default)]
    pub y_range: RangeGroup,
    #[serde(default)]
    pub stacked: bool,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub indexing_mode: IndexingMode,
    #[serde(default)]
    pub line: LineChartStyle,
    #[serde(default)]
    pub bar: BarChartStyle,
    #[serde(default)]
    pub pie: PieConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PieConfig {
    #[serde(default)]
    pub range: RangeGroup,
    #[serde(default)]
    pub style: PieChartStyle,
}

fn default_maximum_history() -> usize {
    HistoryProxySource::DEFAULT_MAXIMUM_HISTORY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_maximum_history")]
    pub maximum_history: usize,
    #[serde(default)]
    pub fill_mode: FillMode,
    /// Sampling interval in milliseconds; absent for change-driven sampling.
    #[serde(default)]
    pub interval_ms: Option<u64>,
    /// Index of the sampled item.
    #[serde(default)]
    pub item: isize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            maximum_history: default_maximum_history(),
            fill_mode: FillMode::DoNotFill,
            interval_ms: None,
            item: 0,
        }
    }
}

impl HistoryConfig {
    pub fn interval(&self) -> Option<Duration> {
        self.interval_ms.map(Duration::from_millis)
    }
}

impl ChartConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ChartConfig = toml::from_str(text)?;
        tracing::debug!(
            stacked = config.stacked,
            direction = ?config.direction,
            "loaded chart config"
        );
        Ok(config)
    }

    /// Ranges, stacking, direction and indexing mode.
    pub fn apply_to_xy(&self, chart: &XYChart) {
        chart.sources().set_indexing_mode(self.indexing_mode);
        chart.set_x_range(self.x_range.clone());
        chart.set_y_range(self.y_range.clone());
        chart.set_stacked(self.stacked);
        chart.set_direction(self.direction);
    }

    pub fn apply_to_line(&self, line: &LineChart) {
        self.apply_to_xy(line.chart());
        line.set_style(self.line.clone());
    }

    pub fn apply_to_bar(&self, bar: &BarChart) {
        self.apply_to_xy(bar.chart());
        bar.set_style(self.bar.clone());
    }

    pub fn apply_to_pie(&self, pie: &PieChart) {
        pie.sources().set_indexing_mode(self.indexing_mode);
        pie.set_range(self.pie.range.clone());
        pie.set_style(self.pie.style.clone());
    }

    /// Changing the fill mode or item clears recorded history.
    pub fn apply_to_history(&self, history: &HistoryProxySource) {
        history.set_maximum_history(self.history.maximum_history);
        history.set_fill_mode(self.history.fill_mode);
        history.set_item_index(self.history.item);
        history.set_interval(self.history.interval());
    }
}
