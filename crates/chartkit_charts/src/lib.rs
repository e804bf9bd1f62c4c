//! chartkit_charts
//!
//! The chart data pipeline built on `chartkit_core`:
//!
//! - **Sources**: arrays, single values, table models, history buffers, value
//!   maps, color gradients and axis ticks behind one [`ChartDataSource`] trait
//! - **Ranges**: explicit or data-derived axis bounds ([`RangeGroup`]) resolved
//!   per chart into a [`ComputedRange`]
//! - **Geometry**: line, bar and pie producers that hand primitives to a
//!   [`GeometrySink`]
//! - **Decorations**: legend entries, axis labels and per-delegate metadata
//!
//! Everything is single-threaded and recomputed synchronously; relayout can be
//! coalesced per frame through [`chartkit_core::FrameScheduler`].
//!
//! # Example
//!
//! ```rust
//! use chartkit_charts::prelude::*;
//!
//! let chart = XYChart::new();
//! let values: SourceHandle = ArraySource::from_numbers([-3.0, 6.0, 4.0, 9.0, 4.0]);
//! chart.sources().append_value_source(&values);
//!
//! let range = chart.computed_range();
//! assert_eq!((range.start_y, range.end_y), (-3.0, 9.0));
//!
//! let line = LineChart::new(chart);
//! line.set_size(Size::new(400.0, 100.0));
//! let mut sink = RecordingSink::new();
//! emit_line_chart(&line, &mut sink);
//! assert_eq!(sink.primitives().len(), 1);
//! ```

pub mod attached;
pub mod axis_labels;
pub mod bar;
pub mod chart;
pub mod config;
pub mod error;
pub mod interpolate;
pub mod legend;
pub mod line;
pub mod pie;
pub mod range;
pub mod sink;
pub mod source;
pub mod xy;

pub use attached::{AttachedMetadata, DelegateId, ItemMetadata};
pub use axis_labels::{axis_labels, AxisLabel, LabelFormat};
pub use bar::{Bar, BarChart, BarChartStyle, Orientation};
pub use chart::{default_color, ChartSources, IndexingMode};
pub use config::ChartConfig;
pub use error::{ChartError, Result};
pub use interpolate::{interpolate_monotone, monotone_tangents};
pub use legend::{legend_entries, LegendEntry};
pub use line::{LineChart, LineChartStyle, LineSeries};
pub use pie::{layout_ring, section_fractions, ArcSegment, PieChart, PieChartStyle, PieRing, RingLayout};
pub use range::{RangeGroup, RangeResult};
pub use sink::{emit_bar_chart, emit_line_chart, emit_pie_chart, GeometrySink, Primitive, RecordingSink};
pub use source::{ChartDataSource, SourceHandle, SourceKind};
pub use xy::{ComputedRange, Direction, XYChart};

/// Common imports for chart users.
pub mod prelude {
    pub use crate::attached::{AttachedMetadata, DelegateId, ItemMetadata};
    pub use crate::axis_labels::{axis_labels, AxisLabel, LabelFormat};
    pub use crate::bar::{BarChart, BarChartStyle, Orientation};
    pub use crate::chart::{ChartSources, IndexingMode};
    pub use crate::config::ChartConfig;
    pub use crate::legend::{legend_entries, LegendEntry};
    pub use crate::line::{LineChart, LineChartStyle};
    pub use crate::pie::{PieChart, PieChartStyle};
    pub use crate::range::RangeGroup;
    pub use crate::sink::{
        emit_bar_chart, emit_line_chart, emit_pie_chart, GeometrySink, Primitive, RecordingSink,
    };
    pub use crate::source::{
        ArraySource, AxisKind, ChartAxisSource, ChartDataSource, ColorGradientSource, FillMode,
        HistoryProxySource, MapProxySource, ModelHistorySource, ModelSource, SingleValueSource,
        SourceHandle, TableModel, VecTableModel,
    };
    pub use crate::xy::{ComputedRange, Direction, XYChart};

    pub use chartkit_core::{Color, Point, Rect, Size, Value};
}
