use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use chartkit_core::{Color, DirtyFlag, FrameScheduler, Notifier, Point, Size, Subscription};
use serde::{Deserialize, Serialize};

use crate::chart::default_color;
use crate::interpolate::interpolate_monotone;
use crate::source::{SourceHandle, SourceRef};
use crate::xy::{Direction, XYChart};

fn default_line_width() -> f32 {
    2.0
}

/// Visual settings for the line chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineChartStyle {
    /// Smooth lines with monotone cubic interpolation.
    #[serde(default)]
    pub smooth: bool,
    #[serde(default = "default_line_width")]
    pub line_width: f32,
    /// Opacity of the area under each line; 0 disables the fill.
    #[serde(default)]
    pub fill_opacity: f32,
}

impl Default for LineChartStyle {
    fn default() -> Self {
        Self {
            smooth: false,
            line_width: default_line_width(),
            fill_opacity: 0.0,
        }
    }
}

/// One polyline per value source.
///
/// `points` have x in pixels and y in [0, 1] measured from the bottom of the
/// chart.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSeries {
    pub source_index: usize,
    pub points: Vec<Point>,
    pub color: Color,
    pub fill_color: Color,
    pub line_width: f32,
}

/// Line chart geometry producer.
///
/// Geometry is rebuilt lazily: any change to the underlying chart, the style
/// or the size marks the layout dirty, and the next [`series`](Self::series)
/// call (or the next frame of an attached [`FrameScheduler`]) rebuilds it once.
pub struct LineChart {
    weak_self: Weak<LineChart>,
    chart: Rc<XYChart>,
    _chart_subscription: Subscription,
    style: RefCell<LineChartStyle>,
    fill_color_source: RefCell<Option<SourceRef>>,
    size: Cell<Size>,
    dirty: DirtyFlag,
    scheduler: RefCell<Option<Rc<FrameScheduler>>>,
    series: RefCell<Vec<LineSeries>>,
    series_changed: Notifier,
}

impl LineChart {
    pub fn new(chart: Rc<XYChart>) -> Rc<Self> {
        Rc::new_cyclic(|weak_self: &Weak<Self>| {
            let weak = weak_self.clone();
            let subscription = chart.changed().subscribe(move |_| {
                if let Some(line) = weak.upgrade() {
                    line.invalidate();
                }
            });
            Self {
                weak_self: weak_self.clone(),
                chart,
                _chart_subscription: subscription,
                style: RefCell::new(LineChartStyle::default()),
                fill_color_source: RefCell::new(None),
                size: Cell::new(Size::ZERO),
                dirty: DirtyFlag::dirty(),
                scheduler: RefCell::new(None),
                series: RefCell::new(Vec::new()),
                series_changed: Notifier::new(),
            }
        })
    }

    pub fn chart(&self) -> &Rc<XYChart> {
        &self.chart
    }

    pub fn style(&self) -> LineChartStyle {
        self.style.borrow().clone()
    }

    pub fn set_style(&self, style: LineChartStyle) {
        *self.style.borrow_mut() = style;
        self.invalidate();
    }

    pub fn set_smooth(&self, smooth: bool) {
        self.style.borrow_mut().smooth = smooth;
        self.invalidate();
    }

    pub fn set_line_width(&self, width: f32) {
        self.style.borrow_mut().line_width = width;
        self.invalidate();
    }

    pub fn set_fill_opacity(&self, opacity: f32) {
        self.style.borrow_mut().fill_opacity = opacity.clamp(0.0, 1.0);
        self.invalidate();
    }

    pub fn set_fill_color_source(&self, source: Option<&SourceHandle>) {
        let weak = self.weak_self.clone();
        *self.fill_color_source.borrow_mut() = source.map(|s| {
            SourceRef::new(s, move || {
                if let Some(line) = weak.upgrade() {
                    line.invalidate();
                }
            })
        });
        self.invalidate();
    }

    pub fn size(&self) -> Size {
        self.size.get()
    }

    pub fn set_size(&self, size: Size) {
        if self.size.replace(size) != size {
            self.invalidate();
        }
    }

    /// Rebuild on the scheduler's next frame instead of on demand.
    pub fn set_scheduler(&self, scheduler: Option<Rc<FrameScheduler>>) {
        *self.scheduler.borrow_mut() = scheduler;
    }

    /// Fired after every rebuild.
    pub fn series_changed(&self) -> &Notifier {
        &self.series_changed
    }

    pub fn needs_layout(&self) -> bool {
        self.dirty.is_dirty()
    }

    pub fn invalidate(&self) {
        let scheduler = self.scheduler.borrow().clone();
        match scheduler {
            Some(scheduler) => {
                let weak = self.weak_self.clone();
                scheduler.schedule(&self.dirty, move || {
                    if let Some(line) = weak.upgrade() {
                        line.relayout();
                    }
                });
            }
            None => {
                self.dirty.mark();
            }
        }
    }

    /// Current geometry, rebuilt first if it is out of date.
    pub fn series(&self) -> Ref<'_, Vec<LineSeries>> {
        if self.dirty.take() {
            self.relayout();
        }
        self.series.borrow()
    }

    fn relayout(&self) {
        let series = self.build_series();
        tracing::trace!(series = series.len(), "line chart relayout");
        *self.series.borrow_mut() = series;
        self.series_changed.emit();
    }

    fn build_series(&self) -> Vec<LineSeries> {
        let range = self.chart.computed_range();
        let size = self.size.get();
        let sources = self.chart.sources().value_sources();
        if range.is_degenerate() || sources.is_empty() {
            return Vec::new();
        }

        let count = range.distance_x as usize;
        let spacing = if count > 1 {
            size.width / (count - 1) as f32
        } else {
            0.0
        };
        let x_at = |k: usize| match self.chart.direction() {
            Direction::ZeroAtStart => k as f32 * spacing,
            Direction::ZeroAtEnd => size.width - k as f32 * spacing,
        };

        let stacked = self.chart.stacked();
        if stacked && sources.iter().any(|s| s.item_count() != sources[0].item_count()) {
            tracing::warn!("stacked line chart sources have different lengths; missing items count as zero");
        }

        let style = self.style.borrow().clone();
        let fill_colors = self
            .fill_color_source
            .borrow()
            .as_ref()
            .map(SourceRef::get);
        let chart_sources = self.chart.sources();

        let mut cumulative = vec![0.0_f64; count];
        let mut out = Vec::with_capacity(sources.len());
        for (index, source) in sources.iter().enumerate() {
            let mut points = Vec::with_capacity(count);
            for (k, total) in cumulative.iter_mut().enumerate() {
                let value = source.item(range.start_x + k as isize);
                let y = if stacked {
                    *total += value.to_f64_or_zero();
                    *total
                } else {
                    match value.as_f64() {
                        Some(v) => v,
                        None => continue,
                    }
                };
                points.push(Point::new(x_at(k), range.normalize_y(y) as f32));
            }
            if style.smooth {
                points = interpolate_monotone(&points, size.height);
            }

            let color = chart_sources.color_at(index, index, index, default_color(index));
            let fill_color = fill_colors
                .as_ref()
                .and_then(|s| s.item(index as isize).as_color())
                .unwrap_or(color)
                .with_alpha(color.a * style.fill_opacity);
            out.push(LineSeries {
                source_index: index,
                points,
                color,
                fill_color,
                line_width: style.line_width,
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ArraySource;

    fn line_chart(values: &[&[f64]]) -> (Rc<LineChart>, Vec<SourceHandle>) {
        let chart = XYChart::new();
        let handles: Vec<SourceHandle> = values
            .iter()
            .map(|v| ArraySource::from_numbers(v.iter().copied()) as SourceHandle)
            .collect();
        chart.sources().set_value_sources(&handles);
        let line = LineChart::new(chart);
        line.set_size(Size::new(300.0, 100.0));
        (line, handles)
    }

    #[test]
    fn points_span_the_width() {
        let (line, _sources) = line_chart(&[&[0.0, 5.0, 10.0, 2.5]]);
        let series = line.series();
        assert_eq!(series.len(), 1);
        let xs: Vec<f32> = series[0].points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 100.0, 200.0, 300.0]);
        let ys: Vec<f32> = series[0].points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, 0.5, 1.0, 0.25]);
    }

    #[test]
    fn zero_at_end_reverses_x() {
        let (line, _sources) = line_chart(&[&[1.0, 2.0, 3.0]]);
        line.chart().set_direction(Direction::ZeroAtEnd);
        let series = line.series();
        let xs: Vec<f32> = series[0].points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![300.0, 150.0, 0.0]);
    }

    #[test]
    fn stacked_series_accumulate() {
        let (line, _sources) = line_chart(&[&[1.0, 2.0], &[3.0, 2.0]]);
        line.chart().set_stacked(true);
        let series = line.series();
        assert_eq!(series[1].points[0].y, 1.0);
        assert_eq!(series[0].points[0].y, 0.25);
    }

    #[test]
    fn degenerate_range_yields_no_series() {
        let (line, _sources) = line_chart(&[&[0.0, 0.0]]);
        assert!(line.series().is_empty());
    }

    #[test]
    fn smoothing_densifies_points() {
        let (line, _sources) = line_chart(&[&[0.0, 10.0, 4.0]]);
        line.set_smooth(true);
        let series = line.series();
        assert!(series[0].points.len() > 3);
        assert!(series[0].points.iter().all(|p| (0.0..=1.0 + 1e-5).contains(&p.y)));
    }

    #[test]
    fn changes_coalesce_into_one_frame() {
        let (line, sources) = line_chart(&[&[1.0, 2.0]]);
        let scheduler = Rc::new(FrameScheduler::new());
        line.set_scheduler(Some(scheduler.clone()));
        drop(line.series());

        let rebuilds = Rc::new(Cell::new(0));
        let r = rebuilds.clone();
        let _sub = line.series_changed().subscribe(move |_| r.set(r.get() + 1));

        line.set_line_width(3.0);
        line.set_smooth(true);
        line.chart().sources().remove_value_source(&sources[0]);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.run_frame(), 1);
        assert_eq!(rebuilds.get(), 1);
    }

    #[test]
    fn eager_read_cancels_the_queued_rebuild() {
        let (line, _sources) = line_chart(&[&[1.0, 2.0]]);
        let scheduler = Rc::new(FrameScheduler::new());
        line.set_scheduler(Some(scheduler.clone()));
        drop(line.series());

        let rebuilds = Rc::new(Cell::new(0));
        let r = rebuilds.clone();
        let _sub = line.series_changed().subscribe(move |_| r.set(r.get() + 1));

        line.set_line_width(4.0);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(line.series()[0].line_width, 4.0);
        assert_eq!(rebuilds.get(), 1);

        assert_eq!(scheduler.run_frame(), 0);
        assert_eq!(rebuilds.get(), 1);
        assert!(!line.needs_layout());
    }

    #[test]
    fn fill_color_uses_opacity() {
        let (line, _sources) = line_chart(&[&[1.0, 2.0]]);
        line.set_fill_opacity(0.5);
        let series = line.series();
        assert_eq!(series[0].fill_color.a, 0.5);
        assert_eq!(series[0].color, default_color(0));
    }
}
