//! Boundary to the renderer.
//!
//! Chart producers describe geometry; a [`GeometrySink`] turns it into
//! whatever the renderer needs. No vertex layout is assumed here.

use chartkit_core::{Color, Point, Rect};

use crate::bar::BarChart;
use crate::line::LineChart;
use crate::pie::{ArcSegment, PieChart};

pub trait GeometrySink {
    /// Polyline with x in pixels and y in [0, 1] from the bottom.
    fn line_strip(&mut self, points: &[Point], color: Color, width: f32);

    /// Area between a polyline and the horizontal `baseline` (same units).
    fn area(&mut self, points: &[Point], baseline: f32, color: Color);

    fn wedge(&mut self, segment: &ArcSegment, inner_radius: f32, outer_radius: f32);

    /// Pixel rectangle with a top-left origin.
    fn bar(&mut self, rect: Rect, color: Color, radius: f32);
}

/// Geometry captured by [`RecordingSink`].
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    LineStrip {
        points: Vec<Point>,
        color: Color,
        width: f32,
    },
    Area {
        points: Vec<Point>,
        baseline: f32,
        color: Color,
    },
    Wedge {
        segment: ArcSegment,
        inner_radius: f32,
        outer_radius: f32,
    },
    Bar {
        rect: Rect,
        color: Color,
        radius: f32,
    },
}

/// Sink that records everything it receives.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    primitives: Vec<Primitive>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn take(&mut self) -> Vec<Primitive> {
        std::mem::take(&mut self.primitives)
    }

    pub fn clear(&mut self) {
        self.primitives.clear();
    }
}

impl GeometrySink for RecordingSink {
    fn line_strip(&mut self, points: &[Point], color: Color, width: f32) {
        self.primitives.push(Primitive::LineStrip {
            points: points.to_vec(),
            color,
            width,
        });
    }

    fn area(&mut self, points: &[Point], baseline: f32, color: Color) {
        self.primitives.push(Primitive::Area {
            points: points.to_vec(),
            baseline,
            color,
        });
    }

    fn wedge(&mut self, segment: &ArcSegment, inner_radius: f32, outer_radius: f32) {
        self.primitives.push(Primitive::Wedge {
            segment: segment.clone(),
            inner_radius,
            outer_radius,
        });
    }

    fn bar(&mut self, rect: Rect, color: Color, radius: f32) {
        self.primitives.push(Primitive::Bar {
            rect,
            color,
            radius,
        });
    }
}

/// Emit every series of `chart`: its fill first (when visible), then the line.
pub fn emit_line_chart(chart: &LineChart, sink: &mut dyn GeometrySink) {
    let baseline = chart
        .chart()
        .computed_range()
        .normalize_y(0.0)
        .clamp(0.0, 1.0) as f32;
    for series in chart.series().iter() {
        if series.points.len() < 2 {
            continue;
        }
        if series.fill_color.a > 0.0 {
            sink.area(&series.points, baseline, series.fill_color);
        }
        sink.line_strip(&series.points, series.color, series.line_width);
    }
}

pub fn emit_bar_chart(chart: &BarChart, sink: &mut dyn GeometrySink) {
    let style = chart.style();
    let size = chart.size();
    for bar in chart.bars().iter() {
        sink.bar(bar.rect(size, style.orientation), bar.color, style.radius);
    }
}

/// Emit every ring of `chart`, outermost first, within `outer_radius`.
pub fn emit_pie_chart(chart: &PieChart, outer_radius: f32, sink: &mut dyn GeometrySink) {
    let rings = chart.rings();
    for (index, ring) in rings.iter().enumerate() {
        let (inner, outer) = chart.ring_radii(index, outer_radius);
        if outer <= inner {
            continue;
        }
        if let Some(background) = &ring.layout.background {
            sink.wedge(background, inner, outer);
        }
        for segment in &ring.layout.segments {
            if segment.start_angle != segment.end_angle {
                sink.wedge(segment, inner, outer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ArraySource, SourceHandle};
    use crate::xy::XYChart;
    use chartkit_core::Size;

    #[test]
    fn line_chart_emits_fill_then_line() {
        let chart = XYChart::new();
        let values: SourceHandle = ArraySource::from_numbers([1.0, 3.0, 2.0]);
        chart.sources().append_value_source(&values);
        let line = LineChart::new(chart);
        line.set_size(Size::new(100.0, 50.0));
        line.set_fill_opacity(0.3);

        let mut sink = RecordingSink::new();
        emit_line_chart(&line, &mut sink);
        let prims = sink.take();
        assert_eq!(prims.len(), 2);
        assert!(matches!(prims[0], Primitive::Area { baseline, .. } if baseline == 0.0));
        assert!(matches!(&prims[1], Primitive::LineStrip { points, .. } if points.len() == 3));
        assert!(sink.primitives().is_empty());
    }

    #[test]
    fn bar_chart_emits_pixel_rects() {
        let chart = XYChart::new();
        let values: SourceHandle = ArraySource::from_numbers([2.0, 4.0]);
        chart.sources().append_value_source(&values);
        let bars = BarChart::new(chart);
        bars.set_size(Size::new(100.0, 100.0));
        bars.set_spacing(0.0);

        let mut sink = RecordingSink::new();
        emit_bar_chart(&bars, &mut sink);
        let rects: Vec<Rect> = sink
            .primitives()
            .iter()
            .filter_map(|p| match p {
                Primitive::Bar { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(
            rects,
            vec![Rect::new(0.0, 50.0, 50.0, 50.0), Rect::new(50.0, 0.0, 50.0, 100.0)]
        );
    }

    #[test]
    fn pie_chart_skips_empty_segments() {
        let pie = PieChart::new();
        let values: SourceHandle = ArraySource::from_numbers([0.0, 2.0, 2.0]);
        pie.sources().append_value_source(&values);
        pie.set_angles(0.0, 180.0);

        let mut sink = RecordingSink::new();
        emit_pie_chart(&pie, 50.0, &mut sink);
        let wedges: Vec<&ArcSegment> = sink
            .primitives()
            .iter()
            .filter_map(|p| match p {
                Primitive::Wedge { segment, inner_radius, outer_radius } => {
                    assert_eq!((*inner_radius, *outer_radius), (40.0, 50.0));
                    Some(segment)
                }
                _ => None,
            })
            .collect();
        assert_eq!(wedges.len(), 2);
        assert!(wedges.iter().all(|w| !w.is_background()));
    }
}
