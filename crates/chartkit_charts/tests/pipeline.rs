//! End-to-end checks of the source → range → geometry pipeline.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chartkit_charts::prelude::*;
use chartkit_charts::{interpolate_monotone, section_fractions, ChartError};
use chartkit_core::{FrameScheduler, Point};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[test]
fn array_source_queries() {
    let source = ArraySource::from_numbers([-3.0, 6.0, 4.0, 9.0, 4.0]);
    assert_eq!(source.item_count(), 5);
    assert_eq!(source.minimum(), Value::Number(-3.0));
    assert_eq!(source.maximum(), Value::Number(9.0));
    assert_eq!(source.item(3), Value::Number(9.0));
    assert_eq!(source.item(5), Value::Invalid);
    assert_eq!(source.item(-1), Value::Invalid);

    source.set_wrap(true);
    assert_eq!(source.item(7), Value::Number(4.0));
    assert_eq!(source.item(-1), Value::Number(4.0));
    assert_eq!(source.item(-5), Value::Number(-3.0));
}

#[test]
fn array_source_from_json() {
    let source = ArraySource::from_json(r##"[1, 2.5, "label", "#ff0000"]"##).unwrap();
    assert_eq!(source.item_count(), 4);
    assert_eq!(source.item(1), Value::Number(2.5));
    assert!(matches!(
        ArraySource::from_json("{\"a\": 1}"),
        Err(ChartError::UnsupportedJson(_))
    ));
    assert!(matches!(ArraySource::from_json("[1,"), Err(ChartError::Json(_))));
}

#[test]
fn history_keeps_newest_samples() {
    init_tracing();
    let value = SingleValueSource::new(-1.0);
    let handle: SourceHandle = value.clone();
    let history = HistoryProxySource::with_source(&handle, 10);

    for v in 0..=14 {
        value.set_value(v as f64);
    }

    assert_eq!(history.item_count(), 10);
    assert_eq!(history.item(0), Value::Number(14.0));
    assert_eq!(history.item(9), Value::Number(5.0));
    assert_eq!(history.minimum(), Value::Number(5.0));
    assert_eq!(history.maximum(), Value::Number(14.0));
}

#[test]
fn history_interval_sampling_is_host_driven() {
    let value = SingleValueSource::new(1.0);
    let handle: SourceHandle = value.clone();
    let history = HistoryProxySource::with_source(&handle, 5);
    history.set_interval(Some(Duration::from_millis(100)));

    value.set_value(2.0);
    assert_eq!(history.item_count(), 0);

    let t0 = Instant::now();
    history.tick(t0);
    let sampled = (1..=4)
        .filter(|&k: &u64| history.tick(t0 + Duration::from_millis(100 * k)))
        .count();
    assert_eq!(sampled, 4);
    assert_eq!(history.item_count(), 4);
    assert_eq!(history.item(0), Value::Number(2.0));
}

#[test]
fn automatic_range_rounds_up_to_increment() {
    let chart = XYChart::new();
    chart.set_y_range(RangeGroup::automatic().with_increment(10.0));
    let values: SourceHandle = ArraySource::from_numbers([12.0, 87.0, 40.0]);
    chart.sources().append_value_source(&values);

    let range = chart.computed_range();
    assert_eq!((range.start_y, range.end_y), (0.0, 90.0));
    assert_eq!((range.start_x, range.end_x, range.distance_x), (0, 3, 3));
}

#[test]
fn automatic_span_is_a_multiple_of_the_increment() {
    for increment in [0.5, 3.0, 7.0, 25.0] {
        let range = RangeGroup::automatic().with_increment(increment);
        let values: Vec<SourceHandle> = vec![ArraySource::from_numbers([-4.2, 13.7, 101.3])];
        let result = range.calculate_range(&values, |s| s.minimum().as_f64(), |s| s.maximum().as_f64());
        let steps = result.distance / increment;
        assert!((steps - steps.round()).abs() < 1e-9, "{increment}: {result:?}");
        assert!(result.end >= 101.3);
    }
}

#[test]
fn computed_range_follows_source_changes() {
    init_tracing();
    let chart = XYChart::new();
    let values = ArraySource::from_numbers([1.0, 2.0]);
    let handle: SourceHandle = values.clone();
    chart.sources().append_value_source(&handle);

    let notified = Rc::new(Cell::new(0));
    let n = notified.clone();
    let _sub = chart
        .computed_range_changed()
        .subscribe(move |_: &ComputedRange| n.set(n.get() + 1));

    values.set_array(vec![Value::Number(1.0), Value::Number(50.0), Value::Number(3.0)]);
    assert_eq!(notified.get(), 1);
    assert_eq!(chart.computed_range().end_y, 50.0);
    assert_eq!(chart.computed_range().end_x, 3);

    values.set_array(vec![Value::Number(1.0), Value::Number(50.0), Value::Number(3.0)]);
    assert_eq!(notified.get(), 1);
}

#[test]
fn removing_a_source_shrinks_the_computed_range() {
    let chart = XYChart::new();
    let short: SourceHandle = ArraySource::from_numbers([1.0, 3.0]);
    let tall: SourceHandle = ArraySource::from_numbers([100.0, 100.0, 100.0]);
    chart.sources().set_value_sources(&[short.clone(), tall.clone()]);
    assert_eq!(chart.computed_range().end_y, 100.0);

    // Dropping the caller's handle leaves the chart's copy in place.
    drop(tall);
    assert_eq!(chart.sources().value_source_count(), 2);
    assert_eq!(chart.computed_range().end_y, 100.0);

    let tall = chart.sources().value_sources()[1].clone();
    assert!(chart.sources().remove_value_source(&tall));
    let range = chart.computed_range();
    assert_eq!((range.end_x, range.end_y), (2, 3.0));
}

#[test]
fn monotone_interpolation_stays_within_segments() {
    let points = vec![
        Point::new(0.0, 0.1),
        Point::new(40.0, 0.2),
        Point::new(80.0, 0.9),
        Point::new(120.0, 0.95),
        Point::new(160.0, 0.3),
        Point::new(200.0, 0.3),
    ];
    let curve = interpolate_monotone(&points, 100.0);
    assert!(curve.len() > points.len());
    assert_eq!(curve.first(), points.first());
    assert_eq!(curve.last(), points.last());

    for w in points.windows(2) {
        let (lo_x, hi_x) = (w[0].x, w[1].x);
        let (lo_y, hi_y) = (w[0].y.min(w[1].y), w[0].y.max(w[1].y));
        for p in curve.iter().filter(|p| p.x >= lo_x && p.x <= hi_x) {
            assert!(
                p.y >= lo_y - 1e-5 && p.y <= hi_y + 1e-5,
                "{p:?} escapes [{lo_y}, {hi_y}]"
            );
        }
    }
}

#[test]
fn pie_fractions_never_exceed_the_span() {
    let automatic = RangeGroup::automatic();
    let full: SourceHandle = ArraySource::from_numbers([1.0, 2.0, 3.0, -4.0]);
    let sum: f64 = section_fractions(&full, &automatic).iter().sum();
    assert!((sum - 1.0).abs() < 1e-9);

    let fixed = RangeGroup::fixed(0.0, 5.0);
    let sections = section_fractions(&full, &fixed);
    assert_eq!(sections.len(), 4);
    assert!((sections.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert_eq!(sections[3], 0.0);

    let roomy = RangeGroup::fixed(0.0, 100.0);
    let sum: f64 = section_fractions(&full, &roomy).iter().sum();
    assert!((sum - 0.06).abs() < 1e-9);
}

#[test]
fn pie_ring_leaves_a_background_for_partial_data() {
    let pie = PieChart::new();
    let values: SourceHandle = ArraySource::from_numbers([25.0, 25.0]);
    pie.sources().append_value_source(&values);
    pie.set_range(RangeGroup::fixed(0.0, 100.0));
    pie.set_angles(0.0, 180.0);

    let rings = pie.rings();
    let layout = &rings[0].layout;
    assert!((layout.background_fraction - 0.5).abs() < 1e-9);
    let background = layout.background.as_ref().unwrap();
    assert!((background.end_angle - std::f32::consts::PI).abs() < 1e-5);
}

#[test]
fn line_chart_relayouts_once_per_frame() {
    init_tracing();
    let chart = XYChart::new();
    let values = ArraySource::from_numbers([1.0, 2.0, 3.0]);
    let handle: SourceHandle = values.clone();
    chart.sources().append_value_source(&handle);

    let line = LineChart::new(chart);
    line.set_size(Size::new(200.0, 100.0));
    let scheduler = Rc::new(FrameScheduler::new());
    line.set_scheduler(Some(scheduler.clone()));
    let _ = line.series();

    let rebuilt = Rc::new(Cell::new(0));
    let r = rebuilt.clone();
    let _sub = line.series_changed().subscribe(move |_| r.set(r.get() + 1));

    values.set_array(vec![Value::Number(4.0), Value::Number(2.0)]);
    values.set_array(vec![Value::Number(5.0), Value::Number(1.0), Value::Number(0.0)]);
    assert_eq!(scheduler.pending(), 1);
    scheduler.run_frame();
    assert_eq!(rebuilt.get(), 1);

    let series = line.series();
    assert_eq!(series[0].points.len(), 3);
    assert_eq!(series[0].points[0], Point::new(0.0, 1.0));
}

#[test]
fn config_drives_a_stacked_bar_chart() {
    let config = ChartConfig::from_toml_str("stacked = true\n[bar]\nspacing = 0.0\n").unwrap();

    let chart = XYChart::new();
    let a: SourceHandle = ArraySource::from_numbers([1.0, 3.0]);
    let b: SourceHandle = ArraySource::from_numbers([1.0, 1.0]);
    // The chart holds the only handles from here on.
    chart.sources().set_value_sources(&[a, b]);
    let bars = BarChart::new(chart);
    bars.set_size(Size::new(100.0, 100.0));
    config.apply_to_bar(&bars);
    assert_eq!(bars.chart().sources().value_source_count(), 2);
    assert_eq!(bars.chart().computed_range().end_y, 4.0);

    let mut sink = RecordingSink::new();
    emit_bar_chart(&bars, &mut sink);
    assert_eq!(sink.primitives().len(), 4);
    let bars = bars.bars();
    let top = bars
        .iter()
        .filter(|b| b.index == 1)
        .map(|b| b.end)
        .fold(0.0_f32, f32::max);
    assert_eq!(top, 1.0);
}

#[test]
fn legend_and_labels_attach_to_delegates() {
    let chart = XYChart::new();
    let values: SourceHandle = ArraySource::from_numbers([3.0, 8.0]);
    let names: SourceHandle = ArraySource::new(vec!["in".into(), "out".into()], false);
    chart.sources().append_value_source(&values);
    chart.sources().set_name_source(Some(&names));

    let entries = legend_entries(chart.sources());
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "in");

    let mut attached = AttachedMetadata::new();
    attached.attach_legend(&[DelegateId(10), DelegateId(11)], &entries);
    assert_eq!(attached.get(DelegateId(11)).map(|m| m.label.as_str()), Some("out"));

    let axis = ChartAxisSource::new(Some(&chart), AxisKind::Y, 2);
    let labels = axis_labels(&*axis, Direction::ZeroAtStart, LabelFormat::Fixed(0));
    let texts: Vec<&str> = labels.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["0", "8"]);
}
