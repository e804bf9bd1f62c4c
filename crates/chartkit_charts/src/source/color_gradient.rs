use std::cell::Cell;
use std::rc::Rc;

use chartkit_core::{Color, Notifier, Value};

use super::{checked_index, ChartDataSource, SourceKind};

/// Synthetic palette: `item_count` colors spaced evenly around the hue wheel,
/// starting at `base_color`.
pub struct ColorGradientSource {
    base_color: Cell<Color>,
    item_count: Cell<usize>,
    changed: Notifier,
}

impl ColorGradientSource {
    pub fn new(base_color: Color, item_count: usize) -> Rc<Self> {
        Rc::new(Self {
            base_color: Cell::new(base_color),
            item_count: Cell::new(item_count),
            changed: Notifier::new(),
        })
    }

    pub fn base_color(&self) -> Color {
        self.base_color.get()
    }

    pub fn set_base_color(&self, color: Color) {
        if self.base_color.replace(color) != color {
            self.changed.emit();
        }
    }

    pub fn set_item_count(&self, count: usize) {
        if self.item_count.replace(count) != count {
            self.changed.emit();
        }
    }

    pub fn colors(&self) -> Vec<Color> {
        (0..self.item_count.get())
            .filter_map(|i| self.item(i as isize).as_color())
            .collect()
    }
}

impl ChartDataSource for ColorGradientSource {
    fn kind(&self) -> SourceKind {
        SourceKind::ColorGradient
    }

    fn item_count(&self) -> usize {
        self.item_count.get()
    }

    fn item(&self, index: isize) -> Value {
        let count = self.item_count.get();
        let Some(i) = checked_index(index, count) else {
            return Value::Invalid;
        };
        let base = self.base_color.get();
        let (hue, saturation, value) = base.to_hsv();
        let mut rotated = hue + i as f32 / count as f32;
        if rotated > 1.0 {
            rotated -= 1.0;
        }
        Value::Color(Color::from_hsv(rotated, saturation, value, base.a))
    }

    fn minimum(&self) -> Value {
        Value::Invalid
    }

    fn maximum(&self) -> Value {
        Value::Invalid
    }

    fn data_changed(&self) -> &Notifier {
        &self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_color_is_the_base_color() {
        let base = Color::rgba(1.0, 0.0, 0.0, 0.5);
        let source = ColorGradientSource::new(base, 3);
        let first = source.item(0).as_color().unwrap();
        assert!((first.r - 1.0).abs() < 1e-5 && first.g.abs() < 1e-5);
        assert_eq!(first.a, 0.5);
    }

    #[test]
    fn hues_are_spread_evenly() {
        let source = ColorGradientSource::new(Color::rgb(1.0, 0.0, 0.0), 3);
        let colors = source.colors();
        assert_eq!(colors.len(), 3);
        // red -> green -> blue
        assert!(colors[1].g > 0.99 && colors[1].r < 1e-4);
        assert!(colors[2].b > 0.99 && colors[2].g < 1e-4);
    }

    #[test]
    fn out_of_range_and_extremes_are_invalid() {
        let source = ColorGradientSource::new(Color::WHITE, 2);
        assert_eq!(source.item(2), Value::Invalid);
        assert_eq!(source.item(-1), Value::Invalid);
        assert_eq!(source.minimum(), Value::Invalid);
        assert_eq!(source.maximum(), Value::Invalid);
    }
}
