//! Legend entries derived from a chart's sources.

use chartkit_core::{Color, Value};

use crate::chart::{default_color, ChartSources, IndexingMode};

#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub name: String,
    pub short_name: String,
    pub color: Color,
    pub value: Value,
    pub max_value: Value,
}

fn text(value: Value) -> String {
    if value.is_valid() {
        value.to_string()
    } else {
        String::new()
    }
}

/// Entries in display order.
///
/// With [`IndexingMode::IndexEachSource`] there is one entry per value source
/// (its first item as value); otherwise one per item, taken from the first
/// source for [`IndexingMode::IndexSourceValues`] and from every source in
/// turn for [`IndexingMode::IndexAllValues`].
pub fn legend_entries(sources: &ChartSources) -> Vec<LegendEntry> {
    let values = sources.value_sources();
    let mode = sources.indexing_mode();
    let entry = |source: usize, item: usize, running: usize, value: Value, max_value: Value| {
        let index = mode.select(source, item, running);
        LegendEntry {
            name: text(sources.name_at(source, item, running)),
            short_name: text(sources.short_name_at(source, item, running)),
            color: sources.color_at(source, item, running, default_color(index)),
            value,
            max_value,
        }
    };

    match mode {
        IndexingMode::IndexEachSource => values
            .iter()
            .enumerate()
            .map(|(i, s)| entry(i, 0, i, s.first(), s.maximum()))
            .collect(),
        IndexingMode::IndexSourceValues => values
            .first()
            .map(|s| {
                (0..s.item_count())
                    .map(|item| entry(0, item, item, s.item(item as isize), s.maximum()))
                    .collect()
            })
            .unwrap_or_default(),
        IndexingMode::IndexAllValues => {
            let mut running = 0;
            let mut out = Vec::new();
            for (i, s) in values.iter().enumerate() {
                for item in 0..s.item_count() {
                    out.push(entry(i, item, running, s.item(item as isize), s.maximum()));
                    running += 1;
                }
            }
            out
        }
    }
}
