//! Turns per-category totals into pie chart slices and renders them as SVG.

use crate::model::{Amount, CategoryLabel};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::BTreeMap;
use std::f32::consts::PI;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Path, Rectangle, Text};
use svg::Document;

/// Slice colors, reused in order when there are more slices than colors.
pub const PALETTE: [&str; 5] = ["#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#A28CF5"];

/// Labels drawn next to a slice are cut to this many characters.
pub const LABEL_LIMIT: usize = 15;

const SIZE: f32 = 400.0;
const RADIUS: f32 = 120.0;
const LEGEND_ROW: f32 = 22.0;

/// One wedge of the pie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub category: CategoryLabel,
    pub value: Amount,
    /// Fraction of the whole pie, 0.0 through 1.0.
    pub share: f64,
    pub color: &'static str,
    /// e.g. `Food: $12.50`
    pub label: String,
}

impl Slice {
    /// The label as drawn beside the slice, cut to `LABEL_LIMIT` characters.
    pub fn short_label(&self) -> String {
        truncate(&self.label, LABEL_LIMIT)
    }
}

/// Builds one slice per category, in category order. Colors follow `PALETTE` round-robin.
pub fn pie_slices(totals: &BTreeMap<CategoryLabel, Amount>) -> Vec<Slice> {
    let sum: Amount = totals.values().sum();
    let sum = sum.value().to_f64().unwrap_or_default();
    totals
        .iter()
        .enumerate()
        .map(|(ix, (category, value))| {
            let v = value.value().to_f64().unwrap_or_default();
            Slice {
                category: *category,
                value: *value,
                share: if sum > 0.0 { v / sum } else { 0.0 },
                color: PALETTE[ix % PALETTE.len()],
                label: format!("{category}: {value}"),
            }
        })
        .collect()
}

/// Cuts `s` to `limit` characters and appends `...` if anything was removed.
pub fn truncate(s: &str, limit: usize) -> String {
    if s.chars().count() > limit {
        let head: String = s.chars().take(limit).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

/// Renders `slices` as an SVG document: the pie on top, a legend with full labels below.
pub fn render_svg(slices: &[Slice]) -> String {
    let (cx, cy) = (SIZE / 2.0, SIZE / 2.0);
    let height = SIZE + LEGEND_ROW * slices.len() as f32 + LEGEND_ROW;

    let mut document = Document::new()
        .set("viewBox", (0, 0, SIZE as i32, height as i32))
        .set("width", SIZE)
        .set("height", height)
        .add(
            Rectangle::new()
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", "white"),
        );

    let drawn: Vec<&Slice> = slices.iter().filter(|s| s.share > 0.0).collect();
    if drawn.is_empty() {
        document = document.add(
            Text::new()
                .set("x", cx)
                .set("y", cy)
                .set("text-anchor", "middle")
                .add(svg::node::Text::new("No expenses yet")),
        );
    }

    // Angles start at twelve o'clock and run clockwise.
    let mut start = -PI / 2.0;
    for slice in &drawn {
        let sweep = slice.share as f32 * 2.0 * PI;
        let end = start + sweep;

        document = if drawn.len() == 1 {
            // An arc from a point back to itself draws nothing.
            document.add(
                Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", RADIUS)
                    .set("fill", slice.color),
            )
        } else {
            let large_arc = if sweep > PI { 1.0 } else { 0.0 };
            let data = Data::new()
                .move_to(vec![cx, cy])
                .line_to(vec![cx + RADIUS * start.cos(), cy + RADIUS * start.sin()])
                .elliptical_arc_to(vec![
                    RADIUS,
                    RADIUS,
                    0.0,
                    large_arc,
                    1.0,
                    cx + RADIUS * end.cos(),
                    cy + RADIUS * end.sin(),
                ])
                .close();
            document.add(
                Path::new()
                    .set("fill", slice.color)
                    .set("stroke", "white")
                    .set("d", data),
            )
        };

        let mid = start + sweep / 2.0;
        let label_radius = RADIUS + 18.0;
        let anchor = if mid.cos() >= 0.0 { "start" } else { "end" };
        document = document.add(
            Text::new()
                .set("x", cx + label_radius * mid.cos())
                .set("y", cy + label_radius * mid.sin())
                .set("text-anchor", anchor)
                .set("font-size", 12)
                .add(svg::node::Text::new(slice.short_label())),
        );
        start = end;
    }

    for (ix, slice) in slices.iter().enumerate() {
        let y = SIZE + LEGEND_ROW * ix as f32;
        document = document
            .add(
                Rectangle::new()
                    .set("x", 20)
                    .set("y", y)
                    .set("width", 14)
                    .set("height", 14)
                    .set("fill", slice.color),
            )
            .add(
                Text::new()
                    .set("x", 42)
                    .set("y", y + 12.0)
                    .set("font-size", 13)
                    .add(svg::node::Text::new(slice.label.clone())),
            );
    }

    document.to_string()
}
