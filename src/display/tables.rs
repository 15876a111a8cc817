//! Table formatting for recommendations and evaluation results.

use comfy_table::{
    Attribute, Cell, CellAlignment, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};

use crate::eval::Metrics;
use crate::types::ApiRecommendation;

/// Longest description shown in a table cell.
const MAX_DESCRIPTION_CHARS: usize = 80;

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        Self { table }
    }

    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    pub fn add_row(mut self, row: Vec<Cell>) -> Self {
        self.table.add_row(row);
        self
    }

    pub fn build(self) -> String {
        self.table.to_string()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.chars().count() <= max_chars {
        return first_line.to_string();
    }
    let mut cut: String = first_line.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Ranked recommendations as a table.
pub fn create_recommendation_table(recommendations: &[ApiRecommendation]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec!["#", "API", "Score", "Description"]);
    for (i, rec) in recommendations.iter().enumerate() {
        builder = builder.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(&rec.full_name),
            Cell::new(format!("{:.4}", rec.score)).set_alignment(CellAlignment::Right),
            Cell::new(truncate(&rec.description, MAX_DESCRIPTION_CHARS)),
        ]);
    }
    builder.build()
}

/// Evaluation metrics as a two-column table.
pub fn create_metrics_table(name: &str, metrics: &Metrics) -> String {
    let mut builder = TableBuilder::new()
        .set_headers(vec!["Metric", "Value"])
        .add_row(vec![Cell::new("Benchmark"), Cell::new(name)])
        .add_row(vec![Cell::new("Queries"), Cell::new(metrics.queries)])
        .add_row(vec![Cell::new("MRR"), Cell::new(format!("{:.4}", metrics.mrr))])
        .add_row(vec![Cell::new("MAP"), Cell::new(format!("{:.4}", metrics.map))]);
    for (k, rate) in &metrics.success_at_k {
        builder = builder.add_row(vec![
            Cell::new(format!("SuccessRate@{k}")),
            Cell::new(format!("{rate:.4}")),
        ]);
    }
    if metrics.skipped > 0 {
        builder = builder.add_row(vec![
            Cell::new("Skipped (no answers)"),
            Cell::new(metrics.skipped),
        ]);
    }
    builder.build()
}
