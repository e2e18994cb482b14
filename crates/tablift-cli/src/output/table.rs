use tablift_core::model::TabularResult;
use tablift_core::orchestrator::Extraction;
use tablift_core::workbook::sheet_name;

/// Render an extraction as plain text: the strategy attempts, then every
/// table as an aligned grid under the sheet name it would get.
pub fn format_extraction(extraction: &Extraction) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Flavor: {}  Pages: {}  Status: {}\n",
        extraction.flavor,
        extraction.pages,
        extraction.status().as_str()
    ));
    for attempt in &extraction.attempts {
        match attempt.error {
            Some(ref error) => out.push_str(&format!("  {}: failed ({error})\n", attempt.strategy)),
            None => out.push_str(&format!(
                "  {}: {} table(s)\n",
                attempt.strategy, attempt.table_count
            )),
        }
    }

    if extraction.tables.is_empty() {
        out.push_str("\nNo tables found\n");
        return out;
    }

    for (i, table) in extraction.tables.iter().enumerate() {
        out.push_str(&format!(
            "\n=== {} (page {}, {} x {}) ===\n\n",
            sheet_name(i + 1),
            table.page_number,
            table.width(),
            table.height()
        ));
        format_grid(&mut out, table);
    }

    out
}

fn format_grid(out: &mut String, table: &TabularResult) {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    push_row(out, &table.columns, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}\n", rule.join("  ")));
    for row in &table.rows {
        push_row(out, row, &widths);
    }
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect();
    out.push_str(&format!("  {}\n", padded.join("  ").trim_end()));
}
