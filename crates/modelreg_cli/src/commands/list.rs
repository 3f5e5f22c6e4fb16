//! List command implementation.

use super::record_to_json;
use modelreg_core::{RecordTable, Registry};
use serde::Serialize;
use serde_json::Value;

/// JSON listing of a registry.
#[derive(Debug, Serialize)]
pub struct ListOutput {
    /// Registry root.
    pub path: String,
    /// Metadata columns, `id` first.
    pub columns: Vec<String>,
    /// One object per model.
    pub models: Vec<Value>,
}

/// Runs the list command.
pub fn run(registry: &Registry, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let table = registry.store().snapshot()?;

    match format {
        "json" => {
            let output = ListOutput {
                path: registry.root().display().to_string(),
                columns: table.header().map(str::to_string).collect(),
                models: table.rows().map(record_to_json).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => print_text_output(&table),
    }

    Ok(())
}

fn print_text_output(table: &RecordTable) {
    if table.is_empty() {
        println!("No models registered");
        return;
    }

    let header: Vec<&str> = table.header().collect();
    let rows: Vec<Vec<String>> = table
        .rows()
        .map(|record| {
            std::iter::once(record.id().to_string())
                .chain(table.columns().iter().map(|name| {
                    record.get(name).map(ToString::to_string).unwrap_or_default()
                }))
                .collect()
        })
        .collect();

    let widths = column_widths(&header, &rows);

    let line = |cells: &[&str]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(&header).trim_end());
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        println!("{}", line(&cells).trim_end());
    }
    println!();
    println!("{} model(s), {} column(s)", table.len(), header.len());
}

/// Display width of each column, counted in characters.
fn column_widths(header: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect()
}
