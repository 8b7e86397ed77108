use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use merge_core::{DEFAULT_METRIC_FIELDS, LOOKUP_FIELD, MergeConfig};
use merge_model::{MergeSummary, Table as DataTable};

use merge_cli::types::MergeRunResult;

pub fn print_summary(result: &MergeRunResult) {
    let summary = &result.outcome.summary;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for row in summary_rows(summary) {
        table.add_row(row);
    }
    println!("{table}");
    if result.written {
        println!(
            "Wrote {} with {} rows.",
            result.out.display(),
            result.outcome.table.len()
        );
    } else {
        println!("Dry run: {} not written.", result.out.display());
    }
}

fn summary_rows(summary: &MergeSummary) -> Vec<Vec<Cell>> {
    vec![
        vec![
            Cell::new("Total rows"),
            Cell::new(summary.total_rows).add_attribute(Attribute::Bold),
        ],
        vec![
            Cell::new("Matched"),
            count_cell(summary.matched, Color::Green),
        ],
        vec![
            Cell::new("Missing metrics matches"),
            count_cell(summary.unmatched, Color::Yellow),
        ],
        vec![
            Cell::new("Match rate"),
            Cell::new(format!("{:.1}%", summary.match_rate() * 100.0)),
        ],
        vec![Cell::new("Keys from opportunities"), dim_or(summary.resolved_direct)],
        vec![Cell::new("Keys from channel map"), dim_or(summary.resolved_via_map)],
        vec![
            Cell::new("Unresolved rows"),
            count_cell(summary.unresolved, Color::Yellow),
        ],
        vec![
            Cell::new("Duplicate metrics keys"),
            count_cell(summary.duplicate_metric_keys, Color::Yellow),
        ],
        vec![
            Cell::new("Used channel map"),
            if summary.map_used {
                Cell::new("Yes").fg(Color::Green)
            } else {
                dim_cell("No")
            },
        ],
        vec![
            Cell::new("Channel column"),
            match &summary.key_header {
                Some(header) => Cell::new(header),
                None => dim_cell("-"),
            },
        ],
    ]
}

/// Prints the header and rows of a table, with a note when rows were cut.
pub fn print_preview(title: &str, data: &DataTable, total_rows: usize) {
    let mut table = Table::new();
    table.set_header(data.headers.iter().map(|h| header_cell(h)).collect::<Vec<_>>());
    apply_table_style(&mut table);
    for row in &data.rows {
        table.add_row(row.iter().map(|value| value_cell(value)).collect::<Vec<_>>());
    }
    println!("{title}");
    println!("{table}");
    if total_rows > data.len() {
        println!("({} of {} rows shown)", data.len(), total_rows);
    }
}

/// Prints the logical fields of `config` and the headers they bind to.
pub fn print_fields(config: &MergeConfig) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Table"),
        header_cell("Header(s)"),
    ]);
    apply_table_style(&mut table);
    for row in field_rows(config) {
        table.add_row(row);
    }
    println!("{table}");
}

fn field_rows(config: &MergeConfig) -> Vec<Vec<Cell>> {
    let key = config.key_field.as_str();
    let mut rows = vec![
        vec![
            key_cell(key),
            Cell::new("opportunities"),
            Cell::new(config.primary_key_headers.join(", ")),
        ],
        vec![
            key_cell(key),
            Cell::new("metrics"),
            Cell::new(&config.metrics_key_header),
        ],
        vec![
            key_cell(key),
            Cell::new("map"),
            Cell::new(&config.mapping_key_header),
        ],
        vec![
            Cell::new(LOOKUP_FIELD),
            Cell::new("opportunities"),
            Cell::new(config.primary_lookup_headers.join(", ")),
        ],
        vec![
            Cell::new(LOOKUP_FIELD),
            Cell::new("map"),
            Cell::new(&config.mapping_lookup_header),
        ],
    ];
    for metric in &config.metric_fields {
        let name = Cell::new(metric.name.as_str());
        rows.push(vec![
            if DEFAULT_METRIC_FIELDS.contains(&metric.name.as_str()) {
                name
            } else {
                name.fg(Color::Magenta)
            },
            Cell::new("metrics"),
            Cell::new(&metric.header),
        ]);
    }
    rows
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(160);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_or(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count)
    } else {
        dim_cell(count)
    }
}

fn value_cell(value: &str) -> Cell {
    if value.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(value)
    }
}

fn key_cell(name: &str) -> Cell {
    Cell::new(name)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
