use std::cmp::Ordering;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crf_cli::pipeline::RunOutcome;
use crf_model::{IssueSeverity, ValidationIssue};
use crf_report::SchemaOutcome;

pub fn print_summary(outcome: &RunOutcome) {
    println!("Form: {} ({})", outcome.form_id, outcome.form_name);
    println!("ODM version: {}", outcome.version);
    if let Some(path) = &outcome.archive {
        println!("Archive: {}", path.display());
    }

    let counts = outcome.counts;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Sections"),
        header_cell("Concepts"),
        header_cell("Items"),
        header_cell("Codelists"),
        header_cell("Units"),
        header_cell("References"),
        header_cell("Schema"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 5, CellAlignment::Center);
    align_column(&mut table, 6, CellAlignment::Center);
    table.add_row(vec![
        count_cell(counts.sections),
        count_cell(counts.concepts),
        count_cell(counts.items),
        count_cell(counts.codelists),
        count_cell(counts.units),
        references_cell(outcome),
        schema_cell(outcome.schema.as_ref()),
    ]);
    println!("{table}");

    let mut files = Table::new();
    files.set_header(vec![header_cell("Output")]);
    apply_table_style(&mut files);
    for path in &outcome.outputs {
        files.add_row(vec![Cell::new(path.display())]);
    }
    println!("{files}");

    print_issue_table(outcome);
    if let Some(SchemaOutcome::Invalid { details }) = &outcome.schema {
        eprintln!("Schema validation:");
        for line in details.lines() {
            eprintln!("- {line}");
        }
    }
}

fn print_issue_table(outcome: &RunOutcome) {
    let Some(report) = &outcome.references else {
        return;
    };
    if report.issues.is_empty() {
        return;
    }
    let mut issues: Vec<&ValidationIssue> = report.issues.iter().collect();
    issues.sort_by(|a, b| {
        let severity = severity_rank(b.severity).cmp(&severity_rank(a.severity));
        if severity != Ordering::Equal {
            return severity;
        }
        a.code.cmp(&b.code)
    });
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Code"),
        header_cell("OID"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for issue in issues {
        table.add_row(vec![
            severity_cell(issue.severity),
            Cell::new(&issue.code),
            issue
                .oid
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(&issue.message),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn references_cell(outcome: &RunOutcome) -> Cell {
    match &outcome.references {
        None => dim_cell("skipped"),
        Some(report) if report.has_errors() => Cell::new(format!(
            "{} errors",
            report.error_count()
        ))
        .fg(Color::Red)
        .add_attribute(Attribute::Bold),
        Some(report) if report.warning_count() > 0 => {
            Cell::new(format!("{} warnings", report.warning_count())).fg(Color::Yellow)
        }
        Some(_) => ok_cell(),
    }
}

fn schema_cell(outcome: Option<&SchemaOutcome>) -> Cell {
    match outcome {
        None => dim_cell("-"),
        Some(SchemaOutcome::Valid) => ok_cell(),
        Some(SchemaOutcome::Invalid { .. }) => Cell::new("invalid")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Some(SchemaOutcome::Unavailable { .. }) => Cell::new("unavailable").fg(Color::Yellow),
    }
}

fn ok_cell() -> Cell {
    Cell::new("✓")
        .fg(Color::Green)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count)
    } else {
        dim_cell(count)
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Error => Cell::new("ERROR").fg(Color::Red),
        IssueSeverity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn severity_rank(severity: IssueSeverity) -> u8 {
    match severity {
        IssueSeverity::Error => 2,
        IssueSeverity::Warning => 1,
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
