use crate::output::read_records;
use crate::parser::fields::{
    FieldLayout, Source, ACCESS_LAYOUT, ALLOCATION_LAYOUT, FREE_LAYOUT, FUNCTION_LAYOUT,
};
use crate::utils::config::PLACEHOLDER;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Validate a JSON Lines record file
///
/// # Returns
/// Record counts keyed by `event`
pub fn validate_records_file(file_path: &Path) -> Result<BTreeMap<String, usize>> {
    println!("Validating records: {}", file_path.display());

    let records = read_records(file_path)
        .with_context(|| format!("Invalid record file {}", file_path.display()))?;

    let mut by_event: BTreeMap<String, usize> = BTreeMap::new();
    for record in &records {
        *by_event.entry(record.event().to_string()).or_insert(0) += 1;
    }

    println!("✓ Valid record file");
    println!("  Records: {}", records.len());
    for (event, count) in &by_event {
        println!("  {}: {}", event, count);
    }

    Ok(by_event)
}

/// Display the line grammar and output keys of every record kind
pub fn display_schema(show_details: bool) {
    println!("Memtracker Record Schema");
    println!("Missing fields are written as \"{}\"", PLACEHOLDER);
    println!();

    if show_details {
        print_layout("alloc:", &ALLOCATION_LAYOUT);
        print_layout("read: / write:", &ACCESS_LAYOUT);
        print_layout("function-begin / function-end", &FUNCTION_LAYOUT);
        print_layout("implicit-free", &FREE_LAYOUT);
    } else {
        println!("Use --show for detailed schema information");
    }
}

fn print_layout<const N: usize>(prefix: &str, layout: &FieldLayout<N>) {
    println!("{} ({})", prefix, layout.kind);
    for (index, spec) in layout.fields.iter().enumerate() {
        let source = match spec.source {
            Source::Keyword => "keyword".to_string(),
            Source::Token(position) => format!("token {}", position),
        };
        let mut notes = Vec::new();
        if index < layout.required {
            notes.push("required");
        }
        if layout.tail == Some(index) {
            notes.push("absorbs remaining tokens");
        }
        if notes.is_empty() {
            println!("  {:<16} {}", spec.name, source);
        } else {
            println!("  {:<16} {:<10} {}", spec.name, source, notes.join(", "));
        }
    }
    println!();
}

/// Display version information
pub fn display_version() {
    println!("memtrace2json v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Converts memtracker pintool traces into JSON Lines event records.");
}
