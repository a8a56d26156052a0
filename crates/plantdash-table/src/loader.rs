//! CSV loading with lenient row handling and column-name cleanup.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::TableError;
use crate::table::Table;

/// What the data pages get back from a load: always a table, plus a
/// message to show the user when something went wrong.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub table: Table,
    /// Rows dropped because they could not be decoded or had too many fields.
    pub skipped_rows: usize,
    /// User-facing message when the file could not be loaded at all.
    pub notice: Option<String>,
}

/// Load a delimited file. Never fails: a missing or unreadable file gives
/// an empty table and a notice.
pub fn load(path: &Path) -> LoadReport {
    let result = std::fs::File::open(path)
        .map_err(TableError::from)
        .and_then(read_from);

    match result {
        Ok((table, skipped_rows)) => {
            info!(
                path = %path.display(),
                rows = table.row_count(),
                columns = table.columns().len(),
                skipped_rows,
                "Dataset loaded"
            );
            LoadReport {
                table,
                skipped_rows,
                notice: None,
            }
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Dataset unavailable, showing empty table");
            LoadReport {
                table: Table::empty(),
                skipped_rows: 0,
                notice: Some(format!("Could not load data from {}: {}", path.display(), e)),
            }
        }
    }
}

/// Parse CSV from any reader. Returns the table and the number of skipped
/// rows.
///
/// Rows with fewer fields than the header are padded with empty cells; rows
/// with more fields, or that fail to decode, are skipped.
pub fn read_from<R: Read>(reader: R) -> Result<(Table, usize), TableError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let raw_headers: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let name = if i == 0 {
                h.trim_start_matches('\u{feff}')
            } else {
                h
            };
            let name = name.trim();
            if name.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name.to_string()
            }
        })
        .collect();
    if raw_headers.is_empty() {
        return Err(TableError::NoHeader);
    }
    let columns = dedupe_columns(raw_headers);
    let width = columns.len();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in rdr.records().enumerate() {
        match record {
            Ok(record) if record.len() <= width => {
                rows.push(record.iter().map(str::to_string).collect());
            }
            Ok(record) => {
                skipped += 1;
                tracing::debug!(
                    row = line + 1,
                    fields = record.len(),
                    expected = width,
                    "Skipping row with too many fields"
                );
            }
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                skipped += 1;
                tracing::debug!(row = line + 1, error = %e, "Skipping malformed row");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "Skipped malformed rows while loading dataset");
    }
    Ok((Table::new(columns, rows), skipped))
}

/// Make column names unique.
///
/// The first occurrence of a name is kept; later ones become `name_1`,
/// `name_2`, ... by occurrence. A generated name that is already taken is
/// bumped to the next free index.
pub fn dedupe_columns(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        let seen = occurrences.entry(name.clone()).or_insert(0);
        if *seen == 0 {
            *seen = 1;
            out.push(name);
            continue;
        }

        let mut n = *seen;
        let renamed = loop {
            let candidate = format!("{}_{}", name, n);
            if !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        *seen = n + 1;
        taken.insert(renamed.clone());
        out.push(renamed);
    }
    out
}
