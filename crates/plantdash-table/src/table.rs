//! In-memory table and the views derived from it.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// Filter value meaning "no filtering".
pub const ALL: &str = "All";

/// Column names plus string cells, row-major. Every row has one cell per
/// column and column names are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// One bar of the chart: a group key and the sum of its values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSum {
    pub key: String,
    pub sum: f64,
}

impl Table {
    /// Build a table, padding short rows with empty cells and dropping
    /// cells beyond the last column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    /// A column is numeric when it has at least one non-empty cell and
    /// every non-empty cell parses as a finite number.
    pub fn is_numeric(&self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        let mut seen_value = false;
        for row in &self.rows {
            let cell = row[idx].trim();
            if cell.is_empty() {
                continue;
            }
            match parse_number(cell) {
                Some(_) => seen_value = true,
                None => return false,
            }
        }
        seen_value
    }

    /// Columns that can be offered as the chart's value axis.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| self.is_numeric(c))
            .cloned()
            .collect()
    }

    /// Sorted distinct non-empty values of a column.
    pub fn unique_values(&self, column: &str) -> Result<Vec<String>, TableError> {
        let idx = self.require_column(column)?;
        let mut values: Vec<String> = self
            .rows
            .iter()
            .map(|row| row[idx].as_str())
            .filter(|cell| !cell.trim().is_empty())
            .collect::<HashSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        values.sort();
        Ok(values)
    }

    /// Rows whose `column` cell equals `value`. [`ALL`] returns the table
    /// unchanged.
    pub fn filter(&self, column: &str, value: &str) -> Result<Table, TableError> {
        if value == ALL {
            return Ok(self.clone());
        }
        let idx = self.require_column(column)?;
        let rows = self
            .rows
            .iter()
            .filter(|row| row[idx] == value)
            .cloned()
            .collect();
        Ok(Table {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Bound rendering cost: above `max_rows`, a random sample of exactly
    /// `max_rows` distinct rows in their original order.
    pub fn sample_for_display(&self, max_rows: usize) -> Table {
        self.sample_for_display_with(max_rows, &mut rand::rng())
    }

    pub fn sample_for_display_with<R: Rng + ?Sized>(&self, max_rows: usize, rng: &mut R) -> Table {
        if self.rows.len() <= max_rows {
            return self.clone();
        }
        let mut picked = rand::seq::index::sample(rng, self.rows.len(), max_rows).into_vec();
        picked.sort_unstable();
        Table {
            columns: self.columns.clone(),
            rows: picked.into_iter().map(|i| self.rows[i].clone()).collect(),
        }
    }

    /// Sum `value_column` per distinct `group_column` value.
    ///
    /// Empty value cells are ignored and rows with an empty group key are
    /// dropped. Groups come back in numeric order when every key is a
    /// number, otherwise in lexical order.
    pub fn aggregate(
        &self,
        group_column: &str,
        value_column: &str,
    ) -> Result<Vec<GroupSum>, TableError> {
        let group_idx = self.require_column(group_column)?;
        let value_idx = self.require_column(value_column)?;
        if !self.is_numeric(value_column) {
            return Err(TableError::NotNumeric(value_column.to_string()));
        }

        let mut sums: HashMap<&str, f64> = HashMap::new();
        for row in &self.rows {
            let key = row[group_idx].as_str();
            if key.trim().is_empty() {
                continue;
            }
            let entry = sums.entry(key).or_insert(0.0);
            if let Some(v) = parse_number(row[value_idx].trim()) {
                *entry += v;
            }
        }

        let mut groups: Vec<GroupSum> = sums
            .into_iter()
            .map(|(key, sum)| GroupSum {
                key: key.to_string(),
                sum,
            })
            .collect();

        let numeric_keys: Option<Vec<f64>> =
            groups.iter().map(|g| parse_number(g.key.trim())).collect();
        match numeric_keys {
            Some(_) => groups.sort_by(|a, b| {
                let a = parse_number(a.key.trim()).unwrap_or(f64::NAN);
                let b = parse_number(b.key.trim()).unwrap_or(f64::NAN);
                a.total_cmp(&b)
            }),
            None => groups.sort_by(|a, b| a.key.cmp(&b.key)),
        }
        Ok(groups)
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}
