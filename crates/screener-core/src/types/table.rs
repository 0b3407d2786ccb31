//! Symbol-keyed score table.
//!
//! `ScoreTable` is the working set every screener and finder passes around:
//! rows keyed by ticker symbol, ordered named columns, cells that are numbers,
//! text, flags or empty. It supports the handful of operations the ranking
//! pipelines need (merge on symbol, filter, sort, fill, round, weighted sum).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::error::StatsError;

/// Name of the implicit key column.
pub const SYMBOL_COLUMN: &str = "symbol";

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    /// Numeric value (never NaN or infinite)
    Number(f64),
    /// Boolean flag
    Flag(bool),
    /// Free text
    Text(String),
    /// Missing value
    #[default]
    Empty,
}

impl Cell {
    /// Numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Text value, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Check if the cell is empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            Cell::Number(value)
        } else {
            Cell::Empty
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::from).unwrap_or(Cell::Empty)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Flag(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map(Cell::Text).unwrap_or(Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Flag(b) => write!(f, "{}", b),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Empty => Ok(()),
        }
    }
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    /// Ticker symbol
    pub symbol: String,
    cells: Vec<(String, Cell)>,
}

impl ScoreRow {
    /// Create an empty row for a symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            cells: Vec::new(),
        }
    }

    /// Builder-style cell setter.
    pub fn with(mut self, column: &str, value: impl Into<Cell>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a cell, replacing any existing value.
    pub fn set(&mut self, column: &str, value: impl Into<Cell>) {
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| name == column) {
            Some((_, cell)) => *cell = value,
            None => self.cells.push((column.to_string(), value)),
        }
    }

    /// Get a cell.
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    /// Numeric value of a cell.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Cell::as_number)
    }

    /// Text value of a cell.
    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Cell::as_text)
    }

    /// Column names present in this row, in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    fn remove(&mut self, column: &str) {
        self.cells.retain(|(name, _)| name != column);
    }

    fn rename(&mut self, from: &str, to: &str) {
        self.remove(to);
        for (name, _) in self.cells.iter_mut() {
            if name == from {
                *name = to.to_string();
            }
        }
    }
}

/// How two tables are joined on symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    /// Only symbols present on both sides
    Inner,
    /// Every left symbol; right columns empty when missing
    Left,
    /// Every symbol from either side
    Outer,
}

/// Symbol-keyed table of named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    columns: Vec<String>,
    rows: Vec<ScoreRow>,
}

impl ScoreTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with a fixed column layout.
    pub fn with_columns(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from rows.
    pub fn from_rows(rows: impl IntoIterator<Item = ScoreRow>) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.push(row);
        }
        table
    }

    /// Append a row; new column names are added in the row's order.
    pub fn push(&mut self, row: ScoreRow) {
        for name in row.column_names() {
            if !self.columns.iter().any(|c| c == name) {
                self.columns.push(name.to_string());
            }
        }
        self.rows.push(row);
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names (excluding the symbol key).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// All rows.
    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    /// Symbols in row order.
    pub fn symbols(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.symbol.clone()).collect()
    }

    /// Row for a symbol.
    pub fn get(&self, symbol: &str) -> Option<&ScoreRow> {
        self.rows.iter().find(|r| r.symbol == symbol)
    }

    /// Check if a symbol is present.
    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    /// Cell at (symbol, column).
    pub fn cell(&self, symbol: &str, column: &str) -> Option<&Cell> {
        self.get(symbol).and_then(|r| r.get(column))
    }

    /// Numeric value at (symbol, column).
    pub fn number(&self, symbol: &str, column: &str) -> Option<f64> {
        self.get(symbol).and_then(|r| r.number(column))
    }

    /// Numeric values of a column in row order.
    pub fn column(&self, column: &str) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.number(column)).collect()
    }

    /// Columns whose non-empty cells are all numbers (and at least one is).
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|name| {
                let mut seen = false;
                for row in &self.rows {
                    match row.get(name) {
                        Some(Cell::Number(_)) => seen = true,
                        Some(Cell::Empty) | None => {}
                        Some(_) => return false,
                    }
                }
                seen
            })
            .cloned()
            .collect()
    }

    /// Replace a column with numeric values in row order.
    pub fn set_column(&mut self, column: &str, values: Vec<Option<f64>>) -> Result<(), StatsError> {
        if values.len() != self.rows.len() {
            return Err(StatsError::InvalidParameter(format!(
                "column {} has {} values for {} rows",
                column,
                values.len(),
                self.rows.len()
            )));
        }
        self.ensure_column(column);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.set(column, value);
        }
        Ok(())
    }

    /// Compute a column from each row.
    pub fn derive_column<F>(&mut self, column: &str, f: F)
    where
        F: Fn(&ScoreRow) -> Option<f64>,
    {
        self.ensure_column(column);
        for row in self.rows.iter_mut() {
            let value = f(row);
            row.set(column, value);
        }
    }

    /// Transform a numeric column in place.
    pub fn map_column<F>(&mut self, column: &str, f: F)
    where
        F: Fn(Option<f64>) -> Option<f64>,
    {
        self.ensure_column(column);
        for row in self.rows.iter_mut() {
            let value = f(row.number(column));
            row.set(column, value);
        }
    }

    /// Keep rows matching a predicate.
    pub fn retain<F>(&mut self, f: F)
    where
        F: Fn(&ScoreRow) -> bool,
    {
        self.rows.retain(|r| f(r));
    }

    /// Keep rows whose value is `>= min`. Empty cells are dropped.
    pub fn retain_at_least(&mut self, column: &str, min: f64) {
        self.retain(|r| r.number(column).map_or(false, |v| v >= min));
    }

    /// Keep rows whose value is `<= max`. Empty cells are dropped.
    pub fn retain_at_most(&mut self, column: &str, max: f64) {
        self.retain(|r| r.number(column).map_or(false, |v| v <= max));
    }

    /// Keep rows whose value is `< max`. Empty cells are dropped.
    pub fn retain_below(&mut self, column: &str, max: f64) {
        self.retain(|r| r.number(column).map_or(false, |v| v < max));
    }

    /// Stable sort by a numeric column; empty cells always sort last.
    pub fn sort_by(&mut self, column: &str, descending: bool) {
        self.rows.sort_by(|a, b| {
            match (a.number(column), b.number(column)) {
                (Some(x), Some(y)) => {
                    let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                    if descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }

    /// Keep the first `n` rows.
    pub fn head(&mut self, n: usize) {
        self.rows.truncate(n);
    }

    /// Keep only the named columns, in the given order.
    pub fn select(&mut self, columns: &[&str]) {
        let keep: Vec<String> = columns
            .iter()
            .filter(|c| self.has_column(c))
            .map(|c| c.to_string())
            .collect();
        for row in self.rows.iter_mut() {
            row.cells.retain(|(name, _)| keep.contains(name));
        }
        self.columns = keep;
    }

    /// Remove the named columns.
    pub fn drop_columns(&mut self, columns: &[&str]) {
        self.columns.retain(|c| !columns.contains(&c.as_str()));
        for row in self.rows.iter_mut() {
            for column in columns {
                row.remove(column);
            }
        }
    }

    /// Remove all columns starting with `prefix`.
    pub fn drop_columns_with_prefix(&mut self, prefix: &str) {
        let names: Vec<String> = self
            .columns
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        self.drop_columns(&refs);
    }

    /// Rename a column.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        if !self.has_column(from) {
            return;
        }
        self.columns.retain(|c| c != to);
        for name in self.columns.iter_mut() {
            if name == from {
                *name = to.to_string();
            }
        }
        for row in self.rows.iter_mut() {
            row.rename(from, to);
        }
    }

    /// Join with another table on symbol.
    ///
    /// Right-hand columns are appended after the left-hand ones. When both
    /// sides carry the same column the left value wins. Duplicate symbols on
    /// the right use the first occurrence.
    pub fn merge(&self, other: &ScoreTable, join: Join) -> ScoreTable {
        let mut index: HashMap<&str, &ScoreRow> = HashMap::new();
        for row in &other.rows {
            index.entry(row.symbol.as_str()).or_insert(row);
        }

        let mut columns = self.columns.clone();
        let mut added = Vec::new();
        for name in &other.columns {
            if !columns.contains(name) {
                columns.push(name.clone());
                added.push(name.clone());
            }
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let matched = index.get(row.symbol.as_str());
            if matched.is_none() && join == Join::Inner {
                continue;
            }
            let mut merged = row.clone();
            for name in &added {
                let value = matched
                    .and_then(|r| r.get(name))
                    .cloned()
                    .unwrap_or(Cell::Empty);
                merged.set(name, value);
            }
            rows.push(merged);
        }

        if join == Join::Outer {
            for row in &other.rows {
                if self.contains(&row.symbol) || rows.iter().any(|r| r.symbol == row.symbol) {
                    continue;
                }
                let mut merged = ScoreRow::new(row.symbol.clone());
                for name in &columns {
                    let value = row.get(name).cloned().unwrap_or(Cell::Empty);
                    merged.set(name, value);
                }
                rows.push(merged);
            }
        }

        ScoreTable { columns, rows }
    }

    /// Replace every empty cell with a number.
    pub fn fill_empty(&mut self, value: f64) {
        let columns = self.columns.clone();
        for row in self.rows.iter_mut() {
            for name in &columns {
                let empty = row.get(name).map_or(true, Cell::is_empty);
                if empty {
                    row.set(name, value);
                }
            }
        }
    }

    /// Round every numeric cell to `precision` decimal places.
    pub fn round(&mut self, precision: u32) {
        for row in self.rows.iter_mut() {
            for (_, cell) in row.cells.iter_mut() {
                if let Cell::Number(v) = cell {
                    *v = round_to(*v, precision);
                }
            }
        }
    }

    /// Write `target = sum(weight * column)`. A row with any empty input gets an empty result.
    pub fn weighted_sum(&mut self, target: &str, weights: &[(&str, f64)]) {
        self.derive_column(target, |row| {
            weights.iter().try_fold(0.0, |acc, (column, weight)| {
                row.number(column).map(|v| acc + v * weight)
            })
        });
    }

    /// Reorder rows to follow the symbol order of `reference`.
    ///
    /// Symbols missing from `reference` keep their relative order at the end.
    pub fn align_to(&mut self, reference: &ScoreTable) {
        let position: HashMap<&str, usize> = reference
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.symbol.as_str(), i))
            .collect();
        let mut rows = std::mem::take(&mut self.rows);
        rows.sort_by_key(|r| position.get(r.symbol.as_str()).copied().unwrap_or(usize::MAX));
        self.rows = rows;
    }

    fn ensure_column(&mut self, column: &str) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
    }
}

/// Round to `precision` decimal places, half away from zero.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
