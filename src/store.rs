//! In-memory column store for one imported CSV file.
//!
//! A [`Table`] keeps its columns in header order and a name -> position side
//! table that is rebuilt after every structural change, so the order and the
//! lookup can never disagree.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use log::debug;

use crate::{
    error::ReconcileError,
    metadata::{self, ColumnType},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<String>,
    pub column_type: ColumnType,
    pub has_variable_content: bool,
    /// Canonical term this column's name already resolves to, for display.
    pub alias: Option<String>,
}

impl Column {
    fn new(name: String, values: Vec<String>) -> Self {
        let column_type = metadata::infer_column_type(&values);
        let has_variable_content = metadata::has_variable_content(&values);
        Self {
            name,
            values,
            column_type,
            has_variable_content,
            alias: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
    positions: HashMap<String, usize>,
}

impl Table {
    /// Builds a table from a header row and its data rows. Every data row must
    /// have exactly one value per header field and header names must be unique
    /// and non-empty.
    pub fn build(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let expected = header.len();
        let mut seen = HashSet::with_capacity(expected);
        for (idx, name) in header.iter().enumerate() {
            if name.is_empty() {
                return Err(ReconcileError::EmptyHeader { column: idx + 1 }.into());
            }
            if !seen.insert(name.as_str()) {
                return Err(ReconcileError::DuplicateHeader(name.clone()).into());
            }
        }
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(ReconcileError::MalformedInput {
                    row: idx + 2,
                    expected,
                    found: row.len(),
                }
                .into());
            }
        }

        let mut values: Vec<Vec<String>> = (0..expected)
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for row in rows {
            for (column, value) in values.iter_mut().zip(row) {
                column.push(value);
            }
        }
        let columns = header
            .into_iter()
            .zip(values)
            .map(|(name, values)| Column::new(name, values))
            .collect();

        let mut table = Self {
            columns,
            positions: HashMap::new(),
        };
        table.reindex();
        debug!(
            "Imported {} column(s) across {} row(s)",
            table.columns.len(),
            table.row_count()
        );
        Ok(table)
    }

    /// Splits raw records into header and data rows and builds the table.
    pub fn from_records(mut records: Vec<Vec<String>>) -> Result<Self> {
        if records.is_empty() {
            return Err(ReconcileError::MissingHeader.into());
        }
        let rows = records.split_off(1);
        let header = records.pop().unwrap_or_default();
        Self::build(header, rows)
    }

    fn reindex(&mut self) {
        self.positions = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| (column.name.clone(), idx))
            .collect();
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn column(&self, term: &str) -> Option<&Column> {
        self.positions.get(term).map(|&idx| &self.columns[idx])
    }

    pub fn contains(&self, term: &str) -> bool {
        self.positions.contains_key(term)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.columns
            .first()
            .map(|column| column.values.len())
            .unwrap_or(0)
    }

    /// Terms whose values are all identical, in table order.
    pub fn removal_candidates(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|column| !column.has_variable_content)
            .map(|column| column.name.clone())
            .collect()
    }

    pub fn annotate_aliases<'a, F>(&mut self, mut lookup: F)
    where
        F: FnMut(&str) -> Option<&'a str>,
    {
        for column in &mut self.columns {
            column.alias = lookup(&column.name).map(str::to_string);
        }
    }

    /// Drops `term`; the remaining columns keep their order. Unknown terms are ignored.
    pub fn remove(&mut self, term: &str) {
        let Some(&idx) = self.positions.get(term) else {
            return;
        };
        self.columns.remove(idx);
        self.reindex();
    }

    /// Renames `old` to `new` in place. If `new` already names a different
    /// column, that column is replaced by the renamed one.
    pub fn rename(&mut self, old: &str, new: &str) {
        if old == new || !self.positions.contains_key(old) {
            return;
        }
        if let Some(&existing) = self.positions.get(new) {
            debug!("Renaming '{old}' to '{new}' replaces the existing '{new}' column");
            self.columns.remove(existing);
            self.reindex();
        }
        if let Some(&idx) = self.positions.get(old) {
            self.columns[idx].name = new.to_string();
        }
        self.reindex();
    }

    /// Produces the header and the row-major data in current term order.
    pub fn export(&self) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let header = self.terms().map(str::to_string).collect::<Vec<_>>();
        let row_count = self.row_count();
        for column in &self.columns {
            if column.values.len() != row_count {
                return Err(ReconcileError::InconsistentColumnLength {
                    term: column.name.clone(),
                    expected: row_count,
                    found: column.values.len(),
                }
                .into());
            }
        }
        let rows = (0..row_count)
            .map(|idx| {
                self.columns
                    .iter()
                    .map(|column| column.values[idx].clone())
                    .collect()
            })
            .collect();
        Ok((header, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn sample() -> Table {
        Table::build(
            strings(&["a", "b", "c"]),
            vec![strings(&["1", "x", "p"]), strings(&["2", "x", "q"])],
        )
        .expect("table")
    }

    #[test]
    fn build_rejects_short_rows() {
        let err = Table::build(strings(&["a", "b"]), vec![strings(&["1"])]).unwrap_err();
        match err.downcast_ref::<ReconcileError>() {
            Some(ReconcileError::MalformedInput {
                row,
                expected,
                found,
            }) => {
                assert_eq!((*row, *expected, *found), (2, 2, 1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn build_rejects_duplicate_headers() {
        let err = Table::build(strings(&["a", "a"]), Vec::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReconcileError>(),
            Some(ReconcileError::DuplicateHeader(name)) if name == "a"
        ));
    }

    #[test]
    fn build_rejects_unnamed_columns() {
        let err = Table::build(strings(&["a", ""]), vec![strings(&["1", "2"])]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReconcileError>(),
            Some(ReconcileError::EmptyHeader { column: 2 })
        ));
    }

    #[test]
    fn from_records_requires_a_header() {
        let err = Table::from_records(Vec::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReconcileError>(),
            Some(ReconcileError::MissingHeader)
        ));
    }

    #[test]
    fn constant_columns_are_removal_candidates() {
        assert_eq!(sample().removal_candidates(), vec!["b"]);
    }

    #[test]
    fn remove_keeps_order_and_ignores_unknown_terms() {
        let mut table = sample();
        table.remove("zzz");
        table.remove("b");
        assert_eq!(table.terms().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(table.column("b").is_none());
        assert_eq!(table.column("c").expect("c").values, strings(&["p", "q"]));
    }

    #[test]
    fn rename_preserves_position() {
        let mut table = sample();
        table.rename("b", "basisOfRecord");
        table.rename("missing", "x");
        assert_eq!(
            table.terms().collect::<Vec<_>>(),
            vec!["a", "basisOfRecord", "c"]
        );
        assert!(!table.contains("b"));
        assert_eq!(
            table.column("basisOfRecord").expect("renamed").values,
            strings(&["x", "x"])
        );
    }

    #[test]
    fn rename_onto_existing_term_collapses_columns() {
        let mut table = sample();
        table.rename("c", "a");
        let (header, rows) = table.export().expect("export");
        assert_eq!(header, strings(&["b", "a"]));
        assert_eq!(rows, vec![strings(&["x", "p"]), strings(&["x", "q"])]);
    }

    #[test]
    fn export_detects_ragged_columns() {
        let mut table = sample();
        table.columns[1].values.pop();
        let err = table.export().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReconcileError>(),
            Some(ReconcileError::InconsistentColumnLength { term, .. }) if term == "b"
        ));
    }
}
