use std::cmp::Ordering;

use bytes::Bytes;

use crate::{codec::FromBytes, util::Status};

/// A single `(row, family, qualifier, timestamp) -> value` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub row: Bytes,
    pub family: Bytes,
    pub qualifier: Bytes,
    pub timestamp: i64,
    pub value: Bytes,
}

impl Cell {
    /// Decode the value with the byte codec.
    pub fn value_as<T: FromBytes>(&self) -> Result<T, Status> {
        T::from_bytes(&self.value)
    }

    pub fn matches(&self, family: &[u8], qualifier: &[u8]) -> bool {
        self.family.as_ref() == family && self.qualifier.as_ref() == qualifier
    }

    /// Result order: family, qualifier, then newest first.
    fn result_order(&self, other: &Cell) -> Ordering {
        self.family
            .cmp(&other.family)
            .then_with(|| self.qualifier.cmp(&other.qualifier))
            .then_with(|| other.timestamp.cmp(&self.timestamp))
    }
}

/// Cells returned for one row. Never null: a miss is an empty result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowResult {
    row: Bytes,
    cells: Vec<Cell>,
}

impl RowResult {
    pub fn new(row: Bytes, mut cells: Vec<Cell>) -> Self {
        cells.sort_by(Cell::result_order);
        RowResult { row, cells }
    }

    pub fn empty(row: Bytes) -> Self {
        RowResult {
            row,
            cells: Vec::new(),
        }
    }

    pub fn row(&self) -> &Bytes {
        &self.row
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Every cell, flattened, in result order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    /// All returned versions of one column, newest first.
    pub fn column(&self, family: &[u8], qualifier: &[u8]) -> Vec<&Cell> {
        self.cells
            .iter()
            .filter(|c| c.matches(family, qualifier))
            .collect()
    }

    pub fn column_latest(&self, family: &[u8], qualifier: &[u8]) -> Option<&Cell> {
        self.cells.iter().find(|c| c.matches(family, qualifier))
    }

    pub fn value(&self, family: &[u8], qualifier: &[u8]) -> Option<&Bytes> {
        self.column_latest(family, qualifier).map(|c| &c.value)
    }

    pub fn contains_column(&self, family: &[u8], qualifier: &[u8]) -> bool {
        self.column_latest(family, qualifier).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(f: &str, q: &str, ts: i64, v: &str) -> Cell {
        Cell {
            row: Bytes::from_static(b"r1"),
            family: Bytes::copy_from_slice(f.as_bytes()),
            qualifier: Bytes::copy_from_slice(q.as_bytes()),
            timestamp: ts,
            value: Bytes::copy_from_slice(v.as_bytes()),
        }
    }

    #[test]
    fn test_result_is_sorted_newest_first() {
        let result = RowResult::new(
            Bytes::from_static(b"r1"),
            vec![
                cell("f2", "q", 1, "a"),
                cell("f1", "q", 1, "old"),
                cell("f1", "q", 3, "new"),
            ],
        );
        let order: Vec<_> = result
            .cells()
            .iter()
            .map(|c| (c.family.clone(), c.timestamp))
            .collect();
        assert_eq!(
            order,
            vec![
                (Bytes::from_static(b"f1"), 3),
                (Bytes::from_static(b"f1"), 1),
                (Bytes::from_static(b"f2"), 1),
            ]
        );
    }

    #[test]
    fn test_column_lookup() {
        let result = RowResult::new(
            Bytes::from_static(b"r1"),
            vec![cell("f1", "q", 1, "old"), cell("f1", "q", 3, "new")],
        );
        assert!(result.contains_column(b"f1", b"q"));
        assert!(!result.contains_column(b"f1", b"other"));
        assert_eq!(result.column(b"f1", b"q").len(), 2);
        let latest = result.column_latest(b"f1", b"q").unwrap();
        assert_eq!(latest.value_as::<String>().unwrap(), "new");
        assert_eq!(result.value(b"f1", b"q").unwrap().as_ref(), b"new");
    }

    #[test]
    fn test_empty_result() {
        let result = RowResult::empty(Bytes::from_static(b"r1"));
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
        assert!(result.column_latest(b"f", b"q").is_none());
    }
}
