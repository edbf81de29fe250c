// src/multiply.rs
//! Cyclic row multiplication.
//!
//! A [`Table`] is replayed as whole passes followed by one prefix batch so
//! that header + data rows add up to exactly `target_rows`.

use crate::error::MultiplyError;

/// One record, as an ordered list of fields. Never inspected here.
pub type Row = Vec<String>;

/// Header plus a non-empty list of data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    header: Row,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(header: Option<Row>, rows: Vec<Row>) -> Result<Self, MultiplyError> {
        let header = header.ok_or(MultiplyError::MissingHeader)?;
        if rows.is_empty() {
            return Err(MultiplyError::EmptyData);
        }
        Ok(Self { header, rows })
    }

    /// Build from records in file order; the first record is the header.
    pub fn from_records<I>(records: I) -> Result<Self, MultiplyError>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut records = records.into_iter();
        let header = records.next();
        Self::new(header, records.collect())
    }

    pub fn header(&self) -> &Row {
        &self.header
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// How many whole passes and how many leading rows reach the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub full_passes: u64,
    pub partial_count: usize,
}

impl Plan {
    /// `full_passes * row_count + partial_count == target_rows - 1`.
    pub fn new(target_rows: u64, row_count: usize) -> Result<Self, MultiplyError> {
        if target_rows < 1 {
            return Err(MultiplyError::InvalidTarget(target_rows));
        }
        if row_count == 0 {
            return Err(MultiplyError::EmptyData);
        }
        let need = target_rows - 1;
        let r = row_count as u64;
        Ok(Self {
            full_passes: need / r,
            partial_count: (need % r) as usize,
        })
    }
}

/// A contiguous slice of the original rows plus the running total
/// (header included) once it has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    pub rows: &'a [Row],
    pub rows_written: u64,
}

/// Lazily yields the batches of a [`Plan`] over a borrowed [`Table`].
#[derive(Debug, Clone)]
pub struct Multiplied<'a> {
    table: &'a Table,
    plan: Plan,
    target_rows: u64,
    passes_done: u64,
    partial_done: bool,
    rows_written: u64,
}

impl<'a> Multiplied<'a> {
    pub fn header(&self) -> &'a Row {
        &self.table.header
    }

    /// Every batch is a prefix of these rows.
    pub fn rows(&self) -> &'a [Row] {
        &self.table.rows
    }

    pub fn plan(&self) -> Plan {
        self.plan
    }

    pub fn target_rows(&self) -> u64 {
        self.target_rows
    }

    /// Rows accounted for so far, header included.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

impl<'a> Iterator for Multiplied<'a> {
    type Item = Batch<'a>;

    fn next(&mut self) -> Option<Batch<'a>> {
        let rows = if self.passes_done < self.plan.full_passes {
            self.passes_done += 1;
            self.table.rows.as_slice()
        } else if !self.partial_done && self.plan.partial_count > 0 {
            self.partial_done = true;
            &self.table.rows[..self.plan.partial_count]
        } else {
            return None;
        };
        self.rows_written += rows.len() as u64;
        Some(Batch {
            rows,
            rows_written: self.rows_written,
        })
    }
}

/// Plan the multiplication of `table` up to `target_rows` total rows.
///
/// All preconditions are checked here, before a single batch exists.
pub fn multiply(table: &Table, target_rows: u64) -> Result<Multiplied<'_>, MultiplyError> {
    let plan = Plan::new(target_rows, table.row_count())?;
    Ok(Multiplied {
        table,
        plan,
        target_rows,
        passes_done: 0,
        partial_done: false,
        rows_written: 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Row {
        fields.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Table {
        Table::new(
            Some(row(&["a", "b"])),
            vec![row(&["1", "2"]), row(&["3", "4"]), row(&["5", "6"])],
        )
        .unwrap()
    }

    fn flatten(table: &Table, target: u64) -> Vec<Row> {
        multiply(table, target)
            .unwrap()
            .flat_map(|b| b.rows.iter().cloned())
            .collect()
    }

    #[test]
    fn exact_multiple_has_no_partial_batch() {
        let table = sample();
        let m = multiply(&table, 7).unwrap();
        assert_eq!(
            m.plan(),
            Plan {
                full_passes: 2,
                partial_count: 0
            }
        );
        let batches: Vec<_> = m.collect();
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.rows == table.rows()));
        assert_eq!(batches.last().unwrap().rows_written, 7);
    }

    #[test]
    fn remainder_takes_prefix() {
        let table = sample();
        let out = flatten(&table, 8);
        assert_eq!(out.len(), 7);
        assert_eq!(&out[..3], table.rows());
        assert_eq!(&out[3..6], table.rows());
        assert_eq!(out[6], row(&["1", "2"]));
    }

    #[test]
    fn target_one_is_header_only() {
        let table = sample();
        let mut m = multiply(&table, 1).unwrap();
        assert_eq!(
            m.plan(),
            Plan {
                full_passes: 0,
                partial_count: 0
            }
        );
        assert!(m.next().is_none());
        assert_eq!(m.rows_written(), 1);
        assert_eq!(m.header(), &row(&["a", "b"]));
    }

    #[test]
    fn target_below_row_count() {
        let table = sample();
        let m = multiply(&table, 3).unwrap();
        assert_eq!(
            m.plan(),
            Plan {
                full_passes: 0,
                partial_count: 2
            }
        );
        let out = flatten(&table, 3);
        assert_eq!(out, table.rows()[..2].to_vec());
    }

    #[test]
    fn row_count_and_cyclic_order_hold_everywhere() {
        for r in 1..=6usize {
            let rows: Vec<Row> = (0..r).map(|i| vec![i.to_string()]).collect();
            let table = Table::new(Some(row(&["n"])), rows).unwrap();
            for target in 1..=40u64 {
                let plan = Plan::new(target, r).unwrap();
                assert_eq!(
                    plan.full_passes * r as u64 + plan.partial_count as u64,
                    target - 1
                );
                assert!(plan.partial_count < r);

                let out = flatten(&table, target);
                assert_eq!(out.len() as u64, target - 1);
                for (i, got) in out.iter().enumerate() {
                    assert_eq!(got, &table.rows()[i % r]);
                }
            }
        }
    }

    #[test]
    fn running_total_reaches_target() {
        let table = sample();
        let mut m = multiply(&table, 11).unwrap();
        let totals: Vec<u64> = m.by_ref().map(|b| b.rows_written).collect();
        assert_eq!(totals, vec![4, 7, 10, 11]);
        assert_eq!(m.rows_written(), m.target_rows());
    }

    #[test]
    fn stops_early_when_caller_stops() {
        let table = sample();
        let mut m = multiply(&table, 1_000_000).unwrap();
        let first = m.next().unwrap();
        assert_eq!(first.rows_written, 4);
        assert_eq!(m.rows_written(), 4);
    }

    #[test]
    fn empty_data_is_rejected() {
        assert_eq!(
            Table::new(Some(row(&["a"])), Vec::new()),
            Err(MultiplyError::EmptyData)
        );
        assert_eq!(
            Table::from_records(vec![row(&["a"])]),
            Err(MultiplyError::EmptyData)
        );
    }

    #[test]
    fn missing_header_is_rejected_first() {
        assert_eq!(
            Table::from_records(Vec::<Row>::new()),
            Err(MultiplyError::MissingHeader)
        );
        assert_eq!(Table::new(None, Vec::new()), Err(MultiplyError::MissingHeader));
    }

    #[test]
    fn zero_target_is_rejected() {
        let table = sample();
        assert_eq!(
            multiply(&table, 0).unwrap_err(),
            MultiplyError::InvalidTarget(0)
        );
    }

    #[test]
    fn from_records_splits_header() {
        let table = Table::from_records(vec![row(&["h"]), row(&["x"]), row(&["y"])]).unwrap();
        assert_eq!(table.header(), &row(&["h"]));
        assert_eq!(table.row_count(), 2);
    }
}
