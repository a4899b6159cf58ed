//! Row aliasing.
//!
//! Column requests that target the same row of the same bank are row-buffer hits for
//! each other: the row needs to be activated only once to serve all of them. The
//! aliaser collects such requests into [`RowGroup`]s.

use crate::DRAMAddr;
use crate::util::GroupBy;
use log::debug;
use serde::Serialize;
use std::fmt;

/// Identifier of a [`RowGroup`] within one scheduling call.
///
/// Ids are 1-based and dense, assigned in order of first occurrence.
pub type RowGroupId = usize;

/// Column requests sharing one DRAM row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowGroup {
    /// Diagnostic id, see [`RowGroupId`]
    pub id: RowGroupId,
    /// Bank group number
    pub bank_group: usize,
    /// Bank number
    pub bank: usize,
    /// Row number
    pub row: usize,
    /// Columns to read, in arrival order. Repeated columns are kept.
    pub columns: Vec<usize>,
}

impl RowGroup {
    /// The (bank group, bank) pair this row lives in.
    pub fn bank_key(&self) -> (usize, usize) {
        (self.bank_group, self.bank)
    }
}

impl fmt::Display for RowGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ID {}: Bank Group {} Bank {} Row {} -> Columns:",
            self.id, self.bank_group, self.bank, self.row
        )?;
        for col in &self.columns {
            write!(f, " {}", col)?;
        }
        Ok(())
    }
}

/// Partitions requests into row groups.
///
/// Groups are ordered by the first request that touched their row.
pub fn alias_rows(requests: &[DRAMAddr]) -> Vec<RowGroup> {
    let groups = requests
        .iter()
        .group_by(|addr| addr.row_key())
        .into_iter()
        .enumerate()
        .map(|(i, ((bank_group, bank, row), addrs))| RowGroup {
            id: i + 1,
            bank_group,
            bank,
            row,
            columns: addrs.iter().map(|addr| addr.col).collect(),
        })
        .collect::<Vec<_>>();
    for group in &groups {
        debug!("{}", group);
    }
    groups
}

/// Looks up a row group by id.
pub fn find_row_group(groups: &[RowGroup], id: RowGroupId) -> Option<&RowGroup> {
    id.checked_sub(1)
        .and_then(|idx| groups.get(idx))
        .filter(|group| group.id == id)
}

#[cfg(test)]
mod tests {
    use super::{alias_rows, find_row_group};
    use crate::DRAMAddr;

    fn reference_batch() -> Vec<DRAMAddr> {
        vec![
            DRAMAddr::new(0, 0, 1, 6),
            DRAMAddr::new(0, 0, 2, 5),
            DRAMAddr::new(0, 0, 1, 3),
            DRAMAddr::new(0, 0, 4, 4),
            DRAMAddr::new(2, 1, 2, 2),
        ]
    }

    #[test]
    fn test_reference_batch() {
        let groups = alias_rows(&reference_batch());
        let summary = groups
            .iter()
            .map(|g| (g.id, g.bank_group, g.bank, g.row, g.columns.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                (1, 0, 0, 1, vec![6, 3]),
                (2, 0, 0, 2, vec![5]),
                (3, 0, 0, 4, vec![4]),
                (4, 2, 1, 2, vec![2]),
            ]
        );
    }

    #[test]
    fn test_same_row_different_bank_is_not_aliased() {
        let groups = alias_rows(&[
            DRAMAddr::new(0, 0, 3, 1),
            DRAMAddr::new(0, 1, 3, 1),
            DRAMAddr::new(1, 0, 3, 1),
        ]);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_duplicate_columns_are_kept() {
        let groups = alias_rows(&[
            DRAMAddr::new(0, 0, 3, 1),
            DRAMAddr::new(0, 0, 3, 1),
            DRAMAddr::new(0, 0, 3, 2),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].columns, vec![1, 1, 2]);
    }

    #[test]
    fn test_empty_batch() {
        assert!(alias_rows(&[]).is_empty());
    }

    #[test]
    fn test_find_row_group() {
        let groups = alias_rows(&reference_batch());
        assert_eq!(find_row_group(&groups, 3).map(|g| g.row), Some(4));
        assert!(find_row_group(&groups, 0).is_none());
        assert!(find_row_group(&groups, 5).is_none());
    }

    #[test]
    fn test_display() {
        let groups = alias_rows(&reference_batch());
        assert_eq!(
            groups[0].to_string(),
            "ID 1: Bank Group 0 Bank 0 Row 1 -> Columns: 6 3"
        );
    }
}
