//! Bank conflict grouping.
//!
//! A bank has a single row buffer, so two row groups in the same bank cannot be open
//! at the same time. The grouper collects those conflicting row groups into one
//! [`BankQueue`] that the scheduler serves row by row.

use crate::alias::{RowGroup, RowGroupId, find_row_group};
use crate::util::GroupBy;
use log::debug;
use serde::Serialize;
use std::fmt;

/// Row groups competing for the row buffer of one bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankQueue {
    /// Bank group number
    pub bank_group: usize,
    /// Bank number
    pub bank: usize,
    /// Row group ids in the order the aliaser produced them
    pub rows: Vec<RowGroupId>,
}

impl BankQueue {
    /// Resolves the queued row group ids against the aliaser output.
    pub fn row_groups<'a>(&'a self, groups: &'a [RowGroup]) -> impl Iterator<Item = &'a RowGroup> {
        self.rows.iter().filter_map(|&id| find_row_group(groups, id))
    }
}

impl fmt::Display for BankQueue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Bank Group {} Bank {} Row(s)",
            self.bank_group, self.bank
        )?;
        for id in &self.rows {
            write!(f, " {}", id)?;
        }
        Ok(())
    }
}

/// Partitions row groups into bank queues ordered by first occurrence of the bank.
pub fn group_banks(groups: &[RowGroup]) -> Vec<BankQueue> {
    let queues = groups
        .iter()
        .group_by(|group| group.bank_key())
        .into_iter()
        .map(|((bank_group, bank), rows)| BankQueue {
            bank_group,
            bank,
            rows: rows.iter().map(|group| group.id).collect(),
        })
        .collect::<Vec<_>>();
    for (i, queue) in queues.iter().enumerate() {
        debug!("{}: {}", i + 1, queue);
    }
    queues
}
