use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// DRAM address with bank group, bank, row, and column components.
///
/// Represents the location of a single column access inside one channel.
/// Only produced from a [`ColumnRequest`](crate::ColumnRequest) that passed ingestion.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DRAMAddr {
    /// Bank group number
    pub bank_group: usize,
    /// Bank number within the bank group
    pub bank: usize,
    /// Row number
    pub row: usize,
    /// Column number
    pub col: usize,
}

impl Display for DRAMAddr {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(
            fmt,
            "({}, {}, {}, {})",
            self.bank_group, self.bank, self.row, self.col
        )
    }
}

impl DRAMAddr {
    /// Creates a new DRAM address.
    ///
    /// # Arguments
    ///
    /// * `bank_group` - Bank group number
    /// * `bank` - Bank number
    /// * `row` - Row number
    /// * `col` - Column number
    pub fn new(bank_group: usize, bank: usize, row: usize, col: usize) -> Self {
        DRAMAddr {
            bank_group,
            bank,
            row,
            col,
        }
    }

    /// The (bank group, bank) pair identifying the row buffer this address uses.
    pub fn bank_key(&self) -> (usize, usize) {
        (self.bank_group, self.bank)
    }

    /// The (bank group, bank, row) triple identifying the DRAM row.
    pub fn row_key(&self) -> (usize, usize, usize) {
        (self.bank_group, self.bank, self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::DRAMAddr;

    #[test]
    fn test_keys() {
        let addr = DRAMAddr::new(2, 1, 7, 3);
        assert_eq!(addr.bank_key(), (2, 1));
        assert_eq!(addr.row_key(), (2, 1, 7));
        assert_eq!(addr.to_string(), "(2, 1, 7, 3)");
    }
}
