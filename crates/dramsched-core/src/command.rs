use crate::timing::Cycle;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// DRAM device command.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    /// Opens a row into the row buffer of a bank
    Activate,
    /// Transfers one column of the open row
    Read,
    /// Closes the open row of a bank
    Precharge,
}

impl Display for CommandKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            CommandKind::Activate => f.pad("ACT"),
            CommandKind::Read => f.pad("RD"),
            CommandKind::Precharge => f.pad("PRE"),
        }
    }
}

/// A device command with its issue cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduledCommand {
    /// Command type
    pub kind: CommandKind,
    /// Bank group number
    pub bank_group: usize,
    /// Bank number
    pub bank: usize,
    /// Row for ACTIVATE and PRECHARGE, column for READ
    pub address: usize,
    /// Cycle at which the command is put on the command bus
    pub issue_cycle: Cycle,
}

impl ScheduledCommand {
    /// ACTIVATE of `row` at `issue_cycle`.
    pub fn activate(bank_group: usize, bank: usize, row: usize, issue_cycle: Cycle) -> Self {
        Self::new(CommandKind::Activate, bank_group, bank, row, issue_cycle)
    }

    /// READ of `col` at `issue_cycle`.
    pub fn read(bank_group: usize, bank: usize, col: usize, issue_cycle: Cycle) -> Self {
        Self::new(CommandKind::Read, bank_group, bank, col, issue_cycle)
    }

    /// PRECHARGE of `row` at `issue_cycle`.
    pub fn precharge(bank_group: usize, bank: usize, row: usize, issue_cycle: Cycle) -> Self {
        Self::new(CommandKind::Precharge, bank_group, bank, row, issue_cycle)
    }

    fn new(
        kind: CommandKind,
        bank_group: usize,
        bank: usize,
        address: usize,
        issue_cycle: Cycle,
    ) -> Self {
        ScheduledCommand {
            kind,
            bank_group,
            bank,
            address,
            issue_cycle,
        }
    }

    /// The (bank group, bank) pair this command targets.
    pub fn bank_key(&self) -> (usize, usize) {
        (self.bank_group, self.bank)
    }
}

impl Display for ScheduledCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let addr = match self.kind {
            CommandKind::Read => "Col",
            CommandKind::Activate | CommandKind::Precharge => "Row",
        };
        write!(
            f,
            "{:>6}: {:<3} Bank Group {} Bank {} {} {}",
            self.issue_cycle, self.kind, self.bank_group, self.bank, addr, self.address
        )
    }
}
