//! Independent schedule checking.
//!
//! [`verify_schedule`] re-checks a command stream against a [`TimingParams`] set
//! without using the [`TimingTracker`](crate::TimingTracker). It checks the
//! bank protocol (a READ needs an open row, an ACTIVATE needs a closed bank, a
//! PRECHARGE closes the open row), every pairwise spacing rule and the four-activate
//! window.

use crate::timing::{ConfigError, Cycle, Spacing, TimingParams};
use crate::util::FAW_ACTIVATES;
use crate::{CommandKind, ScheduledCommand};
use itertools::Itertools;
use std::collections::HashMap;
use thiserror::Error;

/// A property of the command stream that does not hold.
#[derive(Debug, Error)]
pub enum Violation {
    /// Issue cycles decrease between two consecutive commands.
    #[error("Command {index} issues at {cycle}, before its predecessor at {previous}")]
    NotMonotonic {
        /// Position of the offending command
        index: usize,
        /// Its issue cycle
        cycle: Cycle,
        /// Issue cycle of the preceding command
        previous: Cycle,
    },
    /// A command is illegal in the current state of its bank.
    #[error("Command {index} ({command}) is illegal: {reason}")]
    Protocol {
        /// Position of the offending command
        index: usize,
        /// The offending command
        command: ScheduledCommand,
        /// What is wrong
        reason: &'static str,
    },
    /// Two commands are closer than a timing parameter allows.
    #[error("{constraint} violated: {earlier} and {later} are {actual} cycles apart, need {required}")]
    Spacing {
        /// Name of the timing parameter
        constraint: &'static str,
        /// The earlier command
        earlier: ScheduledCommand,
        /// The later command
        later: ScheduledCommand,
        /// Minimum distance
        required: Cycle,
        /// Actual distance
        actual: Cycle,
    },
    /// Five ACTIVATEs issue within one tFAW window.
    #[error("Five activates between cycle {first} and {fifth}, tFAW is {t_faw}")]
    FourActivateWindow {
        /// Cycle of the first activate
        first: Cycle,
        /// Cycle of the fifth activate
        fifth: Cycle,
        /// Window size
        t_faw: Cycle,
    },
    /// The timing parameters are invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

/// Returns the spacing rule that applies from `a` to a later `b`, if any.
fn required_spacing(
    s: &Spacing,
    a: &ScheduledCommand,
    b: &ScheduledCommand,
) -> Option<(&'static str, Cycle)> {
    use CommandKind::*;
    let same_group = a.bank_group == b.bank_group;
    let same_bank = a.bank_key() == b.bank_key();
    match (a.kind, b.kind) {
        (Activate, Activate) if same_group => Some(("tRRD_sg", s.t_rrd_sg)),
        (Activate, Activate) => Some(("tRRD_dg", s.t_rrd_dg)),
        (Read, Read) if same_group => Some(("tRDRD_sg", s.t_rdrd_sg)),
        (Read, Read) => Some(("tRDRD_dg", s.t_rdrd_dg)),
        (Activate, Read) if same_bank => Some(("tRCD", s.t_rcd)),
        (Activate, Precharge) if same_bank => Some(("tRAS", s.t_ras)),
        (Read, Precharge) if same_bank => Some(("tRTP", s.t_rtp)),
        (Precharge, Activate) if same_bank => Some(("tRP", s.t_rp)),
        _ => None,
    }
}

fn check_protocol(commands: &[ScheduledCommand]) -> Result<(), Violation> {
    let mut open_rows: HashMap<(usize, usize), usize> = HashMap::new();
    for (index, command) in commands.iter().enumerate() {
        let open = open_rows.get(&command.bank_key()).copied();
        let reason = match (command.kind, open) {
            (CommandKind::Activate, Some(_)) => Some("bank already has an open row"),
            (CommandKind::Activate, None) => {
                open_rows.insert(command.bank_key(), command.address);
                None
            }
            (CommandKind::Read, None) => Some("bank has no open row"),
            (CommandKind::Read, Some(_)) => None,
            (CommandKind::Precharge, Some(row)) if row == command.address => {
                open_rows.remove(&command.bank_key());
                None
            }
            (CommandKind::Precharge, Some(_)) => Some("precharged row is not the open row"),
            (CommandKind::Precharge, None) => Some("bank has no open row"),
        };
        if let Some(reason) = reason {
            return Err(Violation::Protocol {
                index,
                command: *command,
                reason,
            });
        }
    }
    Ok(())
}

/// Checks a command stream sorted by issue cycle.
///
/// # Errors
///
/// Returns the first [`Violation`] found, or [`Violation::Configuration`] if `params`
/// is invalid.
pub fn verify_schedule(
    commands: &[ScheduledCommand],
    params: &TimingParams,
) -> Result<(), Violation> {
    let spacing = Spacing::try_from(params)?;

    for (index, (prev, cmd)) in commands.iter().tuple_windows().enumerate() {
        if cmd.issue_cycle < prev.issue_cycle {
            return Err(Violation::NotMonotonic {
                index: index + 1,
                cycle: cmd.issue_cycle,
                previous: prev.issue_cycle,
            });
        }
    }

    check_protocol(commands)?;

    for (a, b) in commands.iter().tuple_combinations() {
        if let Some((constraint, required)) = required_spacing(&spacing, a, b) {
            let actual = b.issue_cycle - a.issue_cycle;
            if actual < required {
                return Err(Violation::Spacing {
                    constraint,
                    earlier: *a,
                    later: *b,
                    required,
                    actual,
                });
            }
        }
    }

    let activates = commands
        .iter()
        .filter(|c| c.kind == CommandKind::Activate)
        .map(|c| c.issue_cycle)
        .collect::<Vec<_>>();
    for window in activates.windows(FAW_ACTIVATES + 1) {
        let (first, fifth) = (window[0], window[FAW_ACTIVATES]);
        if fifth - first < spacing.t_faw {
            return Err(Violation::FourActivateWindow {
                first,
                fifth,
                t_faw: spacing.t_faw,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Violation, verify_schedule};
    use crate::{ScheduledCommand, TimingParams};

    fn row(
        bank_group: usize,
        bank: usize,
        act: u64,
        reads: &[u64],
        pre: u64,
    ) -> Vec<ScheduledCommand> {
        let mut out = vec![ScheduledCommand::activate(bank_group, bank, 0, act)];
        out.extend(reads.iter().map(|&c| ScheduledCommand::read(bank_group, bank, 0, c)));
        out.push(ScheduledCommand::precharge(bank_group, bank, 0, pre));
        out
    }

    #[test]
    fn test_legal_row() {
        let commands = row(0, 0, 0, &[14, 21], 29);
        assert!(verify_schedule(&commands, &TimingParams::default()).is_ok());
    }

    #[test]
    fn test_read_too_early() {
        let commands = row(0, 0, 0, &[13], 28);
        assert!(matches!(
            verify_schedule(&commands, &TimingParams::default()),
            Err(Violation::Spacing {
                constraint: "tRCD",
                ..
            })
        ));
    }

    #[test]
    fn test_reads_too_close_in_group() {
        let commands = row(0, 0, 0, &[14, 20], 29);
        assert!(matches!(
            verify_schedule(&commands, &TimingParams::default()),
            Err(Violation::Spacing {
                constraint: "tRDRD_sg",
                actual: 6,
                ..
            })
        ));
    }

    #[test]
    fn test_read_of_closed_bank() {
        let commands = vec![ScheduledCommand::read(0, 0, 1, 14)];
        assert!(matches!(
            verify_schedule(&commands, &TimingParams::default()),
            Err(Violation::Protocol { index: 0, .. })
        ));
    }

    #[test]
    fn test_not_monotonic() {
        let commands = vec![
            ScheduledCommand::activate(0, 0, 1, 10),
            ScheduledCommand::activate(1, 0, 1, 4),
        ];
        assert!(matches!(
            verify_schedule(&commands, &TimingParams::default()),
            Err(Violation::NotMonotonic { index: 1, .. })
        ));
    }

    #[test]
    fn test_four_activate_window() {
        let commands = (0..5)
            .map(|bg| ScheduledCommand::activate(bg, 0, 0, bg as u64 * 4))
            .collect::<Vec<_>>();
        assert!(verify_schedule(&commands, &TimingParams::default()).is_ok());
        let params = TimingParams {
            t_faw: 17,
            ..Default::default()
        };
        assert!(matches!(
            verify_schedule(&commands, &params),
            Err(Violation::FourActivateWindow {
                first: 0,
                fifth: 16,
                t_faw: 17
            })
        ));
    }
}
