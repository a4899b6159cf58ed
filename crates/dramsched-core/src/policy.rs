//! Command scheduling policies.
//!
//! This module defines the [`SchedulingPolicy`] trait that decides in which order row
//! groups are turned into device commands, and the default [`InOrder`] policy.
//!
//! Every policy serves a row group the same way (see [`schedule_row_group`]): one
//! ACTIVATE, one READ per column, one PRECHARGE, each at the earliest cycle the
//! [`TimingTracker`] allows. Policies differ only in the order row groups are served.

use crate::alias::RowGroup;
use crate::bank_queue::BankQueue;
use crate::timing::{Cycle, TimingTracker};
use crate::ScheduledCommand;
use log::debug;

/// Trait for implementing command scheduling strategies.
///
/// Implementors emit commands in the order they commit them to the tracker. The
/// [`Scheduler`](crate::Scheduler) sorts the result by issue cycle afterwards.
///
/// # Required Methods
///
/// * [`name()`](SchedulingPolicy::name) - Short identifier used in logs and reports
/// * [`schedule()`](SchedulingPolicy::schedule) - Emits the commands for a batch
///
/// # Examples
///
/// See [`InOrder`] or the `dramsched-interleave` crate for concrete policies.
pub trait SchedulingPolicy {
    /// Short identifier of the policy.
    fn name(&self) -> &'static str;

    /// Emits the commands serving every row group of `queues`.
    ///
    /// # Arguments
    ///
    /// * `groups` - Row groups produced by the aliaser
    /// * `queues` - Bank queues referencing `groups` by id
    /// * `tracker` - Command history of the channel, updated for every emitted command
    /// * `start` - No command may issue before this cycle
    ///
    /// # Returns
    ///
    /// The commands in emission order.
    fn schedule(
        &self,
        groups: &[RowGroup],
        queues: &[BankQueue],
        tracker: &mut TimingTracker,
        start: Cycle,
    ) -> Vec<ScheduledCommand>;
}

/// Serves a single row group: ACTIVATE, one READ per column, PRECHARGE.
///
/// Consecutive READs of the row are at least one cycle apart. Every command is
/// recorded in `tracker` and appended to `out`.
///
/// # Returns
///
/// The cycle of the closing PRECHARGE.
pub fn schedule_row_group(
    group: &RowGroup,
    tracker: &mut TimingTracker,
    now: Cycle,
    out: &mut Vec<ScheduledCommand>,
) -> Cycle {
    let (bank_group, bank) = group.bank_key();

    let activate = tracker.earliest_activate(bank_group, bank, now);
    tracker.record_activate(bank_group, bank, activate);
    out.push(ScheduledCommand::activate(bank_group, bank, group.row, activate));

    let mut last_read: Option<Cycle> = None;
    for &col in &group.columns {
        let earliest = tracker.earliest_read(bank_group, bank, activate, activate);
        let read = last_read.map_or(earliest, |prev| earliest.max(prev.saturating_add(1)));
        tracker.record_read(bank_group, bank, read);
        out.push(ScheduledCommand::read(bank_group, bank, col, read));
        last_read = Some(read);
    }

    let precharge = tracker.earliest_precharge(
        bank_group,
        bank,
        activate,
        last_read,
        last_read.unwrap_or(activate),
    );
    tracker.record_precharge(bank_group, bank, precharge);
    out.push(ScheduledCommand::precharge(
        bank_group, bank, group.row, precharge,
    ));
    debug!(
        "Row group {} served: ACT {} .. PRE {} ({} reads)",
        group.id,
        activate,
        precharge,
        group.columns.len()
    );
    precharge
}

/// Greedy in-order policy.
///
/// Serves bank queues in arrival order and, within each queue, row groups in arrival
/// order. Never reorders rows to shorten the makespan, which makes the output easy
/// to predict. This is the default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct InOrder;

impl SchedulingPolicy for InOrder {
    fn name(&self) -> &'static str {
        "in-order"
    }

    fn schedule(
        &self,
        groups: &[RowGroup],
        queues: &[BankQueue],
        tracker: &mut TimingTracker,
        start: Cycle,
    ) -> Vec<ScheduledCommand> {
        let mut out = vec![];
        for queue in queues {
            for group in queue.row_groups(groups) {
                schedule_row_group(group, tracker, start, &mut out);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{InOrder, SchedulingPolicy, schedule_row_group};
    use crate::alias::{RowGroup, alias_rows};
    use crate::bank_queue::group_banks;
    use crate::{CommandKind, DRAMAddr, TimingParams, TimingTracker};

    fn tracker() -> TimingTracker {
        TimingTracker::new(TimingParams::default()).expect("reference timings are valid")
    }

    #[test]
    fn test_single_row_group() {
        let group = RowGroup {
            id: 1,
            bank_group: 0,
            bank: 0,
            row: 1,
            columns: vec![6, 3],
        };
        let mut t = tracker();
        let mut out = vec![];
        let pre = schedule_row_group(&group, &mut t, 0, &mut out);
        assert_eq!(pre, 29);
        let cycles = out
            .iter()
            .map(|c| (c.kind, c.address, c.issue_cycle))
            .collect::<Vec<_>>();
        assert_eq!(
            cycles,
            vec![
                (CommandKind::Activate, 1, 0),
                (CommandKind::Read, 6, 14),
                (CommandKind::Read, 3, 21),
                (CommandKind::Precharge, 1, 29),
            ]
        );
        assert_eq!(t.last_precharge(0, 0), Some(29));
    }

    #[test]
    fn test_reads_of_a_row_never_share_a_cycle() {
        let params = TimingParams {
            t_rdrd_sg: 0,
            t_rdrd_dg: 0,
            ..Default::default()
        };
        let mut t = TimingTracker::new(params).expect("valid timings");
        let group = RowGroup {
            id: 1,
            bank_group: 0,
            bank: 0,
            row: 0,
            columns: vec![1, 1, 2],
        };
        let mut out = vec![];
        schedule_row_group(&group, &mut t, 0, &mut out);
        let reads = out
            .iter()
            .filter(|c| c.kind == CommandKind::Read)
            .map(|c| c.issue_cycle)
            .collect::<Vec<_>>();
        assert_eq!(reads, vec![14, 15, 16]);
    }

    #[test]
    fn test_start_cycle_is_respected() {
        let groups = alias_rows(&[DRAMAddr::new(1, 1, 1, 1)]);
        let queues = group_banks(&groups);
        let out = InOrder.schedule(&groups, &queues, &mut tracker(), 100);
        assert_eq!(out[0].issue_cycle, 100);
        assert!(out.iter().all(|c| c.issue_cycle >= 100));
    }

    #[test]
    fn test_in_order_emission() {
        let groups = alias_rows(&[
            DRAMAddr::new(0, 0, 1, 6),
            DRAMAddr::new(2, 1, 2, 2),
            DRAMAddr::new(0, 0, 2, 5),
        ]);
        let queues = group_banks(&groups);
        let out = InOrder.schedule(&groups, &queues, &mut tracker(), 0);
        let activates = out
            .iter()
            .filter(|c| c.kind == CommandKind::Activate)
            .map(|c| (c.bank_group, c.address))
            .collect::<Vec<_>>();
        // bank (0, 0) is served completely before bank (2, 1)
        assert_eq!(activates, vec![(0, 1), (0, 2), (2, 2)]);
    }
}
