use dramsched_core::policy::{SchedulingPolicy, schedule_row_group};
use dramsched_core::{BankQueue, Cycle, RowGroup, ScheduledCommand, TimingTracker};
use log::debug;

/// Round-robin policy over bank queues.
///
/// Serves the first row group of every bank queue, then the second row group of every
/// queue that has one, and so on. Within a bank the row order is unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interleave;

impl SchedulingPolicy for Interleave {
    fn name(&self) -> &'static str {
        "interleave"
    }

    fn schedule(
        &self,
        groups: &[RowGroup],
        queues: &[BankQueue],
        tracker: &mut TimingTracker,
        start: Cycle,
    ) -> Vec<ScheduledCommand> {
        let mut out = vec![];
        let mut pending = queues
            .iter()
            .map(|queue| queue.row_groups(groups))
            .collect::<Vec<_>>();
        let mut round = 0;
        loop {
            let mut served = 0;
            for rows in pending.iter_mut() {
                if let Some(group) = rows.next() {
                    schedule_row_group(group, tracker, start, &mut out);
                    served += 1;
                }
            }
            if served == 0 {
                break;
            }
            debug!("Round {} served {} row groups", round, served);
            round += 1;
        }
        out
    }
}
