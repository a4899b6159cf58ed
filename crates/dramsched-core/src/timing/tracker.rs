use crate::timing::params::{ConfigError, Spacing};
use crate::timing::{Cycle, TimingParams};
use crate::util::FAW_ACTIVATES;
use log::trace;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, Default)]
struct BankHistory {
    last_activate: Option<Cycle>,
    last_read: Option<Cycle>,
    last_precharge: Option<Cycle>,
}

#[derive(Debug, Clone, Copy, Default)]
struct GroupHistory {
    last_activate: Option<Cycle>,
    last_read: Option<Cycle>,
}

/// Command history of one channel.
///
/// Every timing constraint is a minimum spacing to the most recent relevant command,
/// so the earliest legal cycle of the next command follows directly from the latest
/// ACTIVATE/READ/PRECHARGE per bank and per bank group plus the last four ACTIVATEs
/// of the channel.
///
/// Commands must be recorded in the order they are committed. The tracker keeps the
/// latest cycle seen per slot, so a command recorded out of order never moves a
/// constraint anchor backwards.
///
/// One tracker serves exactly one channel. Channels scheduled in parallel own
/// separate trackers.
#[derive(Debug, Clone)]
pub struct TimingTracker {
    params: TimingParams,
    spacing: Spacing,
    banks: HashMap<(usize, usize), BankHistory>,
    groups: HashMap<usize, GroupHistory>,
    /// Latest ACTIVATE of the channel and its bank group
    last_activate: Option<(usize, Cycle)>,
    /// Latest READ of the channel and its bank group
    last_read: Option<(usize, Cycle)>,
    activate_window: VecDeque<Cycle>,
}

/// `last + gap`, or no constraint if the anchor event never happened.
fn after(last: Option<Cycle>, gap: Cycle) -> Cycle {
    last.map_or(0, |last| last.saturating_add(gap))
}

fn latest(slot: &mut Option<Cycle>, cycle: Cycle) {
    *slot = Some(slot.map_or(cycle, |last| last.max(cycle)));
}

impl TimingTracker {
    /// Creates a tracker with an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `params` does not pass [`TimingParams::validate`].
    pub fn new(params: TimingParams) -> Result<Self, ConfigError> {
        let spacing = Spacing::try_from(&params)?;
        Ok(Self {
            params,
            spacing,
            banks: HashMap::new(),
            groups: HashMap::new(),
            last_activate: None,
            last_read: None,
            activate_window: VecDeque::with_capacity(FAW_ACTIVATES),
        })
    }

    /// The timing parameters this tracker enforces.
    pub fn params(&self) -> &TimingParams {
        &self.params
    }

    fn bank(&self, bank_group: usize, bank: usize) -> BankHistory {
        self.banks
            .get(&(bank_group, bank))
            .copied()
            .unwrap_or_default()
    }

    fn group(&self, bank_group: usize) -> GroupHistory {
        self.groups.get(&bank_group).copied().unwrap_or_default()
    }

    /// Earliest cycle `>= now` at which `bank` may be activated.
    ///
    /// Takes the maximum over the precharge of the bank (tRP), the last ACTIVATE in
    /// the same bank group (tRRD_sg), the last ACTIVATE in another bank group
    /// (tRRD_dg) and the four-activate window (tFAW).
    pub fn earliest_activate(&self, bank_group: usize, bank: usize, now: Cycle) -> Cycle {
        let s = &self.spacing;
        let precharged = after(self.bank(bank_group, bank).last_precharge, s.t_rp);
        let same_group = after(self.group(bank_group).last_activate, s.t_rrd_sg);
        let other_group = match self.last_activate {
            Some((group, cycle)) if group != bank_group => cycle.saturating_add(s.t_rrd_dg),
            _ => 0,
        };
        let window = if self.activate_window.len() >= FAW_ACTIVATES {
            after(self.activate_window.front().copied(), s.t_faw)
        } else {
            0
        };
        let cycle = now.max(precharged).max(same_group).max(other_group).max(window);
        trace!(
            "ACT bg{} b{}: now {} tRP {} tRRD_sg {} tRRD_dg {} tFAW {} -> {}",
            bank_group, bank, now, precharged, same_group, other_group, window, cycle
        );
        cycle
    }

    /// Earliest cycle `>= now` at which a READ may follow the ACTIVATE at
    /// `activate_cycle`.
    ///
    /// Takes the maximum over tRCD and the last READ in the same (tRDRD_sg) and in
    /// another (tRDRD_dg) bank group.
    pub fn earliest_read(
        &self,
        bank_group: usize,
        bank: usize,
        activate_cycle: Cycle,
        now: Cycle,
    ) -> Cycle {
        let s = &self.spacing;
        let opened = activate_cycle.saturating_add(s.t_rcd);
        let same_group = after(self.group(bank_group).last_read, s.t_rdrd_sg);
        let other_group = match self.last_read {
            Some((group, cycle)) if group != bank_group => cycle.saturating_add(s.t_rdrd_dg),
            _ => 0,
        };
        let cycle = now.max(opened).max(same_group).max(other_group);
        trace!(
            "RD bg{} b{}: now {} tRCD {} tRDRD_sg {} tRDRD_dg {} -> {}",
            bank_group, bank, now, opened, same_group, other_group, cycle
        );
        cycle
    }

    /// Earliest cycle `>= now` at which the row opened at `activate_cycle` may be
    /// closed, given the last READ to that row.
    pub fn earliest_precharge(
        &self,
        bank_group: usize,
        bank: usize,
        activate_cycle: Cycle,
        last_read_this_row: Option<Cycle>,
        now: Cycle,
    ) -> Cycle {
        let s = &self.spacing;
        let active = activate_cycle.saturating_add(s.t_ras);
        let read_done = after(last_read_this_row, s.t_rtp);
        let cycle = now.max(active).max(read_done);
        trace!(
            "PRE bg{} b{}: now {} tRAS {} tRTP {} -> {}",
            bank_group, bank, now, active, read_done, cycle
        );
        cycle
    }

    /// Records an ACTIVATE committed at `cycle`.
    pub fn record_activate(&mut self, bank_group: usize, bank: usize, cycle: Cycle) {
        latest(
            &mut self.banks.entry((bank_group, bank)).or_default().last_activate,
            cycle,
        );
        latest(
            &mut self.groups.entry(bank_group).or_default().last_activate,
            cycle,
        );
        if self.last_activate.is_none_or(|(_, last)| cycle >= last) {
            self.last_activate = Some((bank_group, cycle));
        }
        if self.activate_window.len() == FAW_ACTIVATES {
            match self.activate_window.front() {
                Some(&oldest) if cycle <= oldest => return,
                _ => {
                    self.activate_window.pop_front();
                }
            }
        }
        let pos = self.activate_window.partition_point(|&c| c <= cycle);
        self.activate_window.insert(pos, cycle);
    }

    /// Records a READ committed at `cycle`.
    pub fn record_read(&mut self, bank_group: usize, bank: usize, cycle: Cycle) {
        latest(
            &mut self.banks.entry((bank_group, bank)).or_default().last_read,
            cycle,
        );
        latest(&mut self.groups.entry(bank_group).or_default().last_read, cycle);
        if self.last_read.is_none_or(|(_, last)| cycle >= last) {
            self.last_read = Some((bank_group, cycle));
        }
    }

    /// Records a PRECHARGE committed at `cycle`.
    pub fn record_precharge(&mut self, bank_group: usize, bank: usize, cycle: Cycle) {
        latest(
            &mut self
                .banks
                .entry((bank_group, bank))
                .or_default()
                .last_precharge,
            cycle,
        );
    }

    /// Latest ACTIVATE recorded for `bank`.
    pub fn last_activate(&self, bank_group: usize, bank: usize) -> Option<Cycle> {
        self.bank(bank_group, bank).last_activate
    }

    /// Latest READ recorded for `bank`.
    pub fn last_read(&self, bank_group: usize, bank: usize) -> Option<Cycle> {
        self.bank(bank_group, bank).last_read
    }

    /// Latest PRECHARGE recorded for `bank`.
    pub fn last_precharge(&self, bank_group: usize, bank: usize) -> Option<Cycle> {
        self.bank(bank_group, bank).last_precharge
    }
}

#[cfg(test)]
mod tests {
    use super::TimingTracker;
    use crate::TimingParams;

    fn tracker() -> TimingTracker {
        TimingTracker::new(TimingParams::default()).expect("reference timings are valid")
    }

    #[test]
    fn test_empty_history_is_unconstrained() {
        let t = tracker();
        assert_eq!(t.earliest_activate(0, 0, 0), 0);
        assert_eq!(t.earliest_activate(3, 1, 42), 42);
        assert_eq!(t.earliest_read(0, 0, 0, 0), 14);
        assert_eq!(t.earliest_precharge(0, 0, 0, None, 0), 28);
    }

    #[test]
    fn test_activate_after_precharge() {
        let mut t = tracker();
        t.record_activate(0, 0, 0);
        t.record_precharge(0, 0, 29);
        assert_eq!(t.earliest_activate(0, 0, 0), 43);
        // other bank of the same group only waits for tRRD_sg
        assert_eq!(t.earliest_activate(0, 1, 0), 4);
    }

    #[test]
    fn test_activate_group_spacing() {
        let params = TimingParams {
            t_rrd_sg: 6,
            t_rrd_dg: 4,
            ..Default::default()
        };
        let mut t = TimingTracker::new(params).expect("valid timings");
        t.record_activate(0, 0, 10);
        assert_eq!(t.earliest_activate(0, 1, 0), 16);
        assert_eq!(t.earliest_activate(1, 0, 0), 14);
        t.record_activate(1, 0, 14);
        // group 0 now also has to keep tRRD_dg to the activate in group 1
        assert_eq!(t.earliest_activate(0, 1, 0), 18);
        assert_eq!(t.earliest_activate(1, 1, 0), 20);
    }

    #[test]
    fn test_four_activate_window() {
        let mut t = tracker();
        for (bg, cycle) in [(0, 0), (1, 4), (2, 8), (3, 12)] {
            assert_eq!(t.earliest_activate(bg, 0, 0), cycle);
            t.record_activate(bg, 0, cycle);
        }
        // fifth activate must wait until the first one left the window
        assert_eq!(t.earliest_activate(4, 0, 0), 16);
        t.record_activate(4, 0, 16);
        assert_eq!(t.earliest_activate(5, 0, 0), 20);
    }

    #[test]
    fn test_read_group_spacing() {
        let mut t = tracker();
        t.record_read(0, 0, 14);
        assert_eq!(t.earliest_read(0, 1, 0, 0), 21);
        assert_eq!(t.earliest_read(1, 0, 0, 0), 18);
        assert_eq!(t.earliest_read(1, 0, 10, 0), 24);
    }

    #[test]
    fn test_precharge_waits_for_last_read() {
        let t = tracker();
        assert_eq!(t.earliest_precharge(0, 0, 0, Some(21), 0), 29);
        assert_eq!(t.earliest_precharge(0, 0, 0, Some(10), 0), 28);
        assert_eq!(t.earliest_precharge(0, 0, 0, Some(10), 50), 50);
    }

    #[test]
    fn test_out_of_order_record_keeps_latest() {
        let mut t = tracker();
        t.record_precharge(0, 0, 50);
        t.record_precharge(0, 0, 20);
        assert_eq!(t.last_precharge(0, 0), Some(50));
        assert_eq!(t.earliest_activate(0, 0, 0), 64);
        t.record_activate(0, 0, 64);
        t.record_activate(0, 0, 30);
        t.record_read(0, 0, 78);
        t.record_read(0, 0, 40);
        assert_eq!(t.last_activate(0, 0), Some(64));
        assert_eq!(t.last_read(0, 0), Some(78));
        assert_eq!(t.last_read(0, 1), None);
        // the group anchors follow the latest commands too
        assert_eq!(t.earliest_activate(0, 1, 0), 68);
        assert_eq!(t.earliest_read(0, 1, 0, 0), 85);

        let params = TimingParams {
            t_faw: 40,
            ..Default::default()
        };
        let mut t = TimingTracker::new(params).expect("valid timings");
        for (bg, cycle) in [(0, 10), (1, 20), (2, 30), (3, 40)] {
            t.record_activate(bg, 0, cycle);
        }
        assert_eq!(t.earliest_activate(6, 0, 0), 50);
        // older than the whole window, the tFAW anchor stays at 10
        t.record_activate(5, 0, 5);
        assert_eq!(t.earliest_activate(6, 0, 0), 50);
        // inside the window, it replaces the oldest activate
        t.record_activate(5, 1, 15);
        assert_eq!(t.earliest_activate(6, 0, 0), 55);
    }

    #[test]
    fn test_cycles_saturate() {
        let mut t = tracker();
        let end = u64::MAX - 4;
        t.record_activate(0, 0, end);
        t.record_read(0, 0, end);
        assert_eq!(t.earliest_activate(0, 1, 0), u64::MAX);
        assert_eq!(t.earliest_read(1, 0, end, end), u64::MAX);
        assert_eq!(t.earliest_precharge(0, 0, end, Some(end), end), u64::MAX);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = TimingParams {
            t_faw: -16,
            ..Default::default()
        };
        assert!(TimingTracker::new(params).is_err());
    }
}
