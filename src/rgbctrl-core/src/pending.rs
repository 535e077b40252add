// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! Pending-op queue: the frame loop's escape hatch for control-plane work
//! that shouldn't run inline on the UDP listener. Each kind keeps only its
//! latest instance (last write wins) so a burst of repeated requests never
//! grows unbounded and never replays stale ones.

use std::sync::Mutex;

use crate::config::ConfigPatch;

/// One deferred unit of work, tagged by kind so the queue can coalesce.
#[derive(Debug, Clone)]
pub enum PendingOp {
    /// Raw bytes that arrived during the quiet window and must be
    /// re-classified once it closes.
    RawDeferred(Vec<u8>),
    /// Full factory reset of the config store.
    Reset,
    /// Pixel count change per channel, requires rebuilding the ring map.
    Counts([u8; 4]),
    /// A config patch to merge; `persist` distinguishes `save` (writes
    /// through to the config store) from `preview` (live only).
    Cfg { patch: ConfigPatch, persist: bool },
}

impl PendingOp {
    fn priority(&self) -> u8 {
        match self {
            PendingOp::RawDeferred(_) => 0,
            PendingOp::Reset => 1,
            PendingOp::Counts(_) => 2,
            PendingOp::Cfg { .. } => 3,
        }
    }

    fn slot(&self) -> usize {
        match self {
            PendingOp::RawDeferred(_) => 0,
            PendingOp::Reset => 1,
            PendingOp::Counts(_) => 2,
            PendingOp::Cfg { .. } => 3,
        }
    }
}

const SLOTS: usize = 4;

/// Four latest-wins slots, one per [`PendingOp`] kind, drained in strict
/// priority order: `RawDeferred` before `Reset` before `Counts` before
/// `Cfg`, so a quiet-window datagram is re-classified before any other
/// deferred work is applied on top of it.
#[derive(Default)]
pub struct PendingQueue {
    slots: Mutex<[Option<PendingOp>; SLOTS]>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, op: PendingOp) {
        let mut slots = self.slots.lock().expect("pending queue mutex poisoned");
        slots[op.slot()] = Some(op);
    }

    pub fn is_empty(&self) -> bool {
        let slots = self.slots.lock().expect("pending queue mutex poisoned");
        slots.iter().all(Option::is_none)
    }

    /// Pops the highest-priority pending op, if any. Callers are expected
    /// to loop this under a time budget; see `process_pending` in the
    /// scheduler for the budget-aware drain.
    pub fn pop_highest_priority(&self) -> Option<PendingOp> {
        let mut slots = self.slots.lock().expect("pending queue mutex poisoned");
        let mut best: Option<usize> = None;
        for (slot, op) in slots.iter().enumerate() {
            if let Some(op) = op {
                let better = match best {
                    None => true,
                    Some(b) => op.priority() < slots[b].as_ref().unwrap().priority(),
                };
                if better {
                    best = Some(slot);
                }
            }
        }
        best.and_then(|slot| slots[slot].take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_push_of_same_kind_replaces_earlier() {
        let q = PendingQueue::new();
        q.push(PendingOp::Counts([1, 0, 0, 0]));
        q.push(PendingOp::Counts([9, 0, 0, 0]));
        match q.pop_highest_priority() {
            Some(PendingOp::Counts(c)) => assert_eq!(c, [9, 0, 0, 0]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(q.is_empty());
    }

    #[test]
    fn drains_in_priority_order() {
        let q = PendingQueue::new();
        q.push(PendingOp::RawDeferred(vec![1]));
        q.push(PendingOp::Cfg {
            patch: ConfigPatch::default(),
            persist: false,
        });
        q.push(PendingOp::Reset);
        q.push(PendingOp::Counts([2, 0, 0, 0]));

        assert!(matches!(q.pop_highest_priority(), Some(PendingOp::RawDeferred(_))));
        assert!(matches!(q.pop_highest_priority(), Some(PendingOp::Reset)));
        assert!(matches!(q.pop_highest_priority(), Some(PendingOp::Counts(_))));
        assert!(matches!(q.pop_highest_priority(), Some(PendingOp::Cfg { .. })));
        assert!(q.pop_highest_priority().is_none());
    }
}
