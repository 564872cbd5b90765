//! # Transfer Queue
//!
//! Priority-ordered waiting queue for sessions that have been escalated to a
//! human agent. Three lanes (High/Normal/Low) with strict precedence between
//! lanes and exact FIFO order inside a lane, plus a membership side-map so
//! duplicate checks and position lookups are O(1) instead of a lane scan.
//!
//! A session appears in at most one lane, at most once, across all three
//! lanes. Queue membership implies the session is `Waiting`; the
//! orchestrator enforces that pairing by mutating the queue and the session
//! store inside the same critical section.
//!
//! Lane-per-priority with insertion order inside a lane gives O(1) amortized
//! push/pop, exact fairness within a priority class, and an auditable
//! position formula: entries ahead in the same lane (plus the entry itself)
//! plus the full length of every strictly-higher lane.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransferEngineError};
use crate::session::SessionId;

/// Priority lane for a queued transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferPriority {
    High,
    Normal,
    Low,
}

/// One waiting entry in the transfer queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedTransfer {
    pub session_id: SessionId,
    pub priority: TransferPriority,
    /// Free-text escalation reason, kept for audit and agent notification.
    pub reason: String,
    /// Enqueue time; used for wait-time reporting and FIFO tie-break.
    pub requested_at: DateTime<Utc>,
}

impl QueuedTransfer {
    pub fn new(session_id: SessionId, priority: TransferPriority, reason: &str) -> Self {
        Self {
            session_id,
            priority,
            reason: reason.to_string(),
            requested_at: Utc::now(),
        }
    }
}

/// Per-lane and total queue depths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueLengths {
    pub high: usize,
    pub normal: usize,
    pub low: usize,
    pub total: usize,
}

/// One row of a queue snapshot, ordered by position ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshotEntry {
    pub session_id: SessionId,
    pub priority: TransferPriority,
    pub wait_seconds: i64,
    /// 1-based position in pop order.
    pub position: usize,
}

/// The three-lane waiting queue.
#[derive(Debug, Default)]
pub struct TransferQueue {
    high: VecDeque<QueuedTransfer>,
    normal: VecDeque<QueuedTransfer>,
    low: VecDeque<QueuedTransfer>,
    /// Which lane each queued session sits in. Source for O(1) membership
    /// checks across all lanes.
    membership: HashMap<SessionId, TransferPriority>,
}

impl TransferQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lane(&self, priority: TransferPriority) -> &VecDeque<QueuedTransfer> {
        match priority {
            TransferPriority::High => &self.high,
            TransferPriority::Normal => &self.normal,
            TransferPriority::Low => &self.low,
        }
    }

    fn lane_mut(&mut self, priority: TransferPriority) -> &mut VecDeque<QueuedTransfer> {
        match priority {
            TransferPriority::High => &mut self.high,
            TransferPriority::Normal => &mut self.normal,
            TransferPriority::Low => &mut self.low,
        }
    }

    /// Insert at the tail of the entry's priority lane.
    ///
    /// Fails with `DuplicateEntry` if the session is already queued in any
    /// lane, not just the target one; the at-most-once invariant spans all
    /// three lanes.
    pub fn push(&mut self, entry: QueuedTransfer) -> Result<()> {
        if self.membership.contains_key(&entry.session_id) {
            return Err(TransferEngineError::DuplicateEntry(entry.session_id));
        }
        self.membership
            .insert(entry.session_id.clone(), entry.priority);
        self.lane_mut(entry.priority).push_back(entry);
        Ok(())
    }

    /// Re-insert at the **front** of the entry's lane. Compensation path for
    /// a claim that popped an entry but could not complete the assignment;
    /// keeps the entry's original pop order instead of sending it to the
    /// back of the line.
    pub fn push_front(&mut self, entry: QueuedTransfer) -> Result<()> {
        if self.membership.contains_key(&entry.session_id) {
            return Err(TransferEngineError::DuplicateEntry(entry.session_id));
        }
        self.membership
            .insert(entry.session_id.clone(), entry.priority);
        self.lane_mut(entry.priority).push_front(entry);
        Ok(())
    }

    /// Update the reason/priority of an already-queued session in place.
    ///
    /// The original `requested_at` is preserved so the customer does not
    /// lose accrued wait time. If the priority is unchanged the entry keeps
    /// its lane position; if it changes, the entry moves to the tail of its
    /// new lane.
    pub fn update_in_place(
        &mut self,
        session_id: &SessionId,
        reason: &str,
        priority: TransferPriority,
    ) -> Result<()> {
        let current_lane = *self
            .membership
            .get(session_id)
            .ok_or_else(|| TransferEngineError::NotInQueue(session_id.clone()))?;

        if current_lane == priority {
            let entry = self
                .lane_mut(current_lane)
                .iter_mut()
                .find(|e| &e.session_id == session_id)
                .expect("membership map out of sync with lane");
            entry.reason = reason.to_string();
            return Ok(());
        }

        let mut entry = self
            .take_from_lane(session_id, current_lane)
            .expect("membership map out of sync with lane");
        entry.reason = reason.to_string();
        entry.priority = priority;
        self.membership.insert(session_id.clone(), priority);
        self.lane_mut(priority).push_back(entry);
        Ok(())
    }

    /// Pop the next entry: strict High > Normal > Low precedence, FIFO
    /// within a lane. Returns `None` immediately when all lanes are empty.
    pub fn pop_next(&mut self) -> Option<QueuedTransfer> {
        let entry = self
            .high
            .pop_front()
            .or_else(|| self.normal.pop_front())
            .or_else(|| self.low.pop_front())?;
        self.membership.remove(&entry.session_id);
        Some(entry)
    }

    /// Remove the session's entry from whichever lane holds it. Idempotent;
    /// returns whether anything was removed.
    pub fn remove(&mut self, session_id: &SessionId) -> bool {
        let Some(lane) = self.membership.remove(session_id) else {
            return false;
        };
        self.take_from_lane(session_id, lane)
            .expect("membership map out of sync with lane");
        true
    }

    /// Remove a specific session and return its entry, for targeted claims.
    pub fn take(&mut self, session_id: &SessionId) -> Option<QueuedTransfer> {
        let lane = self.membership.remove(session_id)?;
        self.take_from_lane(session_id, lane)
    }

    fn take_from_lane(
        &mut self,
        session_id: &SessionId,
        lane: TransferPriority,
    ) -> Option<QueuedTransfer> {
        let queue = self.lane_mut(lane);
        let idx = queue.iter().position(|e| &e.session_id == session_id)?;
        queue.remove(idx)
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.membership.contains_key(session_id)
    }

    /// 1-based position in pop order, or 0 if the session is not queued.
    ///
    /// Position = (entries ahead of it in its own lane, including itself)
    /// + (full length of every strictly-higher-priority lane).
    pub fn position_of(&self, session_id: &SessionId) -> usize {
        let Some(lane) = self.membership.get(session_id) else {
            return 0;
        };
        let in_lane = self
            .lane(*lane)
            .iter()
            .position(|e| &e.session_id == session_id)
            .expect("membership map out of sync with lane")
            + 1;
        let ahead = match lane {
            TransferPriority::High => 0,
            TransferPriority::Normal => self.high.len(),
            TransferPriority::Low => self.high.len() + self.normal.len(),
        };
        ahead + in_lane
    }

    pub fn len(&self) -> QueueLengths {
        QueueLengths {
            high: self.high.len(),
            normal: self.normal.len(),
            low: self.low.len(),
            total: self.high.len() + self.normal.len() + self.low.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.membership.is_empty()
    }

    /// Ordered view of the whole queue, position ascending, with wait time
    /// computed against `now`.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<QueueSnapshotEntry> {
        let mut out = Vec::with_capacity(self.membership.len());
        let mut position = 0;
        for entry in self
            .high
            .iter()
            .chain(self.normal.iter())
            .chain(self.low.iter())
        {
            position += 1;
            out.push(QueueSnapshotEntry {
                session_id: entry.session_id.clone(),
                priority: entry.priority,
                wait_seconds: (now - entry.requested_at).num_seconds().max(0),
                position,
            });
        }
        out
    }

    /// Average wait in seconds across all queued entries; 0.0 when empty.
    pub fn average_wait_seconds(&self, now: DateTime<Utc>) -> f64 {
        let lengths = self.len();
        if lengths.total == 0 {
            return 0.0;
        }
        let total: i64 = self
            .high
            .iter()
            .chain(self.normal.iter())
            .chain(self.low.iter())
            .map(|e| (now - e.requested_at).num_seconds().max(0))
            .sum();
        total as f64 / lengths.total as f64
    }

    /// Empty all lanes, returning how many entries were dropped. The
    /// development-environment gate lives one layer up in the orchestrator.
    pub fn clear(&mut self) -> usize {
        let count = self.membership.len();
        self.high.clear();
        self.normal.clear();
        self.low.clear();
        self.membership.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, priority: TransferPriority) -> QueuedTransfer {
        QueuedTransfer::new(SessionId::from(id), priority, "test")
    }

    #[test]
    fn pop_respects_priority_then_fifo() {
        let mut queue = TransferQueue::new();
        queue.push(entry("s1", TransferPriority::High)).unwrap();
        queue.push(entry("s2", TransferPriority::Normal)).unwrap();
        queue.push(entry("s3", TransferPriority::High)).unwrap();

        let order: Vec<String> = std::iter::from_fn(|| queue.pop_next())
            .map(|e| e.session_id.0)
            .collect();
        assert_eq!(order, vec!["s1", "s3", "s2"]);
    }

    #[test]
    fn duplicate_push_rejected_across_lanes() {
        let mut queue = TransferQueue::new();
        queue.push(entry("s1", TransferPriority::Normal)).unwrap();

        // Same lane and a different lane both count as duplicates.
        let same = queue.push(entry("s1", TransferPriority::Normal));
        assert!(matches!(same, Err(TransferEngineError::DuplicateEntry(_))));
        let other = queue.push(entry("s1", TransferPriority::High));
        assert!(matches!(other, Err(TransferEngineError::DuplicateEntry(_))));
        assert_eq!(queue.len().total, 1);
    }

    #[test]
    fn position_counts_higher_lanes_in_full() {
        let mut queue = TransferQueue::new();
        queue.push(entry("a", TransferPriority::High)).unwrap();
        queue.push(entry("b", TransferPriority::Normal)).unwrap();
        queue.push(entry("c", TransferPriority::Normal)).unwrap();

        // High=[a], Normal=[b, c]: c is 2nd in Normal behind 1 High entry.
        assert_eq!(queue.position_of(&SessionId::from("a")), 1);
        assert_eq!(queue.position_of(&SessionId::from("b")), 2);
        assert_eq!(queue.position_of(&SessionId::from("c")), 3);
        assert_eq!(queue.position_of(&SessionId::from("absent")), 0);
    }

    #[test]
    fn position_matches_pop_order() {
        let mut queue = TransferQueue::new();
        queue.push(entry("s1", TransferPriority::Low)).unwrap();
        queue.push(entry("s2", TransferPriority::High)).unwrap();
        queue.push(entry("s3", TransferPriority::Normal)).unwrap();
        queue.push(entry("s4", TransferPriority::Normal)).unwrap();

        let target = SessionId::from("s4");
        let position = queue.position_of(&target);
        let mut popped = 0;
        loop {
            popped += 1;
            if queue.pop_next().unwrap().session_id == target {
                break;
            }
        }
        assert_eq!(position, popped);
    }

    #[test]
    fn update_in_place_same_lane_keeps_position() {
        let mut queue = TransferQueue::new();
        queue.push(entry("s1", TransferPriority::Normal)).unwrap();
        queue.push(entry("s2", TransferPriority::Normal)).unwrap();

        queue
            .update_in_place(&SessionId::from("s1"), "updated", TransferPriority::Normal)
            .unwrap();

        assert_eq!(queue.position_of(&SessionId::from("s1")), 1);
        let first = queue.pop_next().unwrap();
        assert_eq!(first.reason, "updated");
    }

    #[test]
    fn update_in_place_lane_change_moves_entry_once() {
        let mut queue = TransferQueue::new();
        queue.push(entry("s1", TransferPriority::High)).unwrap();

        queue
            .update_in_place(&SessionId::from("s1"), "billing", TransferPriority::Normal)
            .unwrap();

        let lengths = queue.len();
        assert_eq!(lengths.high, 0);
        assert_eq!(lengths.normal, 1);
        assert_eq!(lengths.total, 1);
        let popped = queue.pop_next().unwrap();
        assert_eq!(popped.priority, TransferPriority::Normal);
    }

    #[test]
    fn push_front_restores_pop_order() {
        let mut queue = TransferQueue::new();
        queue.push(entry("s1", TransferPriority::Normal)).unwrap();
        queue.push(entry("s2", TransferPriority::Normal)).unwrap();

        let popped = queue.pop_next().unwrap();
        assert_eq!(popped.session_id.0, "s1");
        queue.push_front(popped).unwrap();

        assert_eq!(queue.pop_next().unwrap().session_id.0, "s1");
        assert_eq!(queue.pop_next().unwrap().session_id.0, "s2");
    }

    #[test]
    fn remove_is_idempotent() {
        let mut queue = TransferQueue::new();
        queue.push(entry("s1", TransferPriority::Low)).unwrap();

        assert!(queue.remove(&SessionId::from("s1")));
        assert!(!queue.remove(&SessionId::from("s1")));
        assert!(queue.is_empty());
    }

    #[test]
    fn snapshot_is_position_ordered() {
        let mut queue = TransferQueue::new();
        queue.push(entry("s1", TransferPriority::Low)).unwrap();
        queue.push(entry("s2", TransferPriority::High)).unwrap();
        queue.push(entry("s3", TransferPriority::Normal)).unwrap();

        let snapshot = queue.snapshot(Utc::now());
        let ids: Vec<&str> = snapshot.iter().map(|e| e.session_id.0.as_str()).collect();
        assert_eq!(ids, vec!["s2", "s3", "s1"]);
        let positions: Vec<usize> = snapshot.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn clear_empties_every_lane() {
        let mut queue = TransferQueue::new();
        queue.push(entry("s1", TransferPriority::High)).unwrap();
        queue.push(entry("s2", TransferPriority::Normal)).unwrap();
        queue.push(entry("s3", TransferPriority::Low)).unwrap();

        assert_eq!(queue.clear(), 3);
        assert!(queue.is_empty());
        assert_eq!(queue.pop_next().map(|e| e.session_id), None);
    }
}
