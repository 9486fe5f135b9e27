use std::collections::VecDeque;
use rustc_hash::FxHashMap;
use crate::segment::SegmentId;

/// Segments waiting to be retransmitted, in the order they were queued. Both timeouts and
///  fast retransmits append here; ACKs may remove segments from anywhere in the queue.
///
/// Removal only forgets the segment's ticket, leaving its entry in the deque. Entries whose
///  ticket is no longer current are dropped when they reach the front, so removal does not
///  depend on the queue's length, i.e. on other endpoints' backlogs.
#[derive(Default)]
pub struct ResendQueue {
    queue: VecDeque<(SegmentId, u64)>,
    /// the ticket of each live entry
    tickets: FxHashMap<SegmentId, u64>,
    next_ticket: u64,
}

impl ResendQueue {
    pub fn push_back(&mut self, segment: SegmentId) {
        let ticket = self.issue_ticket(segment);
        self.queue.push_back((segment, ticket));
    }

    pub(crate) fn push_front(&mut self, segment: SegmentId) {
        let ticket = self.issue_ticket(segment);
        self.queue.push_front((segment, ticket));
    }

    fn issue_ticket(&mut self, segment: SegmentId) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let previous = self.tickets.insert(segment, ticket);
        debug_assert!(previous.is_none(), "this is a bug: segment is already queued for resend");
        ticket
    }

    pub fn front(&self) -> Option<SegmentId> {
        self.queue.front().map(|&(segment, _)| segment)
    }

    pub fn pop_front(&mut self) -> Option<SegmentId> {
        let (segment, _) = self.queue.pop_front()?;
        self.tickets.remove(&segment);
        self.skip_removed();
        Some(segment)
    }

    /// Returns `true` if the segment was queued
    pub fn remove(&mut self, segment: SegmentId) -> bool {
        if self.tickets.remove(&segment).is_none() {
            return false;
        }
        self.skip_removed();
        true
    }

    /// keeps the front entry live
    fn skip_removed(&mut self) {
        while let Some(&(segment, ticket)) = self.queue.front() {
            if self.is_live(segment, ticket) {
                break;
            }
            self.queue.pop_front();
        }
    }

    fn is_live(&self, segment: SegmentId, ticket: u64) -> bool {
        self.tickets.get(&segment) == Some(&ticket)
    }

    pub fn contains(&self, segment: SegmentId) -> bool {
        self.tickets.contains_key(&segment)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.queue.iter()
            .filter(|&&(segment, ticket)| self.is_live(segment, ticket))
            .map(|&(segment, _)| segment)
    }
}
