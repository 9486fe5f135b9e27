use crate::segment::SegmentId;
use crate::seq::Seq;

/// An endpoint's sent-but-unacknowledged segments, one slot per sequence number modulo the
///  window size.
///
/// The window does not know its own position - that is determined by the endpoint's ACK and send
///  sequence numbers. It only guarantees that a slot is never overwritten while it is occupied.
pub struct SendWindow {
    slots: Box<[Option<SegmentId>]>,
}

impl SendWindow {
    pub fn new(size: usize) -> SendWindow {
        assert!(size.is_power_of_two(), "window size must be a power of two");
        SendWindow {
            slots: vec![None; size].into(),
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, seq: Seq) -> Option<SegmentId> {
        self.slots[seq.slot(self.size())]
    }

    pub fn insert(&mut self, seq: Seq, segment: SegmentId) {
        let slot = seq.slot(self.size());
        assert!(self.slots[slot].is_none(), "this is a bug: send window slot {} for seq {} is still occupied", slot, seq);
        self.slots[slot] = Some(segment);
    }

    pub fn clear(&mut self, seq: Seq) -> Option<SegmentId> {
        let slot = seq.slot(self.size());
        self.slots[slot].take()
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter()
            .filter(|s| s.is_some())
            .count()
    }
}
