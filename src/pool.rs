use std::marker::PhantomData;
use tracing::{debug, trace};
use crate::config::AckConfig;
use crate::endpoint::EndpointId;
use crate::fragment::{FragmentId, SendFragment};
use crate::segment::{AckSegment, AckSegmentId, SegmentId, SendSegment};

/// Typed handle into a [Pool]
pub trait PoolId: Copy {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

/// A fixed-capacity pool of values, addressed by handles. Capacity is fixed at creation, and
///  running out is a regular condition callers must handle.
///
/// NB: A handle is only valid while its value is allocated - slots are reused after release
pub struct Pool<I, T> {
    name: &'static str,
    slots: Vec<Option<T>>,
    free: Vec<usize>,
    _id: PhantomData<I>,
}

impl<I: PoolId, T> Pool<I, T> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Pool {
            name,
            slots: (0..capacity).map(|_| None).collect(),
            // lowest index is handed out first
            free: (0..capacity).rev().collect(),
            _id: PhantomData,
        }
    }

    pub fn allocate(&mut self, value: T) -> Option<I> {
        let Some(index) = self.free.pop() else {
            debug!("{} pool is exhausted ({} entries in use)", self.name, self.slots.len());
            return None;
        };

        trace!("allocating {} #{}", self.name, index);
        self.slots[index] = Some(value);
        Some(I::from_index(index))
    }

    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(id.index())
            .and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(id.index())
            .and_then(|slot| slot.as_mut())
    }

    pub fn release(&mut self, id: I) -> Option<T> {
        let released = self.slots.get_mut(id.index())
            .and_then(|slot| slot.take());
        if released.is_some() {
            trace!("returning {} #{} to pool", self.name, id.index());
            self.free.push(id.index());
        }
        released
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn in_use(&self) -> usize {
        self.capacity() - self.available()
    }
}


/// The module's pools of send segments, fragments and ACK control segments, and the rules
///  connecting their lifecycles
pub(crate) struct SendPools {
    pub(crate) segments: Pool<SegmentId, SendSegment>,
    pub(crate) fragments: Pool<FragmentId, SendFragment>,
    pub(crate) acks: Pool<AckSegmentId, AckSegment>,
}

impl SendPools {
    pub(crate) fn new(config: &AckConfig) -> SendPools {
        SendPools {
            segments: Pool::new("send segment", config.max_send_segments),
            fragments: Pool::new("send fragment", config.max_fragments),
            acks: Pool::new("ACK segment", config.ack_segment_pool_size),
        }
    }

    pub(crate) fn allocate_ack_segment(&mut self, endpoint: EndpointId) -> Option<AckSegmentId> {
        self.acks.allocate(AckSegment::new(endpoint))
    }

    pub(crate) fn return_ack_segment(&mut self, ack: AckSegmentId) -> Option<AckSegment> {
        self.acks.release(ack)
    }

    /// Return a segment to the pool. The fragment keeps track of how many of its segments are
    ///  still allocated so it is not returned while a segment still refers to it.
    pub(crate) fn release_send_segment(&mut self, fragment: FragmentId, segment: SegmentId) {
        let released = self.segments.release(segment)
            .expect("this is a bug: releasing a send segment that is not allocated");
        debug_assert_eq!(released.fragment, fragment);

        if let Some(fragment) = self.fragments.get_mut(fragment) {
            fragment.on_segment_released();
        }
    }

    /// Return the fragment to its pool if it is completely acknowledged and none of its segments
    ///  is still allocated. Returns `true` if the fragment was returned.
    pub(crate) fn return_fragment_if_done(&mut self, fragment: FragmentId) -> bool {
        match self.fragments.get(fragment) {
            Some(f) if f.is_done() => {
                self.fragments.release(fragment);
                true
            }
            _ => false,
        }
    }
}
