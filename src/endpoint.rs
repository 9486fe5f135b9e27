use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use bit_set::BitSet;
use crate::fragment::FragmentId;
use crate::hotel::Hotel;
use crate::safe_converter::SafeCast;
use crate::segment::SegmentId;
use crate::send_window::SendWindow;
use crate::seq::Seq;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EndpointId(u32);

impl Display for EndpointId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl EndpointId {
    pub fn from_raw(value: u32) -> EndpointId {
        EndpointId(value)
    }

    pub fn to_raw(&self) -> u32 {
        self.0
    }
}

/// How an incoming data segment relates to what was received before
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReceiveVerdict {
    /// the next expected sequence number: the contiguous range grows, possibly over segments
    ///  that arrived out of order before
    InOrder,
    /// ahead of the next expected sequence number, but inside the receive window
    OutOfOrder,
    Duplicate,
    /// too far ahead to be remembered - this means the peer does not respect the window
    OutsideWindow,
}

/// One remote peer, with the send side and receive side state of the reliable protocol
pub struct Endpoint {
    id: EndpointId,

    pub(crate) sent_segs: SendWindow,
    pub(crate) hotel: Hotel<SegmentId>,

    pub(crate) next_seq_to_send: Seq,
    /// highest sequence number acknowledged by the peer
    pub(crate) ack_seq_rcvd: Seq,

    pub(crate) next_contig_seq_to_recv: Seq,
    /// slots of sequence numbers after `next_contig_seq_to_recv` that arrived out of order
    rcvd_segs: BitSet,
    /// the peer should get an ACK, either piggy-backed or standalone
    pub(crate) ack_needed: bool,

    /// fragments with data that was not carved into segments yet
    pub(crate) send_queue: VecDeque<FragmentId>,
    /// this endpoint is in the module's list of endpoints that have something to send
    pub(crate) ready_to_send: bool,
}

impl Endpoint {
    pub(crate) fn new(id: EndpointId, window_size: usize, local_start_seq: Seq, peer_start_seq: Seq) -> Endpoint {
        Endpoint {
            id,
            sent_segs: SendWindow::new(window_size),
            hotel: Hotel::new(window_size),
            next_seq_to_send: local_start_seq,
            ack_seq_rcvd: local_start_seq.prev(),
            next_contig_seq_to_recv: peer_start_seq,
            rcvd_segs: BitSet::with_capacity(window_size),
            ack_needed: false,
            send_queue: Default::default(),
            ready_to_send: false,
        }
    }

    pub fn id(&self) -> EndpointId {
        self.id
    }

    pub fn window_size(&self) -> usize {
        self.sent_segs.size()
    }

    pub fn next_seq_to_send(&self) -> Seq {
        self.next_seq_to_send
    }

    pub fn ack_seq_rcvd(&self) -> Seq {
        self.ack_seq_rcvd
    }

    pub fn next_contig_seq_to_recv(&self) -> Seq {
        self.next_contig_seq_to_recv
    }

    /// The value sent in ACKs: the highest sequence number received with no gap before it
    pub fn ack_value(&self) -> Seq {
        self.next_contig_seq_to_recv.prev()
    }

    pub fn is_ack_needed(&self) -> bool {
        self.ack_needed
    }

    pub fn is_ready_to_send(&self) -> bool {
        self.ready_to_send
    }

    pub fn sent_segment(&self, seq: Seq) -> Option<SegmentId> {
        self.sent_segs.get(seq)
    }

    pub fn num_sent_segments(&self) -> usize {
        self.sent_segs.occupied()
    }

    pub fn hotel_occupancy(&self) -> usize {
        self.hotel.occupancy()
    }

    /// segments sent but not acknowledged
    pub fn in_flight(&self) -> usize {
        self.next_seq_to_send.distance_from(self.ack_seq_rcvd.next()).safe_cast()
    }

    pub fn window_is_open(&self) -> bool {
        self.in_flight() < self.window_size()
    }

    pub fn has_queued_data(&self) -> bool {
        !self.send_queue.is_empty()
    }

    pub(crate) fn record_received(&mut self, seq: Seq) -> ReceiveVerdict {
        let window_size = self.window_size();

        if seq.is_before(self.next_contig_seq_to_recv) {
            return ReceiveVerdict::Duplicate;
        }
        let distance: usize = seq.distance_from(self.next_contig_seq_to_recv).safe_cast();
        if distance >= window_size {
            return ReceiveVerdict::OutsideWindow;
        }

        if distance == 0 {
            self.next_contig_seq_to_recv = seq.next();
            while self.rcvd_segs.remove(self.next_contig_seq_to_recv.slot(window_size)) {
                self.next_contig_seq_to_recv = self.next_contig_seq_to_recv.next();
            }
            ReceiveVerdict::InOrder
        }
        else if self.rcvd_segs.insert(seq.slot(window_size)) {
            ReceiveVerdict::OutOfOrder
        }
        else {
            ReceiveVerdict::Duplicate
        }
    }
}
