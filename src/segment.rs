use bytes::BytesMut;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use crate::endpoint::EndpointId;
use crate::fragment::FragmentId;
use crate::header::SegmentHeader;
use crate::hotel::RoomId;
use crate::pool::PoolId;
use crate::seq::Seq;

/// The hardware queue a segment is posted on. This is an opaque routing tag as far as
///  acknowledgement and retransmission are concerned: standalone ACKs go on the priority channel,
///  fragment data on the data channel.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum Channel {
    Priority = 0,
    Data = 1,
}

impl Channel {
    pub const COUNT: usize = 2;

    pub fn index(self) -> usize {
        u8::from(self) as usize
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SegmentId(usize);
impl PoolId for SegmentId {
    fn from_index(index: usize) -> Self {
        SegmentId(index)
    }

    fn index(self) -> usize {
        self.0
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct AckSegmentId(usize);
impl PoolId for AckSegmentId {
    fn from_index(index: usize) -> Self {
        AckSegmentId(index)
    }

    fn index(self) -> usize {
        self.0
    }
}

/// Where a posted segment stands with regard to retransmission. A segment is either waiting for
///  its timeout in the endpoint's hotel, or sitting in the module's resend queue - never both.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TimerState {
    /// not posted yet, or acknowledged
    Idle,
    TimerTracked(RoomId),
    Queued,
}

/// A piece of a fragment's data with its own sequence number. A segment lives in its endpoint's
///  send window from its first post until it is acknowledged; it is returned to the segment pool
///  when it is acknowledged *and* no posted send references its packet buffer any more.
pub struct SendSegment {
    pub(crate) seq: Seq,
    pub(crate) payload_len: usize,
    pub(crate) fragment: FragmentId,
    pub(crate) timer: TimerState,
    pub(crate) ack_pending: bool,
    /// the number of posted sends the hardware has not reported as complete yet
    pub(crate) send_posted: u32,
    pub(crate) channel: Channel,
    /// header and payload as they go on the wire
    pub(crate) packet: BytesMut,
}

impl SendSegment {
    pub(crate) fn new(seq: Seq, fragment: FragmentId, channel: Channel, packet: BytesMut) -> SendSegment {
        assert!(packet.len() >= SegmentHeader::SERIALIZED_LEN, "this is a bug: segment packet without header");

        SendSegment {
            seq,
            payload_len: packet.len() - SegmentHeader::SERIALIZED_LEN,
            fragment,
            timer: TimerState::Idle,
            ack_pending: false,
            send_posted: 0,
            channel,
            packet,
        }
    }

    pub fn seq(&self) -> Seq {
        self.seq
    }

    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    pub fn fragment(&self) -> FragmentId {
        self.fragment
    }

    pub fn timer(&self) -> TimerState {
        self.timer
    }

    pub fn is_ack_pending(&self) -> bool {
        self.ack_pending
    }

    pub fn send_posted(&self) -> u32 {
        self.send_posted
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn packet(&self) -> &[u8] {
        &self.packet
    }
}

/// A standalone ACK control segment. It carries nothing but a header.
pub struct AckSegment {
    pub(crate) endpoint: EndpointId,
    pub(crate) channel: Channel,
    pub(crate) packet: BytesMut,
}

impl AckSegment {
    pub(crate) fn new(endpoint: EndpointId) -> AckSegment {
        AckSegment {
            endpoint,
            channel: Channel::Priority,
            packet: BytesMut::with_capacity(SegmentHeader::SERIALIZED_LEN),
        }
    }

    pub fn endpoint(&self) -> EndpointId {
        self.endpoint
    }
}
