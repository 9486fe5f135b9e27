#[cfg(test)] use mockall::automock;
use crate::endpoint::EndpointId;
use crate::segment::{AckSegmentId, Channel, SegmentId};

/// Identifies a posted send when the hardware reports its completion, see
///  [crate::module::Module::send_complete]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SendToken {
    Data(SegmentId),
    Ack(AckSegmentId),
}

/// This is an abstraction for handing a packet to the NIC's send queue, introduced to keep the
///  hardware out of the protocol logic and to facilitate mocking it away for testing.
///
/// Posting is asynchronous and must not block. The implementation reports every post back
///  exactly once through `Module::send_complete(token)` when the hardware is done with the
///  packet, whether or not the packet actually reached the peer.
#[cfg_attr(test, automock)]
pub trait SendPoster {
    fn post(&mut self, endpoint: EndpointId, token: SendToken, channel: Channel, packet: &[u8]);
}
