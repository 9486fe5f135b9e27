use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use crate::config::{AckConfig, AckExhaustionPolicy};
use crate::endpoint::EndpointId;
use crate::segment::Channel;
use crate::send_poster::{SendPoster, SendToken};

/// small enough to run into limits in tests: window size 4, 100 bytes per segment
pub fn test_config() -> AckConfig {
    AckConfig {
        window_size: 4,
        retrans_timeout: Duration::from_millis(10),
        max_payload_len: 100,
        max_send_segments: 16,
        max_fragments: 8,
        ack_segment_pool_size: 4,
        send_slots_per_channel: 16,
        ack_exhaustion_policy: AckExhaustionPolicy::Skip,
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PostedPacket {
    pub endpoint: EndpointId,
    pub token: SendToken,
    pub channel: Channel,
    pub packet: Vec<u8>,
}

/// A [SendPoster] that records posted packets instead of sending them. Clones share the record,
///  so a test can keep one while the module owns the other.
#[derive(Clone, Default)]
pub struct RecordingSendPoster {
    posted: Rc<RefCell<Vec<PostedPacket>>>,
}

impl RecordingSendPoster {
    pub fn posted(&self) -> Vec<PostedPacket> {
        self.posted.borrow().clone()
    }

    /// returns posted packets, clearing the internal buffer
    pub fn take(&self) -> Vec<PostedPacket> {
        std::mem::take(&mut *self.posted.borrow_mut())
    }
}

impl SendPoster for RecordingSendPoster {
    fn post(&mut self, endpoint: EndpointId, token: SendToken, channel: Channel, packet: &[u8]) {
        self.posted.borrow_mut().push(PostedPacket {
            endpoint,
            token,
            channel,
            packet: packet.to_vec(),
        });
    }
}
