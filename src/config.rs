use std::time::Duration;
use anyhow::bail;
use crate::header::SegmentHeader;

/// What to do when an ACK should be sent, but the pool of ACK control segments is empty
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AckExhaustionPolicy {
    /// Log and abort the process. Losing an ACK is not catastrophic since the peer will time out
    ///  and resend, so this is mainly useful for debugging resource sizing.
    Abort,
    /// Log, count and skip the ACK. The endpoint stays marked as 'ACK needed', so the next
    ///  progress pass tries again.
    Skip,
}

#[derive(Debug, Clone)]
pub struct AckConfig {
    /// The number of slots in each endpoint's send window, i.e. the maximum number of segments
    ///  that can be in flight (sent but not acknowledged) per endpoint. This is also the size of
    ///  the receive window, and the number of rooms in each endpoint's timeout hotel.
    ///
    /// Must be a power of two to allow cheap mapping of sequence numbers to slots, and much smaller
    ///  than the sequence number space to keep wrap-around comparisons unambiguous.
    pub window_size: usize,

    /// Time after which a posted segment without ACK is queued for retransmission
    pub retrans_timeout: Duration,

    /// Maximum payload bytes per segment. Fragments are split into segments of this size (the
    ///  last one being shorter). Header and payload together must fit into a single datagram.
    pub max_payload_len: usize,

    pub max_send_segments: usize,
    pub max_fragments: usize,
    pub ack_segment_pool_size: usize,

    /// The number of sends that can be posted on each channel before the hardware reports
    ///  completion
    pub send_slots_per_channel: usize,

    pub ack_exhaustion_policy: AckExhaustionPolicy,
}

impl AckConfig {
    pub const MAX_WINDOW_SIZE: usize = 16384;
    pub const MAX_DATAGRAM_LEN: usize = 65507;

    /// Defaults for a data center Ethernet interconnect with regular (non-jumbo) frames: 1472
    ///  bytes of UDP payload minus the segment header.
    pub fn default_config() -> AckConfig {
        AckConfig {
            window_size: 4096,
            retrans_timeout: Duration::from_millis(5),
            max_payload_len: 1472 - SegmentHeader::SERIALIZED_LEN,
            max_send_segments: 8192,
            max_fragments: 1024,
            ack_segment_pool_size: 256,
            send_slots_per_channel: 512,
            ack_exhaustion_policy: AckExhaustionPolicy::Skip,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.window_size.is_power_of_two() || self.window_size < 2 {
            bail!("window size must be a power of two and at least 2, was {}", self.window_size);
        }
        if self.window_size > Self::MAX_WINDOW_SIZE {
            bail!("window size must not exceed {}, was {}", Self::MAX_WINDOW_SIZE, self.window_size);
        }
        if self.retrans_timeout.is_zero() {
            bail!("retransmit timeout must be positive");
        }
        if self.max_payload_len == 0 {
            bail!("max payload length must be positive");
        }
        if self.max_payload_len + SegmentHeader::SERIALIZED_LEN > Self::MAX_DATAGRAM_LEN {
            bail!("max payload length {} plus header does not fit into a single datagram", self.max_payload_len);
        }
        if self.max_send_segments == 0 || self.max_fragments == 0 || self.ack_segment_pool_size == 0 {
            bail!("segment, fragment and ACK segment pools must not be empty");
        }
        if self.send_slots_per_channel == 0 {
            bail!("there must be at least one send slot per channel");
        }

        Ok(())
    }
}
