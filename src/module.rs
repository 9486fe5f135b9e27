use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use anyhow::bail;
use bytes::{Bytes, BytesMut};
use rustc_hash::FxHashMap;
use tracing::{debug, error, info, trace, warn};
use crate::config::AckConfig;
use crate::endpoint::{Endpoint, EndpointId, ReceiveVerdict};
use crate::fragment::{FragmentId, FragmentOptions, SendFragment};
use crate::header::{SegmentHeader, SegmentKind};
use crate::pool::SendPools;
use crate::resend_queue::ResendQueue;
use crate::safe_converter::{PrecheckedCast, SafeCast};
use crate::segment::{Channel, SegmentId, SendSegment, TimerState};
use crate::send_poster::{SendPoster, SendToken};
use crate::seq::Seq;
use crate::stats::AckStats;

/// A data segment accepted by the receive path, to be handed to the upper layer
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ReceivedSegment {
    pub seq: Seq,
    pub channel: Channel,
    pub payload: Bytes,
}

enum TransmitOutcome {
    /// the endpoint has nothing more it may send, either because its queue is empty or because
    ///  its window is closed
    Drained,
    OutOfResources,
}

/// The reliability engine for one NIC: endpoints with their send windows and ACK state, plus the
///  module-wide pools, resend queue, send slots and counters.
///
/// All operations take `&mut self` and run to completion without blocking, so a module is driven
///  from a single polling context. See [Module::progress].
pub struct Module {
    pub(crate) config: Arc<AckConfig>,
    pub(crate) poster: Box<dyn SendPoster>,
    pub(crate) endpoints: FxHashMap<EndpointId, Endpoint>,
    next_endpoint_id: u32,

    pub(crate) pools: SendPools,
    pub(crate) resend_queue: ResendQueue,
    /// per channel: the number of sends that can be posted before the hardware completes some
    pub(crate) send_slots: [usize; Channel::COUNT],
    pub(crate) ready_endpoints: VecDeque<EndpointId>,

    pub(crate) stats: AckStats,
}

impl Module {
    pub fn new(config: Arc<AckConfig>, poster: Box<dyn SendPoster>) -> anyhow::Result<Module> {
        config.validate()?;

        info!("initializing module: window size {}, retransmit timeout {:?}, max payload {} bytes",
            config.window_size, config.retrans_timeout, config.max_payload_len);

        Ok(Module {
            pools: SendPools::new(&config),
            send_slots: [config.send_slots_per_channel; Channel::COUNT],
            config,
            poster,
            endpoints: Default::default(),
            next_endpoint_id: 0,
            resend_queue: Default::default(),
            ready_endpoints: Default::default(),
            stats: Default::default(),
        })
    }

    pub fn config(&self) -> &AckConfig {
        &self.config
    }

    /// Register a peer. The starting sequence numbers of both directions are agreed on out of
    ///  band, typically chosen with [Seq::random] and exchanged during connection setup.
    pub fn add_endpoint(&mut self, local_start_seq: Seq, peer_start_seq: Seq) -> EndpointId {
        let id = EndpointId::from_raw(self.next_endpoint_id);
        self.next_endpoint_id += 1;

        debug!("adding endpoint {}: sending from seq {}, receiving from seq {}", id, local_start_seq, peer_start_seq);
        self.endpoints.insert(id, Endpoint::new(id, self.config.window_size, local_start_seq, peer_start_seq));
        id
    }

    pub fn endpoint(&self, id: EndpointId) -> Option<&Endpoint> {
        self.endpoints.get(&id)
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&SendFragment> {
        self.pools.fragments.get(id)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&SendSegment> {
        self.pools.segments.get(id)
    }

    pub fn resend_queue(&self) -> &ResendQueue {
        &self.resend_queue
    }

    pub fn segments_in_use(&self) -> usize {
        self.pools.segments.in_use()
    }

    pub fn fragments_in_use(&self) -> usize {
        self.pools.fragments.in_use()
    }

    pub fn ack_segments_in_use(&self) -> usize {
        self.pools.acks.in_use()
    }

    pub fn send_slots(&self, channel: Channel) -> usize {
        self.send_slots[channel.index()]
    }

    pub fn stats(&self) -> AckStats {
        self.stats
    }

    pub fn log_stats(&self) {
        self.stats.log_report("ACK stats");
    }

    /// The earliest retransmit deadline of all endpoints, i.e. the latest point in time when
    ///  [Module::progress] should be called next if nothing else happens
    pub fn next_deadline(&self) -> Option<Instant> {
        self.endpoints.values()
            .filter_map(|ep| ep.hotel.next_deadline())
            .min()
    }

    /// Queue a fragment for sending to an endpoint. It is split into segments lazily, as the
    ///  endpoint's window and the module's resources allow.
    pub fn send_fragment(&mut self, endpoint_id: EndpointId, payload: Bytes, options: FragmentOptions) -> anyhow::Result<FragmentId> {
        if payload.is_empty() {
            bail!("fragments must not be empty");
        }
        let Some(endpoint) = self.endpoints.get_mut(&endpoint_id) else {
            bail!("sending fragment to unknown endpoint {}", endpoint_id);
        };

        let len = payload.len();
        let Some(fragment_id) = self.pools.fragments.allocate(SendFragment::new(endpoint_id, payload, options)) else {
            bail!("no free fragment to send {} bytes to endpoint {}", len, endpoint_id);
        };

        trace!("queueing fragment {:?} with {} bytes for endpoint {}", fragment_id, len, endpoint_id);
        endpoint.send_queue.push_back(fragment_id);
        self.recompute_ready_to_send(endpoint_id);
        Ok(fragment_id)
    }

    /// One pass of the polling loop: handle expired retransmit timers, post queued resends, send
    ///  new data for endpoints that are ready, and send ACKs that were not piggy-backed.
    pub fn progress(&mut self, now: Instant) {
        self.handle_timeouts(now);
        self.drain_resend_queue(now);
        self.transmit_ready(now);
        self.flush_acks();
    }

    fn sorted_endpoint_ids(&self) -> Vec<EndpointId> {
        let mut result = self.endpoints.keys().copied().collect::<Vec<_>>();
        result.sort();
        result
    }

    fn handle_timeouts(&mut self, now: Instant) {
        for endpoint_id in self.sorted_endpoint_ids() {
            let expired = match self.endpoints.get_mut(&endpoint_id) {
                Some(endpoint) => endpoint.hotel.evict_expired(now),
                None => continue,
            };
            for (room, segment_id) in expired {
                self.on_timeout(endpoint_id, room, segment_id);
            }
        }
    }

    fn drain_resend_queue(&mut self, now: Instant) {
        while let Some(segment_id) = self.resend_queue.front() {
            let segment = self.pools.segments.get_mut(segment_id)
                .expect("this is a bug: resend queue refers to a segment that is not allocated");
            if self.send_slots[segment.channel.index()] == 0 {
                trace!("no free send slot on {:?} channel, postponing resends", segment.channel);
                break;
            }
            self.resend_queue.pop_front();
            debug_assert_eq!(segment.timer, TimerState::Queued);

            let endpoint_id = self.pools.fragments.get(segment.fragment)
                .expect("this is a bug: queued segment refers to a fragment that is not allocated")
                .endpoint();
            let endpoint = self.endpoints.get_mut(&endpoint_id)
                .expect("this is a bug: queued segment for an unknown endpoint");

            let Some(room) = endpoint.hotel.checkin(segment_id, now + self.config.retrans_timeout) else {
                error!("no free room to track resent segment {} for endpoint {} - requeueing", segment.seq, endpoint_id);
                self.resend_queue.push_front(segment_id);
                break;
            };
            segment.timer = TimerState::TimerTracked(room);

            SegmentHeader::patch_ack_seq(&mut segment.packet, take_piggyback_ack(endpoint));
            segment.send_posted += 1;

            trace!("resending segment {} to endpoint {}", segment.seq, endpoint_id);
            post_packet(self.poster.as_mut(), &mut self.send_slots, endpoint_id, SendToken::Data(segment_id), segment.channel, &segment.packet);
            self.stats.num_resends += 1;
        }
    }

    fn transmit_ready(&mut self, now: Instant) {
        let mut pending = std::mem::take(&mut self.ready_endpoints);

        while let Some(endpoint_id) = pending.pop_front() {
            match self.transmit_from(endpoint_id, now) {
                TransmitOutcome::Drained => {
                    if let Some(endpoint) = self.endpoints.get_mut(&endpoint_id) {
                        endpoint.ready_to_send = false;
                    }
                }
                TransmitOutcome::OutOfResources => {
                    pending.push_front(endpoint_id);
                    break;
                }
            }
        }

        pending.extend(self.ready_endpoints.drain(..));
        self.ready_endpoints = pending;
    }

    fn transmit_from(&mut self, endpoint_id: EndpointId, now: Instant) -> TransmitOutcome {
        let Some(endpoint) = self.endpoints.get_mut(&endpoint_id) else {
            return TransmitOutcome::Drained;
        };

        loop {
            if !endpoint.window_is_open() {
                trace!("send window of endpoint {} is full", endpoint_id);
                return TransmitOutcome::Drained;
            }
            let Some(&fragment_id) = endpoint.send_queue.front() else {
                return TransmitOutcome::Drained;
            };
            if self.send_slots[Channel::Data.index()] == 0 || self.pools.segments.available() == 0 {
                trace!("out of send slots or segments, postponing data for endpoint {}", endpoint_id);
                return TransmitOutcome::OutOfResources;
            }

            let fragment = self.pools.fragments.get_mut(fragment_id)
                .expect("this is a bug: send queue refers to a fragment that is not allocated");
            let Some(chunk) = fragment.next_chunk(self.config.max_payload_len) else {
                endpoint.send_queue.pop_front();
                continue;
            };
            fragment.on_segment_allocated();
            if !fragment.has_unsent() {
                endpoint.send_queue.pop_front();
            }

            let seq = endpoint.next_seq_to_send;
            let mut packet = BytesMut::with_capacity(SegmentHeader::SERIALIZED_LEN + chunk.len());
            SegmentHeader::data(Channel::Data, seq, take_piggyback_ack(endpoint), chunk.len().prechecked_cast())
                .ser(&mut packet);
            packet.extend_from_slice(&chunk);

            let segment_id = self.pools.segments.allocate(SendSegment::new(seq, fragment_id, Channel::Data, packet))
                .expect("this is a bug: segment availability was checked");
            endpoint.sent_segs.insert(seq, segment_id);
            endpoint.next_seq_to_send = seq.next();

            let room = endpoint.hotel.checkin(segment_id, now + self.config.retrans_timeout)
                .expect("this is a bug: the hotel has a room for every slot in the send window");

            let segment = self.pools.segments.get_mut(segment_id)
                .expect("this is a bug: freshly allocated segment is missing");
            segment.timer = TimerState::TimerTracked(room);
            segment.ack_pending = true;
            segment.send_posted += 1;

            trace!("sending segment {} with {} bytes to endpoint {}", seq, chunk.len(), endpoint_id);
            post_packet(self.poster.as_mut(), &mut self.send_slots, endpoint_id, SendToken::Data(segment_id), Channel::Data, &segment.packet);
            self.stats.num_data_sends += 1;
        }
    }

    fn flush_acks(&mut self) {
        for endpoint_id in self.sorted_endpoint_ids() {
            if self.endpoints.get(&endpoint_id).map(|ep| ep.ack_needed).unwrap_or(false) {
                self.send_ack(endpoint_id);
            }
        }
    }

    /// The hardware is done with a posted send. Every post is completed exactly once, whether the
    ///  packet reached the peer or not.
    pub fn send_complete(&mut self, token: SendToken) {
        let segment_id = match token {
            SendToken::Ack(ack_id) => return self.ack_send_complete(ack_id),
            SendToken::Data(segment_id) => segment_id,
        };

        let segment = self.pools.segments.get_mut(segment_id)
            .expect("this is a bug: send completion for a segment that is not allocated");
        segment.send_posted = segment.send_posted.checked_sub(1)
            .expect("this is a bug: more send completions than posts");
        self.send_slots[segment.channel.index()] += 1;

        if !segment.ack_pending && segment.send_posted == 0 {
            let fragment_id = segment.fragment;
            self.pools.release_send_segment(fragment_id, segment_id);
            self.pools.return_fragment_if_done(fragment_id);
        }
    }

    /// Process a packet that arrived from an endpoint. ACKs (standalone or piggy-backed) are
    ///  processed, and a data segment's payload is returned if it was not received before.
    pub fn on_packet_received(&mut self, endpoint_id: EndpointId, packet: &[u8]) -> anyhow::Result<Option<ReceivedSegment>> {
        if !self.endpoints.contains_key(&endpoint_id) {
            bail!("received packet from unknown endpoint {}", endpoint_id);
        }

        let mut buf = packet;
        let header = SegmentHeader::deser(&mut buf)?;
        let payload_len: usize = header.payload_len.safe_cast();
        if buf.len() != payload_len {
            bail!("header announces {} bytes of payload, packet has {}", payload_len, buf.len());
        }

        if let Some(ack_seq) = header.ack_seq {
            self.handle_ack(endpoint_id, ack_seq);
        }
        if header.kind == SegmentKind::Ack {
            return Ok(None);
        }

        let endpoint = self.endpoints.get_mut(&endpoint_id)
            .expect("this is a bug: endpoint was checked to exist");
        let verdict = endpoint.record_received(header.seq);
        trace!("received segment {} from endpoint {}: {:?}", header.seq, endpoint_id, verdict);

        match verdict {
            ReceiveVerdict::OutsideWindow => {
                warn!("segment {} from endpoint {} is outside the receive window (expecting {}) - dropping",
                    header.seq, endpoint_id, endpoint.next_contig_seq_to_recv());
                Ok(None)
            }
            ReceiveVerdict::Duplicate => {
                endpoint.ack_needed = true;
                Ok(None)
            }
            ReceiveVerdict::InOrder | ReceiveVerdict::OutOfOrder => {
                endpoint.ack_needed = true;
                Ok(Some(ReceivedSegment {
                    seq: header.seq,
                    channel: header.channel,
                    payload: Bytes::copy_from_slice(buf),
                }))
            }
        }
    }
}

/// The ACK value to piggy-back on an outgoing data segment, if the peer is waiting for one
fn take_piggyback_ack(endpoint: &mut Endpoint) -> Option<Seq> {
    if endpoint.ack_needed {
        endpoint.ack_needed = false;
        Some(endpoint.ack_value())
    }
    else {
        None
    }
}

pub(crate) fn post_packet(poster: &mut dyn SendPoster, send_slots: &mut [usize; Channel::COUNT], endpoint_id: EndpointId, token: SendToken, channel: Channel, packet: &[u8]) {
    let slots = &mut send_slots[channel.index()];
    assert!(*slots > 0, "this is a bug: posting on {:?} channel without a free send slot", channel);
    *slots -= 1;

    poster.post(endpoint_id, token, channel, packet);
}
