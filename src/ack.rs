//! Processing of incoming ACKs and sending of outgoing ones, and the retransmission triggers
//!  (duplicate ACKs and expired timers) that feed the resend queue.
//!
//! ACKs are cumulative: an ACK for sequence number `n` acknowledges every segment up to and
//!  including `n`. A receiver that sees a gap keeps acknowledging the last segment before the
//!  gap, and the sender treats the first repetition of its current ACK as a signal that the next
//!  segment was lost, retransmitting it without waiting for the timeout.

use tracing::{debug, error, trace, warn};
use crate::config::AckExhaustionPolicy;
use crate::endpoint::EndpointId;
use crate::header::SegmentHeader;
use crate::hotel::RoomId;
use crate::module::{post_packet, Module};
use crate::segment::{AckSegmentId, Channel, SegmentId, TimerState};
use crate::send_poster::SendToken;
use crate::seq::Seq;

impl Module {
    /// Process a cumulative ACK from an endpoint.
    ///
    /// NB: An ACK for a segment that was never sent is a protocol violation, and it panics
    pub fn handle_ack(&mut self, endpoint_id: EndpointId, ack_seq: Seq) {
        let Some(endpoint) = self.endpoints.get_mut(&endpoint_id) else {
            warn!("ACK {} for unknown endpoint {} - ignoring", ack_seq, endpoint_id);
            return;
        };

        let ack_seq_rcvd = endpoint.ack_seq_rcvd;
        if ack_seq.is_before(ack_seq_rcvd) {
            debug!("stale ACK {} from endpoint {}, already received ACK {}", ack_seq, endpoint_id, ack_seq_rcvd);
            self.stats.num_old_dup_acks += 1;
            return;
        }
        if ack_seq == ack_seq_rcvd {
            trace!("duplicate ACK {} from endpoint {}", ack_seq, endpoint_id);
            self.stats.num_dup_acks += 1;
            self.force_retransmit(endpoint_id, ack_seq);
            return;
        }

        assert!(ack_seq.is_before(endpoint.next_seq_to_send),
            "protocol violation: endpoint {} acknowledged seq {}, but the highest seq sent is {}", endpoint_id, ack_seq, endpoint.next_seq_to_send.prev());

        trace!("ACK {} from endpoint {}, advancing from {}", ack_seq, endpoint_id, ack_seq_rcvd);

        let mut seq = ack_seq_rcvd;
        while seq != ack_seq {
            seq = seq.next();

            let segment_id = endpoint.sent_segs.get(seq)
                .unwrap_or_else(|| panic!("this is a bug: seq {} of endpoint {} is acknowledged but not in the send window", seq, endpoint_id));
            let segment = self.pools.segments.get_mut(segment_id)
                .expect("this is a bug: send window refers to a segment that is not allocated");
            assert_eq!(segment.seq, seq, "this is a bug: send window slot holds the wrong segment");

            match segment.timer {
                TimerState::TimerTracked(room) => {
                    endpoint.hotel.checkout(room);
                }
                TimerState::Queued => {
                    let was_queued = self.resend_queue.remove(segment_id);
                    debug_assert!(was_queued, "this is a bug: segment is marked as queued but not in the resend queue");
                }
                TimerState::Idle => {
                    panic!("this is a bug: acknowledged segment {} of endpoint {} is neither tracked nor queued", seq, endpoint_id);
                }
            }
            segment.timer = TimerState::Idle;
            segment.ack_pending = false;

            let payload_len = segment.payload_len;
            let fragment_id = segment.fragment;
            let send_posted = segment.send_posted;

            let fragment = self.pools.fragments.get_mut(fragment_id)
                .expect("this is a bug: segment refers to a fragment that is not allocated");
            fragment.on_bytes_acked(payload_len);
            if fragment.wants_completion_callback() {
                trace!("fragment {:?} to endpoint {} is completely acknowledged", fragment_id, endpoint_id);
                fragment.fire_completion(fragment_id);
            }

            if send_posted == 0 {
                self.pools.release_send_segment(fragment_id, segment_id);
            }
            self.pools.return_fragment_if_done(fragment_id);
            endpoint.sent_segs.clear(seq);
        }

        endpoint.ack_seq_rcvd = ack_seq;
        self.recompute_ready_to_send(endpoint_id);
    }

    /// Queue the segment following `ack_seq` for immediate retransmission, unless it is already
    ///  queued or there is no such segment
    pub fn force_retransmit(&mut self, endpoint_id: EndpointId, ack_seq: Seq) {
        let Some(endpoint) = self.endpoints.get_mut(&endpoint_id) else {
            return;
        };

        let seq = ack_seq.next();
        let Some(segment_id) = endpoint.sent_segs.get(seq) else {
            trace!("nothing to retransmit after {} for endpoint {}", ack_seq, endpoint_id);
            return;
        };
        let Some(segment) = self.pools.segments.get_mut(segment_id) else {
            return;
        };
        if segment.seq != seq {
            return;
        }
        let TimerState::TimerTracked(room) = segment.timer else {
            trace!("segment {} for endpoint {} is already queued for resend", seq, endpoint_id);
            return;
        };

        debug!("fast retransmit of segment {} for endpoint {}", seq, endpoint_id);
        endpoint.hotel.checkout(room);
        segment.timer = TimerState::Queued;
        self.resend_queue.push_back(segment_id);
        self.stats.num_fast_retrans += 1;
    }

    /// Send a standalone ACK with the highest sequence number received without a gap
    pub fn send_ack(&mut self, endpoint_id: EndpointId) {
        let Some(endpoint) = self.endpoints.get_mut(&endpoint_id) else {
            warn!("sending ACK to unknown endpoint {} - ignoring", endpoint_id);
            return;
        };

        if self.send_slots[Channel::Priority.index()] == 0 {
            debug!("no free send slot on the priority channel, deferring ACK to endpoint {}", endpoint_id);
            endpoint.ack_needed = true;
            return;
        }

        let Some(ack_id) = self.pools.allocate_ack_segment(endpoint_id) else {
            match self.config.ack_exhaustion_policy {
                AckExhaustionPolicy::Abort => {
                    error!("ACK segment pool is exhausted, cannot send ACK to endpoint {} - aborting", endpoint_id);
                    std::process::abort();
                }
                AckExhaustionPolicy::Skip => {
                    debug!("ACK segment pool is exhausted, skipping ACK to endpoint {}", endpoint_id);
                    self.stats.num_ack_skips += 1;
                    endpoint.ack_needed = true;
                    return;
                }
            }
        };

        let ack_value = endpoint.ack_value();
        let ack = self.pools.acks.get_mut(ack_id)
            .expect("this is a bug: freshly allocated ACK segment is missing");
        ack.packet.clear();
        SegmentHeader::ack(ack_value).ser(&mut ack.packet);

        trace!("sending ACK {} to endpoint {}", ack_value, endpoint_id);
        post_packet(self.poster.as_mut(), &mut self.send_slots, endpoint_id, SendToken::Ack(ack_id), ack.channel, &ack.packet);

        endpoint.ack_needed = false;
        self.stats.num_ack_sends += 1;
    }

    /// The hardware is done with a standalone ACK
    pub fn ack_send_complete(&mut self, ack_id: AckSegmentId) {
        let ack = self.pools.return_ack_segment(ack_id)
            .expect("this is a bug: send completion for an ACK segment that is not allocated");
        self.send_slots[ack.channel.index()] += 1;
    }

    /// A segment's retransmit timer expired. The hotel already vacated the room.
    pub fn on_timeout(&mut self, endpoint_id: EndpointId, room: RoomId, segment_id: SegmentId) {
        let segment = self.pools.segments.get_mut(segment_id)
            .expect("this is a bug: timed out segment is not allocated");
        debug_assert_eq!(segment.timer, TimerState::TimerTracked(room));

        debug!("segment {} for endpoint {} timed out", segment.seq, endpoint_id);
        segment.timer = TimerState::Queued;
        self.resend_queue.push_back(segment_id);
        self.stats.num_timeout_retrans += 1;
    }

    pub(crate) fn recompute_ready_to_send(&mut self, endpoint_id: EndpointId) {
        let Some(endpoint) = self.endpoints.get_mut(&endpoint_id) else {
            return;
        };

        if !endpoint.ready_to_send && endpoint.has_queued_data() && endpoint.window_is_open() {
            trace!("endpoint {} is ready to send", endpoint_id);
            endpoint.ready_to_send = true;
            self.ready_endpoints.push_back(endpoint_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::sync::Arc;
    use std::time::Instant;
    use bytes::Bytes;
    use mockall::predicate::{always, eq};
    use rstest::rstest;
    use crate::config::{AckConfig, AckExhaustionPolicy};
    use crate::endpoint::EndpointId;
    use crate::fragment::{FragmentId, FragmentOptions};
    use crate::header::{SegmentHeader, SegmentKind};
    use crate::module::Module;
    use crate::segment::{Channel, SegmentId, TimerState};
    use crate::send_poster::{MockSendPoster, SendToken};
    use crate::seq::Seq;
    use crate::stats::AckStats;
    use crate::test_util::{test_config, RecordingSendPoster};

    struct Fixture {
        module: Module,
        poster: RecordingSendPoster,
        ep: EndpointId,
        completions: Rc<RefCell<Vec<FragmentId>>>,
        now: Instant,
    }

    impl Fixture {
        /// window size 4, 100 bytes per segment
        fn new(local_start_seq: u16) -> Fixture {
            let poster = RecordingSendPoster::default();
            let mut module = Module::new(Arc::new(test_config()), Box::new(poster.clone())).unwrap();
            let ep = module.add_endpoint(Seq::from_raw(local_start_seq), Seq::from_raw(0));
            Fixture {
                module,
                poster,
                ep,
                completions: Default::default(),
                now: Instant::now(),
            }
        }

        fn send(&mut self, len: usize, always_callback: bool) -> FragmentId {
            let completions = self.completions.clone();
            let fragment_id = self.module.send_fragment(self.ep, Bytes::from(vec![5u8; len]), FragmentOptions {
                dst: None,
                always_callback,
                on_complete: Some(Box::new(move |_, fragment_id| completions.borrow_mut().push(fragment_id))),
            }).unwrap();
            self.module.progress(self.now);
            fragment_id
        }

        fn segment_id(&self, seq: u16) -> SegmentId {
            self.module.endpoint(self.ep).unwrap()
                .sent_segment(Seq::from_raw(seq))
                .unwrap()
        }

        fn timer(&self, seq: u16) -> TimerState {
            self.module.segment(self.segment_id(seq)).unwrap().timer()
        }

        fn complete_all_sends(&mut self) {
            for posted in self.poster.take() {
                self.module.send_complete(posted.token);
            }
        }
    }

    #[test]
    fn test_three_segment_scenario() {
        let mut f = Fixture::new(1);

        // the initial ACK value repeated before anything was sent: counted, nothing to resend
        f.module.handle_ack(f.ep, Seq::from_raw(0));
        assert_eq!(f.module.stats().num_dup_acks, 1);
        assert_eq!(f.module.stats().num_fast_retrans, 0);
        assert_eq!(f.module.endpoint(f.ep).unwrap().ack_seq_rcvd(), Seq::from_raw(0));
        assert!(f.module.resend_queue().is_empty());

        let fragment_id = f.send(300, true);
        for seq in 1..=3 {
            assert!(matches!(f.timer(seq), TimerState::TimerTracked(_)));
        }

        assert_eq!(f.module.endpoint(f.ep).unwrap().ack_seq_rcvd(), Seq::from_raw(0));
        assert_eq!(f.module.endpoint(f.ep).unwrap().num_sent_segments(), 3);
        f.complete_all_sends();

        f.module.handle_ack(f.ep, Seq::from_raw(2));
        let endpoint = f.module.endpoint(f.ep).unwrap();
        assert_eq!(endpoint.ack_seq_rcvd(), Seq::from_raw(2));
        assert_eq!(endpoint.sent_segment(Seq::from_raw(1)), None);
        assert_eq!(endpoint.sent_segment(Seq::from_raw(2)), None);
        assert_eq!(endpoint.num_sent_segments(), 1);
        assert_eq!(endpoint.hotel_occupancy(), 1);
        assert_eq!(f.module.fragment(fragment_id).unwrap().ack_bytes_left(), 100);
        assert_eq!(f.module.segments_in_use(), 1);
        assert!(f.completions.borrow().is_empty());

        f.module.handle_ack(f.ep, Seq::from_raw(1));
        assert_eq!(f.module.stats().num_old_dup_acks, 1);
        assert_eq!(f.module.endpoint(f.ep).unwrap().ack_seq_rcvd(), Seq::from_raw(2));
        assert_eq!(f.module.fragment(fragment_id).unwrap().ack_bytes_left(), 100);

        f.module.handle_ack(f.ep, Seq::from_raw(2));
        assert_eq!(f.module.stats().num_dup_acks, 2);
        assert_eq!(f.module.stats().num_fast_retrans, 1);
        assert_eq!(f.timer(3), TimerState::Queued);
        assert_eq!(f.module.resend_queue().iter().collect::<Vec<_>>(), vec![f.segment_id(3)]);
        assert_eq!(f.module.endpoint(f.ep).unwrap().hotel_occupancy(), 0);

        f.module.handle_ack(f.ep, Seq::from_raw(3));
        assert_eq!(*f.completions.borrow(), vec![fragment_id]);
        assert!(f.module.resend_queue().is_empty());
        assert_eq!(f.module.segments_in_use(), 0);
        assert_eq!(f.module.fragments_in_use(), 0);
        assert_eq!(f.module.endpoint(f.ep).unwrap().num_sent_segments(), 0);
    }

    #[test]
    fn test_duplicate_ack_queues_once() {
        let mut f = Fixture::new(1);
        f.send(300, false);
        f.module.handle_ack(f.ep, Seq::from_raw(1));

        f.module.handle_ack(f.ep, Seq::from_raw(1));
        f.module.handle_ack(f.ep, Seq::from_raw(1));

        assert_eq!(f.module.stats().num_dup_acks, 2);
        assert_eq!(f.module.stats().num_fast_retrans, 1);
        assert_eq!(f.module.resend_queue().len(), 1);
        assert_eq!(f.module.endpoint(f.ep).unwrap().ack_seq_rcvd(), Seq::from_raw(1));
    }

    #[test]
    fn test_duplicate_ack_without_outstanding_segment() {
        let mut f = Fixture::new(1);
        f.module.handle_ack(f.ep, Seq::from_raw(0));

        assert_eq!(f.module.stats().num_dup_acks, 1);
        assert_eq!(f.module.stats().num_fast_retrans, 0);
        assert!(f.module.resend_queue().is_empty());
    }

    #[test]
    fn test_timed_out_segment_acked_while_queued() {
        let mut f = Fixture::new(1);
        f.send(200, false);
        f.complete_all_sends();

        assert!(matches!(f.timer(1), TimerState::TimerTracked(_)));
        // timeouts fire, but the resends are not posted yet
        let evicted = f.module.endpoints.get_mut(&f.ep).unwrap().hotel.evict_expired(f.now + test_config().retrans_timeout);
        assert_eq!(evicted.len(), 2);
        assert_eq!(evicted[0].1, f.segment_id(1));
        for (room, segment_id) in evicted {
            f.module.on_timeout(f.ep, room, segment_id);
        }
        assert_eq!(f.module.stats().num_timeout_retrans, 2);
        assert_eq!(f.timer(1), TimerState::Queued);
        assert_eq!(f.module.resend_queue().len(), 2);

        f.module.handle_ack(f.ep, Seq::from_raw(1));
        assert_eq!(f.module.resend_queue().iter().collect::<Vec<_>>(), vec![f.segment_id(2)]);
        assert_eq!(f.module.endpoint(f.ep).unwrap().hotel_occupancy(), 0);

        f.module.handle_ack(f.ep, Seq::from_raw(2));
        assert!(f.module.resend_queue().is_empty());
        assert_eq!(f.module.segments_in_use(), 0);
    }

    #[rstest]
    #[case::in_order(vec![1, 2, 3, 4])]
    #[case::with_gaps(vec![2, 4])]
    #[case::with_stale_and_duplicates(vec![3, 1, 3, 4, 4])]
    #[case::all_at_once(vec![4])]
    fn test_non_decreasing_acks_empty_the_window(#[case] acks: Vec<u16>) {
        let mut f = Fixture::new(1);
        f.send(400, true);
        f.complete_all_sends();

        for ack in acks {
            f.module.handle_ack(f.ep, Seq::from_raw(ack));
        }

        let endpoint = f.module.endpoint(f.ep).unwrap();
        assert_eq!(endpoint.ack_seq_rcvd(), Seq::from_raw(4));
        assert_eq!(endpoint.num_sent_segments(), 0);
        assert_eq!(endpoint.hotel_occupancy(), 0);
        assert_eq!(f.completions.borrow().len(), 1);
        assert_eq!(f.module.segments_in_use(), 0);
        assert_eq!(f.module.fragments_in_use(), 0);
    }

    #[test]
    fn test_wrap_around() {
        let mut f = Fixture::new(65534);
        let fragment_id = f.send(400, true);
        f.complete_all_sends();

        assert_eq!(f.module.endpoint(f.ep).unwrap().next_seq_to_send(), Seq::from_raw(2));

        f.module.handle_ack(f.ep, Seq::from_raw(65535));
        assert_eq!(f.module.fragment(fragment_id).unwrap().ack_bytes_left(), 200);

        f.module.handle_ack(f.ep, Seq::from_raw(65534));
        assert_eq!(f.module.stats().num_old_dup_acks, 1);

        f.module.handle_ack(f.ep, Seq::from_raw(1));
        assert_eq!(f.module.endpoint(f.ep).unwrap().ack_seq_rcvd(), Seq::from_raw(1));
        assert_eq!(f.module.endpoint(f.ep).unwrap().num_sent_segments(), 0);
        assert_eq!(*f.completions.borrow(), vec![fragment_id]);
    }

    #[test]
    fn test_completion_without_callback_request() {
        let mut f = Fixture::new(1);
        f.send(100, false);
        f.module.handle_ack(f.ep, Seq::from_raw(1));
        assert!(f.completions.borrow().is_empty());
    }

    #[test]
    fn test_put_always_completes() {
        let mut f = Fixture::new(1);
        let calls = Rc::new(Cell::new(0));
        let calls_in_callback = calls.clone();
        f.module.send_fragment(f.ep, Bytes::from(vec![1u8; 150]), FragmentOptions {
            dst: Some(0x4000),
            always_callback: false,
            on_complete: Some(Box::new(move |_, _| calls_in_callback.set(calls_in_callback.get() + 1))),
        }).unwrap();
        f.module.progress(f.now);

        f.module.handle_ack(f.ep, Seq::from_raw(1));
        assert_eq!(calls.get(), 0);
        f.module.handle_ack(f.ep, Seq::from_raw(2));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    #[should_panic]
    fn test_ack_beyond_sent_range() {
        let mut f = Fixture::new(1);
        f.send(200, false);
        f.module.handle_ack(f.ep, Seq::from_raw(3));
    }

    #[test]
    fn test_ack_for_unknown_endpoint() {
        let mut f = Fixture::new(1);
        f.module.handle_ack(EndpointId::from_raw(77), Seq::from_raw(3));
        assert_eq!(f.module.stats(), AckStats::default());
    }

    #[test]
    fn test_send_ack() {
        let mut f = Fixture::new(1);
        f.module.send_ack(f.ep);

        let posted = f.poster.take();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].channel, Channel::Priority);
        let header = SegmentHeader::deser(&mut posted[0].packet.as_slice()).unwrap();
        assert_eq!(header.kind, SegmentKind::Ack);
        assert_eq!(header.ack_seq, Some(Seq::from_raw(65535)));
        assert_eq!(posted[0].packet.len(), SegmentHeader::SERIALIZED_LEN);

        assert_eq!(f.module.stats().num_ack_sends, 1);
        assert_eq!(f.module.ack_segments_in_use(), 1);
        assert_eq!(f.module.send_slots(Channel::Priority), test_config().send_slots_per_channel - 1);

        f.module.send_complete(posted[0].token);
        assert_eq!(f.module.ack_segments_in_use(), 0);
        assert_eq!(f.module.send_slots(Channel::Priority), test_config().send_slots_per_channel);
    }

    #[test]
    fn test_ack_pool_exhausted_skips() {
        let config = AckConfig {
            ack_segment_pool_size: 1,
            ack_exhaustion_policy: AckExhaustionPolicy::Skip,
            ..test_config()
        };

        let mut poster = MockSendPoster::new();
        poster.expect_post()
            .withf(|_, token, channel, packet| matches!(token, SendToken::Ack(_))
                && *channel == Channel::Priority
                && packet.len() == SegmentHeader::SERIALIZED_LEN)
            .times(1)
            .return_const(());

        let mut module = Module::new(Arc::new(config), Box::new(poster)).unwrap();
        let ep = module.add_endpoint(Seq::from_raw(1), Seq::from_raw(1));
        let other = module.add_endpoint(Seq::from_raw(1), Seq::from_raw(1));

        module.send_ack(ep);
        module.send_ack(other);

        assert_eq!(module.stats().num_ack_sends, 1);
        assert_eq!(module.stats().num_ack_skips, 1);
        assert_eq!(module.ack_segments_in_use(), 1);
        assert!(!module.endpoint(ep).unwrap().is_ack_needed());
        assert!(module.endpoint(other).unwrap().is_ack_needed());
        assert_eq!(module.send_slots(Channel::Priority), test_config().send_slots_per_channel - 1);
    }

    const ABORT_CHILD_ENV: &str = "ACKFLOW_ACK_POOL_ABORT_CHILD";

    /// `Abort` ends the process, so the scenario runs in a child process re-executing this test
    #[cfg(unix)]
    #[test]
    fn test_ack_pool_exhausted_aborts() {
        use std::os::unix::process::ExitStatusExt;
        use std::process::{Command, Stdio};

        if std::env::var_os(ABORT_CHILD_ENV).is_some() {
            let config = AckConfig {
                ack_segment_pool_size: 1,
                ack_exhaustion_policy: AckExhaustionPolicy::Abort,
                ..test_config()
            };
            let mut module = Module::new(Arc::new(config), Box::new(RecordingSendPoster::default())).unwrap();
            let ep = module.add_endpoint(Seq::from_raw(1), Seq::from_raw(1));
            let other = module.add_endpoint(Seq::from_raw(1), Seq::from_raw(1));

            module.send_ack(ep);
            module.send_ack(other);
            unreachable!("ACK pool exhaustion did not abort");
        }

        let status = Command::new(std::env::current_exe().unwrap())
            .args(["--exact", "ack::tests::test_ack_pool_exhausted_aborts", "--test-threads=1"])
            .env(ABORT_CHILD_ENV, "1")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .unwrap();

        assert!(!status.success());
        assert_eq!(status.signal(), Some(6), "expected SIGABRT, got {:?}", status);
    }

    #[test]
    #[should_panic(expected = "neither tracked nor queued")]
    fn test_ack_for_untracked_segment_panics() {
        let mut f = Fixture::new(1);
        f.send(100, false);
        f.complete_all_sends();

        let segment_id = f.segment_id(1);
        let TimerState::TimerTracked(room) = f.timer(1) else {
            panic!("segment 1 should be tracked after sending");
        };
        f.module.endpoints.get_mut(&f.ep).unwrap().hotel.checkout(room);
        f.module.pools.segments.get_mut(segment_id).unwrap().timer = TimerState::Idle;

        f.module.handle_ack(f.ep, Seq::from_raw(1));
    }

    #[test]
    fn test_ack_deferred_without_send_slot() {
        let config = AckConfig {
            send_slots_per_channel: 1,
            ..test_config()
        };
        let mut poster = MockSendPoster::new();
        poster.expect_post()
            .with(eq(EndpointId::from_raw(0)), always(), eq(Channel::Priority), always())
            .times(1)
            .return_const(());

        let mut module = Module::new(Arc::new(config), Box::new(poster)).unwrap();
        let ep = module.add_endpoint(Seq::from_raw(1), Seq::from_raw(1));

        module.send_ack(ep);
        module.send_ack(ep);

        assert_eq!(module.stats().num_ack_sends, 1);
        assert_eq!(module.stats().num_ack_skips, 0);
        assert!(module.endpoint(ep).unwrap().is_ack_needed());
    }

    #[test]
    fn test_timeout_then_fast_retransmit_is_noop() {
        let mut f = Fixture::new(1);
        f.send(100, false);

        let evicted = f.module.endpoints.get_mut(&f.ep).unwrap().hotel.evict_expired(f.now + test_config().retrans_timeout);
        for (room, segment_id) in evicted {
            f.module.on_timeout(f.ep, room, segment_id);
        }

        f.module.force_retransmit(f.ep, Seq::from_raw(0));
        assert_eq!(f.module.stats().num_fast_retrans, 0);
        assert_eq!(f.module.resend_queue().len(), 1);
    }
}
