use std::fmt::{Debug, Formatter};
use bytes::Bytes;
use crate::endpoint::EndpointId;
use crate::pool::PoolId;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FragmentId(usize);
impl PoolId for FragmentId {
    fn from_index(index: usize) -> Self {
        FragmentId(index)
    }

    fn index(self) -> usize {
        self.0
    }
}

/// Invoked synchronously from ACK processing when all of a fragment's bytes are acknowledged
pub type CompletionCallback = Box<dyn FnMut(EndpointId, FragmentId)>;

#[derive(Default)]
pub struct FragmentOptions {
    /// The remote address of an RDMA-style put. Fragments with a destination always get a
    ///  completion callback.
    pub dst: Option<u64>,
    /// Request a completion callback for a regular send
    pub always_callback: bool,
    pub on_complete: Option<CompletionCallback>,
}

/// A logical outbound message unit, split into one or more segments for transmission
pub struct SendFragment {
    endpoint: EndpointId,
    payload: Bytes,
    /// offset of the first byte that was not yet carved into a segment
    unsent_offset: usize,
    ack_bytes_left: usize,
    dst: Option<u64>,
    always_callback: bool,
    on_complete: Option<CompletionCallback>,
    /// segments of this fragment that are not returned to the segment pool yet
    live_segments: usize,
}

impl Debug for SendFragment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendFragment")
            .field("endpoint", &self.endpoint)
            .field("total_len", &self.payload.len())
            .field("unsent_offset", &self.unsent_offset)
            .field("ack_bytes_left", &self.ack_bytes_left)
            .field("dst", &self.dst)
            .field("always_callback", &self.always_callback)
            .field("live_segments", &self.live_segments)
            .finish()
    }
}

impl SendFragment {
    pub(crate) fn new(endpoint: EndpointId, payload: Bytes, options: FragmentOptions) -> SendFragment {
        SendFragment {
            endpoint,
            ack_bytes_left: payload.len(),
            payload,
            unsent_offset: 0,
            dst: options.dst,
            always_callback: options.always_callback,
            on_complete: options.on_complete,
            live_segments: 0,
        }
    }

    pub fn endpoint(&self) -> EndpointId {
        self.endpoint
    }

    pub fn total_len(&self) -> usize {
        self.payload.len()
    }

    pub fn ack_bytes_left(&self) -> usize {
        self.ack_bytes_left
    }

    pub fn is_always_callback(&self) -> bool {
        self.always_callback
    }

    pub fn has_unsent(&self) -> bool {
        self.unsent_offset < self.payload.len()
    }

    pub(crate) fn next_chunk(&mut self, max_len: usize) -> Option<Bytes> {
        if !self.has_unsent() {
            return None;
        }

        let end = self.payload.len().min(self.unsent_offset + max_len);
        let chunk = self.payload.slice(self.unsent_offset..end);
        self.unsent_offset = end;
        Some(chunk)
    }

    pub(crate) fn on_segment_allocated(&mut self) {
        self.live_segments += 1;
    }

    pub(crate) fn on_segment_released(&mut self) {
        self.live_segments = self.live_segments.checked_sub(1)
            .expect("this is a bug: more segments released than allocated for a fragment");
    }

    pub(crate) fn on_bytes_acked(&mut self, num_bytes: usize) {
        self.ack_bytes_left = self.ack_bytes_left.checked_sub(num_bytes)
            .expect("this is a bug: more bytes acknowledged than the fragment has");
    }

    /// All bytes are acknowledged, and this is a put or a send that asked for a callback
    pub(crate) fn wants_completion_callback(&self) -> bool {
        self.ack_bytes_left == 0 && (self.dst.is_some() || self.always_callback)
    }

    /// The callback is consumed, so it can never fire twice
    pub(crate) fn fire_completion(&mut self, fragment_id: FragmentId) {
        if let Some(mut callback) = self.on_complete.take() {
            callback(self.endpoint, fragment_id);
        }
        self.always_callback = false;
    }

    /// fully acknowledged, and no segment refers to it any more
    pub(crate) fn is_done(&self) -> bool {
        self.ack_bytes_left == 0 && !self.has_unsent() && self.live_segments == 0
    }
}
