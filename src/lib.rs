//! The reliability layer of a kernel-bypass transport: cumulative ACKs, a sliding send window,
//!  and retransmission of lost segments, both after a timeout and on duplicate ACKs ("fast
//!  retransmit").
//!
//! ## Design goals
//!
//! * Run inside a NIC driver's polling loop: everything is synchronous and non-blocking, all
//!   state changes happen inside `&mut self` calls on a [module::Module]
//!   * there is no internal clock or timer thread - the polling loop passes the current time to
//!     [module::Module::progress]
//!   * sends are *posted* to the hardware and completed asynchronously through
//!     [module::Module::send_complete], see [send_poster::SendPoster]
//! * No allocation on the hot path beyond packet buffers: segments, fragments and ACK control
//!   segments come from fixed-size pools, and running out of them is a regular condition
//! * Fragments (messages) of arbitrary length are split into segments of at most
//!   `max_payload_len` bytes, each with its own 16 bit sequence number. Sequence numbers wrap
//!   around, and all comparisons are wrap-around aware
//! * The receiver acknowledges the highest sequence number it received without a gap, either
//!   piggy-backed on a data segment or in a standalone ACK on the priority channel
//! * A fragment's completion callback fires exactly once, when all its bytes are acknowledged
//!   * for RDMA-style puts (fragments with a destination address) always, for regular sends
//!     only on request
//!
//! Non-goals are congestion control and a handshake: both sides agree on their starting sequence
//!  numbers before creating the endpoints.
//!
//! ## Header
//!
//! See [header::SegmentHeader] for the wire format of data and ACK segments.
//!
//! ## Send window
//!
//! Each endpoint has a window of `window_size` slots, holding the segments that were sent but
//!  not acknowledged. The window's lower bound is the highest ACK received, its upper bound the
//!  next sequence number to be sent. Segments in the window are either waiting for their
//!  retransmit timeout in the endpoint's "hotel" (a fixed-size timeout tracker with one room per
//!  window slot), or queued in the module's resend queue - never both.
//!
//! NB: A segment is returned to its pool only when it is acknowledged *and* the hardware
//!      completed all its posted sends, since the hardware may still read the packet buffer

pub mod seq;
pub mod config;
pub mod header;
pub mod segment;
pub mod fragment;
pub mod pool;
pub mod hotel;
pub mod send_window;
pub mod resend_queue;
pub mod endpoint;
pub mod send_poster;
pub mod stats;
pub mod module;
mod ack;
pub mod safe_converter;

#[cfg(test)] mod test_util;
