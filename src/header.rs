use anyhow::bail;
use bytes::{Buf, BufMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use crate::segment::Channel;
use crate::seq::Seq;

#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
pub enum SegmentKind {
    Data = 0,
    Ack = 1,
}

/// The header at the start of every segment on the wire - all numbers in network byte order (BE):
///
/// ```ascii
///  0: kind (u8): 0 = data, 1 = standalone ACK
///  1: channel (u8): 0 = priority, 1 = data
///  2: flags (u8):
///     * bit 0: ACK present - the `ack_seq` field carries a cumulative ACK. Always set for ACK
///        segments, set on data segments if an ACK is piggy-backed
///     * bit 1-7: unused, should be 0
///  3: reserved (u8), should be 0
///  4: seq (u16) - the segment's sequence number, 0 for ACK segments
///  6: ack_seq (u16) - the highest sequence number received without a gap before it
///  8: payload length (u32)
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentHeader {
    pub kind: SegmentKind,
    pub channel: Channel,
    pub seq: Seq,
    pub ack_seq: Option<Seq>,
    pub payload_len: u32,
}

impl SegmentHeader {
    pub const SERIALIZED_LEN: usize = 12;

    const FLAGS_OFFSET: usize = 2;
    const ACK_SEQ_OFFSET: usize = 6;
    const FLAG_ACK_PRESENT: u8 = 1;

    pub fn data(channel: Channel, seq: Seq, ack_seq: Option<Seq>, payload_len: u32) -> SegmentHeader {
        SegmentHeader {
            kind: SegmentKind::Data,
            channel,
            seq,
            ack_seq,
            payload_len,
        }
    }

    pub fn ack(ack_seq: Seq) -> SegmentHeader {
        SegmentHeader {
            kind: SegmentKind::Ack,
            channel: Channel::Priority,
            seq: Seq::ZERO,
            ack_seq: Some(ack_seq),
            payload_len: 0,
        }
    }

    pub fn ser(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.kind.into());
        buf.put_u8(self.channel.into());
        buf.put_u8(if self.ack_seq.is_some() { Self::FLAG_ACK_PRESENT } else { 0 });
        buf.put_u8(0);
        buf.put_u16(self.seq.to_raw());
        buf.put_u16(self.ack_seq.unwrap_or(Seq::ZERO).to_raw());
        buf.put_u32(self.payload_len);
    }

    pub fn deser(buf: &mut impl Buf) -> anyhow::Result<SegmentHeader> {
        if buf.remaining() < Self::SERIALIZED_LEN {
            bail!("segment header requires {} bytes, only {} available", Self::SERIALIZED_LEN, buf.remaining());
        }

        let kind = SegmentKind::try_from(buf.get_u8())?;
        let channel = Channel::try_from(buf.get_u8())?;
        let flags = buf.get_u8();
        let _reserved = buf.get_u8();
        let seq = Seq::from_raw(buf.get_u16());
        let raw_ack_seq = Seq::from_raw(buf.get_u16());
        let payload_len = buf.get_u32();

        if flags & !Self::FLAG_ACK_PRESENT != 0 {
            bail!("unsupported header flags {:#04x}", flags);
        }
        let ack_seq = if flags & Self::FLAG_ACK_PRESENT != 0 {
            Some(raw_ack_seq)
        }
        else {
            None
        };
        if kind == SegmentKind::Ack && ack_seq.is_none() {
            bail!("ACK segment without ACK value");
        }

        Ok(SegmentHeader {
            kind,
            channel,
            seq,
            ack_seq,
            payload_len,
        })
    }

    /// Replace the piggy-backed ACK in an already serialized segment, e.g. before resending it
    pub fn patch_ack_seq(packet: &mut [u8], ack_seq: Option<Seq>) {
        assert!(packet.len() >= Self::SERIALIZED_LEN, "this is a bug: patching a packet without a complete header");

        let flags = &mut packet[Self::FLAGS_OFFSET];
        match ack_seq {
            Some(_) => *flags |= Self::FLAG_ACK_PRESENT,
            None => *flags &= !Self::FLAG_ACK_PRESENT,
        }
        packet[Self::ACK_SEQ_OFFSET..Self::ACK_SEQ_OFFSET + 2]
            .copy_from_slice(&ack_seq.unwrap_or(Seq::ZERO).to_raw().to_be_bytes());
    }
}
