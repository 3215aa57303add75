//! Brokered frames and the handoff record
//!
//! Every frame on the brokered channels has the same fixed size: a 4-byte
//! tag followed by a full ledger. A GET request carries a ledger payload
//! that the broker ignores; every reply carries the broker's canonical
//! ledger after the request was applied.

use crate::error::{ProtocolError, ProtocolResult};
use crate::layout::{decode_ledger, encode_ledger, LEDGER_WIRE_SIZE};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use hotel_types::{ClientId, ClientRequest, Gender, RoomLedger};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Size of every brokered frame in bytes
pub const FRAME_SIZE: usize = 4 + LEDGER_WIRE_SIZE;

/// Size of an encoded [`ClientRequest`]
pub const REQUEST_WIRE_SIZE: usize = 12;

/// Brokered frame tag
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum FrameTag {
    /// Read the canonical ledger
    Get = 1,
    /// Replace the canonical ledger unconditionally
    Set = 2,
}

/// One brokered request or reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerFrame {
    pub tag: FrameTag,
    pub ledger: RoomLedger,
}

impl LedgerFrame {
    pub fn get() -> Self {
        Self {
            tag: FrameTag::Get,
            ledger: RoomLedger::new(),
        }
    }

    pub fn set(ledger: RoomLedger) -> Self {
        Self {
            tag: FrameTag::Set,
            ledger,
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(FRAME_SIZE);
        self.encode_into(&mut buf);
        buf.freeze()
    }

    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        buf.put_i32_le(self.tag.into());
        encode_ledger(&self.ledger, buf);
    }

    /// Read only the tag of a raw frame.
    pub fn peek_tag(bytes: &[u8]) -> ProtocolResult<i32> {
        if bytes.len() < 4 {
            return Err(ProtocolError::message_too_small(4, bytes.len(), "frame tag"));
        }
        let mut tag = &bytes[..4];
        Ok(tag.get_i32_le())
    }

    /// Decode a full frame, validating both tag and ledger.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        if bytes.len() < FRAME_SIZE {
            return Err(ProtocolError::message_too_small(
                FRAME_SIZE,
                bytes.len(),
                "ledger frame",
            ));
        }

        let mut buf = bytes;
        let raw = buf.get_i32_le();
        let tag = FrameTag::try_from(raw).map_err(|_| ProtocolError::UnknownTag { tag: raw })?;
        let ledger = decode_ledger(&mut buf)?;
        Ok(Self { tag, ledger })
    }

    /// Decode a frame received by the broker. The payload of a GET is
    /// ignored, so it need not be a valid ledger.
    pub fn decode_request(bytes: &[u8]) -> ProtocolResult<Self> {
        let raw = Self::peek_tag(bytes)?;
        match FrameTag::try_from(raw) {
            Ok(FrameTag::Get) => Ok(Self::get()),
            Ok(FrameTag::Set) => Self::decode(bytes),
            Err(_) => Err(ProtocolError::UnknownTag { tag: raw }),
        }
    }
}

/// Write a client record as three little-endian `i32`s: id, gender, rent.
pub fn encode_request<B: BufMut>(request: &ClientRequest, buf: &mut B) {
    buf.put_i32_le(request.id.0);
    buf.put_i32_le(request.gender.into());
    buf.put_i32_le(request.rent_duration.min(i32::MAX as u32) as i32);
}

pub fn decode_request<B: Buf>(buf: &mut B) -> ProtocolResult<ClientRequest> {
    if buf.remaining() < REQUEST_WIRE_SIZE {
        return Err(ProtocolError::message_too_small(
            REQUEST_WIRE_SIZE,
            buf.remaining(),
            "client record",
        ));
    }

    let id = buf.get_i32_le();
    let gender = buf.get_i32_le();
    let rent = buf.get_i32_le();

    let gender = Gender::try_from(gender)
        .map_err(|_| ProtocolError::invalid_gender(gender, format!("record of client {id}")))?;
    let rent_duration =
        u32::try_from(rent).map_err(|_| ProtocolError::InvalidDuration { value: rent })?;

    Ok(ClientRequest::new(ClientId(id), gender, rent_duration))
}
