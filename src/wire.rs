//! Wire format for Google's Protocol Buffers, aka [protobuf](https://protobuf.dev).
//!
//! An encoded message is a concatenation of `(key, value)` records with no
//! overall length prefix. A key is the varint `(field_number << 3) | wire_type`
//! and the [`WireType`] says how the value that follows is framed.

use core::num::NonZeroU32;

use bytes::{Buf, BufMut, Bytes};

use crate::error::{DecodeError, EncodeError};
use crate::leb128::LebCodec;

/// Minimum value of a protobuf field number.
pub const MINIMUM_FIELD_NUMBER: u32 = 1;
/// Maximum value of a protobuf field number.
pub const MAXIMUM_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Denotes how the value of a record in an encoded message is framed.
///
/// The set is closed. The deprecated group markers (3 and 4) and the unused
/// values 6 and 7 are rejected, since the length of a value cannot be
/// inferred without knowing its wire type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer.
    ///
    /// Used for: `int32`, `int64`, `uint32`, `uint64`, `sint32`, `sint64`, `bool`, `enum`.
    Varint = 0,
    /// 64-bit little-endian value.
    ///
    /// Used for: `fixed64`, `sfixed64`, `double`.
    I64 = 1,
    /// Varint length followed by that many bytes.
    ///
    /// Used for: `string`, `bytes`, embedded messages, packed repeated fields.
    Len = 2,
    /// 32-bit little-endian value.
    ///
    /// Used for: `fixed32`, `sfixed32`, `float`.
    I32 = 5,
}

static_assertions::assert_eq_size!(WireType, u8);

impl WireType {
    /// Try to decode a [`WireType`] from the low three bits of a key.
    #[inline]
    pub fn try_from_val(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            5 => Ok(WireType::I32),
            value => Err(DecodeError::InvalidWireType { value }),
        }
    }

    /// Return the raw value for this [`WireType`].
    #[inline]
    pub const fn into_val(self) -> u8 {
        self as u8
    }

    /// Size of the value for fixed width wire types.
    #[inline]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            WireType::I32 => Some(4),
            WireType::I64 => Some(8),
            WireType::Varint | WireType::Len => None,
        }
    }
}

impl TryFrom<u8> for WireType {
    type Error = DecodeError;

    #[inline]
    fn try_from(value: u8) -> Result<Self, DecodeError> {
        WireType::try_from_val(value)
    }
}

/// A validated protobuf record key: a field number and a [`WireType`].
///
/// The layout mirrors the wire format, bits 0-2 hold the wire type and bits
/// 3-31 the field number. Field numbers start at 1 so the raw value is never
/// zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Key(NonZeroU32);

static_assertions::assert_eq_size!(Key, Option<Key>, u32);

impl Key {
    /// Creates a key, validating that `number` is a legal field number.
    pub fn new(number: u32, wire_type: WireType) -> Result<Self, EncodeError> {
        if !(MINIMUM_FIELD_NUMBER..=MAXIMUM_FIELD_NUMBER).contains(&number) {
            return Err(EncodeError::InvalidFieldNumber { number });
        }
        let raw = (number << 3) | u32::from(wire_type.into_val());
        NonZeroU32::new(raw)
            .map(Key)
            .ok_or(EncodeError::InvalidFieldNumber { number })
    }

    /// Validates a raw key as read from the wire.
    fn try_from_raw(raw: u64) -> Result<Self, DecodeError> {
        let wire_type = WireType::try_from_val((raw & 0b111) as u8)?;
        let number = raw >> 3;
        match u32::try_from(number) {
            Ok(number) => {
                Key::new(number, wire_type).map_err(|_| DecodeError::InvalidFieldNumber {
                    number: u64::from(number),
                })
            }
            Err(_) => Err(DecodeError::InvalidFieldNumber { number }),
        }
    }

    /// Returns the field number component of this key.
    #[inline]
    pub const fn number(self) -> u32 {
        self.0.get() >> 3
    }

    /// Returns the [`WireType`] component of this key.
    #[inline]
    pub const fn wire_type(self) -> WireType {
        // Validated during construction, so 5 is the only remaining value.
        match self.0.get() & 0b111 {
            0 => WireType::Varint,
            1 => WireType::I64,
            2 => WireType::Len,
            _ => WireType::I32,
        }
    }

    /// Decomposes this key into its [`WireType`] and field number.
    #[inline]
    pub const fn into_parts(self) -> (WireType, u32) {
        (self.wire_type(), self.number())
    }

    /// The raw `(number << 3) | wire_type` value.
    #[inline]
    pub const fn into_raw(self) -> u32 {
        self.0.get()
    }
}

impl core::fmt::Debug for Key {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Key")
            .field("number", &self.number())
            .field("wire_type", &self.wire_type())
            .finish()
    }
}

/// Encodes a varint, returning the number of bytes written.
#[inline]
pub fn encode_varint<B: BufMut>(value: u64, buf: &mut B) -> usize {
    value.encode_leb128(buf)
}

/// Returns the encoded length of a varint.
#[inline]
pub fn encoded_varint_len(value: u64) -> usize {
    value.encoded_leb128_len()
}

/// Decodes a varint starting at `offset` in `data`.
///
/// Returns the value and the offset just past it.
pub fn decode_varint(data: &[u8], offset: usize) -> Result<(u64, usize), DecodeError> {
    let rest = data.get(offset..).ok_or_else(DecodeError::truncated)?;
    let (value, len) = u64::decode_leb128(rest)?;
    Ok((value, offset + len))
}

/// Decodes a varint from the front of `buf`, advancing past it.
#[inline]
pub fn decode_varint_buf<B: Buf>(buf: &mut B) -> Result<u64, DecodeError> {
    u64::decode_leb128_buf(buf)
}

/// Encodes a record key.
///
/// Hot path for encoding, called for every field of every message.
#[inline]
pub fn encode_key<B: BufMut>(key: Key, buf: &mut B) {
    u64::from(key.into_raw()).encode_leb128(buf);
}

/// Encodes a record key from its parts, validating the field number.
pub fn try_encode_key<B: BufMut>(
    number: u32,
    wire_type: WireType,
    buf: &mut B,
) -> Result<(), EncodeError> {
    encode_key(Key::new(number, wire_type)?, buf);
    Ok(())
}

/// Returns the encoded length of a record key for `number`.
///
/// The wire type only occupies the low three bits so it never changes the
/// length.
#[inline]
pub fn encoded_key_len(number: u32) -> usize {
    u64::from(number << 3).encoded_leb128_len()
}

/// Decodes a record key from the front of `buf`.
#[inline]
pub fn decode_key<B: Buf>(buf: &mut B) -> Result<Key, DecodeError> {
    let raw = u64::decode_leb128_buf(buf)?;
    Key::try_from_raw(raw)
}

/// Decodes the length prefix of a length-delimited value.
#[inline]
pub fn decode_len<B: Buf>(buf: &mut B) -> Result<usize, DecodeError> {
    let len = u64::decode_leb128_buf(buf)?;
    usize::try_from(len).map_err(|_| DecodeError::LengthOverflow { value: len })
}

/// Decodes a length-delimited value, returning its payload.
///
/// For [`Bytes`] input the payload shares the underlying allocation.
#[inline]
pub fn decode_len_delimited<B: Buf>(buf: &mut B) -> Result<Bytes, DecodeError> {
    let len = decode_len(buf)?;
    if buf.remaining() < len {
        return Err(DecodeError::truncated());
    }
    Ok(buf.copy_to_bytes(len))
}

/// Encodes `data` as a length-delimited value.
#[inline]
pub fn encode_len_delimited<B: BufMut>(data: &[u8], buf: &mut B) {
    (data.len() as u64).encode_leb128(buf);
    buf.put_slice(data);
}

/// Returns the encoded length of a length-delimited value of `len` bytes.
#[inline]
pub fn encoded_len_delimited_len(len: usize) -> usize {
    (len as u64).encoded_leb128_len() + len
}

/// Skips over a field value based on its wire type.
///
/// Protobuf supports backwards and forwards compatibility by skipping fields
/// we don't know about. We "skip" a field by advancing our buffer past it.
#[inline]
pub fn skip_field<B: Buf>(wire_type: WireType, buf: &mut B) -> Result<(), DecodeError> {
    let skip_len = match wire_type {
        WireType::Varint => {
            u64::decode_leb128_buf(buf)?;
            return Ok(());
        }
        WireType::I64 => 8,
        WireType::Len => decode_len(buf)?,
        WireType::I32 => 4,
    };

    if buf.remaining() < skip_len {
        return Err(DecodeError::truncated());
    }
    buf.advance(skip_len);
    Ok(())
}

/// Zig-zag maps signed integers so small magnitudes encode as small varints.
#[inline]
pub const fn encode_zigzag32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`encode_zigzag32`].
#[inline]
pub const fn decode_zigzag32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Zig-zag maps signed integers so small magnitudes encode as small varints.
#[inline]
pub const fn encode_zigzag64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`encode_zigzag64`].
#[inline]
pub const fn decode_zigzag64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
